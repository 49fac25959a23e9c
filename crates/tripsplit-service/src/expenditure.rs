//! # Expenditure Service
//!
//! The request pipeline for creating, replacing, reading and deleting
//! expenditures.
//!
//! ## Write Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   save_expenditure(member, request)                     │
//! │                                                                         │
//! │  1. session exists?                       → SessionNotFound            │
//! │  2. acting member in session?             → NotSessionMember           │
//! │        ───── FailedBeforeWrite: the lookup itself failed ────────────  │
//! │  3. validate_expenditure (pure)           → CoreError                  │
//! │        ───── RolledBackOnValidationError: no transaction opened ─────  │
//! │  4. ExpenditureRepository::save (one tx)  → NotFound / DbError         │
//! │        ───── RolledBackOnWriteError: transaction dropped ────────────  │
//! │  5. Committed                                                          │
//! │  6. notify ExpenditureCreated             (failure only logged)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The service holds no mutable state; every request works on its own
//! connection and transaction.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use tripsplit_core::validation::validate_expenditure;
use tripsplit_core::{Expenditure, ExpenditureRecord, ExpenditureRequest, ReferenceData};
use tripsplit_db::{Database, DbError};

use crate::error::{ServiceError, ServiceResult};
use crate::notifier::{ChangeEvent, ChangeNotifier, EventKind, NotifyError};

// =============================================================================
// Write Outcome
// =============================================================================

/// Terminal state of an expenditure write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Every row is durable.
    Committed,

    /// Rejected before a transaction was opened.
    RolledBackOnValidationError,

    /// A transaction was opened and then rolled back.
    RolledBackOnWriteError,

    /// A store lookup failed before a transaction was opened.
    FailedBeforeWrite,
}

impl WriteOutcome {
    /// Returns true if the store ended up with the new record.
    pub fn is_committed(&self) -> bool {
        matches!(self, WriteOutcome::Committed)
    }
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOutcome::Committed => write!(f, "committed"),
            WriteOutcome::RolledBackOnValidationError => write!(f, "rolled_back_on_validation_error"),
            WriteOutcome::RolledBackOnWriteError => write!(f, "rolled_back_on_write_error"),
            WriteOutcome::FailedBeforeWrite => write!(f, "failed_before_write"),
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Expenditure operations for session members.
#[derive(Clone)]
pub struct ExpenditureService {
    db: Database,
    reference: ReferenceData,
    notifier: Arc<dyn ChangeNotifier>,
}

impl ExpenditureService {
    /// Creates a service over an explicit database handle.
    pub fn new(db: Database, reference: ReferenceData, notifier: Arc<dyn ChangeNotifier>) -> Self {
        ExpenditureService {
            db,
            reference,
            notifier,
        }
    }

    /// Categories offered to clients.
    pub fn categories(&self) -> &[String] {
        self.reference.categories()
    }

    /// Creates an expenditure, or replaces one when `expenditure_id` is set.
    ///
    /// ## Returns
    /// The committed record. Other members are notified afterwards.
    pub async fn save_expenditure(
        &self,
        acting_member_id: &str,
        request: &ExpenditureRequest,
    ) -> ServiceResult<ExpenditureRecord> {
        self.save_expenditure_with_outcome(acting_member_id, request)
            .await
            .1
    }

    /// Same as [`save_expenditure`](Self::save_expenditure), also reporting
    /// which terminal state the write reached.
    pub async fn save_expenditure_with_outcome(
        &self,
        acting_member_id: &str,
        request: &ExpenditureRequest,
    ) -> (WriteOutcome, ServiceResult<ExpenditureRecord>) {
        let (outcome, record) = match self.write(acting_member_id, request).await {
            Ok(record) => (WriteOutcome::Committed, Ok(record)),
            Err((err, outcome)) => (outcome, Err(err)),
        };

        match &record {
            Ok(record) => info!(
                expenditure_id = %record.expenditure_id,
                session_id = %record.session_id,
                %outcome,
                "Expenditure saved"
            ),
            Err(err) if err.is_caller_error() => warn!(
                session_id = %request.session_id,
                member_id = %acting_member_id,
                %outcome,
                error = %err,
                "Expenditure rejected"
            ),
            Err(err) => error!(
                session_id = %request.session_id,
                member_id = %acting_member_id,
                %outcome,
                error = %err,
                "Expenditure write failed"
            ),
        }

        if let Ok(record) = &record {
            self.publish(
                &record.session_id,
                acting_member_id,
                EventKind::ExpenditureCreated,
                serde_json::to_value(record),
            );
        }
        (outcome, record)
    }

    async fn write(
        &self,
        acting_member_id: &str,
        request: &ExpenditureRequest,
    ) -> Result<ExpenditureRecord, (ServiceError, WriteOutcome)> {
        let rejected = |err: ServiceError| (err, WriteOutcome::RolledBackOnValidationError);

        let members = self
            .session_members(&request.session_id, acting_member_id)
            .await
            .map_err(|e| {
                if e.is_caller_error() {
                    rejected(e)
                } else {
                    (e, WriteOutcome::FailedBeforeWrite)
                }
            })?;

        let validated =
            validate_expenditure(request, &self.reference, |member_id| members.contains(member_id))
                .map_err(|e| rejected(e.into()))?;

        debug!(
            session_id = %validated.session_id,
            distributions = validated.distribution.len(),
            items = validated.items.len(),
            "Expenditure validated"
        );

        self.db
            .expenditures()
            .save(&validated)
            .await
            .map_err(|e| (write_error(e), WriteOutcome::RolledBackOnWriteError))
    }

    /// Deletes an expenditure and notifies the session.
    pub async fn delete_expenditure(
        &self,
        acting_member_id: &str,
        expenditure_id: &str,
    ) -> ServiceResult<()> {
        let expenditure = self.authorized_expenditure(acting_member_id, expenditure_id).await?;

        self.db
            .expenditures()
            .delete(expenditure_id)
            .await
            .map_err(|e| {
                let err = write_error(e);
                if !err.is_caller_error() {
                    error!(expenditure_id = %expenditure_id, error = %err, "Expenditure delete failed");
                }
                err
            })?;

        info!(
            expenditure_id = %expenditure_id,
            session_id = %expenditure.session_id,
            member_id = %acting_member_id,
            "Expenditure deleted"
        );

        self.publish(
            &expenditure.session_id,
            acting_member_id,
            EventKind::ExpenditureDeleted,
            Ok(serde_json::json!({ "expenditureId": expenditure_id })),
        );
        Ok(())
    }

    /// Returns the full record of one expenditure.
    pub async fn get_expenditure(
        &self,
        acting_member_id: &str,
        expenditure_id: &str,
    ) -> ServiceResult<ExpenditureRecord> {
        self.authorized_expenditure(acting_member_id, expenditure_id).await?;

        self.db
            .expenditures()
            .load_record(expenditure_id)
            .await?
            .ok_or_else(|| ServiceError::ExpenditureNotFound(expenditure_id.to_string()))
    }

    /// Lists a session's expenditures by payment time.
    pub async fn list_expenditures(
        &self,
        acting_member_id: &str,
        session_id: &str,
    ) -> ServiceResult<Vec<Expenditure>> {
        self.session_members(session_id, acting_member_id).await?;

        Ok(self.db.expenditures().list_by_session(session_id).await?)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Checks the session and the acting member, returning all member ids.
    async fn session_members(
        &self,
        session_id: &str,
        acting_member_id: &str,
    ) -> ServiceResult<HashSet<String>> {
        let sessions = self.db.sessions();

        if sessions.get(session_id).await?.is_none() {
            return Err(ServiceError::SessionNotFound(session_id.to_string()));
        }

        let members: HashSet<String> = sessions.member_ids(session_id).await?.into_iter().collect();
        if !members.contains(acting_member_id) {
            return Err(ServiceError::NotSessionMember {
                session_id: session_id.to_string(),
                member_id: acting_member_id.to_string(),
            });
        }

        Ok(members)
    }

    /// Loads an expenditure the acting member is allowed to see.
    async fn authorized_expenditure(
        &self,
        acting_member_id: &str,
        expenditure_id: &str,
    ) -> ServiceResult<Expenditure> {
        let expenditure = self
            .db
            .expenditures()
            .get(expenditure_id)
            .await?
            .ok_or_else(|| ServiceError::ExpenditureNotFound(expenditure_id.to_string()))?;

        self.session_members(&expenditure.session_id, acting_member_id)
            .await?;

        Ok(expenditure)
    }

    /// Hands an event to the notifier. Failures are logged and swallowed.
    fn publish(
        &self,
        session_id: &str,
        acting_member_id: &str,
        kind: EventKind,
        payload: Result<serde_json::Value, serde_json::Error>,
    ) {
        let sent = payload.map_err(NotifyError::from).and_then(|payload| {
            self.notifier.notify(&ChangeEvent {
                session_id: session_id.to_string(),
                acting_member_id: acting_member_id.to_string(),
                kind,
                payload,
            })
        });

        if let Err(e) = sent {
            warn!(session_id = %session_id, kind = ?kind, error = %e, "Change notification failed");
        }
    }
}

fn write_error(err: DbError) -> ServiceError {
    match err {
        DbError::NotFound { entity, id } if entity == "Expenditure" => {
            ServiceError::ExpenditureNotFound(id)
        }
        other => ServiceError::Database(other),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
