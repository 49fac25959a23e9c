//! # TripSplit Service
//!
//! Request pipeline for shared travel expenditures.
//!
//! ## Module Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        tripsplit-service                                │
//! │                                                                         │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────────────┐    │
//! │  │  expenditure  │──►│   notifier    │   │        config         │    │
//! │  │ save / delete │   │ ChangeEvent   │   │ TOML + TRIPSPLIT_* env│    │
//! │  │ get / list    │   │ broadcast     │   └───────────────────────┘    │
//! │  └───────┬───────┘   └───────────────┘   ┌───────────────────────┐    │
//! │          │                               │       telemetry       │    │
//! │          ▼                               │  tracing subscriber   │    │
//! │   tripsplit-core  ──►  tripsplit-db      └───────────────────────┘    │
//! │   (validation)         (transaction)                                   │
//! │                                                                         │
//! │  error: ServiceError ──► ApiError (what callers see)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wiring
//! ```rust,ignore
//! let config = ServiceConfig::load(None)?;
//! init_tracing(&config.logging.filter);
//!
//! let db = Database::new(config.db_config()).await?;
//! let notifier = Arc::new(BroadcastNotifier::new(config.notifications.channel_capacity));
//! let service = ExpenditureService::new(db, config.reference_data(), notifier.clone());
//! ```

pub mod config;
pub mod error;
pub mod expenditure;
pub mod notifier;
pub mod telemetry;

pub use config::ServiceConfig;
pub use error::{ApiError, ErrorCode, ServiceError, ServiceResult};
pub use expenditure::{ExpenditureService, WriteOutcome};
pub use notifier::{BroadcastNotifier, ChangeEvent, ChangeNotifier, EventKind, NotifyError};
pub use telemetry::init_tracing;
