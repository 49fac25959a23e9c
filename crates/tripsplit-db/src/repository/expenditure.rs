//! # Expenditure Repository
//!
//! Atomic writes, reads and deletes for expenditures and their children.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   save(&ValidatedExpenditure)                           │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    │                                                                    │
//! │    ├── expenditure_id given?                                           │
//! │    │     └── delete allocations, items, distributions, payers,         │
//! │    │         then the row itself (NotFound if it wasn't there)         │
//! │    │                                                                    │
//! │    ├── INSERT expenditures                                             │
//! │    ├── INSERT expenditure_payers            (one per payer)            │
//! │    ├── INSERT expenditure_distributions     (num/den, non-zero only)   │
//! │    └── INSERT expenditure_items             (in request order)         │
//! │          └── INSERT expenditure_item_allocations                       │
//! │    │                                                                    │
//! │  COMMIT ──► ExpenditureRecord                                          │
//! │                                                                         │
//! │  Any `?` before COMMIT drops the transaction, which rolls it back.     │
//! │  The same happens if the caller's future is dropped mid-write.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Edits are replace-on-edit: the old children are removed and the new ones
//! inserted under the same expenditure identifier. Item identifiers are
//! regenerated on every save.

use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tripsplit_core::{
    Allocation, Distribution, DistributionEntry, Expenditure, ExpenditureItem, ExpenditureRecord,
    ItemRecord, Payer, ValidatedExpenditure,
};

const EXPENDITURE_COLUMNS: &str =
    "expenditure_id, session_id, name, total_price, currency_code, category, payed_at";

/// Repository for expenditure database operations.
#[derive(Debug, Clone)]
pub struct ExpenditureRepository {
    pool: SqlitePool,
}

impl ExpenditureRepository {
    /// Creates a new ExpenditureRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenditureRepository { pool }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Persists a validated expenditure in one transaction.
    ///
    /// ## Returns
    /// The finalized record, including the generated expenditure identifier
    /// (on create) and item identifiers.
    ///
    /// ## Errors
    /// - `NotFound` when editing an identifier that does not exist in the
    ///   expenditure's session
    /// - Any store error; nothing is written in either case
    pub async fn save(&self, expenditure: &ValidatedExpenditure) -> DbResult<ExpenditureRecord> {
        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        let expenditure_id = match &expenditure.expenditure_id {
            Some(existing) => {
                debug!(expenditure_id = %existing, "Replacing expenditure");
                delete_rows(&mut *tx, existing, Some(expenditure.session_id.as_str())).await?;
                existing.clone()
            }
            None => Uuid::new_v4().to_string(),
        };

        let row = Expenditure {
            expenditure_id: expenditure_id.clone(),
            session_id: expenditure.session_id.clone(),
            name: expenditure.name.clone(),
            total_price: expenditure.total_price,
            currency_code: expenditure.currency_code.clone(),
            category: expenditure.category.clone(),
            payed_at: expenditure.payed_at,
        };
        insert_expenditure(&mut *tx, &row).await?;

        for member_id in &expenditure.payer_ids {
            insert_payer(&mut *tx, &expenditure_id, member_id).await?;
        }

        for entry in &expenditure.distribution {
            insert_distribution(&mut *tx, &expenditure_id, entry).await?;
        }

        let mut items = Vec::with_capacity(expenditure.items.len());
        for (position, item) in expenditure.items.iter().enumerate() {
            let stored = ExpenditureItem {
                item_id: Uuid::new_v4().to_string(),
                expenditure_id: expenditure_id.clone(),
                label: item.label.clone(),
                price: item.price,
                position: position as i64,
            };
            insert_item(&mut *tx, &stored).await?;

            for member_id in &item.allocations {
                insert_allocation(&mut *tx, &stored.item_id, member_id).await?;
            }

            items.push(ItemRecord {
                item_id: stored.item_id,
                label: stored.label,
                price: stored.price,
                allocations: item.allocations.clone(),
            });
        }

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            expenditure_id = %expenditure_id,
            session_id = %expenditure.session_id,
            payers = expenditure.payer_ids.len(),
            distributions = expenditure.distribution.len(),
            items = items.len(),
            "Expenditure committed"
        );

        Ok(ExpenditureRecord::from_parts(
            row,
            expenditure.payer_ids.clone(),
            expenditure.distribution.clone(),
            items,
        ))
    }

    /// Deletes an expenditure and all of its children in one transaction.
    pub async fn delete(&self, expenditure_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        delete_rows(&mut *tx, expenditure_id, None).await?;

        tx.commit().await.map_err(DbError::transaction)?;

        info!(expenditure_id = %expenditure_id, "Expenditure deleted");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an expenditure row by ID.
    pub async fn get(&self, expenditure_id: &str) -> DbResult<Option<Expenditure>> {
        let sql = format!("SELECT {EXPENDITURE_COLUMNS} FROM expenditures WHERE expenditure_id = ?1");
        let expenditure = sqlx::query_as::<_, Expenditure>(&sql)
            .bind(expenditure_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(expenditure)
    }

    /// Lists a session's expenditures by payment time.
    pub async fn list_by_session(&self, session_id: &str) -> DbResult<Vec<Expenditure>> {
        let sql = format!(
            "SELECT {EXPENDITURE_COLUMNS} FROM expenditures WHERE session_id = ?1 \
             ORDER BY payed_at, rowid"
        );
        let expenditures = sqlx::query_as::<_, Expenditure>(&sql)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(expenditures)
    }

    /// Payers of an expenditure, in insertion order.
    pub async fn payers(&self, expenditure_id: &str) -> DbResult<Vec<Payer>> {
        let payers = sqlx::query_as::<_, Payer>(
            "SELECT expenditure_id, member_id FROM expenditure_payers \
             WHERE expenditure_id = ?1 ORDER BY rowid",
        )
        .bind(expenditure_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payers)
    }

    /// Distribution fractions of an expenditure, in insertion order.
    pub async fn distributions(&self, expenditure_id: &str) -> DbResult<Vec<Distribution>> {
        let distributions = sqlx::query_as::<_, Distribution>(
            "SELECT expenditure_id, member_id, numerator, denominator \
             FROM expenditure_distributions WHERE expenditure_id = ?1 ORDER BY rowid",
        )
        .bind(expenditure_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(distributions)
    }

    /// Items of an expenditure, in their original order.
    pub async fn items(&self, expenditure_id: &str) -> DbResult<Vec<ExpenditureItem>> {
        let items = sqlx::query_as::<_, ExpenditureItem>(
            "SELECT item_id, expenditure_id, label, price, position \
             FROM expenditure_items WHERE expenditure_id = ?1 ORDER BY position",
        )
        .bind(expenditure_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Allocations of a single item.
    pub async fn allocations(&self, item_id: &str) -> DbResult<Vec<Allocation>> {
        let allocations = sqlx::query_as::<_, Allocation>(
            "SELECT item_id, member_id FROM expenditure_item_allocations \
             WHERE item_id = ?1 ORDER BY rowid",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(allocations)
    }

    /// Allocations of every item of an expenditure, grouped by item order.
    pub async fn allocations_for_expenditure(
        &self,
        expenditure_id: &str,
    ) -> DbResult<Vec<Allocation>> {
        let allocations = sqlx::query_as::<_, Allocation>(
            "SELECT a.item_id, a.member_id FROM expenditure_item_allocations a \
             JOIN expenditure_items i ON i.item_id = a.item_id \
             WHERE i.expenditure_id = ?1 ORDER BY i.position, a.rowid",
        )
        .bind(expenditure_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(allocations)
    }

    /// Rebuilds the full record of an expenditure.
    pub async fn load_record(&self, expenditure_id: &str) -> DbResult<Option<ExpenditureRecord>> {
        let Some(expenditure) = self.get(expenditure_id).await? else {
            return Ok(None);
        };

        let payers_id = self
            .payers(expenditure_id)
            .await?
            .into_iter()
            .map(|p| p.member_id)
            .collect();

        let distribution = self
            .distributions(expenditure_id)
            .await?
            .into_iter()
            .map(|d| DistributionEntry {
                amount: d.amount(),
                member_id: d.member_id,
            })
            .collect();

        let mut allocations: HashMap<String, Vec<String>> = HashMap::new();
        for allocation in self.allocations_for_expenditure(expenditure_id).await? {
            allocations
                .entry(allocation.item_id)
                .or_default()
                .push(allocation.member_id);
        }

        let items = self
            .items(expenditure_id)
            .await?
            .into_iter()
            .map(|item| ItemRecord {
                allocations: allocations.remove(&item.item_id).unwrap_or_default(),
                item_id: item.item_id,
                label: item.label,
                price: item.price,
            })
            .collect();

        Ok(Some(ExpenditureRecord::from_parts(
            expenditure,
            payers_id,
            distribution,
            items,
        )))
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

/// Removes an expenditure and its children.
///
/// With `session_id` set, the expenditure must also belong to that session.
async fn delete_rows(
    conn: &mut SqliteConnection,
    expenditure_id: &str,
    session_id: Option<&str>,
) -> DbResult<()> {
    sqlx::query(
        "DELETE FROM expenditure_item_allocations WHERE item_id IN \
         (SELECT item_id FROM expenditure_items WHERE expenditure_id = ?1)",
    )
    .bind(expenditure_id)
    .execute(&mut *conn)
    .await?;

    for table in [
        "expenditure_items",
        "expenditure_distributions",
        "expenditure_payers",
    ] {
        sqlx::query(&format!("DELETE FROM {table} WHERE expenditure_id = ?1"))
            .bind(expenditure_id)
            .execute(&mut *conn)
            .await?;
    }

    let result = sqlx::query(
        "DELETE FROM expenditures WHERE expenditure_id = ?1 AND (?2 IS NULL OR session_id = ?2)",
    )
    .bind(expenditure_id)
    .bind(session_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Expenditure", expenditure_id));
    }

    Ok(())
}

async fn insert_expenditure(conn: &mut SqliteConnection, row: &Expenditure) -> DbResult<()> {
    debug!(expenditure_id = %row.expenditure_id, "Inserting expenditure");

    sqlx::query(&format!(
        "INSERT INTO expenditures ({EXPENDITURE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
    ))
    .bind(&row.expenditure_id)
    .bind(&row.session_id)
    .bind(&row.name)
    .bind(row.total_price)
    .bind(&row.currency_code)
    .bind(&row.category)
    .bind(row.payed_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_payer(
    conn: &mut SqliteConnection,
    expenditure_id: &str,
    member_id: &str,
) -> DbResult<()> {
    debug!(expenditure_id = %expenditure_id, member_id = %member_id, "Inserting payer");

    sqlx::query("INSERT INTO expenditure_payers (expenditure_id, member_id) VALUES (?1, ?2)")
        .bind(expenditure_id)
        .bind(member_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

async fn insert_distribution(
    conn: &mut SqliteConnection,
    expenditure_id: &str,
    entry: &DistributionEntry,
) -> DbResult<()> {
    debug!(
        expenditure_id = %expenditure_id,
        member_id = %entry.member_id,
        numerator = entry.amount.numerator,
        denominator = entry.amount.denominator,
        "Inserting distribution"
    );

    sqlx::query(
        "INSERT INTO expenditure_distributions (expenditure_id, member_id, numerator, denominator) \
         VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(expenditure_id)
    .bind(&entry.member_id)
    .bind(entry.amount.numerator)
    .bind(entry.amount.denominator)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_item(conn: &mut SqliteConnection, item: &ExpenditureItem) -> DbResult<()> {
    debug!(item_id = %item.item_id, label = %item.label, "Inserting item");

    sqlx::query(
        "INSERT INTO expenditure_items (item_id, expenditure_id, label, price, position) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&item.item_id)
    .bind(&item.expenditure_id)
    .bind(&item.label)
    .bind(item.price)
    .bind(item.position)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_allocation(conn: &mut SqliteConnection, item_id: &str, member_id: &str) -> DbResult<()> {
    sqlx::query("INSERT INTO expenditure_item_allocations (item_id, member_id) VALUES (?1, ?2)")
        .bind(item_id)
        .bind(member_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
