//! # Database Handle
//!
//! Opens the trip store and hands out repositories.
//!
//! ```text
//!   ServiceConfig [database]
//!          │  path = "data/tripsplit.db" | ":memory:"
//!          ▼
//!   DbConfig ──► StoreLocation::File     WAL journal, up to N connections
//!            └─► StoreLocation::InMemory one connection, never recycled
//!          │
//!          ▼
//!   Database::new ── foreign_keys=ON ── migrate ──► sessions() / expenditures()
//! ```
//!
//! Foreign keys are switched on per connection so deleting a session or an
//! expenditure cascades to its payers, shares, items and allocations.
//!
//! Under WAL a reader never sees a half-written expenditure: the rows of a
//! save become visible together at commit. SQLite admits one writer at a
//! time, which is what orders two concurrent edits of the same expenditure.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::expenditure::ExpenditureRepository;
use crate::repository::session::SessionRepository;

/// Path value that selects a private in-memory store.
pub const IN_MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Where the trip store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// A SQLite file, created on first open.
    File(PathBuf),
    /// A store that disappears with its single connection. Tests use it.
    InMemory,
}

/// How to open the store. Built by `ServiceConfig::db_config`.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: StoreLocation,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
}

impl DbConfig {
    /// A file-backed store at `path`. The literal `:memory:` selects
    /// [`DbConfig::in_memory`] instead.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path == Path::new(IN_MEMORY_PATH) {
            return Self::in_memory();
        }

        DbConfig {
            location: StoreLocation::File(path.to_path_buf()),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
        }
    }

    /// A private in-memory store.
    ///
    /// Pinned to one connection: a second connection would open a second,
    /// empty database.
    pub fn in_memory() -> Self {
        DbConfig {
            location: StoreLocation::InMemory,
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Ignored for in-memory stores.
    pub fn max_connections(mut self, max: u32) -> Self {
        if self.location != StoreLocation::InMemory {
            self.max_connections = max;
        }
        self
    }

    /// Ignored for in-memory stores.
    pub fn min_connections(mut self, min: u32) -> Self {
        if self.location != StoreLocation::InMemory {
            self.min_connections = min;
        }
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.location {
            StoreLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal),
            StoreLocation::InMemory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
                .journal_mode(SqliteJournalMode::Memory),
        };

        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared handle to the trip store. Clones share one pool; the service layer
/// passes it explicitly.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the store and brings its schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(location = ?config.location, "Opening trip store");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout);

        // Closing the only connection of an in-memory store drops its data.
        if config.location == StoreLocation::InMemory {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(max_connections = config.max_connections, "Pool ready");

        migrations::run_migrations(&pool).await?;

        Ok(Database { pool })
    }

    /// Raw pool, for queries outside the repositories.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn sessions(&self) -> SessionRepository {
        SessionRepository::new(self.pool.clone())
    }

    pub fn expenditures(&self) -> ExpenditureRepository {
        ExpenditureRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections to come back, then closes them.
    /// Every later call through this handle fails.
    pub async fn close(&self) {
        info!("Closing trip store");
        self.pool.close().await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
