//! # tripsplit-db: Database Layer for TripSplit
//!
//! This crate provides database access for TripSplit.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        TripSplit Data Flow                              │
//! │                                                                         │
//! │  ExpenditureService::save_expenditure                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  tripsplit-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌──────────────────┐  ┌──────────────┐  │   │
//! │  │   │   Database    │    │   Repositories   │  │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                  │  │  (embedded)  │  │   │
//! │  │   │               │    │ SessionRepo      │  │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ExpenditureRepo  │  │ 001_init.sql │  │   │
//! │  │   │ Transactions  │    │                  │  │              │  │   │
//! │  │   └───────────────┘    └──────────────────┘  └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Opening the store (file or in-memory)
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Session and expenditure repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tripsplit_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/tripsplit.db")).await?;
//!
//! let members = db.sessions().member_ids("trip-1").await?;
//! let record = db.expenditures().save(&validated).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, StoreLocation};

pub use repository::expenditure::ExpenditureRepository;
pub use repository::session::SessionRepository;
