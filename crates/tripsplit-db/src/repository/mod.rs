//! # Repository Module
//!
//! Database repositories for TripSplit.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ExpenditureService                                                    │
//! │       │                                                                 │
//! │       ├── db.sessions().member_ids(session)     (membership predicate) │
//! │       │                                                                 │
//! │       └── db.expenditures().save(&validated)    (one transaction)      │
//! │                │                                                        │
//! │                ▼                                                        │
//! │           SQLite Database                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SessionRepository`](session::SessionRepository) - Sessions and membership
//! - [`ExpenditureRepository`](expenditure::ExpenditureRepository) - Atomic
//!   expenditure writes, reads and deletes

pub mod expenditure;
pub mod session;
