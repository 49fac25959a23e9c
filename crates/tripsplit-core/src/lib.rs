//! # tripsplit-core: Pure Expenditure Logic for TripSplit
//!
//! This crate decides whether a shared travel expenditure is consistent.
//! It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        TripSplit Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               tripsplit-service (request handling)              │   │
//! │  │    save_expenditure, delete_expenditure, list, get, notify      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ tripsplit-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌───────────┐  ┌───────────┐ │   │
//! │  │   │   types   │  │   exact    │  │ reference │  │validation │ │   │
//! │  │   │ Request   │  │ExactAmount │  │ ISO 4217  │  │ distrib.  │ │   │
//! │  │   │ Record    │  │ fractions  │  │ categories│  │ items     │ │   │
//! │  │   └───────────┘  └────────────┘  └───────────┘  └───────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                tripsplit-db (Database Layer)                    │   │
//! │  │          SQLite schema, migrations, transactional writer        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Wire requests, validated expenditures, stored entities
//! - [`exact`] - Arbitrary-precision rational amounts
//! - [`reference`] - Currency and category tables
//! - [`error`] - Domain error types and rejection reasons
//! - [`validation`] - Distribution, item and reconciliation rules
//!
//! ## Design Principles
//!
//! 1. **Exact Arithmetic**: every comparison is done on reduced rationals
//! 2. **One Float Boundary**: client floats are read through their decimal text
//! 3. **No I/O**: membership arrives as a predicate
//! 4. **Explicit Errors**: every rejection has a machine-readable reason
//!
//! ## Example Usage
//!
//! ```rust
//! use tripsplit_core::exact::ExactAmount;
//!
//! let total = ExactAmount::from_client_decimal(10.0).unwrap();
//! let third = total.divide_by_integer(3).unwrap();
//!
//! assert_eq!(third.to_string(), "10/3");
//! assert_eq!(third.multiply_by_integer(3), total);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod exact;
pub mod reference;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{AmountError, CoreError, RejectionReason, ValidationError};
pub use exact::ExactAmount;
pub use reference::ReferenceData;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of an expenditure name, in characters.
pub const MAX_NAME_LENGTH: usize = 200;
