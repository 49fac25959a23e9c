//! # Error Types
//!
//! Domain-specific error types for tripsplit-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tripsplit-core errors (this file)                                     │
//! │  ├── AmountError      - Fraction construction / float boundary         │
//! │  ├── ValidationError  - Malformed input fields                         │
//! │  └── CoreError        - Split consistency violations                   │
//! │                                                                         │
//! │  tripsplit-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  tripsplit-service errors                                              │
//! │  └── ApiError         - What the caller sees (serialized)              │
//! │                                                                         │
//! │  Flow: AmountError → CoreError → ServiceError → ApiError → Client      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `CoreError` is a caller mistake. None of them is raised after a
//! transaction has been opened.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Amount Error
// =============================================================================

/// Errors raised while building or converting an `ExactAmount`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// A fraction was constructed with a zero denominator.
    #[error("Invalid fraction {numerator}/0: denominator must be non-zero")]
    InvalidFraction { numerator: i64 },

    /// Division of an amount by zero.
    #[error("Division by zero")]
    DivisionByZero,

    /// NaN or infinity crossed the float boundary.
    #[error("Amount must be a finite number, got {0}")]
    NotFinite(String),

    /// Decimal value needs more precision than the boundary accepts.
    #[error("Amount {value} is out of range: {reason}")]
    OutOfRange { value: String, reason: String },

    /// Reduced fraction does not fit the 64-bit storage columns.
    #[error("Fraction {0} does not fit in a 64-bit numerator/denominator")]
    FractionOverflow(String),
}

/// Convenience type alias for Results with AmountError.
pub type AmountResult<T> = Result<T, AmountError>;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early field checks before any split arithmetic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., timestamp out of range).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Core Error
// =============================================================================

/// Split consistency errors.
///
/// ## When These Occur
/// ```text
/// Request
///   │
///   ├─► distribution ──► EmptyDenominator / TotalMismatch
///   ├─► payers ────────► NoPayers / InvalidPayer
///   ├─► reference ─────► UnsupportedCurrency / InvalidCategory
///   ├─► items ─────────► EmptyAllocation / InvalidAllocatedMember
///   └─► reconcile ─────► DistributionItemMismatch / DistributionAmountMismatch
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Fraction or float boundary failure.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// A distribution entry has a zero denominator.
    #[error("Distribution for {member_id} has a zero denominator")]
    EmptyDenominator { member_id: String },

    /// Distribution shares do not add up to the declared total.
    #[error("Total price does not match distribution: declared {declared}, distributed {distributed}")]
    TotalMismatch {
        declared: String,
        distributed: String,
    },

    /// Nobody paid.
    #[error("No payer specified")]
    NoPayers,

    /// A payer is not a member of the session.
    #[error("Payer {member_id} is not in the session")]
    InvalidPayer { member_id: String },

    /// An item lists no allocated members.
    #[error("No allocation specified for item '{label}'")]
    EmptyAllocation { label: String },

    /// An allocated member is not a member of the session.
    #[error("Allocated member {member_id} is not in the session")]
    InvalidAllocatedMember { member_id: String },

    /// A distribution member receives nothing from the items.
    #[error("Distribution member {member_id} not found in items")]
    DistributionItemMismatch { member_id: String },

    /// A distribution member's share differs from their item shares.
    #[error("Distribution for {member_id} does not match items: declared {declared}, allocated {allocated}")]
    DistributionAmountMismatch {
        member_id: String,
        declared: String,
        allocated: String,
    },

    /// Currency code is not in the reference table.
    #[error("Unsupported currency code: {0}")]
    UnsupportedCurrency(String),

    /// Category tag is not in the reference table.
    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    /// Field validation failure.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Machine-readable reason for this rejection.
    pub fn reason(&self) -> RejectionReason {
        match self {
            CoreError::Amount(AmountError::InvalidFraction { .. }) => {
                RejectionReason::InvalidFraction
            }
            CoreError::Amount(_) => RejectionReason::InvalidAmount,
            CoreError::EmptyDenominator { .. } => RejectionReason::EmptyDenominator,
            CoreError::TotalMismatch { .. } => RejectionReason::TotalMismatch,
            CoreError::NoPayers => RejectionReason::NoPayers,
            CoreError::InvalidPayer { .. } => RejectionReason::InvalidPayer,
            CoreError::EmptyAllocation { .. } => RejectionReason::EmptyAllocation,
            CoreError::InvalidAllocatedMember { .. } => RejectionReason::InvalidAllocatedMember,
            CoreError::DistributionItemMismatch { .. } => {
                RejectionReason::DistributionItemMismatch
            }
            CoreError::DistributionAmountMismatch { .. } => {
                RejectionReason::DistributionAmountMismatch
            }
            CoreError::UnsupportedCurrency(_) => RejectionReason::UnsupportedCurrency,
            CoreError::InvalidCategory(_) => RejectionReason::InvalidCategory,
            CoreError::Validation(_) => RejectionReason::InvalidInput,
        }
    }
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Rejection Reason
// =============================================================================

/// Why a request was refused, as sent to the client.
///
/// ```json
/// { "code": "VALIDATION_ERROR", "reason": "TOTAL_MISMATCH", "message": "..." }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum RejectionReason {
    InvalidInput,
    InvalidFraction,
    InvalidAmount,
    EmptyDenominator,
    TotalMismatch,
    NoPayers,
    InvalidPayer,
    EmptyAllocation,
    InvalidAllocatedMember,
    DistributionItemMismatch,
    DistributionAmountMismatch,
    UnsupportedCurrency,
    InvalidCategory,
    SessionNotFound,
    NotSessionMember,
    ExpenditureNotFound,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::DistributionAmountMismatch {
            member_id: "alice".to_string(),
            declared: "5".to_string(),
            allocated: "7".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Distribution for alice does not match items: declared 5, allocated 7"
        );

        let err = CoreError::EmptyAllocation {
            label: "Pizza".to_string(),
        };
        assert_eq!(err.to_string(), "No allocation specified for item 'Pizza'");
    }

    #[test]
    fn test_amount_error_is_transparent() {
        let err: CoreError = AmountError::InvalidFraction { numerator: 5 }.into();
        assert_eq!(
            err.to_string(),
            "Invalid fraction 5/0: denominator must be non-zero"
        );
        assert_eq!(err.reason(), RejectionReason::InvalidFraction);

        let err: CoreError = AmountError::DivisionByZero.into();
        assert_eq!(err.reason(), RejectionReason::InvalidAmount);
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.reason(), RejectionReason::InvalidInput);
    }

    #[test]
    fn test_reason_serialization() {
        let json = serde_json::to_string(&RejectionReason::DistributionAmountMismatch).unwrap();
        assert_eq!(json, "\"DISTRIBUTION_AMOUNT_MISMATCH\"");
    }
}
