//! # Domain Types
//!
//! Core domain types used throughout TripSplit.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐                                                  │
//! │  │   Expenditure    │  owns ──┬──► Payer         (who paid)            │
//! │  │  ──────────────  │         ├──► Distribution  (who owes, num/den)   │
//! │  │  expenditure_id  │         └──► ExpenditureItem                     │
//! │  │  session_id (FK) │                   │                              │
//! │  │  total_price     │                   └──► Allocation (who shares)   │
//! │  └──────────────────┘                                                  │
//! │                                                                         │
//! │  Wire in:   ExpenditureRequest ─► validation ─► ValidatedExpenditure   │
//! │  Wire out:  ExpenditureRecord (full detail)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Children refer to their parent by identifier only. They are deleted and
//! recreated together with the expenditure on every edit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Fraction
// =============================================================================

/// A numerator/denominator pair as it travels on the wire and in storage.
///
/// Arithmetic happens on [`crate::exact::ExactAmount`]; this is only the
/// transport shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Fraction {
    pub numerator: i64,
    pub denominator: i64,
}

// =============================================================================
// Requests
// =============================================================================

/// Create or replace an expenditure.
///
/// ## Wire Shape
/// ```json
/// {
///   "sessionId": "trip-1",
///   "expenditureId": null,
///   "name": "Dinner",
///   "totalPrice": 30.0,
///   "currencyCode": "EUR",
///   "category": "food",
///   "payedAt": 1767225600000,
///   "payersId": ["alice"],
///   "distribution": [{ "memberId": "alice", "amount": { "numerator": 15, "denominator": 1 } }],
///   "items": [{ "label": "Pasta", "price": 30.0, "allocations": ["alice", "bob"] }]
/// }
/// ```
/// A present `expenditureId` means "replace this one".
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExpenditureRequest {
    pub session_id: String,

    #[serde(default)]
    #[ts(optional)]
    pub expenditure_id: Option<String>,

    pub name: String,

    /// Decimal total as typed by the user.
    pub total_price: f64,

    pub currency_code: String,

    pub category: String,

    /// Payment time, epoch milliseconds.
    pub payed_at: i64,

    pub payers_id: Vec<String>,

    #[serde(default)]
    pub distribution: Vec<DistributionEntry>,

    #[serde(default)]
    pub items: Vec<ItemRequest>,
}

/// One member's declared share of the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DistributionEntry {
    pub member_id: String,
    pub amount: Fraction,
}

/// One line of an itemized expenditure.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ItemRequest {
    pub label: String,

    /// Decimal price as typed by the user.
    pub price: f64,

    /// Members sharing this item evenly.
    #[serde(default)]
    pub allocations: Vec<String>,
}

// =============================================================================
// Validated Expenditure
// =============================================================================

/// An expenditure that passed every consistency check.
///
/// Only produced by [`crate::validation::validate_expenditure`]. The
/// distribution holds reduced, non-zero fractions in request order; payers
/// and allocations are de-duplicated.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedExpenditure {
    /// `Some` when this replaces an existing expenditure.
    pub expenditure_id: Option<String>,
    pub session_id: String,
    pub name: String,
    pub total_price: f64,
    pub currency_code: String,
    pub category: String,
    pub payed_at: DateTime<Utc>,
    pub payer_ids: Vec<String>,
    pub distribution: Vec<DistributionEntry>,
    pub items: Vec<ValidatedItem>,
}

/// An item with a non-empty, de-duplicated allocation set.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedItem {
    pub label: String,
    pub price: f64,
    pub allocations: Vec<String>,
}

// =============================================================================
// Stored Entities
// =============================================================================

/// A travel session (trip) that expenditures belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// The expenditure row itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Expenditure {
    pub expenditure_id: String,
    pub session_id: String,
    pub name: String,
    pub total_price: f64,
    pub currency_code: String,
    pub category: String,

    /// Serialized as epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub payed_at: DateTime<Utc>,
}

/// A member who physically paid.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payer {
    pub expenditure_id: String,
    pub member_id: String,
}

/// A member's owed share, stored as a reduced fraction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Distribution {
    pub expenditure_id: String,
    pub member_id: String,
    pub numerator: i64,
    pub denominator: i64,
}

impl Distribution {
    /// Returns the share in wire form.
    pub fn amount(&self) -> Fraction {
        Fraction {
            numerator: self.numerator,
            denominator: self.denominator,
        }
    }
}

/// One itemized line.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ExpenditureItem {
    pub item_id: String,
    pub expenditure_id: String,
    pub label: String,
    pub price: f64,

    /// Zero-based order within the expenditure.
    pub position: i64,
}

/// A member sharing an item.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Allocation {
    pub item_id: String,
    pub member_id: String,
}

// =============================================================================
// Full Record
// =============================================================================

/// An expenditure with all of its children, as returned to clients and
/// handed to the change notifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExpenditureRecord {
    pub expenditure_id: String,
    pub session_id: String,
    pub name: String,
    pub total_price: f64,
    pub currency_code: String,
    pub category: String,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub payed_at: DateTime<Utc>,

    pub payers_id: Vec<String>,
    pub distribution: Vec<DistributionEntry>,
    pub items: Vec<ItemRecord>,
}

impl ExpenditureRecord {
    /// Assembles a record from its parent row and children.
    pub fn from_parts(
        expenditure: Expenditure,
        payers_id: Vec<String>,
        distribution: Vec<DistributionEntry>,
        items: Vec<ItemRecord>,
    ) -> Self {
        ExpenditureRecord {
            expenditure_id: expenditure.expenditure_id,
            session_id: expenditure.session_id,
            name: expenditure.name,
            total_price: expenditure.total_price,
            currency_code: expenditure.currency_code,
            category: expenditure.category,
            payed_at: expenditure.payed_at,
            payers_id,
            distribution,
            items,
        }
    }

    /// Returns just the parent row.
    pub fn summary(&self) -> Expenditure {
        Expenditure {
            expenditure_id: self.expenditure_id.clone(),
            session_id: self.session_id.clone(),
            name: self.name.clone(),
            total_price: self.total_price,
            currency_code: self.currency_code.clone(),
            category: self.category.clone(),
            payed_at: self.payed_at,
        }
    }
}

/// An item with its allocated members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ItemRecord {
    pub item_id: String,
    pub label: String,
    pub price: f64,
    pub allocations: Vec<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_wire_json() {
        let json = r#"{
            "sessionId": "trip-1",
            "name": "Dinner",
            "totalPrice": 30.0,
            "currencyCode": "EUR",
            "category": "food",
            "payedAt": 1767225600000,
            "payersId": ["alice"],
            "distribution": [
                { "memberId": "alice", "amount": { "numerator": 1, "denominator": 2 } }
            ]
        }"#;

        let request: ExpenditureRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.session_id, "trip-1");
        assert!(request.expenditure_id.is_none());
        assert_eq!(request.distribution[0].amount.denominator, 2);
        assert!(request.items.is_empty());
    }

    #[test]
    fn test_request_requires_total_price() {
        let json = r#"{
            "sessionId": "trip-1",
            "name": "Dinner",
            "currencyCode": "EUR",
            "category": "food",
            "payedAt": 0,
            "payersId": []
        }"#;

        assert!(serde_json::from_str::<ExpenditureRequest>(json).is_err());
    }

    #[test]
    fn test_record_serializes_millis() {
        let record = ExpenditureRecord {
            expenditure_id: "e1".to_string(),
            session_id: "s1".to_string(),
            name: "Taxi".to_string(),
            total_price: 12.5,
            currency_code: "JPY".to_string(),
            category: "transportation".to_string(),
            payed_at: DateTime::from_timestamp_millis(1_000).unwrap(),
            payers_id: vec!["alice".to_string()],
            distribution: vec![],
            items: vec![],
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["payedAt"], 1_000);
        assert_eq!(value["payersId"][0], "alice");
        assert_eq!(record.summary().total_price, 12.5);
    }
}
