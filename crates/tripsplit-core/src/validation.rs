//! # Validation Module
//!
//! Split consistency rules for TripSplit.
//!
//! ## Validation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Expenditure Validation                             │
//! │                                                                         │
//! │  ExpenditureRequest (floats + fractions from the client)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ExactAmount::from_client_decimal(total)     ← float boundary          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  validate_distribution   Σ shares == total, zero shares dropped        │
//! │  validate_payers         non-empty, all session members                │
//! │  currency / category     reference tables                              │
//! │           │                                                             │
//! │           ▼  (only when items are present)                             │
//! │  aggregate_item_allocations   price / |allocations| per member         │
//! │  reconcile                    declared share == implied share          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ValidatedExpenditure    → handed to the transactional writer          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Membership is a predicate supplied by the caller, so this module never
//! touches a database. Every rule runs before a transaction is opened.

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::exact::ExactAmount;
use crate::reference::ReferenceData;
use crate::types::{
    DistributionEntry, ExpenditureRequest, ItemRequest, ValidatedExpenditure, ValidatedItem,
};
use crate::MAX_NAME_LENGTH;

/// Result type for field validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Member Shares
// =============================================================================

/// Per-member amounts in first-seen order.
///
/// Both the declared distribution and the item-implied distribution are held
/// in this shape, so iteration order follows the request and never depends
/// on hashing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberShares(IndexMap<String, ExactAmount>);

impl MemberShares {
    /// Creates an empty set of shares.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to a member's running share, inserting them if new.
    pub fn add(&mut self, member_id: &str, amount: &ExactAmount) {
        self.0
            .entry(member_id.to_string())
            .and_modify(|share| *share += amount)
            .or_insert_with(|| amount.clone());
    }

    /// Returns a member's share, if they have one.
    pub fn get(&self, member_id: &str) -> Option<&ExactAmount> {
        self.0.get(member_id)
    }

    /// Iterates `(member, amount)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExactAmount)> {
        self.0.iter().map(|(m, a)| (m.as_str(), a))
    }

    /// Sum of all shares.
    pub fn total(&self) -> ExactAmount {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drops members whose share is exactly zero.
    fn without_zeros(mut self) -> Self {
        self.0.retain(|_, amount| !amount.is_zero());
        self
    }
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates an expenditure name.
///
/// ## Rules
/// - Must not be blank
/// - At most `MAX_NAME_LENGTH` characters
///
/// ## Returns
/// The trimmed name.
pub fn validate_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(name.to_string())
}

/// Converts an epoch-milliseconds payment time.
pub fn validate_payed_at(millis: i64) -> ValidationResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| ValidationError::InvalidFormat {
        field: "payedAt".to_string(),
        reason: format!("{} is not a valid epoch-milliseconds timestamp", millis),
    })
}

// =============================================================================
// Distribution Validator
// =============================================================================

/// Checks that the declared distribution adds up to the total exactly.
///
/// ## Rules
/// - Any zero denominator → `EmptyDenominator`
/// - Σ fractions ≠ `total` → `TotalMismatch` (exact, on reduced fractions)
/// - Entries for the same member are added together
/// - Members whose share is zero are dropped from the result but still take
///   part in the sum
///
/// ## Example
/// ```rust
/// use tripsplit_core::exact::ExactAmount;
/// use tripsplit_core::types::{DistributionEntry, Fraction};
/// use tripsplit_core::validation::validate_distribution;
///
/// let total = ExactAmount::from_integer(30);
/// let entries = vec![
///     DistributionEntry { member_id: "a".into(), amount: Fraction { numerator: 15, denominator: 1 } },
///     DistributionEntry { member_id: "b".into(), amount: Fraction { numerator: 30, denominator: 2 } },
///     DistributionEntry { member_id: "c".into(), amount: Fraction { numerator: 0, denominator: 1 } },
/// ];
///
/// let shares = validate_distribution(&total, &entries).unwrap();
/// assert_eq!(shares.len(), 2);
/// ```
pub fn validate_distribution(
    total: &ExactAmount,
    entries: &[DistributionEntry],
) -> CoreResult<MemberShares> {
    let mut shares = MemberShares::new();

    for entry in entries {
        if entry.amount.denominator == 0 {
            return Err(CoreError::EmptyDenominator {
                member_id: entry.member_id.clone(),
            });
        }
        let amount = ExactAmount::try_from(entry.amount)?;
        shares.add(&entry.member_id, &amount);
    }

    let distributed = shares.total();
    if &distributed != total {
        return Err(CoreError::TotalMismatch {
            declared: total.to_string(),
            distributed: distributed.to_string(),
        });
    }

    Ok(shares.without_zeros())
}

/// Checks the payer set.
///
/// ## Rules
/// - At least one payer → otherwise `NoPayers`
/// - Every payer passes `is_member` → otherwise `InvalidPayer`
///
/// ## Returns
/// Payers de-duplicated, in first-seen order.
pub fn validate_payers<F>(payer_ids: &[String], is_member: F) -> CoreResult<Vec<String>>
where
    F: Fn(&str) -> bool,
{
    if payer_ids.is_empty() {
        return Err(CoreError::NoPayers);
    }

    let payers: IndexSet<&str> = payer_ids.iter().map(String::as_str).collect();
    if let Some(outsider) = payers.iter().find(|&&payer_id| !is_member(payer_id)) {
        return Err(CoreError::InvalidPayer {
            member_id: outsider.to_string(),
        });
    }

    Ok(payers.into_iter().map(str::to_string).collect())
}

/// Checks currency and category against the reference tables.
pub fn validate_reference(
    currency_code: &str,
    category: &str,
    reference: &ReferenceData,
) -> CoreResult<()> {
    if !reference.is_supported_currency(currency_code) {
        return Err(CoreError::UnsupportedCurrency(currency_code.to_string()));
    }

    if !reference.is_valid_category(category) {
        return Err(CoreError::InvalidCategory(category.to_string()));
    }

    Ok(())
}

// =============================================================================
// Item Allocation Aggregator
// =============================================================================

/// Items after allocation checks, plus the per-member shares they imply.
#[derive(Debug, Clone)]
pub struct ItemAllocation {
    pub items: Vec<ValidatedItem>,
    pub implied: MemberShares,
}

/// Splits every item evenly across its allocated members.
///
/// ## How It Works
/// ```text
/// Pizza 10.00 → [alice, bob]        alice += 10/2, bob += 10/2
/// Wine   7.00 → [alice, bob, carol] alice += 7/3,  bob += 7/3, carol += 7/3
///                                   ─────────────────────────────────────
/// implied:                          alice 22/3, bob 22/3, carol 7/3
/// ```
/// Nothing is rounded: `7/3` stays `7/3`.
///
/// ## Rules
/// - An item with no allocated members → `EmptyAllocation`
/// - An allocated member failing `is_member` → `InvalidAllocatedMember`
/// - A member listed twice on one item counts once
pub fn aggregate_item_allocations<F>(items: &[ItemRequest], is_member: F) -> CoreResult<ItemAllocation>
where
    F: Fn(&str) -> bool,
{
    let mut validated = Vec::with_capacity(items.len());
    let mut implied = MemberShares::new();

    for item in items {
        let price = ExactAmount::from_client_decimal(item.price)?;

        let allocations: IndexSet<&str> = item.allocations.iter().map(String::as_str).collect();

        if allocations.is_empty() {
            return Err(CoreError::EmptyAllocation {
                label: item.label.clone(),
            });
        }

        let share = price.divide_by_integer(allocations.len() as i64)?;

        for &member_id in &allocations {
            if !is_member(member_id) {
                return Err(CoreError::InvalidAllocatedMember {
                    member_id: member_id.to_string(),
                });
            }
            implied.add(member_id, &share);
        }

        validated.push(ValidatedItem {
            label: item.label.clone(),
            price: item.price,
            allocations: allocations.into_iter().map(str::to_string).collect(),
        });
    }

    Ok(ItemAllocation {
        items: validated,
        implied,
    })
}

// =============================================================================
// Consistency Reconciler
// =============================================================================

/// Cross-checks declared shares against item-implied shares.
///
/// ## Rules
/// For every member with a non-zero declared share:
/// - no implied share → `DistributionItemMismatch`
/// - implied ≠ declared → `DistributionAmountMismatch`
///
/// The check is one-directional: a member who appears only in the items is
/// accepted.
pub fn reconcile(declared: &MemberShares, implied: &MemberShares) -> CoreResult<()> {
    for (member_id, amount) in declared.iter() {
        let allocated = implied
            .get(member_id)
            .ok_or_else(|| CoreError::DistributionItemMismatch {
                member_id: member_id.to_string(),
            })?;

        if allocated != amount {
            return Err(CoreError::DistributionAmountMismatch {
                member_id: member_id.to_string(),
                declared: amount.to_string(),
                allocated: allocated.to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Full Pipeline
// =============================================================================

/// Runs every rule over a request, in order, stopping at the first failure.
///
/// ## Order
/// name → total/distribution → payers → currency/category → payedAt →
/// items → reconciliation → storable fractions
///
/// `is_member` is called once per distinct payer and once per distinct
/// allocated member of each item.
pub fn validate_expenditure<F>(
    request: &ExpenditureRequest,
    reference: &ReferenceData,
    is_member: F,
) -> CoreResult<ValidatedExpenditure>
where
    F: Fn(&str) -> bool,
{
    let name = validate_name(&request.name)?;

    let total = ExactAmount::from_client_decimal(request.total_price)?;
    let declared = validate_distribution(&total, &request.distribution)?;

    let payer_ids = validate_payers(&request.payers_id, &is_member)?;

    validate_reference(&request.currency_code, &request.category, reference)?;

    let payed_at = validate_payed_at(request.payed_at)?;

    let items = if request.items.is_empty() {
        Vec::new()
    } else {
        let allocation = aggregate_item_allocations(&request.items, &is_member)?;
        reconcile(&declared, &allocation.implied)?;
        allocation.items
    };

    let distribution = declared
        .iter()
        .map(|(member_id, amount)| {
            Ok(DistributionEntry {
                member_id: member_id.to_string(),
                amount: amount.to_fraction()?,
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;

    Ok(ValidatedExpenditure {
        expenditure_id: request.expenditure_id.clone(),
        session_id: request.session_id.clone(),
        name,
        total_price: request.total_price,
        currency_code: request.currency_code.clone(),
        category: request.category.clone(),
        payed_at,
        payer_ids,
        distribution,
        items,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AmountError, RejectionReason};
    use crate::types::Fraction;

    fn entry(member_id: &str, numerator: i64, denominator: i64) -> DistributionEntry {
        DistributionEntry {
            member_id: member_id.to_string(),
            amount: Fraction {
                numerator,
                denominator,
            },
        }
    }

    fn item(label: &str, price: f64, allocations: &[&str]) -> ItemRequest {
        ItemRequest {
            label: label.to_string(),
            price,
            allocations: allocations.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn members(ids: &'static [&'static str]) -> impl Fn(&str) -> bool {
        move |id: &str| ids.iter().any(|m| *m == id)
    }

    fn request(total_price: f64, distribution: Vec<DistributionEntry>, items: Vec<ItemRequest>) -> ExpenditureRequest {
        ExpenditureRequest {
            session_id: "trip".to_string(),
            expenditure_id: None,
            name: "Dinner".to_string(),
            total_price,
            currency_code: "EUR".to_string(),
            category: "food".to_string(),
            payed_at: 1_767_225_600_000,
            payers_id: vec!["A".to_string()],
            distribution,
            items,
        }
    }

    fn frac(n: i64, d: i64) -> ExactAmount {
        ExactAmount::from_fraction(n, d).unwrap()
    }

    // -------------------------------------------------------------------------
    // Field validators
    // -------------------------------------------------------------------------

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Dinner ").unwrap(), "Dinner");
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"A".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_payed_at() {
        let at = validate_payed_at(1_767_225_600_000).unwrap();
        assert_eq!(at.timestamp_millis(), 1_767_225_600_000);
        assert!(validate_payed_at(i64::MAX).is_err());
    }

    // -------------------------------------------------------------------------
    // Distribution
    // -------------------------------------------------------------------------

    #[test]
    fn test_even_halves_of_thirty() {
        let total = ExactAmount::from_client_decimal(30.00).unwrap();
        let shares = validate_distribution(&total, &[entry("A", 15, 1), entry("B", 15, 1)]).unwrap();

        assert_eq!(shares.get("A"), Some(&ExactAmount::from_integer(15)));
        assert_eq!(shares.get("B"), Some(&ExactAmount::from_integer(15)));
        assert_eq!(shares.total(), total);
    }

    #[test]
    fn test_unreduced_fractions_are_reduced() {
        let total = ExactAmount::from_integer(30);
        let shares = validate_distribution(&total, &[entry("A", 30, 2), entry("B", 45, 3)]).unwrap();
        let a = shares.get("A").unwrap().to_fraction().unwrap();
        assert_eq!(a, Fraction { numerator: 15, denominator: 1 });
    }

    #[test]
    fn test_zero_denominator_rejected() {
        let total = ExactAmount::from_integer(5);
        let err = validate_distribution(&total, &[entry("C", 5, 0)]).unwrap_err();
        assert_eq!(
            err,
            CoreError::EmptyDenominator {
                member_id: "C".to_string()
            }
        );
        assert_eq!(err.reason(), RejectionReason::EmptyDenominator);
    }

    #[test]
    fn test_total_mismatch() {
        let total = ExactAmount::from_client_decimal(30.00).unwrap();
        let err = validate_distribution(&total, &[entry("A", 1500, 100), entry("B", 1499, 100)])
            .unwrap_err();

        match err {
            CoreError::TotalMismatch {
                declared,
                distributed,
            } => {
                assert_eq!(declared, "30");
                assert_eq!(distributed, "2999/100");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zero_share_counted_but_dropped() {
        let total = ExactAmount::from_integer(10);
        let shares = validate_distribution(&total, &[entry("A", 10, 1), entry("B", 0, 1)]).unwrap();

        assert_eq!(shares.len(), 1);
        assert!(shares.get("B").is_none());
    }

    #[test]
    fn test_repeated_member_is_merged() {
        let total = ExactAmount::from_integer(10);
        let shares =
            validate_distribution(&total, &[entry("A", 3, 1), entry("B", 5, 1), entry("A", 2, 1)])
                .unwrap();

        let order: Vec<&str> = shares.iter().map(|(m, _)| m).collect();
        assert_eq!(order, vec!["A", "B"]);
        assert_eq!(shares.get("A"), Some(&ExactAmount::from_integer(5)));
    }

    #[test]
    fn test_merged_to_zero_is_dropped() {
        let total = ExactAmount::from_integer(10);
        let shares =
            validate_distribution(&total, &[entry("A", 10, 1), entry("B", 3, 1), entry("B", -3, 1)])
                .unwrap();
        assert!(shares.get("B").is_none());
    }

    // -------------------------------------------------------------------------
    // Payers
    // -------------------------------------------------------------------------

    #[test]
    fn test_payers() {
        let is_member = members(&["A", "B"]);
        assert_eq!(validate_payers(&[], &is_member).unwrap_err(), CoreError::NoPayers);

        let payers = validate_payers(&["B".into(), "A".into(), "B".into()], &is_member).unwrap();
        assert_eq!(payers, vec!["B".to_string(), "A".to_string()]);

        let err = validate_payers(&["A".into(), "Z".into()], &is_member).unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidPayer {
                member_id: "Z".to_string()
            }
        );
    }

    // -------------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------------

    #[test]
    fn test_item_split_evenly() {
        let allocation = aggregate_item_allocations(
            &[item("Pizza", 10.0, &["A", "B"]), item("Wine", 7.0, &["A", "B", "C"])],
            members(&["A", "B", "C"]),
        )
        .unwrap();

        assert_eq!(allocation.implied.get("A"), Some(&frac(22, 3)));
        assert_eq!(allocation.implied.get("C"), Some(&frac(7, 3)));
        assert_eq!(allocation.implied.total(), ExactAmount::from_integer(17));
        assert_eq!(allocation.items.len(), 2);
    }

    #[test]
    fn test_item_empty_allocation() {
        let err =
            aggregate_item_allocations(&[item("Pizza", 10.0, &[])], members(&["A"])).unwrap_err();
        assert_eq!(
            err,
            CoreError::EmptyAllocation {
                label: "Pizza".to_string()
            }
        );
    }

    #[test]
    fn test_item_outsider() {
        let err = aggregate_item_allocations(&[item("Pizza", 10.0, &["A", "Z"])], members(&["A"]))
            .unwrap_err();
        assert_eq!(err.reason(), RejectionReason::InvalidAllocatedMember);
    }

    #[test]
    fn test_item_duplicate_allocation_counts_once() {
        let allocation =
            aggregate_item_allocations(&[item("Pizza", 10.0, &["A", "A", "B"])], members(&["A", "B"]))
                .unwrap();
        assert_eq!(allocation.implied.get("A"), Some(&ExactAmount::from_integer(5)));
        assert_eq!(allocation.items[0].allocations, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_item_price_not_finite() {
        let err = aggregate_item_allocations(&[item("Pizza", f64::NAN, &["A"])], members(&["A"]))
            .unwrap_err();
        assert!(matches!(err, CoreError::Amount(AmountError::NotFinite(_))));
    }

    // -------------------------------------------------------------------------
    // Reconciliation
    // -------------------------------------------------------------------------

    #[test]
    fn test_reconcile_matching() {
        let mut declared = MemberShares::new();
        declared.add("A", &ExactAmount::from_integer(5));
        let mut implied = MemberShares::new();
        implied.add("A", &frac(10, 2));
        assert!(reconcile(&declared, &implied).is_ok());
    }

    #[test]
    fn test_reconcile_missing_member() {
        let mut declared = MemberShares::new();
        declared.add("A", &ExactAmount::from_integer(5));
        let err = reconcile(&declared, &MemberShares::new()).unwrap_err();
        assert_eq!(err.reason(), RejectionReason::DistributionItemMismatch);
    }

    #[test]
    fn test_reconcile_is_one_directional() {
        let mut declared = MemberShares::new();
        declared.add("A", &ExactAmount::from_integer(5));
        let mut implied = MemberShares::new();
        implied.add("A", &ExactAmount::from_integer(5));
        implied.add("B", &ExactAmount::from_integer(3));
        assert!(reconcile(&declared, &implied).is_ok());
    }

    // -------------------------------------------------------------------------
    // Full pipeline
    // -------------------------------------------------------------------------

    #[test]
    fn test_pipeline_shares_are_amounts_not_proportions() {
        let validated = validate_expenditure(
            &request(30.0, vec![entry("A", 1, 2), entry("B", 1, 2)], vec![]),
            &ReferenceData::default(),
            members(&["A", "B"]),
        );
        // 1/2 + 1/2 = 1, which is not 30
        assert_eq!(validated.unwrap_err().reason(), RejectionReason::TotalMismatch);

        let validated = validate_expenditure(
            &request(30.0, vec![entry("A", 30, 2), entry("B", 45, 3)], vec![]),
            &ReferenceData::default(),
            members(&["A", "B"]),
        )
        .unwrap();
        assert_eq!(
            validated.distribution,
            vec![entry("A", 15, 1), entry("B", 15, 1)]
        );

        let validated = validate_expenditure(
            &request(1.0, vec![entry("A", 1, 2), entry("B", 1, 2)], vec![]),
            &ReferenceData::default(),
            members(&["A", "B"]),
        )
        .unwrap();
        assert_eq!(
            validated.distribution,
            vec![entry("A", 1, 2), entry("B", 1, 2)]
        );
    }

    #[test]
    fn test_pipeline_items_match() {
        let validated = validate_expenditure(
            &request(
                10.0,
                vec![entry("A", 5, 1), entry("B", 5, 1)],
                vec![item("Pasta", 10.0, &["A", "B"])],
            ),
            &ReferenceData::default(),
            members(&["A", "B"]),
        )
        .unwrap();

        assert_eq!(validated.items.len(), 1);
        assert_eq!(validated.payer_ids, vec!["A".to_string()]);
    }

    #[test]
    fn test_pipeline_items_mismatch() {
        let err = validate_expenditure(
            &request(
                10.0,
                vec![entry("A", 5, 1), entry("B", 5, 1)],
                vec![item("Steak", 7.0, &["A"]), item("Salad", 3.0, &["B"])],
            ),
            &ReferenceData::default(),
            members(&["A", "B"]),
        )
        .unwrap_err();

        assert_eq!(
            err,
            CoreError::DistributionAmountMismatch {
                member_id: "A".to_string(),
                declared: "5".to_string(),
                allocated: "7".to_string(),
            }
        );
    }

    #[test]
    fn test_pipeline_reference_checks() {
        let mut bad_currency = request(10.0, vec![entry("A", 10, 1)], vec![]);
        bad_currency.currency_code = "XYZ".to_string();
        let err = validate_expenditure(&bad_currency, &ReferenceData::default(), members(&["A"]))
            .unwrap_err();
        assert_eq!(err.reason(), RejectionReason::UnsupportedCurrency);

        let mut bad_category = request(10.0, vec![entry("A", 10, 1)], vec![]);
        bad_category.category = "bribes".to_string();
        let err = validate_expenditure(&bad_category, &ReferenceData::default(), members(&["A"]))
            .unwrap_err();
        assert_eq!(err.reason(), RejectionReason::InvalidCategory);
    }

    #[test]
    fn test_pipeline_non_terminating_shares() {
        // 10.00 split three ways through items and declared as thirds
        let validated = validate_expenditure(
            &request(
                10.0,
                vec![entry("A", 10, 3), entry("B", 10, 3), entry("C", 10, 3)],
                vec![item("Taxi", 10.0, &["A", "B", "C"])],
            ),
            &ReferenceData::default(),
            members(&["A", "B", "C"]),
        )
        .unwrap();

        let stored: ExactAmount = validated
            .distribution
            .iter()
            .map(|d| ExactAmount::try_from(d.amount).unwrap())
            .collect::<Vec<_>>()
            .iter()
            .sum();
        assert_eq!(stored, ExactAmount::from_integer(10));
    }
}

// =============================================================================
// Property Tests
// =============================================================================
