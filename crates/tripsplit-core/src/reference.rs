//! # Reference Data
//!
//! Static lookup tables for currency codes and expenditure categories.
//!
//! The built-in tables are the defaults; deployments can replace either list
//! through configuration (see `tripsplit-service`'s `ServiceConfig`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Active ISO 4217 currency codes.
pub const ISO_4217_CURRENCIES: &[&str] = &[
    "AED", "AFN", "ALL", "AMD", "ANG", "AOA", "ARS", "AUD", "AWG", "AZN", "BAM", "BBD", "BDT",
    "BGN", "BHD", "BIF", "BMD", "BND", "BOB", "BRL", "BSD", "BTN", "BWP", "BYN", "BZD", "CAD",
    "CDF", "CHF", "CLP", "CNY", "COP", "CRC", "CUP", "CVE", "CZK", "DJF", "DKK", "DOP", "DZD",
    "EGP", "ERN", "ETB", "EUR", "FJD", "FKP", "GBP", "GEL", "GHS", "GIP", "GMD", "GNF", "GTQ",
    "GYD", "HKD", "HNL", "HTG", "HUF", "IDR", "ILS", "INR", "IQD", "IRR", "ISK", "JMD", "JOD",
    "JPY", "KES", "KGS", "KHR", "KMF", "KPW", "KRW", "KWD", "KYD", "KZT", "LAK", "LBP", "LKR",
    "LRD", "LSL", "LYD", "MAD", "MDL", "MGA", "MKD", "MMK", "MNT", "MOP", "MRU", "MUR", "MVR",
    "MWK", "MXN", "MYR", "MZN", "NAD", "NGN", "NIO", "NOK", "NPR", "NZD", "OMR", "PAB", "PEN",
    "PGK", "PHP", "PKR", "PLN", "PYG", "QAR", "RON", "RSD", "RUB", "RWF", "SAR", "SBD", "SCR",
    "SDG", "SEK", "SGD", "SHP", "SLE", "SOS", "SRD", "SSP", "STN", "SYP", "SZL", "THB", "TJS",
    "TMT", "TND", "TOP", "TRY", "TTD", "TWD", "TZS", "UAH", "UGX", "USD", "UYU", "UZS", "VES",
    "VND", "VUV", "WST", "XAF", "XCD", "XOF", "XPF", "YER", "ZAR", "ZMW", "ZWL",
];

/// Expenditure categories offered to clients, in display order.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "food",
    "accommodation",
    "transportation",
    "sightseeing",
    "activity",
    "shopping",
    "health",
    "other",
];

/// Currency and category tables used by validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceData {
    currencies: BTreeSet<String>,
    categories: Vec<String>,
}

impl ReferenceData {
    /// Builds tables from explicit lists.
    pub fn new(
        currencies: impl IntoIterator<Item = String>,
        categories: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut seen = BTreeSet::new();
        let categories = categories
            .into_iter()
            .filter(|c| seen.insert(c.clone()))
            .collect();

        ReferenceData {
            currencies: currencies
                .into_iter()
                .map(|c| c.to_ascii_uppercase())
                .collect(),
            categories,
        }
    }

    /// Checks a currency code. Codes are compared case-sensitively in their
    /// canonical upper-case form; `"eur"` is not accepted.
    pub fn is_supported_currency(&self, code: &str) -> bool {
        self.currencies.contains(code)
    }

    /// Checks a category tag.
    pub fn is_valid_category(&self, tag: &str) -> bool {
        self.categories.iter().any(|c| c == tag)
    }

    /// Categories in display order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Number of supported currencies.
    pub fn currency_count(&self) -> usize {
        self.currencies.len()
    }
}

impl Default for ReferenceData {
    fn default() -> Self {
        ReferenceData::new(
            ISO_4217_CURRENCIES.iter().map(|c| c.to_string()),
            DEFAULT_CATEGORIES.iter().map(|c| c.to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables() {
        let reference = ReferenceData::default();
        assert!(reference.is_supported_currency("EUR"));
        assert!(reference.is_supported_currency("KRW"));
        assert!(!reference.is_supported_currency("eur"));
        assert!(!reference.is_supported_currency("XYZ"));

        assert!(reference.is_valid_category("food"));
        assert!(!reference.is_valid_category("Food"));
        assert_eq!(reference.categories()[0], "food");
    }

    #[test]
    fn test_custom_tables_dedupe_categories() {
        let reference = ReferenceData::new(
            vec!["usd".to_string()],
            vec!["food".to_string(), "food".to_string(), "fuel".to_string()],
        );
        assert!(reference.is_supported_currency("USD"));
        assert_eq!(reference.currency_count(), 1);
        assert_eq!(reference.categories(), &["food".to_string(), "fuel".to_string()]);
    }
}
