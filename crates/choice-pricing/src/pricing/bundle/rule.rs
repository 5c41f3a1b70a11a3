use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Non-linear group pricing policy for a product category (e.g. annual passes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleRule {
    pub anchor_key: String,
    pub dependent_key: String,
    pub bundle_price: f64,
    pub max_dependents_per_anchor: u32,
    /// Per-person fees that are mutually exclusive with the bundle, by option key.
    pub standard_fees: BTreeMap<String, f64>,
}

impl BundleRule {
    /// National-park style annual pass: $250 per pass covering the buyer and three companions.
    pub fn annual_pass() -> Self {
        let mut standard_fees = BTreeMap::new();
        standard_fees.insert("us_resident".to_string(), 8.0);
        standard_fees.insert("non_resident".to_string(), 100.0);

        Self {
            anchor_key: "annual_pass_buyer".to_string(),
            dependent_key: "annual_pass_companion".to_string(),
            bundle_price: 250.0,
            max_dependents_per_anchor: 3,
            standard_fees,
        }
    }

    pub fn standard_fee(&self, option_key: &str) -> Option<f64> {
        self.standard_fees.get(option_key).copied()
    }

    /// Whether an option key is priced by this rule rather than by the matrix.
    pub fn governs(&self, option_key: &str) -> bool {
        option_key == self.anchor_key
            || option_key == self.dependent_key
            || self.standard_fees.contains_key(option_key)
    }
}
