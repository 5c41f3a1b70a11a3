mod policy;
mod roles;
mod rule;

pub use policy::{BundleValidation, BundleViolation};
pub use rule::BundleRule;

use serde::{Deserialize, Serialize};

use super::domain::{PartySize, Selection};
use roles::count_roles;

/// Stateless evaluator applying a bundle rule to a selection set.
#[derive(Debug, Clone)]
pub struct BundleEvaluator {
    rule: BundleRule,
}

impl BundleEvaluator {
    pub fn new(rule: BundleRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> &BundleRule {
        &self.rule
    }

    pub fn validate(&self, selections: &[Selection], total_people: u32) -> BundleValidation {
        let counts = count_roles(&self.rule, selections);
        policy::check_counts(&self.rule, &counts, total_people)
    }

    /// Price the rule-governed selections. Callers validate first; excess companions are clamped.
    pub fn evaluate(&self, selections: &[Selection], party: &PartySize) -> BundleQuote {
        let counts = count_roles(&self.rule, selections);

        if counts.anchors > 0 {
            let cap = counts
                .anchors
                .saturating_mul(self.rule.max_dependents_per_anchor);
            let companions = counts.dependents.min(cap);
            let total = counts.anchors as f64 * self.rule.bundle_price;

            let mut lines = vec![BundleLine {
                option_key: self.rule.anchor_key.clone(),
                quantity: counts.anchors,
                unit_price: self.rule.bundle_price,
                amount: total,
            }];
            if companions > 0 {
                lines.push(BundleLine {
                    option_key: self.rule.dependent_key.clone(),
                    quantity: companions,
                    unit_price: 0.0,
                    amount: 0.0,
                });
            }

            return BundleQuote {
                mode: BundleMode::Bundle,
                total,
                annual_pass_buyers: counts.anchors,
                companions,
                covered_people: counts.anchors.saturating_add(companions),
                lines,
            };
        }

        let people = party.total();
        let lines: Vec<BundleLine> = counts
            .standard_fees
            .into_iter()
            .map(|fee| BundleLine {
                option_key: fee.option_key,
                quantity: people,
                unit_price: fee.unit_fee,
                amount: fee.unit_fee * people as f64,
            })
            .collect();
        let total = lines.iter().map(|line| line.amount).sum();

        BundleQuote {
            mode: BundleMode::Standard,
            total,
            annual_pass_buyers: 0,
            companions: 0,
            covered_people: 0,
            lines,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleMode {
    Bundle,
    Standard,
}

/// Priced line produced by the evaluator, kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleLine {
    pub option_key: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleQuote {
    pub mode: BundleMode,
    pub total: f64,
    pub annual_pass_buyers: u32,
    pub companions: u32,
    pub covered_people: u32,
    pub lines: Vec<BundleLine>,
}
