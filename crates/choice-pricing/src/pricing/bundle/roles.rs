use std::collections::BTreeMap;

use super::super::domain::Selection;
use super::rule::BundleRule;

/// Role a selection plays under a bundle rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum BundleRole {
    Anchor,
    Dependent,
    StandardFee(f64),
}

pub(crate) fn role_of(rule: &BundleRule, selection: &Selection) -> Option<BundleRole> {
    let key = selection.option_key.as_deref()?;
    if key == rule.anchor_key {
        Some(BundleRole::Anchor)
    } else if key == rule.dependent_key {
        Some(BundleRole::Dependent)
    } else {
        rule.standard_fee(key).map(BundleRole::StandardFee)
    }
}

/// Counts derived from a selection set, with anchors and dependents deduplicated by option id.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RoleCounts {
    pub anchors: u32,
    pub dependents: u32,
    pub standard_fees: Vec<StandardFeeLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StandardFeeLine {
    pub option_key: String,
    pub unit_fee: f64,
}

pub(crate) fn count_roles(rule: &BundleRule, selections: &[Selection]) -> RoleCounts {
    // The same pass purchase is repeated once per canyon group in multi-group payloads.
    let mut anchors: BTreeMap<&str, u32> = BTreeMap::new();
    let mut dependents: BTreeMap<&str, u32> = BTreeMap::new();
    let mut standard_fees = Vec::new();

    for selection in selections {
        match role_of(rule, selection) {
            Some(BundleRole::Anchor) => {
                let seen = anchors.entry(selection.option_id.as_str()).or_default();
                *seen = (*seen).max(selection.quantity);
            }
            Some(BundleRole::Dependent) => {
                let seen = dependents.entry(selection.option_id.as_str()).or_default();
                *seen = (*seen).max(selection.quantity);
            }
            Some(BundleRole::StandardFee(unit_fee)) => standard_fees.push(StandardFeeLine {
                option_key: selection.identity().to_string(),
                unit_fee,
            }),
            None => {}
        }
    }

    RoleCounts {
        anchors: saturating_sum(anchors.values()),
        dependents: saturating_sum(dependents.values()),
        standard_fees,
    }
}

fn saturating_sum<'a>(quantities: impl Iterator<Item = &'a u32>) -> u32 {
    quantities.fold(0, |total, quantity| total.saturating_add(*quantity))
}
