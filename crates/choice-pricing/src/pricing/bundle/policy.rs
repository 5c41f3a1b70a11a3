use serde::{Serialize, Serializer};

use super::roles::RoleCounts;
use super::rule::BundleRule;

/// Reasons a selection set cannot be priced under a bundle rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BundleViolation {
    #[error("annual pass purchases cannot be combined with per-person entrance fees")]
    MixedBundleAndStandard,
    #[error("{dependents} companion(s) selected without an annual pass buyer")]
    DependentsWithoutAnchor { dependents: u32 },
    #[error("{anchors} annual pass(es) cover at most {allowed} companion(s), found {found}")]
    TooManyDependents {
        anchors: u32,
        allowed: u32,
        found: u32,
    },
    #[error("{selected} pass holder(s) and companion(s) exceed party size of {party}")]
    ExceedsParty { selected: u32, party: u32 },
}

/// Validation result returned across the pricing boundary instead of an error.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleValidation {
    pub valid: bool,
    pub violation: Option<BundleViolation>,
}

impl BundleValidation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            violation: None,
        }
    }

    pub fn rejected(violation: BundleViolation) -> Self {
        Self {
            valid: false,
            violation: Some(violation),
        }
    }

    pub fn error(&self) -> Option<String> {
        self.violation.as_ref().map(ToString::to_string)
    }

    pub fn into_result(self) -> Result<(), BundleViolation> {
        match self.violation {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }
}

impl Serialize for BundleValidation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("BundleValidation", 2)?;
        state.serialize_field("valid", &self.valid)?;
        state.serialize_field("error", &self.error())?;
        state.end()
    }
}

pub(crate) fn check_counts(
    rule: &BundleRule,
    counts: &RoleCounts,
    total_people: u32,
) -> BundleValidation {
    if counts.anchors > 0 && !counts.standard_fees.is_empty() {
        return BundleValidation::rejected(BundleViolation::MixedBundleAndStandard);
    }

    if counts.anchors == 0 && counts.dependents > 0 {
        return BundleValidation::rejected(BundleViolation::DependentsWithoutAnchor {
            dependents: counts.dependents,
        });
    }

    let allowed = counts
        .anchors
        .saturating_mul(rule.max_dependents_per_anchor);
    if counts.dependents > allowed {
        return BundleValidation::rejected(BundleViolation::TooManyDependents {
            anchors: counts.anchors,
            allowed,
            found: counts.dependents,
        });
    }

    let selected = counts.anchors.saturating_add(counts.dependents);
    if selected > total_people {
        return BundleValidation::rejected(BundleViolation::ExceedsParty {
            selected,
            party: total_people,
        });
    }

    BundleValidation::ok()
}
