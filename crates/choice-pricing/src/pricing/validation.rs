use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::domain::{ProductSchema, Selection, SelectionArity};

/// Reasons a selection set does not fit the product's choice schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("choice group '{group_id}' is not part of this product")]
    UnknownGroup { group_id: String },
    #[error("option '{option}' does not exist in choice group '{group_id}'")]
    UnknownOption { group_id: String, option: String },
    #[error("option '{option_key}' in choice group '{group_id}' is no longer offered")]
    RetiredOption { group_id: String, option_key: String },
    #[error("option '{option_key}' was selected more than once in choice group '{group_id}'")]
    DuplicateOption { group_id: String, option_key: String },
    #[error("option '{option_key}' must have a quantity of at least one")]
    ZeroQuantity { option_key: String },
    #[error("choice group '{group_id}' accepts at most {max} option(s), found {found}")]
    TooManySelections {
        group_id: String,
        max: u32,
        found: u32,
    },
    #[error("choice group '{group_id}' requires at least {min} option(s), found {found}")]
    TooFewSelections {
        group_id: String,
        min: u32,
        found: u32,
    },
}

/// Typed validation outcome for callers that prompt for correction instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionValidation {
    pub valid: bool,
    pub error: Option<String>,
}

impl SelectionValidation {
    pub fn accepted() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn rejected(reason: impl ToString) -> Self {
        Self {
            valid: false,
            error: Some(reason.to_string()),
        }
    }
}

/// Resolve selections against the schema, filling in stable option keys.
///
/// Options are matched by id first and by option key second, so reservations made before the
/// option table was regenerated still resolve.
pub fn normalize_selections(
    schema: &ProductSchema,
    selections: &[Selection],
) -> Result<Vec<Selection>, SelectionError> {
    let mut normalized = Vec::with_capacity(selections.len());
    let mut per_group: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for selection in selections {
        let group = schema
            .group(&selection.group_id)
            .ok_or_else(|| SelectionError::UnknownGroup {
                group_id: selection.group_id.clone(),
            })?;

        let option = group
            .find_option(&selection.option_id, selection.option_key.as_deref())
            .ok_or_else(|| SelectionError::UnknownOption {
                group_id: group.group_id.clone(),
                option: selection.identity().to_string(),
            })?;

        if !option.active || !group.active {
            return Err(SelectionError::RetiredOption {
                group_id: group.group_id.clone(),
                option_key: option.option_key.clone(),
            });
        }

        if selection.quantity == 0 {
            return Err(SelectionError::ZeroQuantity {
                option_key: option.option_key.clone(),
            });
        }

        let chosen = per_group.entry(group.group_id.as_str()).or_default();
        if !chosen.insert(option.option_key.as_str()) {
            return Err(SelectionError::DuplicateOption {
                group_id: group.group_id.clone(),
                option_key: option.option_key.clone(),
            });
        }

        let mut resolved = selection.clone();
        resolved.option_key = Some(option.option_key.clone());
        normalized.push(resolved);
    }

    for group in schema.groups.iter().filter(|group| group.active) {
        let found = per_group
            .get(group.group_id.as_str())
            .map(|chosen| chosen.len() as u32)
            .unwrap_or(0);

        let max = match group.arity {
            SelectionArity::Single => Some(group.max_select.map_or(1, |max| max.min(1))),
            SelectionArity::Multiple | SelectionArity::Quantity => group.max_select,
        };
        if let Some(max) = max {
            if found > max {
                return Err(SelectionError::TooManySelections {
                    group_id: group.group_id.clone(),
                    max,
                    found,
                });
            }
        }

        let min = if group.required {
            group.min_select.max(1)
        } else if found > 0 {
            group.min_select
        } else {
            0
        };
        if found < min {
            return Err(SelectionError::TooFewSelections {
                group_id: group.group_id.clone(),
                min,
                found,
            });
        }
    }

    Ok(normalized)
}
