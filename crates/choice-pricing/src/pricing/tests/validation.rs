use super::common::*;
use crate::pricing::domain::Selection;
use crate::pricing::validation::{normalize_selections, SelectionError};

#[test]
fn normalization_fills_option_keys() {
    let selections = vec![
        Selection::new("canyon", "opt-lower", None),
        Selection::new("transport", "opt-van", None),
    ];

    let normalized = normalize_selections(&canyon_schema(), &selections).expect("valid");
    assert_eq!(normalized[0].option_key.as_deref(), Some("lower_antelope"));
    assert_eq!(normalized[1].option_key.as_deref(), Some("van"));
}

#[test]
fn regenerated_option_ids_resolve_by_key() {
    let selections = vec![Selection::new("canyon", "opt-lower-v1", Some("lower_antelope"))];

    let normalized = normalize_selections(&canyon_schema(), &selections).expect("valid");
    assert_eq!(normalized[0].option_id, "opt-lower-v1");
    assert_eq!(normalized[0].identity(), "lower_antelope");
}

#[test]
fn unknown_group_is_rejected() {
    let selections = vec![sel("lodging", "opt-hotel", "hotel")];

    match normalize_selections(&canyon_schema(), &selections) {
        Err(SelectionError::UnknownGroup { group_id }) => assert_eq!(group_id, "lodging"),
        other => panic!("expected unknown group, got {other:?}"),
    }
}

#[test]
fn unknown_option_is_rejected() {
    let selections = vec![Selection::new("canyon", "opt-secret", Some("secret_canyon"))];

    match normalize_selections(&canyon_schema(), &selections) {
        Err(SelectionError::UnknownOption { group_id, option }) => {
            assert_eq!(group_id, "canyon");
            assert_eq!(option, "secret_canyon");
        }
        other => panic!("expected unknown option, got {other:?}"),
    }
}

#[test]
fn retired_option_is_rejected() {
    let mut schema = canyon_schema();
    schema.groups[0].options[1].active = false;

    match normalize_selections(&schema, &[sel("canyon", "opt-upper", "upper_antelope")]) {
        Err(SelectionError::RetiredOption { option_key, .. }) => {
            assert_eq!(option_key, "upper_antelope")
        }
        other => panic!("expected retired option, got {other:?}"),
    }
}

#[test]
fn single_groups_accept_one_option() {
    let selections = vec![
        sel("canyon", "opt-lower", "lower_antelope"),
        sel("canyon", "opt-upper", "upper_antelope"),
    ];

    match normalize_selections(&canyon_schema(), &selections) {
        Err(SelectionError::TooManySelections { max, found, .. }) => {
            assert_eq!(max, 1);
            assert_eq!(found, 2);
        }
        other => panic!("expected too many selections, got {other:?}"),
    }
}

#[test]
fn required_group_must_be_selected() {
    let selections = vec![sel("transport", "opt-van", "van")];

    match normalize_selections(&canyon_schema(), &selections) {
        Err(SelectionError::TooFewSelections {
            group_id,
            min,
            found,
        }) => {
            assert_eq!(group_id, "canyon");
            assert_eq!(min, 1);
            assert_eq!(found, 0);
        }
        other => panic!("expected missing required group, got {other:?}"),
    }
}

#[test]
fn duplicate_and_zero_quantity_selections_are_rejected() {
    let duplicate = vec![
        sel("canyon", "opt-lower", "lower_antelope"),
        Selection::new("canyon", "opt-lower", None),
    ];
    assert!(matches!(
        normalize_selections(&canyon_schema(), &duplicate),
        Err(SelectionError::DuplicateOption { .. })
    ));

    let zero = vec![
        sel("canyon", "opt-lower", "lower_antelope"),
        sel("extras", "opt-photo", "photo_pack").with_quantity(0),
    ];
    assert!(matches!(
        normalize_selections(&canyon_schema(), &zero),
        Err(SelectionError::ZeroQuantity { .. })
    ));
}

#[test]
fn max_select_caps_multiple_groups() {
    let mut schema = annual_pass_schema();
    schema.groups[0].max_select = Some(1);
    let selections = vec![
        sel("south_rim_fees", "opt-buyer", "annual_pass_buyer"),
        sel("south_rim_fees", "opt-companion", "annual_pass_companion"),
    ];

    assert!(matches!(
        normalize_selections(&schema, &selections),
        Err(SelectionError::TooManySelections { max: 1, .. })
    ));
}
