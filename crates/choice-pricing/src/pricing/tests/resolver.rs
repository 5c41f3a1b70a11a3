use super::common::*;
use crate::pricing::matrix::PricingMatrix;
use crate::pricing::resolver::{
    fallback_ota_sale_price, resolve, resolve_with_fallback, CombinationQuery, FallbackPolicy,
    MatchTier, PriceSource,
};

fn matrix(entries: Vec<(&str, f64)>) -> PricingMatrix {
    entries
        .into_iter()
        .map(|(key, amount)| (key.to_string(), sale_price(amount)))
        .collect()
}

#[test]
fn combination_id_wins_first() {
    let matrix = matrix(vec![("combo-17", 120.0), ("lower_antelope+van", 90.0)]);
    let query = CombinationQuery {
        combination_id: Some("combo-17".to_string()),
        ..CombinationQuery::from_selections(&lower_with_van())
    };

    let resolution = resolve(&query, &matrix);
    assert_eq!(resolution.tier, Some(MatchTier::CombinationId));
    assert_eq!(resolution.matched_key, Some("combo-17"));
}

#[test]
fn exact_key_beats_partial_match() {
    // "lower_antelope" sorts first and would satisfy the partial tier.
    let matrix = matrix(vec![("lower_antelope", 50.0), ("lower_antelope+van", 90.0)]);
    let query = CombinationQuery::from_selections(&lower_with_van());

    let resolution = resolve(&query, &matrix);
    assert_eq!(resolution.tier, Some(MatchTier::CombinationKey));
    assert_eq!(
        resolution.data.and_then(|price| price.ota_sale_price),
        Some(90.0)
    );
}

#[test]
fn unsorted_stored_key_matches_by_sorted_segments() {
    let matrix = matrix(vec![("van+lower_antelope", 90.0)]);
    let query = CombinationQuery::from_selections(&lower_with_van());

    let resolution = resolve(&query, &matrix);
    assert_eq!(resolution.tier, Some(MatchTier::SortedKey));
    assert_eq!(resolution.matched_key, Some("van+lower_antelope"));
}

#[test]
fn option_id_key_matches_legacy_rows() {
    let matrix = matrix(vec![("opt-van+opt-lower", 75.0)]);
    let query = CombinationQuery {
        combination_id: None,
        combination_key: None,
        details: lower_with_van(),
    };

    let resolution = resolve(&query, &matrix);
    assert_eq!(resolution.tier, Some(MatchTier::OptionIdKey));
    assert_eq!(resolution.matched_key, Some("opt-van+opt-lower"));
}

#[test]
fn stale_stored_key_falls_through_to_detail_keys() {
    let matrix = matrix(vec![("lower_antelope+van", 90.0)]);
    let query = CombinationQuery {
        combination_id: None,
        combination_key: Some("retired_canyon".to_string()),
        details: lower_with_van(),
    };

    let resolution = resolve(&query, &matrix);
    assert_eq!(resolution.tier, Some(MatchTier::OptionKeyKey));
}

#[test]
fn renamed_segments_match_partially() {
    let matrix = matrix(vec![("lower_antelope_canyon+van", 95.0)]);
    let query = CombinationQuery::from_selections(&lower_with_van());

    let resolution = resolve(&query, &matrix);
    assert_eq!(resolution.tier, Some(MatchTier::Partial));
    assert_eq!(resolution.matched_key, Some("lower_antelope_canyon+van"));
}

#[test]
fn unrelated_keys_do_not_match() {
    let matrix = matrix(vec![("upper_antelope+jeep", 90.0)]);
    let query = CombinationQuery::from_selections(&lower_with_van());

    let resolution = resolve(&query, &matrix);
    assert!(!resolution.is_match());
    assert_eq!(resolution.tier, None);
}

#[test]
fn empty_query_never_matches_partially() {
    let matrix = matrix(vec![("lower_antelope", 50.0)]);
    let resolution = resolve(&CombinationQuery::default(), &matrix);
    assert!(!resolution.is_match());
}

#[test]
fn fallback_prefers_entries_of_the_same_shape() {
    let matrix = matrix(vec![("a+b", 100.0), ("c+d", 150.0), ("e", 400.0)]);

    assert_eq!(fallback_ota_sale_price("x+y", &matrix), Some(150.0));
    assert_eq!(fallback_ota_sale_price("x+y+z", &matrix), Some(400.0));
    assert_eq!(fallback_ota_sale_price("x+y", &PricingMatrix::new()), None);
}

#[test]
fn resolve_with_fallback_reports_direct_hits() {
    let matrix = matrix(vec![("lower_antelope+van", 90.0)]);
    let query = CombinationQuery::from_selections(&lower_with_van());

    let sale = resolve_with_fallback(&query, &matrix, FallbackPolicy::MaxSameShape);
    assert_close(sale.amount, 90.0);
    assert_eq!(sale.source, PriceSource::Direct(MatchTier::CombinationKey));
    assert_eq!(sale.matched_key.as_deref(), Some("lower_antelope+van"));
}

#[test]
fn resolve_with_fallback_uses_configured_policy_on_miss() {
    let matrix = matrix(vec![("upper_antelope+jeep", 110.0), ("upper_antelope", 300.0)]);
    let query = CombinationQuery::from_selections(&lower_with_van());

    let fallback = resolve_with_fallback(&query, &matrix, FallbackPolicy::MaxSameShape);
    assert_close(fallback.amount, 110.0);
    assert_eq!(fallback.source, PriceSource::Fallback);

    let zero = resolve_with_fallback(&query, &matrix, FallbackPolicy::Zero);
    assert_close(zero.amount, 0.0);
    assert_eq!(zero.source, PriceSource::Unpriced);
}

#[test]
fn negative_sale_price_is_not_a_direct_hit() {
    let matrix = matrix(vec![("lower_antelope+van", -1.0), ("upper_antelope+jeep", 80.0)]);
    let query = CombinationQuery::from_selections(&lower_with_van());

    let sale = resolve_with_fallback(&query, &matrix, FallbackPolicy::MaxSameShape);
    assert_eq!(sale.source, PriceSource::Fallback);
    assert_close(sale.amount, 80.0);
}

#[test]
fn fallback_ignores_negative_sale_prices() {
    let matrix = matrix(vec![("upper_antelope+jeep", -40.0), ("upper_antelope+van", -5.0)]);
    let query = CombinationQuery::from_selections(&lower_with_van());

    assert_eq!(fallback_ota_sale_price("lower_antelope+van", &matrix), None);

    let sale = resolve_with_fallback(&query, &matrix, FallbackPolicy::MaxSameShape);
    assert_eq!(sale.source, PriceSource::Unpriced);
    assert_close(sale.amount, 0.0);
}

#[test]
fn fallback_policy_parses_configuration_values() {
    assert_eq!(
        FallbackPolicy::parse(" MAX_SAME_SHAPE "),
        Some(FallbackPolicy::MaxSameShape)
    );
    assert_eq!(FallbackPolicy::parse("zero"), Some(FallbackPolicy::Zero));
    assert_eq!(FallbackPolicy::parse("median"), None);
}
