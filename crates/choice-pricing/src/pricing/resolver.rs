//! Tiered lookup of combination prices that tolerates matrices written under older schemas.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::combination::{build_id_key, build_key, canonicalize, segment_count, segments};
use super::domain::Selection;
use super::matrix::{ChoicePrice, PricingMatrix};

/// Policy applied when no matrix entry matches a combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Charge the highest `ota_sale_price` among entries with the same number of segments.
    #[default]
    MaxSameShape,
    /// Charge nothing and leave the decision to the caller.
    Zero,
}

impl FallbackPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "max_same_shape" | "max" => Some(Self::MaxSameShape),
            "zero" | "none" => Some(Self::Zero),
            _ => None,
        }
    }
}

/// Which lookup tier produced a match, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    CombinationId,
    CombinationKey,
    SortedKey,
    OptionIdKey,
    OptionKeyKey,
    Partial,
}

/// A combination as seen by the resolver: optional stored identities plus the detail records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinationQuery {
    pub combination_id: Option<String>,
    pub combination_key: Option<String>,
    pub details: Vec<Selection>,
}

impl CombinationQuery {
    pub fn from_selections(selections: &[Selection]) -> Self {
        Self {
            combination_id: None,
            combination_key: Some(build_key(selections)),
            details: selections.to_vec(),
        }
    }

    /// Canonical key the fuzzy tiers compare against.
    pub fn target_key(&self) -> String {
        match non_empty(&self.combination_key) {
            Some(key) => canonicalize(key),
            None => build_key(&self.details),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'m> {
    pub data: Option<&'m ChoicePrice>,
    pub matched_key: Option<&'m str>,
    pub tier: Option<MatchTier>,
}

impl<'m> Resolution<'m> {
    fn hit(key: &'m str, data: &'m ChoicePrice, tier: MatchTier) -> Self {
        debug!(matched_key = key, ?tier, "combination price resolved");
        Self {
            data: Some(data),
            matched_key: Some(key),
            tier: Some(tier),
        }
    }

    fn miss() -> Self {
        Self {
            data: None,
            matched_key: None,
            tier: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.data.is_some()
    }
}

/// Where a resolved sale price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "tier", rename_all = "snake_case")]
pub enum PriceSource {
    Direct(MatchTier),
    Fallback,
    Unpriced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSalePrice {
    pub amount: f64,
    pub source: PriceSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_key: Option<String>,
}

/// Resolve a combination against the matrix, first hit wins.
pub fn resolve<'m>(query: &CombinationQuery, matrix: &'m PricingMatrix) -> Resolution<'m> {
    if let Some(id) = non_empty(&query.combination_id) {
        if let Some((key, data)) = matrix.get_key_value(id) {
            return Resolution::hit(key, data, MatchTier::CombinationId);
        }
    }

    if let Some(precomputed) = non_empty(&query.combination_key) {
        if let Some((key, data)) = matrix.get_key_value(precomputed) {
            return Resolution::hit(key, data, MatchTier::CombinationKey);
        }
    }

    let target = query.target_key();
    if !target.is_empty() {
        if let Some((key, data)) = find_canonical(matrix, &target) {
            return Resolution::hit(key, data, MatchTier::SortedKey);
        }
    }

    if !query.details.is_empty() {
        let id_key = build_id_key(&query.details);
        if let Some((key, data)) = find_exact_or_canonical(matrix, &id_key) {
            return Resolution::hit(key, data, MatchTier::OptionIdKey);
        }

        let option_key = build_key(&query.details);
        if let Some((key, data)) = find_exact_or_canonical(matrix, &option_key) {
            return Resolution::hit(key, data, MatchTier::OptionKeyKey);
        }
    }

    if !target.is_empty() {
        if let Some((key, data)) = find_partial(matrix, &target) {
            return Resolution::hit(key, data, MatchTier::Partial);
        }
    }

    Resolution::miss()
}

/// Highest `ota_sale_price` among entries shaped like the target, else across all entries.
pub fn fallback_ota_sale_price(target_key: &str, matrix: &PricingMatrix) -> Option<f64> {
    let target_segments = segment_count(target_key);

    let same_shape = max_ota_sale_price(
        matrix
            .iter()
            .filter(|(key, _)| segment_count(key) == target_segments)
            .map(|(_, price)| price),
    );

    same_shape.or_else(|| max_ota_sale_price(matrix.iter().map(|(_, price)| price)))
}

/// Resolve a sale price, applying the configured fallback when no entry matches.
pub fn resolve_with_fallback(
    query: &CombinationQuery,
    matrix: &PricingMatrix,
    policy: FallbackPolicy,
) -> ResolvedSalePrice {
    let resolution = resolve(query, matrix);

    if let (Some(data), Some(tier)) = (resolution.data, resolution.tier) {
        if let Some(amount) = data.ota_sale_price.filter(|amount| *amount >= 0.0) {
            return ResolvedSalePrice {
                amount,
                source: PriceSource::Direct(tier),
                matched_key: resolution.matched_key.map(str::to_string),
            };
        }
    }

    if policy == FallbackPolicy::MaxSameShape {
        let target = query.target_key();
        if let Some(amount) = fallback_ota_sale_price(&target, matrix) {
            warn!(
                combination = %target,
                amount,
                "no matrix entry for combination, charging same-shape maximum"
            );
            return ResolvedSalePrice {
                amount,
                source: PriceSource::Fallback,
                matched_key: None,
            };
        }
    }

    ResolvedSalePrice {
        amount: 0.0,
        source: PriceSource::Unpriced,
        matched_key: None,
    }
}

fn max_ota_sale_price<'a, I>(prices: I) -> Option<f64>
where
    I: Iterator<Item = &'a ChoicePrice>,
{
    prices
        .filter_map(|price| price.ota_sale_price)
        .filter(|amount| *amount >= 0.0)
        .fold(None, |best: Option<f64>, amount| match best {
            Some(current) if current >= amount => Some(current),
            _ => Some(amount),
        })
}

fn find_exact_or_canonical<'m>(
    matrix: &'m PricingMatrix,
    key: &str,
) -> Option<(&'m String, &'m ChoicePrice)> {
    if key.is_empty() {
        return None;
    }
    matrix
        .get_key_value(key)
        .or_else(|| find_canonical(matrix, &canonicalize(key)))
}

fn find_canonical<'m>(
    matrix: &'m PricingMatrix,
    canonical_target: &str,
) -> Option<(&'m String, &'m ChoicePrice)> {
    matrix
        .iter()
        .find(|(key, _)| canonicalize(key) == canonical_target)
}

fn find_partial<'m>(
    matrix: &'m PricingMatrix,
    target: &str,
) -> Option<(&'m String, &'m ChoicePrice)> {
    matrix.iter().find(|(key, _)| {
        if key.is_empty() {
            return false;
        }

        let every_segment_overlaps = segments(target).all(|wanted| {
            segments(key).any(|candidate| candidate.contains(wanted) || wanted.contains(candidate))
        });

        every_segment_overlaps || key.contains(target) || target.contains(key.as_str())
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}
