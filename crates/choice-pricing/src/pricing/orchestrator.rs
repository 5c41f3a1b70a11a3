use serde::{Deserialize, Serialize};
use tracing::warn;

use super::bundle::{BundleEvaluator, BundleMode, BundleQuote, BundleViolation};
use super::combination::build_key;
use super::domain::{
    round_cents, PartySize, PricingRequest, ProductSchema, Selection, SelectionArity,
};
use super::matrix::{CellRef, PricingRow};
use super::resolver::{
    resolve, resolve_with_fallback, CombinationQuery, FallbackPolicy, PriceSource,
};
use super::validation::{normalize_selections, SelectionError, SelectionValidation};

/// Kind of contribution to a final price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Base,
    Choice,
    Bundle,
    StandardFee,
    Option,
    ChannelMultiplier,
    DateMultiplier,
    Discount,
}

/// Discrete contribution to a price so the derivation can be audited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceComponent {
    pub kind: ComponentKind,
    pub label: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PriceSource>,
}

/// Itemized price for a reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub base_price: f64,
    pub choices_total: f64,
    pub options_total: f64,
    pub discount_total: f64,
    pub final_total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_pass_buyers: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub companions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub covered_people: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combination_key: Option<String>,
    pub components: Vec<PriceComponent>,
    /// Reasons a human should look at this price before it is accepted.
    pub review_flags: Vec<String>,
}

impl PriceBreakdown {
    pub fn requires_review(&self) -> bool {
        !self.review_flags.is_empty()
    }
}

/// Breakdown plus the validated selections it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub breakdown: PriceBreakdown,
    pub selections: Vec<Selection>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Bundle(#[from] BundleViolation),
    #[error("party must include at least one person")]
    EmptyParty,
    #[error("party size exceeds the supported headcount")]
    PartyTooLarge,
    #[error("pricing row {row} does not belong to {requested}")]
    RowMismatch { row: CellRef, requested: CellRef },
}

/// Stateless pricing pipeline; safe to share across requests.
#[derive(Debug, Clone, Default)]
pub struct PricingOrchestrator {
    fallback_policy: FallbackPolicy,
}

impl PricingOrchestrator {
    pub fn new(fallback_policy: FallbackPolicy) -> Self {
        Self { fallback_policy }
    }

    pub fn fallback_policy(&self) -> FallbackPolicy {
        self.fallback_policy
    }

    /// Check selections against the schema and, for bundle products, the bundle rule.
    pub fn validate_selections(
        &self,
        schema: &ProductSchema,
        selections: &[Selection],
        party: &PartySize,
    ) -> SelectionValidation {
        match self.checked_selections(schema, selections, party) {
            Ok(_) => SelectionValidation::accepted(),
            Err(err) => SelectionValidation::rejected(err),
        }
    }

    fn checked_selections(
        &self,
        schema: &ProductSchema,
        selections: &[Selection],
        party: &PartySize,
    ) -> Result<Vec<Selection>, PricingError> {
        let normalized = normalize_selections(schema, selections)?;

        if let Some(rule) = schema.pricing_mode.bundle_rule() {
            let governed: Vec<Selection> = normalized
                .iter()
                .filter(|selection| rule.governs(selection.identity()))
                .cloned()
                .collect();
            BundleEvaluator::new(rule.clone())
                .validate(&governed, party.total())
                .into_result()?;
        }

        Ok(normalized)
    }

    pub fn price_reservation(
        &self,
        schema: &ProductSchema,
        request: &PricingRequest,
        row: Option<&PricingRow>,
    ) -> Result<PriceQuote, PricingError> {
        let requested = CellRef {
            product_id: schema.product_id.clone(),
            channel_id: request.channel_id.clone(),
            date: request.date,
        };
        if let Some(row) = row {
            if row.cell() != requested {
                return Err(PricingError::RowMismatch {
                    row: row.cell(),
                    requested,
                });
            }
        }

        let party = request.party;
        let headcount = match party.checked_total() {
            Some(0) => return Err(PricingError::EmptyParty),
            Some(headcount) => headcount,
            None => return Err(PricingError::PartyTooLarge),
        };

        let mut selections = self.checked_selections(schema, &request.selections, &party)?;
        let rule = schema.pricing_mode.bundle_rule();

        let mut combination = Vec::new();
        let mut governed = Vec::new();
        let mut add_ons = Vec::new();
        for (index, selection) in selections.iter().enumerate() {
            let arity = schema
                .group(&selection.group_id)
                .map(|group| group.arity)
                .unwrap_or(SelectionArity::Single);
            if arity == SelectionArity::Quantity {
                add_ons.push(index);
            } else if rule.is_some_and(|rule| rule.governs(selection.identity())) {
                governed.push(selection.clone());
            } else {
                combination.push(selection.clone());
            }
        }

        let bundle =
            rule.map(|rule| BundleEvaluator::new(rule.clone()).evaluate(&governed, &party));
        let bundle_mode = matches!(
            bundle,
            Some(BundleQuote {
                mode: BundleMode::Bundle,
                ..
            })
        );

        let mut components = Vec::new();
        let mut review_flags = Vec::new();

        let base_cell = row.and_then(|row| row.base.as_ref());
        let base_sale_price = base_cell
            .and_then(|base| base.ota_sale_price)
            .filter(|amount| amount.is_finite() && *amount >= 0.0);
        let (base_price, base_label) =
            match (base_cell.and_then(|base| base.person_prices()), base_sale_price) {
                (Some(prices), _) => (prices.total_for(&party), "dynamic base price"),
                (None, Some(sale)) => (sale * headcount as f64, "supplier base sale price"),
                (None, None) => (schema.base_prices.total_for(&party), "product base price"),
            };
        components.push(PriceComponent {
            kind: ComponentKind::Base,
            label: base_label.to_string(),
            amount: base_price,
            source: None,
        });

        let mut choices_total = 0.0;
        if let Some(quote) = &bundle {
            let kind = match quote.mode {
                BundleMode::Bundle => ComponentKind::Bundle,
                BundleMode::Standard => ComponentKind::StandardFee,
            };
            for line in &quote.lines {
                components.push(PriceComponent {
                    kind,
                    label: format!("{} x{}", line.option_key, line.quantity),
                    amount: line.amount,
                    source: None,
                });
            }
            choices_total += quote.total;
        }

        let combination_key = build_key(&combination);
        if !bundle_mode && !combination_key.is_empty() {
            let (amount, source) = self.price_combination(
                schema,
                &combination,
                &party,
                row,
                &mut review_flags,
            );
            components.push(PriceComponent {
                kind: ComponentKind::Choice,
                label: combination_key.clone(),
                amount,
                source,
            });
            choices_total += amount;
        }

        let mut options_total = 0.0;
        for index in add_ons {
            let selection = &mut selections[index];
            let unit_price = schema
                .group(&selection.group_id)
                .and_then(|group| {
                    group.find_option(&selection.option_id, selection.option_key.as_deref())
                })
                .map(|option| option.prices.adult)
                .unwrap_or_default();
            let amount = unit_price * selection.quantity as f64;
            selection.unit_price = Some(unit_price);
            components.push(PriceComponent {
                kind: ComponentKind::Option,
                label: format!("{} x{}", selection.identity(), selection.quantity),
                amount,
                source: None,
            });
            options_total += amount;
        }

        if let (Some(rule), Some(quote)) = (rule, &bundle) {
            for selection in selections
                .iter_mut()
                .filter(|selection| rule.governs(selection.identity()))
            {
                selection.unit_price = Some(match selection.identity() {
                    key if key == rule.anchor_key && quote.mode == BundleMode::Bundle => {
                        rule.bundle_price
                    }
                    key => rule.standard_fee(key).unwrap_or_default(),
                });
            }
        }

        let mut subtotal = base_price + choices_total + options_total;

        let (channel_multiplier, date_multiplier) = match row {
            Some(row) if !bundle_mode => (row.channel_multiplier, row.date_multiplier),
            _ => (None, None),
        };
        for (kind, multiplier) in [
            (ComponentKind::ChannelMultiplier, channel_multiplier),
            (ComponentKind::DateMultiplier, date_multiplier),
        ] {
            if let Some(multiplier) = multiplier {
                let adjusted = subtotal * multiplier;
                components.push(PriceComponent {
                    kind,
                    label: format!("x{multiplier}"),
                    amount: adjusted - subtotal,
                    source: None,
                });
                subtotal = adjusted;
            }
        }

        let discount_total = request
            .discount
            .filter(|amount| amount.is_finite())
            .unwrap_or_default()
            .clamp(0.0, subtotal.max(0.0));
        if discount_total > 0.0 {
            components.push(PriceComponent {
                kind: ComponentKind::Discount,
                label: "discount".to_string(),
                amount: -discount_total,
                source: None,
            });
        }

        let final_total = round_cents(subtotal - discount_total);
        if final_total <= 0.0 {
            review_flags.push("final total is zero".to_string());
        }

        let breakdown = PriceBreakdown {
            base_price: round_cents(base_price),
            choices_total: round_cents(choices_total),
            options_total: round_cents(options_total),
            discount_total: round_cents(discount_total),
            final_total,
            channel_multiplier,
            date_multiplier,
            annual_pass_buyers: bundle
                .as_ref()
                .filter(|_| bundle_mode)
                .map(|quote| quote.annual_pass_buyers),
            companions: bundle
                .as_ref()
                .filter(|_| bundle_mode)
                .map(|quote| quote.companions),
            covered_people: bundle
                .as_ref()
                .filter(|_| bundle_mode)
                .map(|quote| quote.covered_people),
            combination_key: (!combination_key.is_empty()).then_some(combination_key),
            components,
            review_flags,
        };

        Ok(PriceQuote {
            breakdown,
            selections,
        })
    }

    fn price_combination(
        &self,
        schema: &ProductSchema,
        combination: &[Selection],
        party: &PartySize,
        row: Option<&PricingRow>,
        review_flags: &mut Vec<String>,
    ) -> (f64, Option<PriceSource>) {
        let Some(row) = row else {
            return (option_prices_total(schema, combination, party), None);
        };

        let query = CombinationQuery::from_selections(combination);
        let resolution = resolve(&query, &row.choices);
        if let (Some(prices), Some(tier)) = (
            resolution.data.and_then(|data| data.person_prices()),
            resolution.tier,
        ) {
            return (prices.total_for(party), Some(PriceSource::Direct(tier)));
        }

        let sale = resolve_with_fallback(&query, &row.choices, self.fallback_policy);
        match sale.source {
            PriceSource::Direct(_) => (sale.amount * party.total() as f64, Some(sale.source)),
            PriceSource::Fallback => {
                review_flags.push(format!(
                    "combination '{}' not in pricing matrix; charged highest comparable sale price",
                    query.target_key()
                ));
                (sale.amount * party.total() as f64, Some(sale.source))
            }
            PriceSource::Unpriced => {
                warn!(
                    product_id = %schema.product_id.0,
                    combination = %query.target_key(),
                    "combination unpriced in matrix, charging nothing"
                );
                review_flags.push(format!(
                    "combination '{}' unpriced in matrix; charged nothing",
                    query.target_key()
                ));
                (0.0, Some(sale.source))
            }
        }
    }
}

fn option_prices_total(schema: &ProductSchema, selections: &[Selection], party: &PartySize) -> f64 {
    selections
        .iter()
        .filter_map(|selection| {
            schema.group(&selection.group_id).and_then(|group| {
                group.find_option(&selection.option_id, selection.option_key.as_deref())
            })
        })
        .map(|option| option.prices.total_for(party))
        .sum()
}
