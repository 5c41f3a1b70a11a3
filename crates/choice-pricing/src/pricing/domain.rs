use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::bundle::BundleRule;

/// Identifier wrapper for bookable products.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

/// Sales channel (direct, OTA partners, walk-in counters).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

/// Per-person-type price triple used by options, base prices, and matrix cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonPrices {
    pub adult: f64,
    pub child: f64,
    pub infant: f64,
}

impl PersonPrices {
    pub const fn flat(amount: f64) -> Self {
        Self {
            adult: amount,
            child: amount,
            infant: amount,
        }
    }

    pub fn total_for(&self, party: &PartySize) -> f64 {
        self.adult * party.adults as f64
            + self.child * party.children as f64
            + self.infant * party.infants as f64
    }
}

/// Party composition on a reservation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySize {
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
}

impl PartySize {
    pub const fn new(adults: u32, children: u32, infants: u32) -> Self {
        Self {
            adults,
            children,
            infants,
        }
    }

    /// Headcount, saturating at `u32::MAX`.
    pub const fn total(&self) -> u32 {
        self.adults
            .saturating_add(self.children)
            .saturating_add(self.infants)
    }

    pub const fn checked_total(&self) -> Option<u32> {
        match self.adults.checked_add(self.children) {
            Some(partial) => partial.checked_add(self.infants),
            None => None,
        }
    }
}

/// How many options a group accepts and how they are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionArity {
    Single,
    Multiple,
    Quantity,
}

impl SelectionArity {
    pub const fn label(self) -> &'static str {
        match self {
            SelectionArity::Single => "single",
            SelectionArity::Multiple => "multiple",
            SelectionArity::Quantity => "quantity",
        }
    }
}

/// One selectable value within a choice group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub option_id: String,
    pub option_key: String,
    pub name: String,
    pub prices: PersonPrices,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub sort_order: i32,
}

/// A named axis of selection on a product (e.g. "Canyon", "Canyon Fee Type").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceGroup {
    pub group_id: String,
    pub name: String,
    #[serde(default)]
    pub localized_names: BTreeMap<String, String>,
    pub arity: SelectionArity,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub min_select: u32,
    #[serde(default)]
    pub max_select: Option<u32>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub active: bool,
    pub options: Vec<ChoiceOption>,
}

impl ChoiceGroup {
    /// Locate an option by database id, falling back to the stable option key.
    pub fn find_option(&self, option_id: &str, option_key: Option<&str>) -> Option<&ChoiceOption> {
        self.options
            .iter()
            .find(|option| option.option_id == option_id)
            .or_else(|| {
                option_key
                    .filter(|key| !key.is_empty())
                    .and_then(|key| self.options.iter().find(|option| option.option_key == key))
            })
    }
}

/// Pricing policy decided once at product configuration time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PricingMode {
    #[default]
    Flat,
    Bundle(BundleRule),
}

impl PricingMode {
    pub fn bundle_rule(&self) -> Option<&BundleRule> {
        match self {
            PricingMode::Flat => None,
            PricingMode::Bundle(rule) => Some(rule),
        }
    }
}

/// Declared choice schema for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSchema {
    pub product_id: ProductId,
    pub name: String,
    pub base_prices: PersonPrices,
    #[serde(default)]
    pub pricing_mode: PricingMode,
    pub groups: Vec<ChoiceGroup>,
}

impl ProductSchema {
    pub fn group(&self, group_id: &str) -> Option<&ChoiceGroup> {
        self.groups.iter().find(|group| group.group_id == group_id)
    }
}

/// One chosen (group, option) pair on a reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub group_id: String,
    pub option_id: String,
    #[serde(default)]
    pub option_key: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub unit_price: Option<f64>,
}

impl Selection {
    pub fn new(group_id: &str, option_id: &str, option_key: Option<&str>) -> Self {
        Self {
            group_id: group_id.to_string(),
            option_id: option_id.to_string(),
            option_key: option_key.map(str::to_string),
            quantity: 1,
            unit_price: None,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Stable identifier used for combination keys: the option key when known, else the id.
    pub fn identity(&self) -> &str {
        match self.option_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => &self.option_id,
        }
    }
}

/// Everything the orchestrator needs to price a reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRequest {
    pub product_id: ProductId,
    pub channel_id: ChannelId,
    pub date: NaiveDate,
    pub party: PartySize,
    pub selections: Vec<Selection>,
    #[serde(default)]
    pub discount: Option<f64>,
}

fn default_true() -> bool {
    true
}

fn default_quantity() -> u32 {
    1
}

/// Round a monetary amount to cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
