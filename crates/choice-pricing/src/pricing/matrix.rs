use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{ChannelId, PersonPrices, ProductId};

/// Price override for a single combination within a dynamic pricing row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoicePrice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adult_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infant_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ota_sale_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup_amount: Option<f64>,
}

impl ChoicePrice {
    /// Per-person prices when the cell defines at least an adult price.
    pub fn person_prices(&self) -> Option<PersonPrices> {
        let adult = self.adult_price?;
        Some(PersonPrices {
            adult,
            child: self.child_price.unwrap_or_default(),
            infant: self.infant_price.unwrap_or_default(),
        })
    }
}

/// Combination-keyed price table. Ordered so iteration (and serialization) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PricingMatrix(BTreeMap<String, ChoicePrice>);

impl PricingMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&ChoicePrice> {
        self.0.get(key)
    }

    pub fn get_key_value(&self, key: &str) -> Option<(&String, &ChoicePrice)> {
        self.0.get_key_value(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, price: ChoicePrice) -> Option<ChoicePrice> {
        self.0.insert(key.into(), price)
    }

    pub fn entry_mut(&mut self, key: &str) -> &mut ChoicePrice {
        self.0.entry(key.to_string()).or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ChoicePrice)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ChoicePrice)> for PricingMatrix {
    fn from_iter<T: IntoIterator<Item = (String, ChoicePrice)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Address of one dynamic pricing row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub product_id: ProductId,
    pub channel_id: ChannelId,
    pub date: NaiveDate,
}

impl std::fmt::Display for CellRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.product_id.0, self.channel_id.0, self.date
        )
    }
}

/// Dynamic pricing row for a (product, channel, date) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRow {
    pub product_id: ProductId,
    pub channel_id: ChannelId,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<ChoicePrice>,
    #[serde(default)]
    pub choices: PricingMatrix,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_multiplier: Option<f64>,
}

impl PricingRow {
    pub fn empty(cell: &CellRef) -> Self {
        Self {
            product_id: cell.product_id.clone(),
            channel_id: cell.channel_id.clone(),
            date: cell.date,
            base: None,
            choices: PricingMatrix::new(),
            channel_multiplier: None,
            date_multiplier: None,
        }
    }

    pub fn cell(&self) -> CellRef {
        CellRef {
            product_id: self.product_id.clone(),
            channel_id: self.channel_id.clone(),
            date: self.date,
        }
    }
}
