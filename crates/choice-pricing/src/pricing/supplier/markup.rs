use serde::{Deserialize, Serialize};

use super::super::combination::canonicalize;
use super::super::domain::{round_cents, ProductId};
use super::super::matrix::{ChoicePrice, PricingRow};

/// Supplier cost for a product, optionally scoped to one combination of options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierCost {
    pub product_id: ProductId,
    #[serde(default)]
    pub combination_key: Option<String>,
    pub supplier_price: f64,
    #[serde(default)]
    pub markup_percent: f64,
    #[serde(default)]
    pub markup_amount: f64,
}

impl SupplierCost {
    /// `supplier + amount + supplier * percent / 100`, rounded to cents.
    pub fn final_price(&self) -> f64 {
        round_cents(
            self.supplier_price
                + self.markup_amount
                + self.supplier_price * self.markup_percent / 100.0,
        )
    }

    fn apply_to(&self, cell: &mut ChoicePrice) {
        cell.supplier_price = Some(self.supplier_price);
        cell.markup_percent = Some(self.markup_percent);
        cell.markup_amount = Some(self.markup_amount);
        cell.ota_sale_price = Some(self.final_price());
    }
}

/// Write every cost into the row: product-level costs into the base cell, scoped costs into the
/// canonical combination cell. Per-person prices already on a cell are left untouched.
pub(crate) fn apply_costs(row: &mut PricingRow, costs: &[SupplierCost]) -> usize {
    let mut applied = 0;
    for cost in costs
        .iter()
        .filter(|cost| cost.product_id == row.product_id)
    {
        match cost.combination_key.as_deref().map(canonicalize) {
            Some(key) if !key.is_empty() => cost.apply_to(row.choices.entry_mut(&key)),
            _ => cost.apply_to(row.base.get_or_insert_with(ChoicePrice::default)),
        }
        applied += 1;
    }
    applied
}
