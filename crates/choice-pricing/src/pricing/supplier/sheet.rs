use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::super::domain::ProductId;
use super::super::store::{StoreError, SupplierCostSource};
use super::markup::SupplierCost;

#[derive(Debug)]
pub enum SupplierSheetError {
    Io(std::io::Error),
    Csv(csv::Error),
    NegativeAmount { line: usize, product_id: String },
}

impl std::fmt::Display for SupplierSheetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupplierSheetError::Io(err) => write!(f, "failed to read supplier sheet: {}", err),
            SupplierSheetError::Csv(err) => write!(f, "invalid supplier CSV data: {}", err),
            SupplierSheetError::NegativeAmount { line, product_id } => write!(
                f,
                "supplier sheet line {line} for product '{product_id}' has a negative amount"
            ),
        }
    }
}

impl std::error::Error for SupplierSheetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SupplierSheetError::Io(err) => Some(err),
            SupplierSheetError::Csv(err) => Some(err),
            SupplierSheetError::NegativeAmount { .. } => None,
        }
    }
}

impl From<std::io::Error> for SupplierSheetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for SupplierSheetError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Supplier costs loaded from a CSV export, grouped by product.
///
/// Expected headers: `product_id,combination_key,supplier_price,markup_percent,markup_amount`.
/// An empty `combination_key` means the cost applies to the product base price.
#[derive(Debug, Clone, Default)]
pub struct SupplierCostSheet {
    costs: BTreeMap<ProductId, Vec<SupplierCost>>,
}

impl SupplierCostSheet {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SupplierSheetError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SupplierSheetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut costs: BTreeMap<ProductId, Vec<SupplierCost>> = BTreeMap::new();

        for (index, record) in csv_reader.deserialize::<SheetRow>().enumerate() {
            let row = record?;
            let markup_amount = row.markup_amount.unwrap_or_default();
            if row.supplier_price < 0.0 || markup_amount < 0.0 {
                return Err(SupplierSheetError::NegativeAmount {
                    line: index + 2,
                    product_id: row.product_id,
                });
            }

            let product_id = ProductId(row.product_id);
            costs.entry(product_id.clone()).or_default().push(SupplierCost {
                product_id,
                combination_key: row.combination_key,
                supplier_price: row.supplier_price,
                markup_percent: row.markup_percent.unwrap_or_default(),
                markup_amount,
            });
        }

        Ok(Self { costs })
    }

    pub fn products(&self) -> Vec<ProductId> {
        self.costs.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.costs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }
}

impl SupplierCostSource for SupplierCostSheet {
    fn costs_for(&self, product_id: &ProductId) -> Result<Vec<SupplierCost>, StoreError> {
        Ok(self.costs.get(product_id).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct SheetRow {
    product_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    combination_key: Option<String>,
    supplier_price: f64,
    #[serde(default)]
    markup_percent: Option<f64>,
    #[serde(default)]
    markup_amount: Option<f64>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|raw| !raw.trim().is_empty()))
}
