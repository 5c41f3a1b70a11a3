use super::domain::{ProductId, ProductSchema};
use super::matrix::{CellRef, PricingRow};
use super::supplier::SupplierCost;

/// Storage abstraction over dynamic pricing rows so the pricing path stays I/O free.
pub trait PricingStore: Send + Sync {
    fn fetch_row(&self, cell: &CellRef) -> Result<Option<PricingRow>, StoreError>;
    /// Replace the row at its cell; last writer wins.
    fn upsert_row(&self, row: PricingRow) -> Result<(), StoreError>;
}

/// Read access to the product configuration.
pub trait ProductCatalog: Send + Sync {
    fn schema(&self, product_id: &ProductId) -> Result<Option<ProductSchema>, StoreError>;
}

/// Source-of-truth supplier cost records.
pub trait SupplierCostSource: Send + Sync {
    fn costs_for(&self, product_id: &ProductId) -> Result<Vec<SupplierCost>, StoreError>;
}

/// Error enumeration for collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
