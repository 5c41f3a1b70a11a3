//! Supplier cost and markup propagation into dynamic pricing rows.

mod markup;
mod propagator;
mod sheet;

pub use markup::SupplierCost;
pub use propagator::{
    CellFailure, MarkupPropagator, PropagationError, SyncPlan, SyncReport, SyncSettings,
};
pub use sheet::{SupplierCostSheet, SupplierSheetError};
