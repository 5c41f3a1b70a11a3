//! Choice-based dynamic pricing for reservations.
//!
//! A product declares choice groups; a reservation selects options from them. The selected
//! options form a combination whose price is looked up in a per-(product, channel, date) matrix,
//! with tolerant matching for keys written under older schemas. Bundle products (annual passes)
//! bypass the matrix and are priced by rule. Supplier cost and markup are pushed into the matrix
//! by the propagator.

pub mod bundle;
pub mod combination;
pub mod domain;
pub mod matrix;
pub mod orchestrator;
pub mod resolver;
pub mod router;
pub mod service;
pub mod store;
pub mod supplier;
pub mod validation;

#[cfg(test)]
mod tests;

pub use bundle::{
    BundleEvaluator, BundleLine, BundleMode, BundleQuote, BundleRule, BundleValidation,
    BundleViolation,
};
pub use combination::{build_key, canonicalize, KEY_DELIMITER};
pub use domain::{
    round_cents, ChannelId, ChoiceGroup, ChoiceOption, PartySize, PersonPrices, PricingMode,
    PricingRequest, ProductId, ProductSchema, Selection, SelectionArity,
};
pub use matrix::{CellRef, ChoicePrice, PricingMatrix, PricingRow};
pub use orchestrator::{
    ComponentKind, PriceBreakdown, PriceComponent, PriceQuote, PricingError, PricingOrchestrator,
};
pub use resolver::{
    fallback_ota_sale_price, resolve, resolve_with_fallback, CombinationQuery, FallbackPolicy,
    MatchTier, PriceSource, Resolution, ResolvedSalePrice,
};
pub use router::pricing_router;
pub use service::{PricingService, PricingServiceError, SelectionCheck};
pub use store::{PricingStore, ProductCatalog, StoreError, SupplierCostSource};
pub use supplier::{
    CellFailure, MarkupPropagator, PropagationError, SupplierCost, SupplierCostSheet,
    SupplierSheetError, SyncPlan, SyncReport, SyncSettings,
};
pub use validation::{normalize_selections, SelectionError, SelectionValidation};
