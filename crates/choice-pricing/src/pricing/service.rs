use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{PartySize, PricingRequest, ProductId, ProductSchema, Selection};
use super::matrix::CellRef;
use super::orchestrator::{PriceQuote, PricingError, PricingOrchestrator};
use super::store::{PricingStore, ProductCatalog, StoreError};
use super::validation::SelectionValidation;

/// Selection set submitted for a pre-booking check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionCheck {
    pub product_id: ProductId,
    pub party: PartySize,
    pub selections: Vec<Selection>,
}

/// Service composing the product catalog, the pricing store, and the orchestrator.
pub struct PricingService<C, S> {
    catalog: Arc<C>,
    store: Arc<S>,
    orchestrator: Arc<PricingOrchestrator>,
}

impl<C, S> PricingService<C, S>
where
    C: ProductCatalog + 'static,
    S: PricingStore + 'static,
{
    pub fn new(catalog: Arc<C>, store: Arc<S>, orchestrator: PricingOrchestrator) -> Self {
        Self {
            catalog,
            store,
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Price a reservation against the stored row for its cell, if any.
    pub fn quote(&self, request: PricingRequest) -> Result<PriceQuote, PricingServiceError> {
        let schema = self.schema(&request.product_id)?;
        let cell = CellRef {
            product_id: request.product_id.clone(),
            channel_id: request.channel_id.clone(),
            date: request.date,
        };
        let row = self.store.fetch_row(&cell)?;

        let quote = self
            .orchestrator
            .price_reservation(&schema, &request, row.as_ref())?;

        info!(
            cell = %cell,
            final_total = quote.breakdown.final_total,
            review = quote.breakdown.requires_review(),
            "reservation priced"
        );
        Ok(quote)
    }

    /// Check a selection set without pricing it.
    pub fn validate(
        &self,
        check: &SelectionCheck,
    ) -> Result<SelectionValidation, PricingServiceError> {
        let schema = self.schema(&check.product_id)?;
        Ok(self
            .orchestrator
            .validate_selections(&schema, &check.selections, &check.party))
    }

    fn schema(&self, product_id: &ProductId) -> Result<ProductSchema, PricingServiceError> {
        let schema = self
            .catalog
            .schema(product_id)?
            .ok_or(StoreError::NotFound)?;
        Ok(schema)
    }
}

/// Error raised by the pricing service.
#[derive(Debug, thiserror::Error)]
pub enum PricingServiceError {
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
