use chrono::NaiveDate;
use choice_pricing::error::AppError;
use choice_pricing::pricing::{
    CellRef, PricingRow, PricingStore, ProductCatalog, ProductId, ProductSchema, StoreError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

const DEMO_CATALOG: &str = include_str!("../data/demo_catalog.json");

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Product schemas keyed by id, loaded once at startup.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryCatalog {
    schemas: Arc<BTreeMap<ProductId, ProductSchema>>,
}

impl InMemoryCatalog {
    pub(crate) fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let schemas: Vec<ProductSchema> = serde_json::from_str(raw)?;
        Ok(Self {
            schemas: Arc::new(
                schemas
                    .into_iter()
                    .map(|schema| (schema.product_id.clone(), schema))
                    .collect(),
            ),
        })
    }

    /// Bundled canyon tour and annual pass products.
    pub(crate) fn demo() -> Result<Self, serde_json::Error> {
        Self::from_json(DEMO_CATALOG)
    }

    /// Read a catalog file when one is given, otherwise fall back to the demo catalog.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                Ok(Self::from_json(&raw)?)
            }
            None => Ok(Self::demo()?),
        }
    }

    pub(crate) fn product_ids(&self) -> Vec<ProductId> {
        self.schemas.keys().cloned().collect()
    }
}

impl ProductCatalog for InMemoryCatalog {
    fn schema(&self, product_id: &ProductId) -> Result<Option<ProductSchema>, StoreError> {
        Ok(self.schemas.get(product_id).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPricingStore {
    rows: Arc<Mutex<HashMap<CellRef, PricingRow>>>,
}

impl InMemoryPricingStore {
    pub(crate) fn len(&self) -> usize {
        self.rows.lock().map(|guard| guard.len()).unwrap_or_default()
    }
}

impl PricingStore for InMemoryPricingStore {
    fn fetch_row(&self, cell: &CellRef) -> Result<Option<PricingRow>, StoreError> {
        let guard = self.rows.lock().map_err(|_| poisoned())?;
        Ok(guard.get(cell).cloned())
    }

    fn upsert_row(&self, row: PricingRow) -> Result<(), StoreError> {
        let mut guard = self.rows.lock().map_err(|_| poisoned())?;
        guard.insert(row.cell(), row);
        Ok(())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("pricing store mutex poisoned".to_string())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|err| format!("invalid date '{raw}': {err}"))
}
