use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::pricing::bundle::BundleRule;
use crate::pricing::domain::{
    ChannelId, ChoiceGroup, ChoiceOption, PartySize, PersonPrices, PricingMode, PricingRequest,
    ProductId, ProductSchema, Selection, SelectionArity,
};
use crate::pricing::matrix::{CellRef, ChoicePrice, PricingRow};
use crate::pricing::store::{PricingStore, ProductCatalog, StoreError, SupplierCostSource};
use crate::pricing::supplier::SupplierCost;

pub(super) const CANYON_TOUR: &str = "canyon-tour";
pub(super) const ANNUAL_PASS: &str = "grand-canyon-pass";
pub(super) const DIRECT: &str = "direct";

pub(super) fn travel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 14).expect("valid date")
}

pub(super) fn option(id: &str, key: &str, adult: f64, child: f64) -> ChoiceOption {
    ChoiceOption {
        option_id: id.to_string(),
        option_key: key.to_string(),
        name: key.replace('_', " "),
        prices: PersonPrices {
            adult,
            child,
            infant: 0.0,
        },
        capacity: None,
        is_default: false,
        active: true,
        sort_order: 0,
    }
}

pub(super) fn group(
    id: &str,
    arity: SelectionArity,
    required: bool,
    options: Vec<ChoiceOption>,
) -> ChoiceGroup {
    ChoiceGroup {
        group_id: id.to_string(),
        name: id.to_string(),
        localized_names: BTreeMap::new(),
        arity,
        required,
        min_select: 0,
        max_select: None,
        sort_order: 0,
        active: true,
        options,
    }
}

/// Flat product: required canyon, optional transport, quantity-priced extras.
pub(super) fn canyon_schema() -> ProductSchema {
    ProductSchema {
        product_id: ProductId(CANYON_TOUR.to_string()),
        name: "Antelope Canyon Tour".to_string(),
        base_prices: PersonPrices {
            adult: 100.0,
            child: 80.0,
            infant: 0.0,
        },
        pricing_mode: PricingMode::Flat,
        groups: vec![
            group(
                "canyon",
                SelectionArity::Single,
                true,
                vec![
                    option("opt-lower", "lower_antelope", 50.0, 40.0),
                    option("opt-upper", "upper_antelope", 60.0, 50.0),
                ],
            ),
            group(
                "transport",
                SelectionArity::Single,
                false,
                vec![
                    option("opt-van", "van", 20.0, 20.0),
                    option("opt-jeep", "jeep", 35.0, 35.0),
                ],
            ),
            group(
                "extras",
                SelectionArity::Quantity,
                false,
                vec![option("opt-photo", "photo_pack", 15.0, 15.0)],
            ),
        ],
    }
}

fn pass_options() -> Vec<ChoiceOption> {
    vec![
        option("opt-buyer", "annual_pass_buyer", 0.0, 0.0),
        option("opt-companion", "annual_pass_companion", 0.0, 0.0),
        option("opt-us", "us_resident", 0.0, 0.0),
        option("opt-intl", "non_resident", 0.0, 0.0),
    ]
}

/// Bundle product whose fee options repeat across two canyon groups.
pub(super) fn annual_pass_schema() -> ProductSchema {
    ProductSchema {
        product_id: ProductId(ANNUAL_PASS.to_string()),
        name: "Grand Canyon Entrance".to_string(),
        base_prices: PersonPrices::default(),
        pricing_mode: PricingMode::Bundle(BundleRule::annual_pass()),
        groups: vec![
            group(
                "south_rim_fees",
                SelectionArity::Multiple,
                false,
                pass_options(),
            ),
            group(
                "north_rim_fees",
                SelectionArity::Multiple,
                false,
                pass_options(),
            ),
        ],
    }
}

pub(super) fn sel(group_id: &str, option_id: &str, option_key: &str) -> Selection {
    Selection::new(group_id, option_id, Some(option_key))
}

pub(super) fn lower_with_van() -> Vec<Selection> {
    vec![
        sel("transport", "opt-van", "van"),
        sel("canyon", "opt-lower", "lower_antelope"),
    ]
}

pub(super) fn request(
    product: &str,
    party: PartySize,
    selections: Vec<Selection>,
) -> PricingRequest {
    PricingRequest {
        product_id: ProductId(product.to_string()),
        channel_id: ChannelId(DIRECT.to_string()),
        date: travel_date(),
        party,
        selections,
        discount: None,
    }
}

pub(super) fn cell(product: &str) -> CellRef {
    CellRef {
        product_id: ProductId(product.to_string()),
        channel_id: ChannelId(DIRECT.to_string()),
        date: travel_date(),
    }
}

pub(super) fn sale_price(amount: f64) -> ChoicePrice {
    ChoicePrice {
        ota_sale_price: Some(amount),
        ..ChoicePrice::default()
    }
}

pub(super) fn person_price(adult: f64, child: f64) -> ChoicePrice {
    ChoicePrice {
        adult_price: Some(adult),
        child_price: Some(child),
        ..ChoicePrice::default()
    }
}

pub(super) fn row_with(product: &str, entries: Vec<(&str, ChoicePrice)>) -> PricingRow {
    let mut row = PricingRow::empty(&cell(product));
    for (key, price) in entries {
        row.choices.insert(key, price);
    }
    row
}

#[derive(Default, Clone)]
pub(super) struct MemoryCatalog {
    schemas: Arc<Mutex<HashMap<ProductId, ProductSchema>>>,
}

impl MemoryCatalog {
    pub(super) fn with(schemas: Vec<ProductSchema>) -> Self {
        let catalog = Self::default();
        {
            let mut guard = catalog.schemas.lock().expect("catalog mutex poisoned");
            for schema in schemas {
                guard.insert(schema.product_id.clone(), schema);
            }
        }
        catalog
    }
}

impl ProductCatalog for MemoryCatalog {
    fn schema(&self, product_id: &ProductId) -> Result<Option<ProductSchema>, StoreError> {
        let guard = self.schemas.lock().expect("catalog mutex poisoned");
        Ok(guard.get(product_id).cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    pub(super) rows: Arc<Mutex<HashMap<CellRef, PricingRow>>>,
    writes: Arc<Mutex<usize>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl MemoryStore {
    pub(super) fn with_rows(rows: Vec<PricingRow>) -> Self {
        let store = Self::default();
        {
            let mut guard = store.rows.lock().expect("store mutex poisoned");
            for row in rows {
                guard.insert(row.cell(), row);
            }
        }
        store
    }

    /// Cancel `token` once `writes` rows have been stored.
    pub(super) fn cancelling_after(writes: usize, token: CancellationToken) -> Self {
        Self {
            cancel_after: Some((writes, token)),
            ..Self::default()
        }
    }

    pub(super) fn row(&self, cell: &CellRef) -> Option<PricingRow> {
        self.rows
            .lock()
            .expect("store mutex poisoned")
            .get(cell)
            .cloned()
    }

    pub(super) fn len(&self) -> usize {
        self.rows.lock().expect("store mutex poisoned").len()
    }
}

impl PricingStore for MemoryStore {
    fn fetch_row(&self, cell: &CellRef) -> Result<Option<PricingRow>, StoreError> {
        Ok(self.row(cell))
    }

    fn upsert_row(&self, row: PricingRow) -> Result<(), StoreError> {
        self.rows
            .lock()
            .expect("store mutex poisoned")
            .insert(row.cell(), row);

        let mut writes = self.writes.lock().expect("write counter poisoned");
        *writes += 1;
        if let Some((limit, token)) = &self.cancel_after {
            if *writes >= *limit {
                token.cancel();
            }
        }
        Ok(())
    }
}

pub(super) struct UnavailableStore;

impl PricingStore for UnavailableStore {
    fn fetch_row(&self, _cell: &CellRef) -> Result<Option<PricingRow>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn upsert_row(&self, _row: PricingRow) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

/// Accepts writes for every product except one.
pub(super) struct RejectingStore {
    pub(super) inner: MemoryStore,
    pub(super) rejected: ProductId,
}

impl PricingStore for RejectingStore {
    fn fetch_row(&self, cell: &CellRef) -> Result<Option<PricingRow>, StoreError> {
        self.inner.fetch_row(cell)
    }

    fn upsert_row(&self, row: PricingRow) -> Result<(), StoreError> {
        if row.product_id == self.rejected {
            return Err(StoreError::Unavailable("row locked".to_string()));
        }
        self.inner.upsert_row(row)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryCosts {
    costs: Vec<SupplierCost>,
}

impl MemoryCosts {
    pub(super) fn with(costs: Vec<SupplierCost>) -> Self {
        Self { costs }
    }
}

impl SupplierCostSource for MemoryCosts {
    fn costs_for(&self, product_id: &ProductId) -> Result<Vec<SupplierCost>, StoreError> {
        Ok(self
            .costs
            .iter()
            .filter(|cost| &cost.product_id == product_id)
            .cloned()
            .collect())
    }
}

pub(super) fn supplier_cost(
    product: &str,
    combination_key: Option<&str>,
    supplier_price: f64,
    markup_percent: f64,
    markup_amount: f64,
) -> SupplierCost {
    SupplierCost {
        product_id: ProductId(product.to_string()),
        combination_key: combination_key.map(str::to_string),
        supplier_price,
        markup_percent,
        markup_amount,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
