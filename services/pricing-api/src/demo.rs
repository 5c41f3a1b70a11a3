use crate::infra::{InMemoryCatalog, InMemoryPricingStore};
use chrono::{Local, NaiveDate};
use choice_pricing::config::AppConfig;
use choice_pricing::error::AppError;
use choice_pricing::pricing::{
    CellRef, ChannelId, MarkupPropagator, PriceQuote, PricingOrchestrator, PricingRequest,
    PricingService, SupplierCostSheet, SyncPlan, SyncReport,
};
use choice_pricing::telemetry;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// JSON pricing request (product, channel, date, party, selections)
    #[arg(long)]
    pub(crate) request: PathBuf,
    /// Product catalog JSON file (defaults to the bundled demo catalog)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Supplier cost sheet to apply to the request's matrix row before pricing
    #[arg(long)]
    pub(crate) supplier_csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct SyncArgs {
    /// Supplier cost sheet (product_id,combination_key,supplier_price,markup_percent,markup_amount)
    #[arg(long)]
    pub(crate) supplier_csv: PathBuf,
    /// Product catalog JSON file (defaults to the bundled demo catalog)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// First travel date to refresh (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Number of days to refresh. Defaults to PRICING_SYNC_WINDOW_DAYS.
    #[arg(long)]
    pub(crate) days: Option<u32>,
    /// Sales channels to refresh
    #[arg(long = "channel", default_values_t = vec!["direct".to_string()])]
    pub(crate) channels: Vec<String>,
}

pub(crate) fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let QuoteArgs {
        request,
        catalog,
        supplier_csv,
    } = args;

    let config = AppConfig::load()?;
    let raw = std::fs::read_to_string(&request)?;
    let request: PricingRequest = serde_json::from_str(&raw)?;

    let catalog = Arc::new(InMemoryCatalog::load(catalog.as_deref())?);
    let store = Arc::new(InMemoryPricingStore::default());

    if let Some(path) = supplier_csv {
        let sheet = SupplierCostSheet::from_path(&path)?;
        let propagator =
            MarkupPropagator::new(store.clone(), Arc::new(sheet), config.sync.settings());
        propagator.update_one(&CellRef {
            product_id: request.product_id.clone(),
            channel_id: request.channel_id.clone(),
            date: request.date,
        })?;
    }

    let service = PricingService::new(
        catalog,
        store,
        PricingOrchestrator::new(config.pricing.fallback_policy),
    );
    let quote = service.quote(request.clone())?;
    render_quote(&request, &quote);

    Ok(())
}

pub(crate) async fn run_sync(args: SyncArgs) -> Result<(), AppError> {
    let SyncArgs {
        supplier_csv,
        catalog,
        start,
        days,
        channels,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let sheet = SupplierCostSheet::from_path(&supplier_csv)?;
    let catalog = InMemoryCatalog::load(catalog.as_deref())?;
    let store = Arc::new(InMemoryPricingStore::default());
    info!(
        costs = sheet.len(),
        sheet = %supplier_csv.display(),
        "loaded supplier cost sheet"
    );

    let plan = SyncPlan {
        products: catalog.product_ids(),
        channels: channels.into_iter().map(ChannelId).collect(),
        start: start.unwrap_or_else(|| Local::now().date_naive()),
        days: days.unwrap_or(config.sync.window_days),
    };

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("interrupt received, stopping supplier sync");
                signal_token.cancel();
            }
            Err(err) => warn!(error = %err, "failed to listen for interrupt"),
        }
    });

    let propagator = MarkupPropagator::new(store.clone(), Arc::new(sheet), config.sync.settings());
    let report = propagator.sync_all(&plan, &cancel).await;
    render_sync_report(&plan, &report, store.len());

    Ok(())
}

fn render_quote(request: &PricingRequest, quote: &PriceQuote) {
    let breakdown = &quote.breakdown;

    println!("Reservation quote");
    println!(
        "Product: {} | Channel: {} | Date: {}",
        request.product_id.0, request.channel_id.0, request.date
    );
    println!(
        "Party: {} adult(s), {} child(ren), {} infant(s)",
        request.party.adults, request.party.children, request.party.infants
    );
    if let Some(key) = &breakdown.combination_key {
        println!("Combination: {}", key);
    }

    println!("\nComponents");
    for component in &breakdown.components {
        match &component.source {
            Some(source) => println!(
                "  - {:<32} {:>10.2}  ({:?})",
                component.label, component.amount, source
            ),
            None => println!("  - {:<32} {:>10.2}", component.label, component.amount),
        }
    }

    println!("\nBase price:     {:>10.2}", breakdown.base_price);
    println!("Choices total:  {:>10.2}", breakdown.choices_total);
    println!("Options total:  {:>10.2}", breakdown.options_total);
    println!("Discount:       {:>10.2}", breakdown.discount_total);
    println!("Final total:    {:>10.2}", breakdown.final_total);

    if let Some(covered) = breakdown.covered_people {
        println!(
            "Annual passes: {} buyer(s), {} companion(s), {} people covered",
            breakdown.annual_pass_buyers.unwrap_or_default(),
            breakdown.companions.unwrap_or_default(),
            covered
        );
    }

    if breakdown.requires_review() {
        println!("\nNeeds review:");
        for flag in &breakdown.review_flags {
            println!("  - {}", flag);
        }
    }
}

fn render_sync_report(plan: &SyncPlan, report: &SyncReport, rows_stored: usize) {
    println!("Supplier sync");
    println!(
        "Window: {} (+{} days) | Products: {} | Channels: {}",
        plan.start,
        plan.days,
        plan.products.len(),
        plan.channels.len()
    );
    println!(
        "Cells planned: {} | attempted: {} | succeeded: {} | skipped: {}",
        report.planned, report.attempted, report.succeeded, report.skipped
    );
    println!("Rows stored: {}", rows_stored);

    if report.cancelled {
        println!("Run was cancelled before completion");
    }

    if report.failures.is_empty() {
        println!("Failures: none");
    } else {
        println!("Failures:");
        for failure in &report.failures {
            println!("  - {}: {}", failure.cell, failure.error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_request_prices_against_demo_catalog() {
        let request: PricingRequest =
            serde_json::from_str(include_str!("../data/quote_request.json"))
                .expect("request parses");
        let service = PricingService::new(
            Arc::new(InMemoryCatalog::demo().expect("demo catalog parses")),
            Arc::new(InMemoryPricingStore::default()),
            PricingOrchestrator::default(),
        );

        let quote = service.quote(request).expect("quote succeeds");

        assert_eq!(quote.breakdown.base_price, 280.0);
        assert!(!quote.breakdown.requires_review());
        assert!(quote.breakdown.final_total > quote.breakdown.base_price);
    }

    #[test]
    fn bundled_supplier_sheet_parses() {
        let sheet = SupplierCostSheet::from_reader(std::io::Cursor::new(include_str!(
            "../data/supplier_costs.csv"
        )))
        .expect("sheet parses");

        assert_eq!(sheet.len(), 4);
        assert_eq!(sheet.products().len(), 1);
    }
}
