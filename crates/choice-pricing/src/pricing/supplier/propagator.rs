use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::super::domain::{ChannelId, ProductId};
use super::super::matrix::{CellRef, PricingRow};
use super::super::store::{PricingStore, StoreError, SupplierCostSource};
use super::markup::apply_costs;

/// Failure while refreshing a single pricing row.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropagationError {
    #[error("failed to load supplier costs: {0}")]
    Costs(#[source] StoreError),
    #[error("failed to read pricing row: {0}")]
    Read(#[source] StoreError),
    #[error("failed to write pricing row: {0}")]
    Write(#[source] StoreError),
}

/// Pacing for bulk recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub batch_size: usize,
    pub batch_delay: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            batch_size: 25,
            batch_delay: Duration::from_millis(500),
        }
    }
}

/// Cells to recompute: every product x channel x date in `[start, start + days)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    pub products: Vec<ProductId>,
    pub channels: Vec<ChannelId>,
    pub start: NaiveDate,
    pub days: u32,
}

impl SyncPlan {
    pub fn cells(&self) -> Vec<CellRef> {
        let dates: Vec<NaiveDate> = (0..self.days)
            .filter_map(|offset| self.start.checked_add_days(Days::new(u64::from(offset))))
            .collect();

        let mut cells = Vec::with_capacity(self.products.len() * self.channels.len() * dates.len());
        for product_id in &self.products {
            for channel_id in &self.channels {
                for date in &dates {
                    cells.push(CellRef {
                        product_id: product_id.clone(),
                        channel_id: channel_id.clone(),
                        date: *date,
                    });
                }
            }
        }
        cells
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellFailure {
    pub cell: CellRef,
    pub error: String,
}

/// Outcome of a bulk run. Per-cell failures never abort the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub planned: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<CellFailure>,
    pub skipped: usize,
    pub cancelled: bool,
}

impl SyncReport {
    pub fn all_succeeded(&self) -> bool {
        !self.cancelled && self.failures.is_empty() && self.succeeded == self.planned
    }
}

/// Pushes supplier cost and markup into stored pricing rows.
pub struct MarkupPropagator<S, C> {
    store: Arc<S>,
    costs: Arc<C>,
    settings: SyncSettings,
}

impl<S, C> MarkupPropagator<S, C>
where
    S: PricingStore,
    C: SupplierCostSource,
{
    pub fn new(store: Arc<S>, costs: Arc<C>, settings: SyncSettings) -> Self {
        Self {
            store,
            costs,
            settings,
        }
    }

    pub fn settings(&self) -> SyncSettings {
        self.settings
    }

    /// Recompute one row from current supplier costs and write it back.
    ///
    /// A missing row is created from scratch. Running twice with unchanged costs leaves the same
    /// row behind.
    pub fn update_one(&self, cell: &CellRef) -> Result<PricingRow, PropagationError> {
        let costs = self
            .costs
            .costs_for(&cell.product_id)
            .map_err(PropagationError::Costs)?;

        let mut row = self
            .store
            .fetch_row(cell)
            .map_err(PropagationError::Read)?
            .unwrap_or_else(|| PricingRow::empty(cell));

        let applied = apply_costs(&mut row, &costs);
        self.store
            .upsert_row(row.clone())
            .map_err(PropagationError::Write)?;

        debug!(cell = %cell, applied, "pricing row refreshed from supplier costs");
        Ok(row)
    }

    /// Recompute every cell in the plan, pausing between batches.
    ///
    /// Cancellation is checked before each cell and during batch pauses; cells not reached are
    /// counted as skipped.
    pub async fn sync_all(&self, plan: &SyncPlan, cancel: &CancellationToken) -> SyncReport {
        let cells = plan.cells();
        let batch_size = self.settings.batch_size.max(1);
        let mut report = SyncReport {
            planned: cells.len(),
            ..SyncReport::default()
        };

        info!(
            cells = report.planned,
            batch_size,
            delay_ms = self.settings.batch_delay.as_millis() as u64,
            "starting supplier price sync"
        );

        for (index, cell) in cells.iter().enumerate() {
            if index > 0 && index % batch_size == 0 && !self.settings.batch_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.settings.batch_delay) => {}
                }
            }

            if cancel.is_cancelled() {
                report.cancelled = true;
                report.skipped = cells.len() - index;
                break;
            }

            report.attempted += 1;
            match self.update_one(cell) {
                Ok(_) => report.succeeded += 1,
                Err(err) => {
                    warn!(cell = %cell, error = %err, "pricing row refresh failed");
                    report.failures.push(CellFailure {
                        cell: cell.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        if report.cancelled {
            warn!(
                succeeded = report.succeeded,
                skipped = report.skipped,
                "supplier price sync cancelled"
            );
        } else {
            info!(
                succeeded = report.succeeded,
                failed = report.failures.len(),
                "supplier price sync finished"
            );
        }

        report
    }
}
