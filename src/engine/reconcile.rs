//! Counter reconciliation.
//!
//! Click and Transaction rows are the source of truth; the counters on
//! links, products, and creators are a derived cache. This sweep
//! recomputes every counter from the ledger and overwrites the cache.

use crate::db::Repository;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Summary of one reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub links: usize,
    pub products: usize,
    pub creators: usize,
}

pub struct Reconciler {
    repo: Arc<Repository>,
}

impl Reconciler {
    pub fn new(repo: Arc<Repository>) -> Self {
        Reconciler { repo }
    }

    /// Recompute all projection counters from ledger rows.
    ///
    /// # Errors
    /// Returns an error if any aggregate query or counter write fails;
    /// entities already swept stay repaired.
    pub async fn reconcile_all(&self) -> Result<ReconcileReport, sqlx::Error> {
        let mut report = ReconcileReport::default();

        for link_id in self.repo.list_link_ids().await? {
            let totals = self.repo.ledger_totals_for_link(&link_id).await?;
            self.repo.set_link_counters(&link_id, totals).await?;
            report.links += 1;
        }

        for product_id in self.repo.list_product_ids().await? {
            let totals = self.repo.ledger_totals_for_product(&product_id).await?;
            self.repo.set_product_counters(&product_id, totals).await?;
            report.products += 1;
        }

        for creator_id in self.repo.list_creator_ids().await? {
            let totals = self.repo.ledger_totals_for_creator(&creator_id).await?;
            self.repo.set_creator_counters(&creator_id, totals).await?;
            report.creators += 1;
        }

        info!(
            links = report.links,
            products = report.products,
            creators = report.creators,
            "Reconciliation sweep complete"
        );
        Ok(report)
    }
}
