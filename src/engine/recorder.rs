//! Click recorder: admits inbound tracking hits and persists the click
//! audit trail.

use crate::db::Repository;
use crate::domain::{AffiliateLink, Click, Product, RequestContext, TimeMs};
use crate::engine::CommissionLedger;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("link is inactive")]
    LinkInactive,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Admits clicks: one Click insert, best-effort projection bumps, and an
/// optional CPC accrual. Cookie issuance and the redirect itself belong
/// to the gateway.
pub struct ClickRecorder {
    repo: Arc<Repository>,
    ledger: CommissionLedger,
    window_days: i64,
}

impl ClickRecorder {
    pub fn new(repo: Arc<Repository>, window_days: i64) -> Self {
        let ledger = CommissionLedger::new(repo.clone());
        ClickRecorder {
            repo,
            ledger,
            window_days,
        }
    }

    /// Attribution window applied to every admitted click, in days.
    pub fn window_days(&self) -> i64 {
        self.window_days
    }

    /// Record one admitted click through an active link.
    ///
    /// The Click row is the source of truth; the link/product/creator
    /// counter bumps are projections and never fail the admit. A CPC
    /// accrual is posted when the product carries a per-click rate.
    ///
    /// # Errors
    /// `LinkInactive` for deactivated links; `Db` only when the Click row
    /// itself cannot be written (the gateway then fails open and
    /// redirects anyway).
    pub async fn record_click(
        &self,
        link: &AffiliateLink,
        product: &Product,
        context: RequestContext,
    ) -> Result<Click, RecordError> {
        if !link.active {
            return Err(RecordError::LinkInactive);
        }

        let now = TimeMs::now();
        let click = Click::new(
            link.id.clone(),
            link.creator_id.clone(),
            link.product_id.clone(),
            link.brand_id.clone(),
            context,
            now,
            self.window_days,
        );
        self.repo.insert_click(&click).await?;

        if let Err(e) = self.repo.increment_link_clicks(&link.id).await {
            warn!(link = %link.id, error = %e, "Link click counter bump failed; reconcile will repair");
        }
        if let Err(e) = self.repo.increment_product_clicks(&product.id).await {
            warn!(product = %product.id, error = %e, "Product click counter bump failed; reconcile will repair");
        }
        if let Err(e) = self.repo.increment_creator_clicks(&link.creator_id).await {
            warn!(creator = %link.creator_id, error = %e, "Creator click counter bump failed; reconcile will repair");
        }

        if !product.cpc_rate.is_zero() {
            if let Err(e) = self.ledger.post_click(&click, product, now).await {
                warn!(click = %click.id, error = %e, "CPC accrual failed; reconcile will surface the gap");
            }
        }

        Ok(click)
    }
}
