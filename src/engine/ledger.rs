//! Commission ledger: computes commissions and appends immutable
//! transaction rows, then bumps the projection counters.

use crate::db::Repository;
use crate::domain::{
    AttributionSource, Click, Money, Product, TimeMs, Transaction, TransactionId,
    TransactionStatus, TransactionType,
};
use std::sync::Arc;
use tracing::warn;

/// The only writer of Sale and Click ledger rows.
///
/// Sale rows are built here but inserted through the repository's
/// convert-and-post step so the insert shares a database transaction with
/// the converted-flag flip.
pub struct CommissionLedger {
    repo: Arc<Repository>,
}

impl CommissionLedger {
    pub fn new(repo: Arc<Repository>) -> Self {
        CommissionLedger { repo }
    }

    /// Build the Sale transaction for an attributed purchase.
    ///
    /// Commission is `gross * rate / 100`, computed in fixed-point minor
    /// units with half-up rounding (see `Money::commission_at`).
    pub fn sale_transaction(
        &self,
        click: &Click,
        product: &Product,
        order_id: &str,
        gross: Money,
        now: TimeMs,
    ) -> Transaction {
        Transaction {
            id: TransactionId::generate(),
            tx_type: TransactionType::Sale,
            brand_id: click.brand_id.clone(),
            creator_id: click.creator_id.clone(),
            product_id: click.product_id.clone(),
            link_id: click.link_id.clone(),
            click_id: Some(click.id.clone()),
            order_id: Some(order_id.to_string()),
            gross,
            commission: gross.commission_at(product.commission_rate),
            source: AttributionSource::Cookie,
            status: TransactionStatus::Completed,
            created_at: now,
        }
    }

    /// Post a fixed CPC accrual for an admitted click.
    ///
    /// # Errors
    /// Returns an error if the ledger insert fails. Projection counter
    /// bumps are best-effort and only logged on failure.
    pub async fn post_click(
        &self,
        click: &Click,
        product: &Product,
        now: TimeMs,
    ) -> Result<Transaction, sqlx::Error> {
        let txn = Transaction {
            id: TransactionId::generate(),
            tx_type: TransactionType::Click,
            brand_id: click.brand_id.clone(),
            creator_id: click.creator_id.clone(),
            product_id: click.product_id.clone(),
            link_id: click.link_id.clone(),
            click_id: Some(click.id.clone()),
            order_id: None,
            gross: Money::zero(),
            commission: product.cpc_rate,
            source: AttributionSource::Direct,
            status: TransactionStatus::Completed,
            created_at: now,
        };

        self.repo.insert_transaction(&txn).await?;

        if let Err(e) = self.repo.add_link_commission(&txn.link_id, txn.commission).await {
            warn!(link = %txn.link_id, error = %e, "CPC link counter bump failed; reconcile will repair");
        }
        if let Err(e) = self
            .repo
            .add_creator_earnings(&txn.creator_id, txn.commission)
            .await
        {
            warn!(creator = %txn.creator_id, error = %e, "CPC creator counter bump failed; reconcile will repair");
        }

        Ok(txn)
    }

    /// Bump link/product/creator projections for a posted Sale.
    ///
    /// Best-effort: the ledger row is already committed and the counters
    /// are a repairable cache, so failures are logged and the sale stands.
    pub async fn apply_sale_projections(&self, txn: &Transaction) {
        if let Err(e) = self
            .repo
            .apply_link_conversion(&txn.link_id, txn.gross, txn.commission)
            .await
        {
            warn!(link = %txn.link_id, error = %e, "Sale link counter bump failed; reconcile will repair");
        }
        if let Err(e) = self
            .repo
            .apply_product_conversion(&txn.product_id, txn.gross)
            .await
        {
            warn!(product = %txn.product_id, error = %e, "Sale product counter bump failed; reconcile will repair");
        }
        if let Err(e) = self
            .repo
            .apply_creator_conversion(&txn.creator_id, txn.commission)
            .await
        {
            warn!(creator = %txn.creator_id, error = %e, "Sale creator counter bump failed; reconcile will repair");
        }
    }
}
