//! Attribution window tracker: associates a conversion with its
//! originating click, exactly once, within the attribution window.

use crate::db::Repository;
use crate::domain::{ClickToken, Money, TimeMs, Transaction};
use crate::engine::CommissionLedger;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Ordered failure modes of the postback path. Each maps to a distinct
/// pixel status; none of them surfaces to the merchant page.
#[derive(Debug, Error)]
pub enum AttributionError {
    #[error("no click token accompanied the conversion")]
    MissingAttribution,
    #[error("no click found for the supplied token")]
    UnknownClick,
    #[error("click was already credited with a sale")]
    AlreadyConverted,
    #[error("attribution window expired before the conversion arrived")]
    AttributionExpired,
    #[error("click references a product that no longer resolves: {0}")]
    DanglingProduct(String),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Tracks conversions back to clicks and hands qualifying ones to the
/// commission ledger.
pub struct AttributionTracker {
    repo: Arc<Repository>,
    ledger: CommissionLedger,
}

impl AttributionTracker {
    pub fn new(repo: Arc<Repository>) -> Self {
        let ledger = CommissionLedger::new(repo.clone());
        AttributionTracker { repo, ledger }
    }

    /// Attribute a conversion to its click and post the Sale transaction.
    ///
    /// Preconditions are checked in order: token present, click known,
    /// not yet converted, window still open. The converted-flag flip and
    /// the Sale insert happen in one database transaction, so a retried
    /// postback racing this call resolves to `AlreadyConverted` rather
    /// than a second Sale row.
    ///
    /// # Errors
    /// One of the `AttributionError` variants; no Transaction is written
    /// on any error path.
    pub async fn attribute(
        &self,
        token: Option<&ClickToken>,
        order_id: &str,
        gross: Money,
    ) -> Result<Transaction, AttributionError> {
        let token = token.ok_or(AttributionError::MissingAttribution)?;

        let click = self
            .repo
            .get_click_by_token(token)
            .await?
            .ok_or(AttributionError::UnknownClick)?;

        if click.converted {
            return Err(AttributionError::AlreadyConverted);
        }

        let now = TimeMs::now();
        if click.is_expired(now) {
            return Err(AttributionError::AttributionExpired);
        }

        let product = self
            .repo
            .get_product(&click.product_id)
            .await?
            .ok_or_else(|| AttributionError::DanglingProduct(click.product_id.to_string()))?;

        let txn = self
            .ledger
            .sale_transaction(&click, &product, order_id, gross, now);

        let posted = self
            .repo
            .convert_click_and_insert_sale(token, &txn)
            .await?;
        if !posted {
            // Lost the race against a concurrent postback for this click.
            return Err(AttributionError::AlreadyConverted);
        }

        self.ledger.apply_sale_projections(&txn).await;

        info!(
            order_id,
            link = %txn.link_id,
            commission = %txn.commission,
            "Sale attributed"
        );
        Ok(txn)
    }
}
