//! Catalog entities consumed by the attribution engine: products and
//! creators. CRUD for these lives outside this service; the engine only
//! reads rates/URLs and bumps projection counters.

use crate::domain::{BrandId, CreatorId, Money, ProductId, RateBps, TimeMs};
use serde::{Deserialize, Serialize};

/// A promotable catalog entry owned by a brand.
///
/// `total_*` counters are derived, eventually-consistent projections of
/// the Click/Transaction streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub brand_id: BrandId,
    pub name: String,
    pub product_url: String,
    pub price: Money,
    pub sale_price: Option<Money>,
    pub commission_rate: RateBps,
    /// Fixed accrual per admitted click; zero disables CPC.
    pub cpc_rate: Money,
    pub creators_interested: i64,
    pub total_clicks: i64,
    pub total_conversions: i64,
    pub total_revenue: Money,
    pub created_at: TimeMs,
}

impl Product {
    /// Effective price shown to buyers (sale price wins when set).
    pub fn effective_price(&self) -> Money {
        self.sale_price.unwrap_or(self.price)
    }
}

/// A creator account, counters only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub id: CreatorId,
    pub name: String,
    pub total_clicks: i64,
    pub total_conversions: i64,
    pub total_earnings: Money,
    pub created_at: TimeMs,
}
