//! Click: one admitted, trackable visit through a link.

use crate::domain::{BrandId, ClickId, ClickToken, CreatorId, LinkId, ProductId, TimeMs};
use serde::{Deserialize, Serialize};

/// Origin metadata captured from the inbound request.
///
/// Informational only; none of it participates in attribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

/// One admitted click, the unit of the attribution audit trail.
///
/// The token is globally unique; `converted` flips false->true exactly
/// once and never back. Click rows are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Click {
    pub id: ClickId,
    pub token: ClickToken,
    pub link_id: LinkId,
    // Denormalized for query speed on the postback path.
    pub creator_id: CreatorId,
    pub product_id: ProductId,
    pub brand_id: BrandId,
    pub context: RequestContext,
    pub converted: bool,
    pub expires_at: TimeMs,
    pub created_at: TimeMs,
}

impl Click {
    /// Create an unconverted click expiring `window_days` after `now`.
    pub fn new(
        link_id: LinkId,
        creator_id: CreatorId,
        product_id: ProductId,
        brand_id: BrandId,
        context: RequestContext,
        now: TimeMs,
        window_days: i64,
    ) -> Self {
        Click {
            id: ClickId::generate(),
            token: ClickToken::generate(),
            link_id,
            creator_id,
            product_id,
            brand_id,
            context,
            converted: false,
            expires_at: now.plus_days(window_days),
            created_at: now,
        }
    }

    /// True once the attribution window has passed.
    pub fn is_expired(&self, now: TimeMs) -> bool {
        now > self.expires_at
    }
}
