//! Affiliate link: a creator's right to promote a product.

use crate::domain::{BrandId, CreatorId, LinkId, Money, ProductId, Slug, TimeMs};
use serde::{Deserialize, Serialize};

/// One affiliate link.
///
/// At most one link exists per (creator, product) pair; the slug is
/// globally unique and immutable once minted. Links are soft-deactivated
/// via `active`, never deleted. Counters are eventually-consistent
/// projections of the Click/Transaction ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliateLink {
    pub id: LinkId,
    pub creator_id: CreatorId,
    pub product_id: ProductId,
    pub brand_id: BrandId,
    pub slug: Slug,
    pub active: bool,
    pub clicks: i64,
    pub conversions: i64,
    pub revenue: Money,
    pub commission: Money,
    pub created_at: TimeMs,
}

impl AffiliateLink {
    /// Create a fresh, active link with zeroed counters.
    pub fn new(
        creator_id: CreatorId,
        product_id: ProductId,
        brand_id: BrandId,
        slug: Slug,
        created_at: TimeMs,
    ) -> Self {
        AffiliateLink {
            id: LinkId::generate(),
            creator_id,
            product_id,
            brand_id,
            slug,
            active: true,
            clicks: 0,
            conversions: 0,
            revenue: Money::zero(),
            commission: Money::zero(),
            created_at,
        }
    }

    /// The shareable tracking path for this link.
    pub fn tracking_path(&self) -> String {
        format!("/r/{}", self.slug)
    }
}
