//! Domain model for the click attribution and commission ledger core.

pub mod catalog;
pub mod click;
pub mod coupon;
pub mod link;
pub mod money;
pub mod primitives;
pub mod transaction;

pub use catalog::{Creator, Product};
pub use click::{Click, RequestContext};
pub use coupon::Coupon;
pub use link::AffiliateLink;
pub use money::{Money, MoneyError, RateBps};
pub use primitives::{
    BrandId, ClickId, ClickToken, CreatorId, LinkId, ProductId, Slug, TimeMs, TransactionId,
};
pub use transaction::{AttributionSource, Transaction, TransactionStatus, TransactionType};
