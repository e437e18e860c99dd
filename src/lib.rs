pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;

pub use config::Config;
pub use db::{init_db, LedgerTotals, Repository};
pub use domain::{
    AffiliateLink, Click, ClickToken, Creator, CreatorId, Money, Product, ProductId, RateBps, Slug,
    TimeMs, Transaction,
};
pub use engine::{
    AttributionError, AttributionTracker, ClickRecorder, CommissionLedger, LinkRegistry,
    Reconciler,
};
pub use error::AppError;
