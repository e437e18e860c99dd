//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `links.rs` - Affiliate link registry operations
//! - `clicks.rs` - Click audit-trail operations
//! - `transactions.rs` - Ledger operations, including the atomic
//!   convert-and-post step
//! - `catalog.rs` - Product, creator, and coupon operations

mod catalog;
mod clicks;
mod links;
mod transactions;

use sqlx::sqlite::SqlitePool;

/// Aggregates recomputed from ledger rows during reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    pub clicks: i64,
    pub conversions: i64,
    pub revenue_minor: i64,
    pub commission_minor: i64,
}

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::Repository;
    use crate::db::migrations::init_db;
    use crate::domain::{
        AffiliateLink, BrandId, Creator, CreatorId, LinkId, Money, Product, ProductId, RateBps,
        Slug, TimeMs,
    };
    use tempfile::TempDir;

    pub async fn setup_test_db() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    /// Seed the creators/products rows that link foreign keys point at.
    pub async fn seed_catalog(repo: &Repository) {
        for creator_id in ["c1", "c2"] {
            repo.insert_creator(&Creator {
                id: CreatorId::new(creator_id),
                name: format!("Creator {}", creator_id),
                total_clicks: 0,
                total_conversions: 0,
                total_earnings: Money::zero(),
                created_at: TimeMs::new(0),
            })
            .await
            .expect("seed creator failed");
        }

        repo.insert_product(&Product {
            id: ProductId::new("p1"),
            brand_id: BrandId::new("b1"),
            name: "Sample Product".to_string(),
            product_url: "https://shop.example/p1".to_string(),
            price: Money::parse("2999").unwrap(),
            sale_price: None,
            commission_rate: RateBps::from_percent_str("15").unwrap(),
            cpc_rate: Money::zero(),
            creators_interested: 0,
            total_clicks: 0,
            total_conversions: 0,
            total_revenue: Money::zero(),
            created_at: TimeMs::new(0),
        })
        .await
        .expect("seed product failed");
    }

    pub fn sample_link(slug: &str) -> AffiliateLink {
        AffiliateLink {
            id: LinkId::new(format!("link-{}", slug)),
            creator_id: CreatorId::new("c1"),
            product_id: ProductId::new("p1"),
            brand_id: BrandId::new("b1"),
            slug: Slug::new(slug),
            active: true,
            clicks: 0,
            conversions: 0,
            revenue: Money::zero(),
            commission: Money::zero(),
            created_at: TimeMs::new(1_000),
        }
    }
}
