//! Product, creator, and coupon operations.

use crate::domain::{
    BrandId, Coupon, Creator, CreatorId, Money, Product, ProductId, RateBps, TimeMs,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::Repository;

fn product_from_row(row: &SqliteRow) -> Product {
    Product {
        id: ProductId::new(row.get::<String, _>("id")),
        brand_id: BrandId::new(row.get::<String, _>("brand_id")),
        name: row.get("name"),
        product_url: row.get("product_url"),
        price: Money::from_minor(row.get("price_minor")),
        sale_price: row
            .get::<Option<i64>, _>("sale_price_minor")
            .map(Money::from_minor),
        commission_rate: RateBps::from_bps(row.get("commission_rate_bps")),
        cpc_rate: Money::from_minor(row.get("cpc_rate_minor")),
        creators_interested: row.get("creators_interested"),
        total_clicks: row.get("total_clicks"),
        total_conversions: row.get("total_conversions"),
        total_revenue: Money::from_minor(row.get("total_revenue_minor")),
        created_at: TimeMs::new(row.get("created_at")),
    }
}

fn creator_from_row(row: &SqliteRow) -> Creator {
    Creator {
        id: CreatorId::new(row.get::<String, _>("id")),
        name: row.get("name"),
        total_clicks: row.get("total_clicks"),
        total_conversions: row.get("total_conversions"),
        total_earnings: Money::from_minor(row.get("total_earnings_minor")),
        created_at: TimeMs::new(row.get("created_at")),
    }
}

fn coupon_from_row(row: &SqliteRow) -> Coupon {
    Coupon {
        id: row.get("id"),
        code: row.get("code"),
        product_id: row
            .get::<Option<String>, _>("product_id")
            .map(ProductId::new),
        active: row.get::<i64, _>("active") != 0,
        expires_at: row.get::<Option<i64>, _>("expires_at").map(TimeMs::new),
        usage_limit: row.get("usage_limit"),
        usage_count: row.get("usage_count"),
        created_at: TimeMs::new(row.get("created_at")),
    }
}

impl Repository {
    /// Insert a product.
    pub async fn insert_product(&self, product: &Product) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, brand_id, name, product_url, price_minor, sale_price_minor,
                commission_rate_bps, cpc_rate_minor, creators_interested,
                total_clicks, total_conversions, total_revenue_minor, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(product.id.as_str())
        .bind(product.brand_id.as_str())
        .bind(&product.name)
        .bind(&product.product_url)
        .bind(product.price.minor())
        .bind(product.sale_price.map(|p| p.minor()))
        .bind(product.commission_rate.as_bps())
        .bind(product.cpc_rate.minor())
        .bind(product.creators_interested)
        .bind(product.total_clicks)
        .bind(product.total_conversions)
        .bind(product.total_revenue.minor())
        .bind(product.created_at.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch a product by id.
    pub async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM products WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(product_from_row))
    }

    /// Bump the count of creators promoting this product.
    pub async fn increment_product_creators_interested(
        &self,
        id: &ProductId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE products SET creators_interested = creators_interested + 1 WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Bump the product's click projection counter.
    pub async fn increment_product_clicks(&self, id: &ProductId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE products SET total_clicks = total_clicks + 1 WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Apply a conversion to the product's projection counters.
    pub async fn apply_product_conversion(
        &self,
        id: &ProductId,
        revenue: Money,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE products SET
                total_conversions = total_conversions + 1,
                total_revenue_minor = total_revenue_minor + ?
            WHERE id = ?
            "#,
        )
        .bind(revenue.minor())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Overwrite the product's projection counters with ledger-derived totals.
    pub async fn set_product_counters(
        &self,
        id: &ProductId,
        totals: super::LedgerTotals,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE products SET
                total_clicks = ?,
                total_conversions = ?,
                total_revenue_minor = ?
            WHERE id = ?
            "#,
        )
        .bind(totals.clicks)
        .bind(totals.conversions)
        .bind(totals.revenue_minor)
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List all product ids, for reconciliation sweeps.
    pub async fn list_product_ids(&self) -> Result<Vec<ProductId>, sqlx::Error> {
        let rows = sqlx::query("SELECT id FROM products ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|r| ProductId::new(r.get::<String, _>("id")))
            .collect())
    }

    /// Insert a creator.
    pub async fn insert_creator(&self, creator: &Creator) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO creators (
                id, name, total_clicks, total_conversions, total_earnings_minor, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(creator.id.as_str())
        .bind(&creator.name)
        .bind(creator.total_clicks)
        .bind(creator.total_conversions)
        .bind(creator.total_earnings.minor())
        .bind(creator.created_at.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch a creator by id.
    pub async fn get_creator(&self, id: &CreatorId) -> Result<Option<Creator>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM creators WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(creator_from_row))
    }

    /// Bump the creator's click projection counter.
    pub async fn increment_creator_clicks(&self, id: &CreatorId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE creators SET total_clicks = total_clicks + 1 WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Apply a conversion to the creator's projection counters.
    pub async fn apply_creator_conversion(
        &self,
        id: &CreatorId,
        earnings: Money,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE creators SET
                total_conversions = total_conversions + 1,
                total_earnings_minor = total_earnings_minor + ?
            WHERE id = ?
            "#,
        )
        .bind(earnings.minor())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Add CPC earnings to a creator without touching conversion counts.
    pub async fn add_creator_earnings(
        &self,
        id: &CreatorId,
        earnings: Money,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE creators SET total_earnings_minor = total_earnings_minor + ? WHERE id = ?")
            .bind(earnings.minor())
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Overwrite the creator's projection counters with ledger-derived totals.
    pub async fn set_creator_counters(
        &self,
        id: &CreatorId,
        totals: super::LedgerTotals,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE creators SET
                total_clicks = ?,
                total_conversions = ?,
                total_earnings_minor = ?
            WHERE id = ?
            "#,
        )
        .bind(totals.clicks)
        .bind(totals.conversions)
        .bind(totals.commission_minor)
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List all creator ids, for reconciliation sweeps.
    pub async fn list_creator_ids(&self) -> Result<Vec<CreatorId>, sqlx::Error> {
        let rows = sqlx::query("SELECT id FROM creators ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|r| CreatorId::new(r.get::<String, _>("id")))
            .collect())
    }

    /// Insert a coupon.
    pub async fn insert_coupon(&self, coupon: &Coupon) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, product_id, active, expires_at, usage_limit, usage_count, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.code)
        .bind(coupon.product_id.as_ref().map(|p| p.as_str().to_string()))
        .bind(i64::from(coupon.active))
        .bind(coupon.expires_at.map(|t| t.as_i64()))
        .bind(coupon.usage_limit)
        .bind(coupon.usage_count)
        .bind(coupon.created_at.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch a coupon by its public code.
    pub async fn get_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM coupons WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(coupon_from_row))
    }

    /// Bump a coupon's usage count.
    pub async fn increment_coupon_usage(&self, code: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE coupons SET usage_count = usage_count + 1 WHERE code = ?")
            .bind(code)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{seed_catalog, setup_test_db};
    use crate::domain::{Coupon, CreatorId, Money, ProductId, TimeMs};

    #[tokio::test]
    async fn test_product_roundtrip_and_counters() {
        let (repo, _temp) = setup_test_db().await;
        seed_catalog(&repo).await;

        let id = ProductId::new("p1");
        repo.increment_product_clicks(&id).await.unwrap();
        repo.increment_product_creators_interested(&id).await.unwrap();
        repo.apply_product_conversion(&id, Money::parse("2999").unwrap())
            .await
            .unwrap();

        let product = repo.get_product(&id).await.unwrap().unwrap();
        assert_eq!(product.total_clicks, 1);
        assert_eq!(product.creators_interested, 1);
        assert_eq!(product.total_conversions, 1);
        assert_eq!(product.total_revenue, Money::parse("2999").unwrap());
        assert_eq!(product.commission_rate.as_bps(), 1500);
    }

    #[tokio::test]
    async fn test_creator_roundtrip_and_counters() {
        let (repo, _temp) = setup_test_db().await;
        seed_catalog(&repo).await;

        let id = CreatorId::new("c1");
        repo.increment_creator_clicks(&id).await.unwrap();
        repo.apply_creator_conversion(&id, Money::parse("449.85").unwrap())
            .await
            .unwrap();
        repo.add_creator_earnings(&id, Money::parse("5").unwrap())
            .await
            .unwrap();

        let creator = repo.get_creator(&id).await.unwrap().unwrap();
        assert_eq!(creator.total_clicks, 1);
        assert_eq!(creator.total_conversions, 1);
        assert_eq!(creator.total_earnings, Money::parse("454.85").unwrap());
    }

    #[tokio::test]
    async fn test_coupon_roundtrip_and_usage() {
        let (repo, _temp) = setup_test_db().await;
        seed_catalog(&repo).await;

        let coupon = Coupon {
            id: "cp1".to_string(),
            code: "SAVE10".to_string(),
            product_id: Some(ProductId::new("p1")),
            active: true,
            expires_at: Some(TimeMs::new(1_000_000)),
            usage_limit: Some(2),
            usage_count: 0,
            created_at: TimeMs::new(0),
        };
        repo.insert_coupon(&coupon).await.unwrap();

        repo.increment_coupon_usage("SAVE10").await.unwrap();
        repo.increment_coupon_usage("SAVE10").await.unwrap();

        let stored = repo.get_coupon_by_code("SAVE10").await.unwrap().unwrap();
        assert_eq!(stored.usage_count, 2);
        assert!(!stored.is_valid(TimeMs::new(500)));
    }

    #[tokio::test]
    async fn test_missing_product_returns_none() {
        let (repo, _temp) = setup_test_db().await;

        let found = repo.get_product(&ProductId::new("missing")).await.unwrap();
        assert_eq!(found, None);
    }
}
