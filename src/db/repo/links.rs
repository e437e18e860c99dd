//! Affiliate link registry operations.

use crate::domain::{
    AffiliateLink, BrandId, CreatorId, LinkId, Money, ProductId, Slug, TimeMs,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::Repository;

fn link_from_row(row: &SqliteRow) -> AffiliateLink {
    AffiliateLink {
        id: LinkId::new(row.get::<String, _>("id")),
        creator_id: CreatorId::new(row.get::<String, _>("creator_id")),
        product_id: ProductId::new(row.get::<String, _>("product_id")),
        brand_id: BrandId::new(row.get::<String, _>("brand_id")),
        slug: Slug::new(row.get::<String, _>("slug")),
        active: row.get::<i64, _>("active") != 0,
        clicks: row.get("clicks"),
        conversions: row.get("conversions"),
        revenue: Money::from_minor(row.get("revenue_minor")),
        commission: Money::from_minor(row.get("commission_minor")),
        created_at: TimeMs::new(row.get("created_at")),
    }
}

const LINK_COLUMNS: &str = "id, creator_id, product_id, brand_id, slug, active, \
     clicks, conversions, revenue_minor, commission_minor, created_at";

impl Repository {
    /// Insert a new link.
    ///
    /// # Errors
    /// Surfaces unique-index violations (slug collision, duplicate
    /// creator/product pair) as `sqlx::Error::Database`; the registry
    /// inspects those to retry or return the existing link.
    pub async fn insert_link(&self, link: &AffiliateLink) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO links (
                id, creator_id, product_id, brand_id, slug, active,
                clicks, conversions, revenue_minor, commission_minor, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(link.id.as_str())
        .bind(link.creator_id.as_str())
        .bind(link.product_id.as_str())
        .bind(link.brand_id.as_str())
        .bind(link.slug.as_str())
        .bind(i64::from(link.active))
        .bind(link.clicks)
        .bind(link.conversions)
        .bind(link.revenue.minor())
        .bind(link.commission.minor())
        .bind(link.created_at.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Resolve a link by its slug. Unique-index lookup, hot path of every
    /// redirect.
    pub async fn get_link_by_slug(
        &self,
        slug: &Slug,
    ) -> Result<Option<AffiliateLink>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM links WHERE slug = ?",
            LINK_COLUMNS
        ))
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(link_from_row))
    }

    /// Fetch a link by id.
    pub async fn get_link_by_id(
        &self,
        id: &LinkId,
    ) -> Result<Option<AffiliateLink>, sqlx::Error> {
        let row = sqlx::query(&format!("SELECT {} FROM links WHERE id = ?", LINK_COLUMNS))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(link_from_row))
    }

    /// Fetch the link for a (creator, product) pair, if one exists.
    pub async fn get_link_by_pair(
        &self,
        creator_id: &CreatorId,
        product_id: &ProductId,
    ) -> Result<Option<AffiliateLink>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM links WHERE creator_id = ? AND product_id = ?",
            LINK_COLUMNS
        ))
        .bind(creator_id.as_str())
        .bind(product_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(link_from_row))
    }

    /// Soft-activate or deactivate a link. Returns false if no such link.
    pub async fn set_link_active(
        &self,
        id: &LinkId,
        active: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE links SET active = ? WHERE id = ?")
            .bind(i64::from(active))
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Bump the link's click projection counter.
    pub async fn increment_link_clicks(&self, id: &LinkId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE links SET clicks = clicks + 1 WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Apply a conversion to the link's projection counters.
    pub async fn apply_link_conversion(
        &self,
        id: &LinkId,
        revenue: Money,
        commission: Money,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE links SET
                conversions = conversions + 1,
                revenue_minor = revenue_minor + ?,
                commission_minor = commission_minor + ?
            WHERE id = ?
            "#,
        )
        .bind(revenue.minor())
        .bind(commission.minor())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Add CPC commission to the link's projection counters.
    pub async fn add_link_commission(
        &self,
        id: &LinkId,
        commission: Money,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE links SET commission_minor = commission_minor + ? WHERE id = ?")
            .bind(commission.minor())
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Overwrite the link's projection counters with ledger-derived totals.
    pub async fn set_link_counters(
        &self,
        id: &LinkId,
        totals: super::LedgerTotals,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE links SET
                clicks = ?,
                conversions = ?,
                revenue_minor = ?,
                commission_minor = ?
            WHERE id = ?
            "#,
        )
        .bind(totals.clicks)
        .bind(totals.conversions)
        .bind(totals.revenue_minor)
        .bind(totals.commission_minor)
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List all link ids, for reconciliation sweeps.
    pub async fn list_link_ids(&self) -> Result<Vec<LinkId>, sqlx::Error> {
        let rows = sqlx::query("SELECT id FROM links ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|r| LinkId::new(r.get::<String, _>("id")))
            .collect())
    }
}
