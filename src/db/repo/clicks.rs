//! Click audit-trail operations.

use crate::domain::{
    BrandId, Click, ClickId, ClickToken, CreatorId, LinkId, ProductId, RequestContext, TimeMs,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::Repository;

pub(super) fn click_from_row(row: &SqliteRow) -> Click {
    Click {
        id: ClickId::new(row.get::<String, _>("id")),
        token: ClickToken::new(row.get::<String, _>("click_token")),
        link_id: LinkId::new(row.get::<String, _>("link_id")),
        creator_id: CreatorId::new(row.get::<String, _>("creator_id")),
        product_id: ProductId::new(row.get::<String, _>("product_id")),
        brand_id: BrandId::new(row.get::<String, _>("brand_id")),
        context: RequestContext {
            ip: row.get("ip"),
            user_agent: row.get("user_agent"),
            referrer: row.get("referrer"),
        },
        converted: row.get::<i64, _>("converted") != 0,
        expires_at: TimeMs::new(row.get("expires_at")),
        created_at: TimeMs::new(row.get("created_at")),
    }
}

const CLICK_COLUMNS: &str = "id, click_token, link_id, creator_id, product_id, brand_id, \
     ip, user_agent, referrer, converted, expires_at, created_at";

impl Repository {
    /// Persist an admitted click.
    ///
    /// # Errors
    /// Returns an error if the insert fails (including token collisions,
    /// which are vanishingly rare with 128-bit tokens).
    pub async fn insert_click(&self, click: &Click) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO clicks (
                id, click_token, link_id, creator_id, product_id, brand_id,
                ip, user_agent, referrer, converted, expires_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(click.id.as_str())
        .bind(click.token.as_str())
        .bind(click.link_id.as_str())
        .bind(click.creator_id.as_str())
        .bind(click.product_id.as_str())
        .bind(click.brand_id.as_str())
        .bind(click.context.ip.as_deref())
        .bind(click.context.user_agent.as_deref())
        .bind(click.context.referrer.as_deref())
        .bind(i64::from(click.converted))
        .bind(click.expires_at.as_i64())
        .bind(click.created_at.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Look up a click by its opaque token.
    pub async fn get_click_by_token(
        &self,
        token: &ClickToken,
    ) -> Result<Option<Click>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM clicks WHERE click_token = ?",
            CLICK_COLUMNS
        ))
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(click_from_row))
    }

    /// Count admitted clicks for a link (source-of-truth click count).
    pub async fn count_clicks_for_link(&self, link_id: &LinkId) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM clicks WHERE link_id = ?")
            .bind(link_id.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("n"))
    }
}
