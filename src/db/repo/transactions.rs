//! Ledger operations.
//!
//! Includes the one operation in the system that needs a real
//! concurrency-correctness argument: flipping a click's converted flag
//! and inserting the Sale row in a single database transaction.

use crate::domain::{
    AttributionSource, BrandId, ClickId, ClickToken, CreatorId, LinkId, Money, ProductId,
    TimeMs, Transaction, TransactionId, TransactionStatus, TransactionType,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{LedgerTotals, Repository};

fn transaction_from_row(row: &SqliteRow) -> Transaction {
    let tx_type: String = row.get("tx_type");
    let source: String = row.get("source");
    let status: String = row.get("status");

    Transaction {
        id: TransactionId::new(row.get::<String, _>("id")),
        // Stored values are written by us; unknown strings mean a schema
        // mismatch and default conservatively.
        tx_type: TransactionType::parse(&tx_type).unwrap_or(TransactionType::Sale),
        brand_id: BrandId::new(row.get::<String, _>("brand_id")),
        creator_id: CreatorId::new(row.get::<String, _>("creator_id")),
        product_id: ProductId::new(row.get::<String, _>("product_id")),
        link_id: LinkId::new(row.get::<String, _>("link_id")),
        click_id: row.get::<Option<String>, _>("click_id").map(ClickId::new),
        order_id: row.get("order_id"),
        gross: Money::from_minor(row.get("gross_minor")),
        commission: Money::from_minor(row.get("commission_minor")),
        source: AttributionSource::parse(&source).unwrap_or(AttributionSource::Cookie),
        status: TransactionStatus::parse(&status).unwrap_or(TransactionStatus::Completed),
        created_at: TimeMs::new(row.get("created_at")),
    }
}

const TRANSACTION_COLUMNS: &str = "id, tx_type, brand_id, creator_id, product_id, link_id, \
     click_id, order_id, gross_minor, commission_minor, source, status, created_at";

const INSERT_TRANSACTION_SQL: &str = r#"
    INSERT INTO transactions (
        id, tx_type, brand_id, creator_id, product_id, link_id,
        click_id, order_id, gross_minor, commission_minor, source, status, created_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

impl Repository {
    /// Insert a ledger transaction (CPC accruals, adjustments).
    ///
    /// Sale rows must go through `convert_click_and_insert_sale` instead,
    /// which couples the insert with the converted-flag flip.
    pub async fn insert_transaction(&self, txn: &Transaction) -> Result<(), sqlx::Error> {
        sqlx::query(INSERT_TRANSACTION_SQL)
            .bind(txn.id.as_str())
            .bind(txn.tx_type.as_str())
            .bind(txn.brand_id.as_str())
            .bind(txn.creator_id.as_str())
            .bind(txn.product_id.as_str())
            .bind(txn.link_id.as_str())
            .bind(txn.click_id.as_ref().map(|c| c.as_str().to_string()))
            .bind(txn.order_id.as_deref())
            .bind(txn.gross.minor())
            .bind(txn.commission.minor())
            .bind(txn.source.as_str())
            .bind(txn.status.as_str())
            .bind(txn.created_at.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Atomically mark a click converted and insert its Sale transaction.
    ///
    /// Returns false without inserting anything when the click was already
    /// converted. The guard is a conditional update (`WHERE converted = 0`)
    /// executed in the same database transaction as the insert, so two
    /// concurrent postbacks for the same click can never both post a Sale:
    /// exactly one of them observes rows_affected = 1.
    ///
    /// # Errors
    /// Returns an error if any statement fails; the transaction rolls back.
    pub async fn convert_click_and_insert_sale(
        &self,
        token: &ClickToken,
        txn: &Transaction,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let result =
            sqlx::query("UPDATE clicks SET converted = 1 WHERE click_token = ? AND converted = 0")
                .bind(token.as_str())
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(INSERT_TRANSACTION_SQL)
            .bind(txn.id.as_str())
            .bind(txn.tx_type.as_str())
            .bind(txn.brand_id.as_str())
            .bind(txn.creator_id.as_str())
            .bind(txn.product_id.as_str())
            .bind(txn.link_id.as_str())
            .bind(txn.click_id.as_ref().map(|c| c.as_str().to_string()))
            .bind(txn.order_id.as_deref())
            .bind(txn.gross.minor())
            .bind(txn.commission.minor())
            .bind(txn.source.as_str())
            .bind(txn.status.as_str())
            .bind(txn.created_at.as_i64())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Fetch a transaction by id.
    pub async fn get_transaction(
        &self,
        id: &TransactionId,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM transactions WHERE id = ?",
            TRANSACTION_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(transaction_from_row))
    }

    /// List ledger entries attributed to a click.
    pub async fn list_transactions_for_click(
        &self,
        click_id: &ClickId,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM transactions WHERE click_id = ? ORDER BY created_at ASC, id ASC",
            TRANSACTION_COLUMNS
        ))
        .bind(click_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(transaction_from_row).collect())
    }

    /// List ledger entries for a link.
    pub async fn list_transactions_for_link(
        &self,
        link_id: &LinkId,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM transactions WHERE link_id = ? ORDER BY created_at ASC, id ASC",
            TRANSACTION_COLUMNS
        ))
        .bind(link_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(transaction_from_row).collect())
    }

    /// Recompute a link's aggregates from the ledger.
    ///
    /// Clicks come from the clicks table; conversions, revenue, and
    /// commission from completed transactions. Integer SUMs stay exact in
    /// SQLite, so aggregation happens in SQL.
    pub async fn ledger_totals_for_link(
        &self,
        link_id: &LinkId,
    ) -> Result<LedgerTotals, sqlx::Error> {
        let clicks = self.count_clicks_for_link(link_id).await?;

        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN tx_type = 'sale' THEN 1 ELSE 0 END), 0) AS conversions,
                COALESCE(SUM(CASE WHEN tx_type = 'sale' THEN gross_minor ELSE 0 END), 0) AS revenue_minor,
                COALESCE(SUM(commission_minor), 0) AS commission_minor
            FROM transactions
            WHERE link_id = ? AND status = 'completed' AND tx_type IN ('sale', 'click')
            "#,
        )
        .bind(link_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(LedgerTotals {
            clicks,
            conversions: row.get("conversions"),
            revenue_minor: row.get("revenue_minor"),
            commission_minor: row.get("commission_minor"),
        })
    }

    /// Recompute a creator's earnings aggregates from the ledger.
    pub async fn ledger_totals_for_creator(
        &self,
        creator_id: &CreatorId,
    ) -> Result<LedgerTotals, sqlx::Error> {
        let clicks_row = sqlx::query("SELECT COUNT(*) AS n FROM clicks WHERE creator_id = ?")
            .bind(creator_id.as_str())
            .fetch_one(&self.pool)
            .await?;

        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN tx_type = 'sale' THEN 1 ELSE 0 END), 0) AS conversions,
                COALESCE(SUM(CASE WHEN tx_type = 'sale' THEN gross_minor ELSE 0 END), 0) AS revenue_minor,
                COALESCE(SUM(commission_minor), 0) AS commission_minor
            FROM transactions
            WHERE creator_id = ? AND status = 'completed' AND tx_type IN ('sale', 'click')
            "#,
        )
        .bind(creator_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(LedgerTotals {
            clicks: clicks_row.get("n"),
            conversions: row.get("conversions"),
            revenue_minor: row.get("revenue_minor"),
            commission_minor: row.get("commission_minor"),
        })
    }

    /// Recompute a product's aggregates from the ledger.
    pub async fn ledger_totals_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<LedgerTotals, sqlx::Error> {
        let clicks_row = sqlx::query("SELECT COUNT(*) AS n FROM clicks WHERE product_id = ?")
            .bind(product_id.as_str())
            .fetch_one(&self.pool)
            .await?;

        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN tx_type = 'sale' THEN 1 ELSE 0 END), 0) AS conversions,
                COALESCE(SUM(CASE WHEN tx_type = 'sale' THEN gross_minor ELSE 0 END), 0) AS revenue_minor,
                COALESCE(SUM(commission_minor), 0) AS commission_minor
            FROM transactions
            WHERE product_id = ? AND status = 'completed' AND tx_type IN ('sale', 'click')
            "#,
        )
        .bind(product_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(LedgerTotals {
            clicks: clicks_row.get("n"),
            conversions: row.get("conversions"),
            revenue_minor: row.get("revenue_minor"),
            commission_minor: row.get("commission_minor"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{sample_link, seed_catalog, setup_test_db};
    use crate::domain::{
        AttributionSource, Click, Money, RequestContext, TimeMs, Transaction, TransactionId,
        TransactionStatus, TransactionType,
    };

    fn sale_for(click: &Click, order_id: &str) -> Transaction {
        Transaction {
            id: TransactionId::generate(),
            tx_type: TransactionType::Sale,
            brand_id: click.brand_id.clone(),
            creator_id: click.creator_id.clone(),
            product_id: click.product_id.clone(),
            link_id: click.link_id.clone(),
            click_id: Some(click.id.clone()),
            order_id: Some(order_id.to_string()),
            gross: Money::parse("2999").unwrap(),
            commission: Money::parse("449.85").unwrap(),
            source: AttributionSource::Cookie,
            status: TransactionStatus::Completed,
            created_at: TimeMs::new(20_000),
        }
    }

    async fn seeded_click(
        repo: &crate::db::Repository,
    ) -> (crate::domain::AffiliateLink, Click) {
        seed_catalog(repo).await;
        let link = sample_link("s1");
        repo.insert_link(&link).await.unwrap();

        let click = Click::new(
            link.id.clone(),
            link.creator_id.clone(),
            link.product_id.clone(),
            link.brand_id.clone(),
            RequestContext::default(),
            TimeMs::new(10_000),
            7,
        );
        repo.insert_click(&click).await.unwrap();
        (link, click)
    }

    #[tokio::test]
    async fn test_convert_and_insert_sale_once() {
        let (repo, _temp) = setup_test_db().await;
        let (_link, click) = seeded_click(&repo).await;

        let txn = sale_for(&click, "ORD-1");
        let posted = repo
            .convert_click_and_insert_sale(&click.token, &txn)
            .await
            .expect("convert failed");
        assert!(posted);

        let stored = repo
            .get_click_by_token(&click.token)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.converted);

        let txns = repo.list_transactions_for_click(&click.id).await.unwrap();
        assert_eq!(txns, vec![txn]);
    }

    #[tokio::test]
    async fn test_second_convert_is_rejected_and_inserts_nothing() {
        let (repo, _temp) = setup_test_db().await;
        let (_link, click) = seeded_click(&repo).await;

        let first = sale_for(&click, "ORD-1");
        assert!(repo
            .convert_click_and_insert_sale(&click.token, &first)
            .await
            .unwrap());

        let second = sale_for(&click, "ORD-1");
        let posted = repo
            .convert_click_and_insert_sale(&click.token, &second)
            .await
            .unwrap();
        assert!(!posted);

        let txns = repo.list_transactions_for_click(&click.id).await.unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].id, first.id);
    }

    #[tokio::test]
    async fn test_ledger_totals_for_link() {
        let (repo, _temp) = setup_test_db().await;
        let (link, click) = seeded_click(&repo).await;

        let txn = sale_for(&click, "ORD-1");
        repo.convert_click_and_insert_sale(&click.token, &txn)
            .await
            .unwrap();

        let totals = repo.ledger_totals_for_link(&link.id).await.unwrap();
        assert_eq!(totals.clicks, 1);
        assert_eq!(totals.conversions, 1);
        assert_eq!(totals.revenue_minor, 299_900);
        assert_eq!(totals.commission_minor, 44_985);
    }

    #[tokio::test]
    async fn test_cpc_click_transaction_counts_toward_commission_only() {
        let (repo, _temp) = setup_test_db().await;
        let (link, click) = seeded_click(&repo).await;

        let cpc = Transaction {
            id: TransactionId::generate(),
            tx_type: TransactionType::Click,
            brand_id: click.brand_id.clone(),
            creator_id: click.creator_id.clone(),
            product_id: click.product_id.clone(),
            link_id: click.link_id.clone(),
            click_id: Some(click.id.clone()),
            order_id: None,
            gross: Money::zero(),
            commission: Money::parse("5").unwrap(),
            source: AttributionSource::Direct,
            status: TransactionStatus::Completed,
            created_at: TimeMs::new(10_001),
        };
        repo.insert_transaction(&cpc).await.unwrap();

        let totals = repo.ledger_totals_for_link(&link.id).await.unwrap();
        assert_eq!(totals.conversions, 0);
        assert_eq!(totals.revenue_minor, 0);
        assert_eq!(totals.commission_minor, 500);
    }

    #[tokio::test]
    async fn test_get_transaction_roundtrip() {
        let (repo, _temp) = setup_test_db().await;
        let (_link, click) = seeded_click(&repo).await;

        let txn = sale_for(&click, "ORD-9");
        repo.convert_click_and_insert_sale(&click.token, &txn)
            .await
            .unwrap();

        let fetched = repo.get_transaction(&txn.id).await.unwrap();
        assert_eq!(fetched, Some(txn));
    }
}
