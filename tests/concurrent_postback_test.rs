use clickledger::db::init_db;
use clickledger::domain::{
    AffiliateLink, BrandId, Click, Creator, CreatorId, LinkId, Money, Product, ProductId, RateBps,
    RequestContext, Slug, TimeMs,
};
use clickledger::engine::{AttributionError, AttributionTracker};
use clickledger::Repository;
use std::sync::Arc;
use tempfile::TempDir;

async fn setup_repo() -> (Arc<Repository>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    (Arc::new(Repository::new(pool)), temp_dir)
}

async fn seed_click(repo: &Repository) -> Click {
    repo.insert_creator(&Creator {
        id: CreatorId::new("c1"),
        name: "Creator One".to_string(),
        total_clicks: 0,
        total_conversions: 0,
        total_earnings: Money::zero(),
        created_at: TimeMs::new(0),
    })
    .await
    .unwrap();

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
    .unwrap();

    let link = AffiliateLink {
        id: LinkId::new("link-1"),
        creator_id: CreatorId::new("c1"),
        product_id: ProductId::new("p1"),
        brand_id: BrandId::new("b1"),
        slug: Slug::new("abc12345"),
        active: true,
        clicks: 0,
        conversions: 0,
        revenue: Money::zero(),
        commission: Money::zero(),
        created_at: TimeMs::new(1_000),
    };
    repo.insert_link(&link).await.unwrap();

    let click = Click::new(
        link.id,
        link.creator_id,
        link.product_id,
        link.brand_id,
        RequestContext::default(),
        TimeMs::now(),
        7,
    );
    repo.insert_click(&click).await.unwrap();
    click
}

/// A retried postback racing itself must yield exactly one Sale row.
#[tokio::test]
async fn test_concurrent_duplicate_postbacks_accrue_once() {
    let (repo, _temp) = setup_repo().await;
    let click = seed_click(&repo).await;
    let tracker = Arc::new(AttributionTracker::new(repo.clone()));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let tracker = tracker.clone();
        let token = click.token.clone();
        handles.push(tokio::spawn(async move {
            tracker
                .attribute(Some(&token), "ORD-1", Money::parse("2999").unwrap())
                .await
        }));
    }

    let results = futures::future::join_all(handles).await;

    let mut sales = 0;
    let mut duplicates = 0;
    for result in results {
        match result.expect("task panicked") {
            Ok(txn) => {
                sales += 1;
                assert_eq!(txn.commission, Money::parse("449.85").unwrap());
            }
            Err(AttributionError::AlreadyConverted) => duplicates += 1,
            Err(other) => panic!("unexpected attribution error: {}", other),
        }
    }
    assert_eq!(sales, 1);
    assert_eq!(duplicates, 7);

    let txns = repo.list_transactions_for_click(&click.id).await.unwrap();
    assert_eq!(txns.len(), 1);

    let stored = repo
        .get_click_by_token(&click.token)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.converted);
}
