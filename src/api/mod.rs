pub mod admin;
pub mod health;
pub mod links;
pub mod pixel;
pub mod redirect;

use crate::config::Config;
use crate::db::Repository;
use crate::engine::{AttributionTracker, ClickRecorder, LinkRegistry, Reconciler};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Cookie carrying the click token for later pixel attribution.
pub const AFF_CLICK_COOKIE: &str = "aff_click_id";
/// Cookie carrying the link id, set alongside the click token.
pub const AFF_LINK_COOKIE: &str = "aff_link_id";

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
    pub registry: Arc<LinkRegistry>,
    pub recorder: Arc<ClickRecorder>,
    pub tracker: Arc<AttributionTracker>,
    pub reconciler: Arc<Reconciler>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, config: Config) -> Self {
        let registry = Arc::new(LinkRegistry::new(repo.clone()));
        let recorder = Arc::new(ClickRecorder::new(
            repo.clone(),
            config.attribution_window_days,
        ));
        let tracker = Arc::new(AttributionTracker::new(repo.clone()));
        let reconciler = Arc::new(Reconciler::new(repo.clone()));
        Self {
            repo,
            config,
            registry,
            recorder,
            tracker,
            reconciler,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/r/:slug", get(redirect::redirect))
        .route("/tracking/pixel", get(pixel::pixel))
        .route("/v1/links", post(links::create_link))
        .route("/v1/links/:slug", get(links::get_link))
        .route("/v1/links/:slug/deactivate", post(links::deactivate_link))
        .route("/v1/reconcile", post(admin::reconcile))
        .layer(cors)
        .with_state(state)
}
