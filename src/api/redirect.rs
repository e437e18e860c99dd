use axum::extract::{Path, State};
use axum::http::header::{HeaderMap, LOCATION, SET_COOKIE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use super::{AppState, AFF_CLICK_COOKIE, AFF_LINK_COOKIE};
use crate::domain::{RequestContext, Slug};

/// `GET /r/{slug}`, the tracked redirect.
///
/// Unknown or inactive slugs bounce to the marketplace home page. A
/// resolvable slug always redirects to the product page, even when the
/// click cannot be persisted; losing a click is acceptable, losing the
/// shopper is not.
pub async fn redirect(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let slug = Slug::new(slug);

    let link = match state.registry.resolve(&slug).await {
        Ok(Some(link)) if link.active => link,
        Ok(_) => return found(&state.config.home_redirect_url, Vec::new()),
        Err(e) => {
            warn!(slug = %slug, error = %e, "Slug resolution failed; bouncing to home");
            return found(&state.config.home_redirect_url, Vec::new());
        }
    };

    let product = match state.repo.get_product(&link.product_id).await {
        Ok(Some(product)) => product,
        Ok(None) => {
            warn!(slug = %slug, product = %link.product_id, "Link points at a missing product");
            return found(&state.config.home_redirect_url, Vec::new());
        }
        Err(e) => {
            warn!(slug = %slug, error = %e, "Product lookup failed; bouncing to home");
            return found(&state.config.home_redirect_url, Vec::new());
        }
    };

    let context = request_context(&headers);
    match state.recorder.record_click(&link, &product, context).await {
        Ok(click) => {
            let max_age = state.recorder.window_days() * 86_400;
            let cookies = vec![
                attribution_cookie(AFF_CLICK_COOKIE, click.token.as_str(), max_age),
                attribution_cookie(AFF_LINK_COOKIE, link.id.as_str(), max_age),
            ];
            found(&product.product_url, cookies)
        }
        Err(e) => {
            warn!(slug = %slug, error = %e, "Click not recorded; redirecting anyway");
            found(&product.product_url, Vec::new())
        }
    }
}

fn found(location: &str, cookies: Vec<String>) -> Response {
    let mut builder = Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, location);
    for cookie in cookies {
        builder = builder.header(SET_COOKIE, cookie);
    }
    builder
        .body(axum::body::Body::empty())
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn attribution_cookie(name: &str, value: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; SameSite=Lax",
        name, value, max_age_secs
    )
}

fn request_context(headers: &HeaderMap) -> RequestContext {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let referrer = headers
        .get("referer")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    RequestContext {
        ip,
        user_agent,
        referrer,
    }
}
