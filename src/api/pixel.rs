use axum::extract::{Query, State};
use axum::http::header::{HeaderMap, CACHE_CONTROL, CONTENT_TYPE, COOKIE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{info, warn};

use super::{AppState, AFF_CLICK_COOKIE};
use crate::domain::{ClickToken, Money};
use crate::engine::AttributionError;

/// 1x1 transparent GIF, the body of every pixel response.
const TRANSPARENT_GIF: [u8; 43] = [
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, // GIF89a
    0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, // 1x1, 2-color palette
    0x00, 0x00, 0x00, 0xff, 0xff, 0xff, // palette
    0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, // transparency extension
    0x2c, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, // image descriptor
    0x02, 0x02, 0x44, 0x01, 0x00, // pixel data
    0x3b, // trailer
];

#[derive(Debug, Deserialize)]
pub struct PixelQuery {
    pub order_id: Option<String>,
    pub amount: Option<String>,
}

/// `GET /tracking/pixel?order_id=...&amount=...`, the conversion postback.
///
/// The response body is always the transparent GIF so a broken or
/// unattributed postback never breaks the merchant's confirmation page;
/// the status code is the only signal of what happened.
pub async fn pixel(
    Query(params): Query<PixelQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let status = process_postback(&state, &params, &headers).await;
    gif_response(status)
}

async fn process_postback(
    state: &AppState,
    params: &PixelQuery,
    headers: &HeaderMap,
) -> StatusCode {
    let order_id = match params.order_id.as_deref() {
        Some(id) if !id.is_empty() => id,
        _ => return StatusCode::BAD_REQUEST,
    };
    let gross = match params.amount.as_deref().map(Money::parse) {
        Some(Ok(amount)) => amount,
        Some(Err(e)) => {
            info!(order_id, error = %e, "Postback with unparseable amount");
            return StatusCode::BAD_REQUEST;
        }
        None => return StatusCode::BAD_REQUEST,
    };

    let token = cookie_value(headers, AFF_CLICK_COOKIE).map(ClickToken::new);

    match state.tracker.attribute(token.as_ref(), order_id, gross).await {
        Ok(_) => StatusCode::OK,
        Err(AttributionError::MissingAttribution) => {
            info!(order_id, "Postback without attribution cookie");
            StatusCode::BAD_REQUEST
        }
        Err(AttributionError::UnknownClick) => {
            info!(order_id, "Postback with unknown click token");
            StatusCode::NOT_FOUND
        }
        Err(AttributionError::AlreadyConverted) => {
            info!(order_id, "Duplicate postback ignored");
            StatusCode::NOT_FOUND
        }
        Err(AttributionError::AttributionExpired) => {
            info!(order_id, "Postback outside the attribution window");
            StatusCode::BAD_REQUEST
        }
        Err(AttributionError::DanglingProduct(product)) => {
            warn!(order_id, product, "Postback for a click with a missing product");
            StatusCode::NOT_FOUND
        }
        Err(AttributionError::Db(e)) => {
            // Never bubble storage trouble onto the merchant page.
            warn!(order_id, error = %e, "Postback hit a database error");
            StatusCode::OK
        }
    }
}

fn gif_response(status: StatusCode) -> Response {
    (
        status,
        [
            (CONTENT_TYPE, "image/gif"),
            (CACHE_CONTROL, "no-store"),
        ],
        TRANSPARENT_GIF.as_slice(),
    )
        .into_response()
}

/// Pull one value out of the Cookie header, if present.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        if k == name && !v.is_empty() {
            Some(v.to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_gif_is_valid_gif89a() {
        assert_eq!(&TRANSPARENT_GIF[..6], b"GIF89a");
        assert_eq!(TRANSPARENT_GIF[42], 0x3b);
    }

    #[test]
    fn test_cookie_value_parses_multiple_pairs() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; aff_click_id=tok123; aff_link_id=l1"),
        );
        assert_eq!(
            cookie_value(&headers, AFF_CLICK_COOKIE).as_deref(),
            Some("tok123")
        );
        assert_eq!(cookie_value(&headers, "theme").as_deref(), Some("dark"));
        assert!(cookie_value(&headers, "missing").is_none());
    }

    #[test]
    fn test_cookie_value_ignores_empty() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("aff_click_id="));
        assert!(cookie_value(&headers, AFF_CLICK_COOKIE).is_none());
    }
}
