use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::domain::{AffiliateLink, CreatorId, ProductId, Slug};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    pub creator_id: String,
    pub product_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDto {
    pub id: String,
    pub creator_id: String,
    pub product_id: String,
    pub brand_id: String,
    pub slug: String,
    pub active: bool,
    pub tracking_url: String,
    pub clicks: i64,
    pub conversions: i64,
    pub revenue: String,
    pub commission: String,
    pub created_at_ms: i64,
}

impl LinkDto {
    fn from_link(link: &AffiliateLink, public_base_url: &str) -> Self {
        LinkDto {
            id: link.id.to_string(),
            creator_id: link.creator_id.to_string(),
            product_id: link.product_id.to_string(),
            brand_id: link.brand_id.to_string(),
            slug: link.slug.to_string(),
            active: link.active,
            tracking_url: format!("{}{}", public_base_url, link.tracking_path()),
            clicks: link.clicks,
            conversions: link.conversions,
            revenue: link.revenue.to_decimal_string(),
            commission: link.commission.to_decimal_string(),
            created_at_ms: link.created_at.as_i64(),
        }
    }
}

/// `POST /v1/links`, idempotent per (creator, product): 201 on first
/// create, 200 with the existing link thereafter.
pub async fn create_link(
    State(state): State<AppState>,
    Json(req): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkDto>), AppError> {
    if req.creator_id.is_empty() || req.product_id.is_empty() {
        return Err(AppError::BadRequest(
            "creatorId and productId are required".into(),
        ));
    }

    let created = state
        .registry
        .create_link(
            &CreatorId::new(req.creator_id),
            &ProductId::new(req.product_id),
        )
        .await?;

    let status = if created.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let dto = LinkDto::from_link(&created.link, &state.config.public_base_url);
    Ok((status, Json(dto)))
}

pub async fn get_link(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinkDto>, AppError> {
    let link = state
        .registry
        .resolve(&Slug::new(slug.clone()))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no link for slug {}", slug)))?;
    Ok(Json(LinkDto::from_link(
        &link,
        &state.config.public_base_url,
    )))
}

pub async fn deactivate_link(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deactivated = state.registry.deactivate(&Slug::new(slug.clone())).await?;
    if !deactivated {
        return Err(AppError::NotFound(format!("no link for slug {}", slug)));
    }
    Ok(Json(serde_json::json!({"deactivated": true})))
}
