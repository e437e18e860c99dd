use axum::extract::State;
use axum::Json;

use super::AppState;
use crate::engine::ReconcileReport;
use crate::error::AppError;

/// `POST /v1/reconcile`: recompute every projection counter from the
/// ledger and report how many entities were swept.
pub async fn reconcile(State(state): State<AppState>) -> Result<Json<ReconcileReport>, AppError> {
    let report = state.reconciler.reconcile_all().await?;
    Ok(Json(report))
}
