use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use stockroom_core::StoreStats;

use crate::error::ApiResult;
use crate::AppState;

/// `GET /api/stats`
pub async fn summary(State(state): State<Arc<AppState>>) -> ApiResult<Json<StoreStats>> {
    Ok(Json(state.db.stats().summary().await?))
}
