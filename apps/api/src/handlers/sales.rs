//! Sale endpoints. All require a token; the caller is recorded on the sale.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use stockroom_core::{Sale, SaleRequest};
use tracing::{info, warn};

use super::ApiJson;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SaleList {
    pub sales: Vec<Sale>,
}

/// `POST /api/sales`
pub async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(request): ApiJson<SaleRequest>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    let sale = state
        .db
        .sales()
        .create_sale(&request.items, &user.staff_identity())
        .await
        .map_err(|e| {
            warn!(by = %user.username, error = %e, "Sale rejected");
            ApiError::from(e)
        })?;

    info!(sale_id = %sale.id, total = %sale.total(), by = %user.username, "Sale created");

    Ok((StatusCode::CREATED, Json(sale)))
}

/// `GET /api/sales`
pub async fn list(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> ApiResult<Json<SaleList>> {
    let sales = state.db.sales().list().await?;
    Ok(Json(SaleList { sales }))
}

/// `GET /api/sales/{id}`
pub async fn get(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Sale>> {
    state
        .db
        .sales()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Sale", &id))
}
