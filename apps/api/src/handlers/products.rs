//! Product catalogue endpoints. Reads are public, writes need a token.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use stockroom_core::{CoreError, Product, ProductInput};
use tracing::info;

use super::ApiJson;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct DeletedProduct {
    pub success: bool,
    pub deleted: Product,
}

/// `GET /api/products`
pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult<Json<ProductList>> {
    let products = state.db.products().list().await?;
    Ok(Json(ProductList { products }))
}

/// `GET /api/products/{id}`
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", &id))
}

/// `POST /api/products`
pub async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let new = input.into_new_product().map_err(CoreError::from)?;
    let product = state.db.products().insert(new).await?;

    info!(
        product_id = %product.id,
        sku = %product.sku,
        by = %user.username,
        "Product created"
    );

    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/products/{id}`
pub async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(changes): ApiJson<ProductInput>,
) -> ApiResult<Json<Product>> {
    let product = state.db.products().update(&id, &changes).await?;

    info!(product_id = %product.id, by = %user.username, "Product updated");

    Ok(Json(product))
}

/// `DELETE /api/products/{id}`
pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedProduct>> {
    let deleted = state.db.products().delete(&id).await?;

    info!(product_id = %deleted.id, by = %user.username, "Product deleted");

    Ok(Json(DeletedProduct {
        success: true,
        deleted,
    }))
}
