//! HTTP handlers, one module per resource.

pub mod auth;
pub mod health;
pub mod products;
pub mod sales;
pub mod stats;

use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json` whose rejections use the API error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
