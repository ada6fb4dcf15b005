//! Registration and login.
//!
//! ## Registration Rules
//! ```text
//! role absent / "staff"  ──► anyone may register
//! role "admin"           ──► caller must present an admin bearer token
//!                              no token      → 401 Missing token
//!                              staff token   → 403 Insufficient role
//! ```

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use stockroom_core::validation::{require, validate_password, validate_username};
use stockroom_core::{CoreError, Role, UserProfile};
use tracing::{info, warn};

use super::ApiJson;
use crate::auth::{hash_password, optional_auth, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
    pub user: UserProfile,
}

/// Validated username/password pair.
fn credentials(username: Option<String>, password: Option<String>) -> ApiResult<(String, String)> {
    let username = require("username", username).map_err(CoreError::from)?;
    let password = require("password", password).map_err(CoreError::from)?;
    validate_username(&username).map_err(CoreError::from)?;
    validate_password(&password).map_err(CoreError::from)?;
    Ok((username.trim().to_string(), password))
}

/// Argon2 is CPU-bound, so it runs off the async workers.
async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(format!("Password task failed: {e}")))?
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    let (username, password) = credentials(req.username, req.password)?;

    let role = match req.role.as_deref() {
        None | Some("") => Role::Staff,
        Some(role) => role.parse::<Role>().map_err(CoreError::from)?,
    };

    if role == Role::Admin {
        let caller = optional_auth(&headers, &state.jwt)?.ok_or_else(ApiError::missing_token)?;
        caller.require_role(Role::Admin)?;
    }

    let password_hash = blocking(move || hash_password(&password)).await?;
    let user = state
        .db
        .users()
        .insert(&username, &password_hash, role)
        .await?;

    info!(user_id = %user.id, username = %user.username, role = %user.role, "User registered");

    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

/// `POST /api/auth/login`
///
/// Unknown users and wrong passwords get the same response.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (username, password) = credentials(req.username, req.password)?;

    let Some(user) = state.db.users().get_by_username(&username).await? else {
        warn!(username = %username, "Login failed: unknown user");
        return Err(ApiError::invalid_credentials());
    };

    let stored_hash = user.password_hash.clone();
    let valid = blocking(move || Ok(verify_password(&password, &stored_hash))).await?;
    if !valid {
        warn!(username = %username, "Login failed: wrong password");
        return Err(ApiError::invalid_credentials());
    }

    let token = state.jwt.generate_token(&user)?;
    info!(user_id = %user.id, username = %user.username, "User logged in");

    Ok(Json(LoginResponse {
        token,
        expires_in: state.jwt.lifetime_secs(),
        user: UserProfile::from(&user),
    }))
}
