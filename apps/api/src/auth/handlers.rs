//! Axum route handlers for registration, login, token refresh and password change.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::authenticator::authenticate;
use crate::auth::principal::Principal;
use crate::auth::service::{change_password, register, ChangePasswordRequest, RegisterRequest};
use crate::auth::tokens::TokenPair;
use crate::errors::AppError;
use crate::models::user::UserView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    #[serde(alias = "identifier", alias = "email")]
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    request: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    let Json(request) = request?;
    let user = register(
        state.store.as_ref(),
        &state.passwords,
        state.password_policy.as_ref(),
        request,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, AppError> {
    let Json(request) = request?;
    let user = authenticate(
        state.store.as_ref(),
        &state.passwords,
        &request.username,
        &request.password,
    )
    .await
    .map_err(|failure| {
        warn!("Login rejected: {failure}");
        AppError::from(failure)
    })?;

    let pair = state
        .tokens
        .issue_pair(user.id)
        .map_err(|e| AppError::Internal(e.into()))?;

    info!("User {} logged in", user.id);
    Ok(Json(pair))
}

/// POST /api/v1/auth/token/refresh
pub async fn handle_refresh(
    State(state): State<AppState>,
    request: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<RefreshResponse>, AppError> {
    let Json(request) = request?;
    let access = state.tokens.refresh(&request.refresh).map_err(|e| {
        warn!("Refresh rejected: {e}");
        AppError::Unauthorized("Token is invalid or expired".to_string())
    })?;
    Ok(Json(RefreshResponse { access }))
}

/// PUT /api/v1/auth/change-password
pub async fn handle_change_password(
    State(state): State<AppState>,
    principal: Principal,
    request: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = request?;
    change_password(
        state.store.as_ref(),
        &state.passwords,
        state.password_policy.as_ref(),
        &principal,
        request,
    )
    .await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Password updated successfully"
    })))
}
