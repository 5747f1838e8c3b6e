//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, and logout. They drive
//! the ambient session: signing in sets the current user for the whole app,
//! signing out clears it.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use booktrack_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account and sign it in
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = state
        .session
        .sign_up(&req.email, &req.password)
        .await
        .map_err(|e| {
            error!("Failed to create user: {e}");
            match e {
                // Taken email, weak password and the like: the cause text is
                // already safe to show inline next to the form.
                PortError::Unexpected(message) => (StatusCode::BAD_REQUEST, message),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create user".to_string(),
                ),
            }
        })?;

    let response = AuthResponse {
        user_id: user.user_id,
        email: user.email.unwrap_or_default(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /auth/login - Sign an existing account in
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = state
        .session
        .sign_in(&req.email, &req.password)
        .await
        .map_err(|e| {
            error!("Failed to sign user in: {e}");
            match e {
                PortError::Unauthorized => (
                    StatusCode::UNAUTHORIZED,
                    "Invalid email or password".to_string(),
                ),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Authentication error".to_string(),
                ),
            }
        })?;

    let response = AuthResponse {
        user_id: user.user_id,
        email: user.email.unwrap_or_default(),
    };
    Ok((StatusCode::OK, Json(response)))
}

/// POST /auth/logout - Clear the ambient session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state.session.sign_out().await.map_err(|e| {
        error!("Failed to sign user out: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to logout".to_string(),
        )
    })?;

    Ok(StatusCode::OK)
}
