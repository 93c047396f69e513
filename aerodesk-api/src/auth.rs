use aerodesk_core::user::SignupRequest;
use aerodesk_core::Role;
use aerodesk_shared::Masked;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, middleware::auth::issue_token, state::AppState};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub role: Role,
    /// Email for customers and agents, username for staff.
    pub identifier: String,
    pub password: Masked<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub identifier: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub role: Role,
    pub identifier: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/signup", post(signup))
        .route("/v1/auth/login", post(login))
}

/// POST /v1/auth/signup
async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let response = SignupResponse {
        role: request.details.role(),
        identifier: request.details.identifier().to_string(),
    };
    state.credentials.signup(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /v1/auth/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let ctx = state
        .credentials
        .login(request.role, &request.identifier, request.password.expose())
        .await?;
    let token = issue_token(&state.auth, &ctx)?;

    Ok(Json(LoginResponse {
        token,
        role: ctx.role(),
        identifier: ctx.identifier().to_string(),
    }))
}
