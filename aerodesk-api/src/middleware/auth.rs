use aerodesk_core::{Principal, SessionContext};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

// ============================================================================
// JWT Claims
// ============================================================================

/// Bearer token payload. Carries the whole principal so handlers never
/// re-read the account.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String,
    pub principal: Principal,
    pub exp: usize,
}

pub fn issue_token(auth: &AuthConfig, ctx: &SessionContext) -> Result<String, AppError> {
    let expiration = i64::try_from(auth.expiration).unwrap_or(i64::MAX);
    let exp = (Utc::now() + Duration::seconds(expiration)).timestamp();
    let claims = SessionClaims {
        sub: ctx.identifier().to_string(),
        principal: ctx.principal.clone(),
        exp: usize::try_from(exp).unwrap_or(0),
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

fn session_from_headers(auth: &AuthConfig, headers: &HeaderMap) -> Result<Option<SessionContext>, AppError> {
    let Some(auth_header) = headers.get("Authorization") else {
        return Ok(None);
    };
    let token = auth_header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::AuthenticationError("Malformed Authorization header".to_string()))?;

    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthenticationError("Invalid or expired session".to_string()))?;

    Ok(Some(SessionContext::new(token_data.claims.principal)))
}

// ============================================================================
// Session Middleware
// ============================================================================

/// Rejects requests without a valid session with 401.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = session_from_headers(&state.auth, req.headers())?
        .ok_or_else(|| AppError::AuthenticationError("Login required".to_string()))?;

    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

/// Attaches a session when one is presented; anonymous requests pass through.
pub async fn optional_session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(ctx) = session_from_headers(&state.auth, req.headers())? {
        req.extensions_mut().insert(ctx);
    }
    Ok(next.run(req).await)
}
