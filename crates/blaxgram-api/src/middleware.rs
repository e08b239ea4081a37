use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;

use blaxgram_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// Extract and validate the bearer JWT; handlers read it back with
/// `Extension<Claims>`.
///
/// A missing header is 401, a token that fails verification is 403.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("No token provided".into()))?;

    let claims = decode_token(&state.jwt_secret, token).map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError::Forbidden("Invalid token".into())
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}
