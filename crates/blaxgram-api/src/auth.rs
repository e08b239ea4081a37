use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;

use blaxgram_db::Database;
use blaxgram_db::models::{NewUser, RegisterOutcome};
use blaxgram_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};

use crate::convert;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::run_db;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

const MAX_USERNAME_LEN: usize = 32;

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim().to_string();
    let username = req.username.trim().to_string();

    // Validate input
    if name.is_empty() || username.is_empty() {
        return Err(ApiError::bad_request("Name and username required"));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::bad_request(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LEN
        )));
    }

    let last_name = req.last_name.unwrap_or_default();
    let phone = req.phone.unwrap_or_default();
    let outcome = run_db(&state, move |db| {
        db.register_user(
            &NewUser {
                name: &name,
                last_name: &last_name,
                username: &username,
                phone: &phone,
            },
            Utc::now(),
        )
    })
    .await?;

    let row = match outcome {
        RegisterOutcome::Created(row) => row,
        RegisterOutcome::UsernameTaken => {
            return Err(ApiError::bad_request("Username already taken"));
        }
    };

    let token = create_token(&state, row.id, &row.username)?;
    info!("Registered user {} ({})", row.username, row.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: convert::user(row),
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim().to_string();
    let row = run_db(&state, move |db| db.get_user_by_username(&username))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if row.two_fa_enabled {
        let verified = match (row.two_fa_password.as_deref(), req.two_fa_password.as_deref()) {
            (Some(hash), Some(password)) => verify_secret(hash, password)?,
            _ => false,
        };
        if !verified {
            return Err(ApiError::TwoFactorRequired);
        }
    }

    let token = create_token(&state, row.id, &row.username)?;

    Ok(Json(AuthResponse {
        user: convert::user(row),
        token,
    }))
}

pub(crate) fn create_token(state: &AppStateInner, user_id: i64, username: &str) -> anyhow::Result<String> {
    let now = Utc::now();
    let expiry = now
        .checked_add_signed(state.token_ttl)
        .ok_or_else(|| anyhow::anyhow!("token lifetime {} overflows", state.token_ttl))?;
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        iat: now.timestamp(),
        exp: expiry.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes()),
    )?;

    Ok(token)
}

/// Hash a second-factor password with Argon2id.
pub(crate) fn hash_secret(secret: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Argon2 hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

pub(crate) fn verify_secret(hash: &str, candidate: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Corrupt password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_hash_roundtrip() {
        let hash = hash_secret("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_secret(&hash, "hunter2").unwrap());
        assert!(!verify_secret(&hash, "hunter3").unwrap());
    }

    fn state_with_ttl(token_ttl: Duration) -> AppStateInner {
        AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "unit-secret".to_string(),
            token_ttl,
        }
    }

    #[test]
    fn token_carries_configured_lifetime() {
        let state = state_with_ttl(Duration::days(7));
        let token = create_token(&state, 42, "@unit").unwrap();
        let claims = crate::middleware::decode_token("unit-secret", &token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn overflowing_lifetime_is_an_error() {
        let state = state_with_ttl(Duration::MAX);
        assert!(create_token(&state, 1, "@unit").is_err());
    }

    #[test]
    fn corrupt_hash_is_an_error() {
        assert!(verify_secret("plaintext", "plaintext").is_err());
    }
}
