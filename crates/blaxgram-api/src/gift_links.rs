use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::info;
use uuid::Uuid;

use blaxgram_db::models::{ActivationOutcome, CreateGiftLinkOutcome, NewGiftLink};
use blaxgram_types::api::{ActivateGiftLinkResponse, Claims, CreateGiftLinkRequest};

use crate::auth::AppState;
use crate::convert;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::run_db;

const GENERATED_CODE_LEN: usize = 12;

fn generate_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_CODE_LEN)
        .map(char::from)
        .collect()
}

/// Create a gift link. The creator pays
/// [`blaxgram_db::queries::GIFT_LINK_PRICE`] stars.
pub async fn create_gift_link(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateGiftLinkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    if req.expires_at <= now {
        return Err(ApiError::bad_request("Expiry must be in the future"));
    }

    let code = req
        .code
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(generate_code);
    let id = format!("gift_{}", Uuid::new_v4().simple());
    let user_id = claims.sub;
    let expires_at = req.expires_at;

    let outcome = run_db(&state, move |db| {
        db.create_gift_link(
            &NewGiftLink {
                id: &id,
                code: &code,
                created_by: user_id,
                expires_at,
            },
            now,
        )
    })
    .await?;

    match outcome {
        CreateGiftLinkOutcome::Created(row) => {
            info!("User {} created gift link {}", claims.username, row.id);
            Ok((StatusCode::CREATED, Json(convert::gift_link(row))))
        }
        CreateGiftLinkOutcome::InsufficientStars => Err(ApiError::bad_request("Insufficient stars")),
        CreateGiftLinkOutcome::CodeTaken => Err(ApiError::bad_request("Gift link code already exists")),
        CreateGiftLinkOutcome::UserNotFound => Err(ApiError::not_found("User not found")),
    }
}

pub async fn activate_gift_link(
    State(state): State<AppState>,
    ApiPath(code): ApiPath<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ActivateGiftLinkResponse>, ApiError> {
    let user_id = claims.sub;
    let outcome = run_db(&state, move |db| db.activate_gift_link(&code, user_id, Utc::now())).await?;

    match outcome {
        ActivationOutcome::Activated { premium_until } => {
            info!("User {} redeemed a gift link, premium until {}", claims.username, premium_until);
            Ok(Json(ActivateGiftLinkResponse {
                success: true,
                premium_until,
            }))
        }
        ActivationOutcome::NotFound => Err(ApiError::not_found("Gift link not found")),
        ActivationOutcome::AlreadyActivated => Err(ApiError::bad_request("Gift link already activated")),
        ActivationOutcome::Expired => Err(ApiError::bad_request("Gift link expired")),
        ActivationOutcome::UserNotFound => Err(ApiError::not_found("User not found")),
    }
}
