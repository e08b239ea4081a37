use axum::{Extension, Json, extract::State};
use chrono::Utc;
use tracing::info;

use blaxgram_db::models::{BalanceOutcome, NewUserGift, ProfileOutcome};
use blaxgram_db::queries::ProfileUpdate;
use blaxgram_types::api::{
    AdjustStarsRequest, Claims, PurchaseGiftRequest, PurchaseGiftResponse, StarsResponse,
    UpdateUserRequest, User, UserProfile,
};

use crate::auth::{AppState, hash_secret};
use crate::convert;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::run_db;

pub async fn get_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserProfile>, ApiError> {
    let user_id = claims.sub;
    let (row, gifts) = run_db(&state, move |db| {
        let Some(row) = db.get_user_by_id(user_id)? else {
            return Ok(None);
        };
        let gifts = db.get_user_gifts(user_id)?;
        Ok(Some((row, gifts)))
    })
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserProfile {
        user: convert::user(row),
        gifts: gifts.into_iter().map(convert::user_gift).collect(),
    }))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::bad_request("Name required"));
    }

    let password_hash = match req.two_fa_password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => Some(hash_secret(password)?),
        None => None,
    };

    let user_id = claims.sub;
    let last_name = req.last_name.unwrap_or_default();
    let bio = req.bio.unwrap_or_default();
    let two_fa_enabled = req.two_fa_enabled;

    let outcome = run_db(&state, move |db| {
        db.update_profile(
            user_id,
            &ProfileUpdate {
                name: &name,
                last_name: &last_name,
                bio: &bio,
                two_fa_enabled,
                two_fa_password_hash: password_hash.as_deref(),
            },
        )
    })
    .await?;

    match outcome {
        ProfileOutcome::Updated(row) => Ok(Json(convert::user(row))),
        ProfileOutcome::TwoFactorPasswordRequired => Err(ApiError::bad_request("2FA password required")),
        ProfileOutcome::UserNotFound => Err(ApiError::not_found("User not found")),
    }
}

/// Apply a signed star adjustment. The balance never goes below zero.
pub async fn adjust_stars(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<AdjustStarsRequest>,
) -> Result<Json<StarsResponse>, ApiError> {
    let user_id = claims.sub;
    let outcome = run_db(&state, move |db| db.adjust_stars(user_id, req.amount)).await?;

    match outcome {
        BalanceOutcome::Updated { stars } => Ok(Json(StarsResponse { stars })),
        BalanceOutcome::InsufficientStars => Err(ApiError::bad_request("Insufficient stars")),
        BalanceOutcome::UserNotFound => Err(ApiError::not_found("User not found")),
    }
}

pub async fn purchase_gift(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<PurchaseGiftRequest>,
) -> Result<Json<PurchaseGiftResponse>, ApiError> {
    if req.gift_price < 0 {
        return Err(ApiError::bad_request("Gift price must not be negative"));
    }
    if req.gift_name.trim().is_empty() {
        return Err(ApiError::bad_request("Gift name required"));
    }

    let user_id = claims.sub;
    let gift_id = req.gift_id;
    let outcome = run_db(&state, move |db| {
        db.purchase_gift(
            user_id,
            &NewUserGift {
                gift_id,
                gift_name: req.gift_name.trim(),
                gift_icon: &req.gift_icon,
                gift_price: req.gift_price,
            },
            Utc::now(),
        )
    })
    .await?;

    match outcome {
        BalanceOutcome::Updated { stars } => {
            info!("User {} bought gift {}, {} stars left", claims.username, gift_id, stars);
            Ok(Json(PurchaseGiftResponse { success: true, stars }))
        }
        BalanceOutcome::InsufficientStars => Err(ApiError::bad_request("Insufficient stars")),
        BalanceOutcome::UserNotFound => Err(ApiError::not_found("User not found")),
    }
}
