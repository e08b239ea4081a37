use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use tracing::info;

use blaxgram_db::is_unique_violation;
use blaxgram_db::models::NewXostBot;
use blaxgram_types::api::{Claims, CreateXostBotRequest, XostBot};

use crate::auth::AppState;
use crate::convert;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::run_db;

const DEFAULT_NAME: &str = "Unnamed";

/// Records a hosted bot. Nothing here runs the submitted code.
pub async fn create_xost_bot(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateXostBotRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.id.trim().is_empty()
        || req.token.trim().is_empty()
        || req.language.trim().is_empty()
        || req.code.is_empty()
    {
        return Err(ApiError::bad_request("Bot id, token, language and code required"));
    }

    let name = req
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_NAME.to_string());
    let user_id = claims.sub;

    let result = run_db(&state, move |db| {
        db.create_xost_bot(
            &NewXostBot {
                id: req.id.trim(),
                token: req.token.trim(),
                language: req.language.trim(),
                code: &req.code,
                name: &name,
                user_id,
            },
            Utc::now(),
        )
    })
    .await;

    match result {
        Ok(row) => {
            info!("User {} hosted bot {} ({})", claims.username, row.id, row.language);
            Ok((StatusCode::CREATED, Json(convert::xost_bot(row))))
        }
        Err(ApiError::Internal(e)) if is_unique_violation(&e) => {
            Err(ApiError::bad_request("Hosted bot already exists"))
        }
        Err(e) => Err(e),
    }
}

pub async fn list_xost_bots(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<XostBot>>, ApiError> {
    let rows = run_db(&state, move |db| db.get_xost_bots_for_user(claims.sub)).await?;
    Ok(Json(rows.into_iter().map(convert::xost_bot).collect()))
}
