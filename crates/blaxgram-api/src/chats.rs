use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use tracing::info;

use blaxgram_db::models::{CreateChatOutcome, NewChat};
use blaxgram_types::api::{Chat, Claims, CreateChatRequest};

use crate::auth::AppState;
use crate::convert;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::run_db;

const DEFAULT_AVATAR: &str = "👤";

pub async fn list_chats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Chat>>, ApiError> {
    let rows = run_db(&state, move |db| db.get_chats_for_user(claims.sub)).await?;
    Ok(Json(rows.into_iter().map(convert::chat).collect()))
}

pub async fn create_chat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::bad_request("Chat name required"));
    }
    let username = req.username.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
    let avatar = req
        .avatar
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| DEFAULT_AVATAR.to_string());

    let chat_type = req.chat_type;
    let user_id = claims.sub;
    let outcome = run_db(&state, move |db| {
        db.create_chat(
            &NewChat {
                id: req.id,
                chat_type,
                name: &name,
                username: username.as_deref(),
                avatar: &avatar,
                verified: req.verified,
                created_by: user_id,
            },
            Utc::now(),
        )
    })
    .await?;

    match outcome {
        CreateChatOutcome::Created(row) => {
            info!("User {} created {} chat {}", claims.username, chat_type, row.id);
            Ok((StatusCode::CREATED, Json(convert::chat(row))))
        }
        CreateChatOutcome::IdTaken => Err(ApiError::bad_request("Chat already exists")),
        CreateChatOutcome::UsernameTaken => Err(ApiError::bad_request("Username already taken")),
    }
}
