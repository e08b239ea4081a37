use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use blaxgram_db::models::{NewMessage, SendMessageOutcome};
use blaxgram_types::api::{Claims, Message, SendMessageRequest};

use crate::auth::AppState;
use crate::convert;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::run_db;

const MAX_PAGE: u32 = 200;

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Message-id cursor: pass the id of the oldest message from the
    /// previous page to fetch older messages.
    pub before: Option<i64>,
}

fn default_limit() -> u32 {
    50
}

/// Any authenticated user may read any chat; membership is not checked.
pub async fn get_messages(
    State(state): State<AppState>,
    ApiPath(chat_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<MessageQuery>,
    Extension(_claims): Extension<Claims>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let limit = query.limit.clamp(1, MAX_PAGE);
    let before = query.before;

    let rows = run_db(&state, move |db| {
        if db.get_chat(chat_id)?.is_none() {
            return Ok(None);
        }
        db.get_messages(chat_id, limit, before).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("Chat not found"))?;

    Ok(Json(rows.into_iter().map(convert::message).collect()))
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let gift_data = req.gift_data.as_ref().map(|v| v.to_string());
    let user_id = claims.sub;

    let outcome = run_db(&state, move |db| {
        db.send_message(
            &NewMessage {
                chat_id: req.chat_id,
                user_id,
                text: &req.text,
                kind: req.kind,
                file_name: req.file_name.as_deref(),
                file_size: req.file_size.as_deref(),
                gift_id: req.gift_id,
                gift_data,
                reply_to: req.reply_to,
            },
            Utc::now(),
        )
    })
    .await?;

    match outcome {
        SendMessageOutcome::Sent(row) => {
            debug!("User {} posted message {} to chat {}", claims.username, row.id, row.chat_id);
            Ok((StatusCode::CREATED, Json(convert::message(row))))
        }
        SendMessageOutcome::ChatNotFound => Err(ApiError::not_found("Chat not found")),
        SendMessageOutcome::ReplyNotFound => Err(ApiError::bad_request("Reply target not found")),
    }
}
