use axum::{Extension, Json, extract::State};

use blaxgram_db::models::ToggleReactionOutcome;
use blaxgram_types::api::{Claims, ToggleReactionRequest, ToggleReactionResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::run_db;

/// Reactions are keyed by username, so the caller's username from the
/// token is what gets added or removed.
pub async fn toggle_reaction(
    State(state): State<AppState>,
    ApiPath(message_id): ApiPath<i64>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<ToggleReactionRequest>,
) -> Result<Json<ToggleReactionResponse>, ApiError> {
    let emoji = req.emoji.trim().to_string();
    if emoji.is_empty() {
        return Err(ApiError::bad_request("Emoji required"));
    }

    let outcome = run_db(&state, move |db| {
        db.toggle_reaction(message_id, &emoji, &claims.username)
    })
    .await?;

    match outcome {
        ToggleReactionOutcome::Toggled { added, reactions } => Ok(Json(ToggleReactionResponse {
            success: true,
            added,
            reactions,
        })),
        ToggleReactionOutcome::MessageNotFound => Err(ApiError::not_found("Message not found")),
    }
}
