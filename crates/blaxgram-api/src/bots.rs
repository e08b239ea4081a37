use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde_json::Value;
use tracing::info;

use blaxgram_db::is_unique_violation;
use blaxgram_db::models::NewBot;
use blaxgram_types::api::{Bot, Claims, CreateBotRequest};

use crate::auth::AppState;
use crate::convert;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::run_db;

pub async fn create_bot(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateBotRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = req.id.trim().to_string();
    let name = req.name.trim().to_string();
    let username = req.username.trim().to_string();
    let token = req.token.trim().to_string();
    if [&id, &name, &username, &token].iter().any(|f| f.is_empty()) {
        return Err(ApiError::bad_request("Bot id, name, username and token required"));
    }

    let description = req.description.unwrap_or_default();
    let commands = Value::Array(req.commands).to_string();
    let user_id = claims.sub;

    let result = run_db(&state, move |db| {
        db.create_bot(
            &NewBot {
                id: &id,
                name: &name,
                username: &username,
                description: &description,
                token: &token,
                commands,
                created_by: user_id,
            },
            Utc::now(),
        )
    })
    .await;

    match result {
        Ok(row) => {
            info!("User {} created bot {}", claims.username, row.username);
            Ok((StatusCode::CREATED, Json(convert::bot(row))))
        }
        Err(ApiError::Internal(e)) if is_unique_violation(&e) => {
            Err(ApiError::bad_request("Bot already exists"))
        }
        Err(e) => Err(e),
    }
}

pub async fn list_bots(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Bot>>, ApiError> {
    let rows = run_db(&state, move |db| db.get_bots_by_creator(claims.sub)).await?;
    Ok(Json(rows.into_iter().map(convert::bot).collect()))
}
