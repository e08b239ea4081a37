use axum::{Json, extract::State};

use blaxgram_types::api::HealthResponse;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_db;

/// Reports ok once the database answers a trivial query.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    run_db(&state, |db| {
        db.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))?;
            Ok(())
        })
    })
    .await?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}
