//! HTTP layer of the Blaxgram backend: axum handlers over `blaxgram-db`.

pub mod auth;
pub mod bots;
pub mod chats;
mod convert;
pub mod error;
pub mod extract;
pub mod gift_links;
pub mod health;
pub mod messages;
pub mod middleware;
pub mod profile;
pub mod reactions;
pub mod xost_bots;

use axum::{
    Router,
    routing::{get, post},
};
use tracing::error;

use blaxgram_db::Database;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;

/// All `/api` routes. Everything except register, login and health sits
/// behind [`middleware::require_auth`].
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/health", get(health::health));

    let protected_routes = Router::new()
        .route("/api/chats", get(chats::list_chats).post(chats::create_chat))
        .route("/api/chats/{chat_id}/messages", get(messages::get_messages))
        .route("/api/messages", post(messages::send_message))
        .route("/api/messages/{message_id}/reactions", post(reactions::toggle_reaction))
        .route("/api/bots", get(bots::list_bots).post(bots::create_bot))
        .route("/api/gift-links", post(gift_links::create_gift_link))
        .route("/api/gift-links/{code}/activate", post(gift_links::activate_gift_link))
        .route("/api/xost-bots", get(xost_bots::list_xost_bots).post(xost_bots::create_xost_bot))
        .route("/api/user", get(profile::get_user).put(profile::update_user))
        .route("/api/user/stars", post(profile::adjust_stars))
        .route("/api/user/gifts", post(profile::purchase_gift))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Run blocking DB work off the async runtime.
pub(crate) async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed: {}", e))
        })?
        .map_err(ApiError::from)
}
