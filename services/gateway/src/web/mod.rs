pub mod dispatcher;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

use axum::{routing::get, Router};
use std::sync::Arc;

pub use dispatcher::dispatch;
pub use rest::health_handler;
pub use ws_handler::ws_handler;

/// The gateway routes. The rich client connects to the bare address, so the
/// WebSocket is served on `/` as well as `/ws`.
pub fn router(app_state: Arc<state::AppState>) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
