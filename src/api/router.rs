use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::SharedState;
use crate::ws;

/// Build the Axum router with all routes and middleware.
pub fn create_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // Sessions
        .route(
            "/api/sessions",
            post(handlers::create_session).get(handlers::list_sessions),
        )
        .route(
            "/api/sessions/{id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        // Human input
        .route("/api/sessions/{id}/click", post(handlers::click))
        .route("/api/sessions/{id}/moves", post(handlers::make_move))
        // Session controls
        .route("/api/sessions/{id}/difficulty", put(handlers::set_difficulty))
        .route("/api/sessions/{id}/new-game", post(handlers::new_game))
        // Queries
        .route("/api/sessions/{id}/legal-moves", get(handlers::legal_moves))
        .route("/api/sessions/{id}/chat", get(handlers::chat_log))
        .route("/api/llm/status", get(handlers::llm_status))
        // Live events
        .route("/ws/sessions/{id}", get(ws::ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
