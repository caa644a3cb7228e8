//! Browser chat front end for the dispatcher
//!
//! A small server-rendered page plus a JSON endpoint; sessions are kept in
//! memory for the lifetime of the process.

pub mod handlers;
pub mod page;
pub mod session;

pub use handlers::{ChatState, SESSION_COOKIE};
pub use session::{ChatEntry, ChatRole, Session, SessionStore};

use crate::config::ChatConfig;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Build the chat server routes
pub fn build_router(state: ChatState, config: &ChatConfig) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/chat", post(handlers::submit_chat))
        .route("/api/v1/chat", post(handlers::api_chat))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
