//! Chat server handlers

use super::page::render_page;
use super::session::{ChatEntry, ChatRole, SessionStore};
use crate::config::ChatConfig;
use crate::dispatcher::Dispatcher;
use crate::metrics::METRICS;
use crate::presentation::{escape_html, render_chat_html, text_to_html};
use axum::{
    extract::{Form, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "news_sense_session";

/// Application state for chat handlers
#[derive(Clone)]
pub struct ChatState {
    pub dispatcher: Arc<Dispatcher>,
    pub sessions: Arc<SessionStore>,
}

impl ChatState {
    pub fn new(dispatcher: Arc<Dispatcher>, config: &ChatConfig) -> Self {
        Self {
            dispatcher,
            sessions: Arc::new(SessionStore::new(config.session_ttl(), config.max_sessions)),
        }
    }
}

/// Form body of `POST /chat`
#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub message: String,
}

/// Body of `POST /api/v1/chat`
#[derive(Debug, Deserialize)]
pub struct ChatApiRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ChatApiResponse {
    pub session_id: Uuid,
    pub reply: ChatEntry,
    pub history: Vec<ChatEntry>,
}

/// API error for chat endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatApiError {
    pub code: String,
    pub message: String,
}

impl ChatApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Session id from the request's cookie header, if any
pub fn session_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

fn session_cookie(id: Uuid) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, id
    ))
    .ok()
}

fn with_session_cookie(mut response: Response, id: Uuid) -> Response {
    if let Some(cookie) = session_cookie(id) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

/// Record the user's message, dispatch it and record the reply
async fn process_turn(state: &ChatState, session_id: Uuid, message: &str) -> ChatEntry {
    state
        .sessions
        .push(&session_id, ChatEntry::new(ChatRole::User, text_to_html(message)));

    let content = match state.dispatcher.dispatch(message).await {
        Ok(output) => {
            METRICS.record_chat_turn(true);
            render_chat_html(&output)
        }
        Err(e) => {
            error!("Chat turn failed: {}", e);
            METRICS.record_chat_turn(false);
            escape_html(&format!("Sorry, I encountered an error: {}", e))
        }
    };

    let reply = ChatEntry::new(ChatRole::Assistant, content);
    state.sessions.push(&session_id, reply.clone());
    reply
}

/// Render the chat page
///
/// GET /
pub async fn index(State(state): State<ChatState>, headers: HeaderMap) -> Response {
    let session_id = state.sessions.resolve(session_from_headers(&headers));
    let page = state
        .sessions
        .get(&session_id)
        .map(|session| render_page(&session))
        .unwrap_or_default();

    with_session_cookie(Html(page).into_response(), session_id)
}

/// Process a turn submitted from the page form
///
/// POST /chat
pub async fn submit_chat(
    State(state): State<ChatState>,
    headers: HeaderMap,
    Form(form): Form<ChatForm>,
) -> Response {
    let session_id = state.sessions.resolve(session_from_headers(&headers));

    let message = form.message.trim();
    if !message.is_empty() {
        info!("Chat turn for session {}", session_id);
        process_turn(&state, session_id, message).await;
    }

    with_session_cookie(Redirect::to("/").into_response(), session_id)
}

/// Process a turn over JSON
///
/// POST /api/v1/chat
pub async fn api_chat(
    State(state): State<ChatState>,
    headers: HeaderMap,
    Json(request): Json<ChatApiRequest>,
) -> Result<Response, (StatusCode, Json<ChatApiError>)> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ChatApiError::new("VALIDATION_ERROR", "Message cannot be empty")),
        ));
    }

    let requested = request.session_id.or_else(|| session_from_headers(&headers));
    let session_id = state.sessions.resolve(requested);

    let reply = process_turn(&state, session_id, message).await;
    let history = state
        .sessions
        .get(&session_id)
        .map(|session| session.history)
        .unwrap_or_default();

    let body = ChatApiResponse {
        session_id,
        reply,
        history,
    };
    Ok(with_session_cookie(Json(body).into_response(), session_id))
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        METRICS.export_prometheus(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_from_headers() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", SESSION_COOKIE, id)).unwrap(),
        );
        assert_eq!(session_from_headers(&headers), Some(id));

        let mut bad = HeaderMap::new();
        bad.insert(header::COOKIE, HeaderValue::from_static("news_sense_session=nope"));
        assert_eq!(session_from_headers(&bad), None);
        assert_eq!(session_from_headers(&HeaderMap::new()), None);
    }
}
