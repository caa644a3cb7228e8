//! Server-rendered chat page

use super::session::{ChatRole, Session};
use crate::presentation::escape_html;
use std::fmt::Write;

const STYLE: &str = r#"<style>
    body { font-family: sans-serif; max-width: 900px; margin: 2rem auto; }
    .chat-message { padding: 1.5rem; border-radius: 0.5rem; margin-bottom: 1rem; display: flex; flex-direction: column; }
    .chat-message.user { background-color: #e6f7ff; border-left: 5px solid #2196F3; }
    .chat-message.assistant { background-color: #f0f0f0; border-left: 5px solid #4CAF50; }
    .chat-message .content { display: flex; margin-top: 0.5rem; }
    .avatar { width: 40px; height: 40px; border-radius: 50%; object-fit: cover; margin-right: 1rem; }
    .message { flex: 1; color: #000000; }
    .timestamp { font-size: 0.8rem; color: #888; margin-top: 0.2rem; }
    form { display: flex; gap: 0.5rem; }
    form input[type=text] { flex: 1; padding: 0.6rem; }
    footer { color: #888; font-size: 0.8rem; border-top: 1px solid #ddd; margin-top: 2rem; padding-top: 0.5rem; }
</style>"#;

fn avatar_url(role: ChatRole, session: &Session) -> String {
    match role {
        ChatRole::User => format!(
            "https://api.dicebear.com/7.x/avataaars/svg?seed={}",
            session.user_id
        ),
        ChatRole::Assistant => "https://api.dicebear.com/7.x/bottts/svg?seed=news-sense".to_string(),
    }
}

/// The whole page for one session
pub fn render_page(session: &Session) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>News Sense Agent</title>\n");
    html.push_str(STYLE);
    html.push_str("\n</head>\n<body>\n");
    html.push_str("<h1>&#128240; News Sense Agent</h1>\n");
    html.push_str("<p>Ask me about the latest news, trends, and insights!</p>\n");

    for entry in &session.history {
        let class = match entry.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        };
        let _ = write!(
            html,
            "<div class=\"chat-message {}\"><div class=\"content\">\
             <img src=\"{}\" class=\"avatar\" />\
             <div class=\"message\">{}<div class=\"timestamp\">{}</div></div>\
             </div></div>\n",
            class,
            avatar_url(entry.role, session),
            entry.content,
            escape_html(&entry.timestamp)
        );
    }

    html.push_str(
        "<form method=\"post\" action=\"/chat\">\
         <input type=\"text\" name=\"message\" placeholder=\"Ask me anything about news...\" autofocus required />\
         <button type=\"submit\">Send</button></form>\n",
    );
    html.push_str("<footer>Built with axum</footer>\n</body>\n</html>\n");
    html
}
