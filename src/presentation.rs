//! Rendering of dispatch results for the console and the chat page

use crate::agents::AgentOutput;
use crate::knowledge::VerificationResult;
use reqwest::Url;
use std::fmt::Write;

/// Shown when the answer matched no known output shape
pub const FALLBACK_MESSAGE: &str = "Sorry, I can't assist with that.";

/// Plain-text rendering for the console
pub fn render_console(output: &AgentOutput) -> String {
    match output {
        AgentOutput::TrendingNews(news) => {
            let mut text = String::new();
            for item in &news.headlines {
                let _ = writeln!(text, "  Rank #{}: {}", item.rank, item.headline);
                let _ = writeln!(text, "  Source: {}", item.source);
                text.push('\n');
            }
            text
        }
        AgentOutput::FactCheck(check) => render_verification(&check.result),
        AgentOutput::Summary(summary) => format!("Summary: {}", summary.summary_text),
        AgentOutput::Unrecognized(_) => FALLBACK_MESSAGE.to_string(),
    }
}

fn render_verification(result: &VerificationResult) -> String {
    let sources = if result.sources.is_empty() {
        "(none)".to_string()
    } else {
        result.sources.join(", ")
    };
    format!(
        "Verdict: {}\nSummary: {}\nSources: {}",
        result.verdict, result.summary, sources
    )
}

/// HTML fragment for an assistant chat bubble
pub fn render_chat_html(output: &AgentOutput) -> String {
    match output {
        AgentOutput::TrendingNews(news) => {
            let mut html = String::new();
            // Numbered by position; the model's rank may skip or repeat
            for (i, item) in news.headlines.iter().enumerate() {
                let _ = write!(
                    html,
                    "<p><b>{}:</b> {}</p><p><i>Source:</i> {}</p><br>",
                    i + 1,
                    escape_html(&item.headline),
                    source_html(&item.source)
                );
            }
            html
        }
        AgentOutput::FactCheck(check) => escape_html(&check.result.summary),
        AgentOutput::Summary(summary) => text_to_html(&summary.summary_text),
        AgentOutput::Unrecognized(_) => escape_html(FALLBACK_MESSAGE),
    }
}

/// A link for http(s) sources, escaped plain text for anything else
fn source_html(source: &str) -> String {
    let escaped = escape_html(source);
    match Url::parse(source.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => format!(
            "<a href='{}' target='_blank'>{}</a>",
            escape_html(url.as_str()),
            escaped
        ),
        _ => escaped,
    }
}

/// Escape text for use in HTML content and single- or double-quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escaped text with line breaks kept
pub fn text_to_html(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}
