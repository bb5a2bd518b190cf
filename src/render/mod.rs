mod highlight;

pub use highlight::{default_rules, highlight, highlight_span, HighlightRule, Matcher};

use crate::config::Configuration;
use serde_json::Value;
use std::sync::Arc;

/// Hook that turns an inbound payload into the text to highlight.
pub type Transform = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// The identity transform: strings pass through, anything else is shown as JSON.
pub fn payload_text(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Transform that escapes markup characters before highlighting.
pub fn escape_html(payload: &Value) -> String {
    html_escape::encode_text(&payload_text(payload)).into_owned()
}

pub fn wrap_line(markup: &str) -> String {
    format!("<p class=\"console-line\">{}</p>", markup)
}

/// Runs a payload through transform, highlight and line wrapping.
pub fn render(config: &Configuration, payload: &Value) -> String {
    let text = (config.transform)(payload);
    wrap_line(&highlight(&config.highlight_rules, &text))
}
