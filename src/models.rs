use crate::config::Mode;
use serde::Serialize;
use uuid::Uuid;

/// Snapshot of one attached widget, as reported by the demo host.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetStatus {
    pub widget_id: Uuid,
    pub mode: Mode,
    pub line_count: usize,
    pub polling: bool,
    pub fullscreen: bool,
    pub last_error: Option<String>,
}
