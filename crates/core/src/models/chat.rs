use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::chart::ChartSpecification;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    /// Backend-side prompt entries; may show up in history.
    System,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
            ChatRole::System => write!(f, "system"),
        }
    }
}

/// One entry of the message log. Content is markdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,

    #[serde(rename = "chart_data", default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartSpecification>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            chart: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            chart: None,
        }
    }

    pub fn with_chart(mut self, chart: Option<ChartSpecification>) -> Self {
        self.chart = chart;
        self
    }

    pub fn has_chart(&self) -> bool {
        self.chart.is_some()
    }
}

/// Body of `POST /chat/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub company_id: i64,
    /// Sent as `null` when the conversation has not started yet.
    pub session_id: Option<String>,
}

/// Response of `POST /chat/`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatReply {
    pub session_id: String,
    pub response: String,

    #[serde(default)]
    pub has_chart: bool,

    /// Kept raw so a malformed chart never fails the whole reply.
    #[serde(default)]
    pub chart_data: Option<serde_json::Value>,

    #[serde(default)]
    pub company_name: Option<String>,

    #[serde(default)]
    pub reports_used: Option<u32>,

    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
}

impl ChatReply {
    pub fn text(session_id: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            response: response.into(),
            has_chart: false,
            chart_data: None,
            company_name: None,
            reports_used: None,
            suggestions: None,
        }
    }

    /// The chart to attach to the assistant message.
    ///
    /// Only honoured when `has_chart` is set; a payload that does not parse
    /// as a chart specification is dropped.
    pub fn chart(&self) -> Option<ChartSpecification> {
        if !self.has_chart {
            return None;
        }
        let raw = self.chart_data.as_ref()?;
        if raw.is_null() {
            return None;
        }
        match serde_json::from_value::<ChartSpecification>(raw.clone()) {
            Ok(spec) => Some(spec),
            Err(e) => {
                tracing::warn!(session_id = %self.session_id, "Dropping malformed chart payload: {e}");
                None
            }
        }
    }
}

/// One element of `GET /chat/history/{session_id}`. Charts are not kept
/// in history.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryEntry {
    pub role: ChatRole,
    pub content: String,

    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
}

impl From<HistoryEntry> for ChatMessage {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            role: entry.role,
            content: entry.content,
            chart: None,
        }
    }
}

/// Response of `POST /chat/analyze/{company_id}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub company_id: Option<i64>,

    #[serde(default)]
    pub company_name: Option<String>,

    #[serde(default)]
    pub analysis_type: Option<String>,

    pub result: serde_json::Value,

    #[serde(default)]
    pub reports_analyzed: Option<u32>,
}

impl AnalysisResponse {
    pub fn from_result(result: serde_json::Value) -> Self {
        Self {
            company_id: None,
            company_name: None,
            analysis_type: None,
            result,
            reports_analyzed: None,
        }
    }

    /// The analysis text, or the whole result dumped as JSON when the
    /// `analysis` field is missing or empty.
    #[must_use]
    pub fn analysis_text(&self) -> String {
        match self.result.get("analysis") {
            Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
            Some(serde_json::Value::Null) | Some(serde_json::Value::String(_)) | None => {
                self.result.to_string()
            }
            Some(other) => other.to_string(),
        }
    }
}
