mod structured;
mod text;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collector::AuditResult;

pub use structured::{parse_structured, to_document};
pub use text::PLACEHOLDER;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    Text,
    Structured,
}

impl ReportMode {
    pub fn file_extension(self) -> &'static str {
        match self {
            ReportMode::Text => "txt",
            ReportMode::Structured => "json",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReportBody {
    Text(String),
    Structured(Value),
}

/// Read-only projection of an [`AuditResult`] at export time.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    host_id: String,
    collected_at: DateTime<Utc>,
    exported_at: DateTime<Utc>,
    body: ReportBody,
}

impl Report {
    pub fn mode(&self) -> ReportMode {
        match self.body {
            ReportBody::Text(_) => ReportMode::Text,
            ReportBody::Structured(_) => ReportMode::Structured,
        }
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    pub fn collected_at(&self) -> DateTime<Utc> {
        self.collected_at
    }

    pub fn exported_at(&self) -> DateTime<Utc> {
        self.exported_at
    }

    pub fn body(&self) -> &ReportBody {
        &self.body
    }

    /// Final bytes-to-be: the text block, or pretty-printed JSON.
    pub fn render(&self) -> String {
        match &self.body {
            ReportBody::Text(text) => text.clone(),
            ReportBody::Structured(doc) => {
                serde_json::to_string_pretty(doc).unwrap_or_else(|_| "{}".to_string())
            }
        }
    }
}

/// Formats `result` stamped with the current time as export time.
pub fn format(result: &AuditResult, mode: ReportMode) -> Report {
    format_at(result, mode, Utc::now())
}

pub fn format_at(result: &AuditResult, mode: ReportMode, exported_at: DateTime<Utc>) -> Report {
    let body = match mode {
        ReportMode::Text => ReportBody::Text(text::render(result, exported_at)),
        ReportMode::Structured => ReportBody::Structured(to_document(result, exported_at)),
    };
    Report {
        host_id: result.host_id().to_string(),
        collected_at: result.collected_at(),
        exported_at,
        body,
    }
}
