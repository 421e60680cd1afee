use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::intern::InternedString;

/// A timestamped free-text log message attached to a scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub timestamp: DateTime<Utc>,
    pub text: InternedString,
}

impl Message {
    pub fn new(timestamp: DateTime<Utc>, text: InternedString) -> Self {
        Self { timestamp, text }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSeverity {
    Warning,
    Error,
}

/// A warning or error raised during the build.
///
/// Diagnostics live in a flat list on [`crate::model::Build`] rather than
/// inline in their scope's message stream: they may arrive with partial or no
/// context and must never be dropped. The scope ids are kept so consumers can
/// index diagnostics by project/target/task as needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub text: InternedString,
    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<InternedString>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<InternedString>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_file: Option<InternedString>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<InternedString>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<i32>,

    /// Project context id at raise time, when populated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i32>,
}
