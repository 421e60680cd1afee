use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Event payload variants, one per build-engine callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "content")]
#[serde(rename_all = "snake_case")]
pub enum BuildEventPayload {
    /// The whole build started. First event of a well-formed stream.
    BuildStarted(BuildStartedPayload),

    /// The whole build finished. Absent when the stream was truncated.
    BuildFinished(BuildFinishedPayload),

    /// A project's property/item evaluation pass began.
    EvaluationStarted(EvaluationStartedPayload),

    /// A project's evaluation pass completed.
    EvaluationFinished(EvaluationFinishedPayload),

    /// Project execution started. Carries the evaluated property and item
    /// snapshot plus the fixed-format `Project "X" (targets):` message.
    ProjectStarted(ProjectStartedPayload),

    /// Project execution finished.
    ProjectFinished(ProjectFinishedPayload),

    /// A target within an open project started.
    TargetStarted(TargetStartedPayload),

    /// A target finished.
    TargetFinished(TargetFinishedPayload),

    /// A task within an open target started.
    TaskStarted(TaskStartedPayload),

    /// A task finished.
    TaskFinished(TaskFinishedPayload),

    /// Free-text log message. May carry structured sub-fields in the text
    /// (item groups, task parameters, copy operations).
    Message(MessagePayload),

    /// Engine status event (project queue movement, node activity).
    Status(StatusPayload),

    /// Custom event raised by a task or logger.
    Custom(CustomPayload),

    /// Warning diagnostic. Always collected, never dropped.
    Warning(DiagnosticPayload),

    /// Error diagnostic. Always collected, never dropped.
    Error(DiagnosticPayload),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildStartedPayload {
    /// Environment variable snapshot at build start, sorted by name.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildFinishedPayload {
    pub succeeded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationStartedPayload {
    /// Full path of the project file being evaluated.
    pub project_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationFinishedPayload {
    pub project_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectStartedPayload {
    /// Fixed-format engine message, `Project "X" (targets):`. The project
    /// name is extracted from this text, not carried as a separate field.
    pub message: String,

    /// Full path of the project file.
    pub project_file: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_version: Option<String>,

    /// Global properties passed into this project instance.
    #[serde(default)]
    pub global_properties: Vec<(String, String)>,

    /// Evaluated properties at project start.
    #[serde(default)]
    pub properties: Vec<(String, String)>,

    /// Evaluated items at project start: (item type, item).
    #[serde(default)]
    pub items: Vec<(String, ItemPayload)>,

    /// Context id of the project that requested this build, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_project_id: Option<i32>,

    /// Task id of the spawning task when a task requested this sub-build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFinishedPayload {
    pub succeeded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetStartedPayload {
    pub name: String,

    /// File that defines the target. May be empty on older engines.
    #[serde(default)]
    pub source_file: String,

    /// Target that caused this one to run (DependsOnTargets etc.).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_target: Option<String>,

    /// Why the target was built, when the engine reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetFinishedPayload {
    pub succeeded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStartedPayload {
    pub name: String,

    /// File whose `<Task>` element invoked this task.
    #[serde(default)]
    pub source_file: String,

    /// Command line for command-line backed tasks (ToolTask).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_line: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskFinishedPayload {
    pub succeeded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<MessageImportance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageImportance {
    High,
    Normal,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPayload {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomPayload {
    pub text: String,
}

/// Shared payload for warning and error events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticPayload {
    pub text: String,

    /// Diagnostic code, e.g. `CS0168` or `MSB3021`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<i32>,
}

/// Raw item data carried on `ProjectStarted` snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemPayload {
    /// Item spec, usually a file path.
    pub text: String,

    /// Metadata key/value pairs in declaration order.
    #[serde(default)]
    pub metadata: Vec<(String, String)>,
}

impl ItemPayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Vec::new(),
        }
    }
}
