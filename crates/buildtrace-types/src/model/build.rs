use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::intern::InternedString;
use crate::model::diagnostic::{Diagnostic, Message};
use crate::model::item::{FileCopy, ItemAction, ItemGroup, Property, TaskParameter};

/// Final result of a build, project, target, or task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Failed,

    /// No finish event was observed; the stream was truncated or the record
    /// was still open when the build ended.
    Incomplete,
}

impl Outcome {
    pub fn from_flag(succeeded: Option<bool>) -> Self {
        match succeeded {
            Some(true) => Outcome::Succeeded,
            Some(false) => Outcome::Failed,
            None => Outcome::Incomplete,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, Outcome::Succeeded)
    }
}

/// The fully-frozen reconstruction of one build.
///
/// Produced exactly once per event stream, after the stream ends. Everything
/// below this node is read-only, in insertion (arrival) order, with
/// parent-to-child pointers only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Build {
    pub start_time: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    pub outcome: Outcome,

    /// Environment variable snapshot at build start, sorted by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<Property>,

    /// Build-level messages (no project/target/task context).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,

    /// The root project of the build.
    pub project: Project,

    /// Evaluation passes observed before/alongside execution, in first-seen
    /// order of project file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evaluated_projects: Vec<EvaluatedProject>,

    /// Flat list of all warnings and errors, scope ids intact.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// One project's evaluation pass(es).
///
/// Keyed by project file name during reconstruction because evaluation ids
/// are not guaranteed unique across projects; all observed ids are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatedProject {
    pub project_file: InternedString,

    /// Every evaluation id observed for this project file.
    pub evaluation_ids: Vec<i64>,

    pub start_time: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

/// One executed project instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Project context id at execution time.
    pub id: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<i32>,

    /// Name extracted from the `Project "X" (targets):` start message.
    pub name: InternedString,

    pub project_file: InternedString,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_version: Option<InternedString>,

    /// Sorted by property name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_properties: Vec<Property>,

    /// Sorted by property name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,

    /// Grouped by item type, item types in first-seen order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemGroup>,

    pub start_time: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    pub outcome: Outcome,

    /// Targets in start order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<Target>,

    /// Sub-builds requested by this project outside any resolvable task.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Project>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

/// One executed target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<i32>,

    pub name: InternedString,

    /// File that defines the target.
    pub source_file: InternedString,

    /// Target that caused this one to run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_target: Option<InternedString>,

    /// Why the target was built, when the engine reported it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    pub start_time: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    pub outcome: Outcome,

    /// `Output Item(s)` groups recorded at target scope.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_items: Vec<ItemGroup>,

    /// `Set Property` operations in arrival order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_sets: Vec<Property>,

    /// `Added Item(s)` / `Removed Item(s)` operations in arrival order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item_actions: Vec<ItemAction>,

    /// Tasks in start order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<Task>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

/// One executed task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<i32>,

    pub name: InternedString,

    /// Assembly the task was loaded from, resolved from `Using task` events.
    /// Empty when resolution never arrived.
    pub from_assembly: InternedString,

    pub source_file: InternedString,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_line: Option<String>,

    pub start_time: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    pub outcome: Outcome,

    /// `Task Parameter` values in arrival order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<TaskParameter>,

    /// `Output Item(s)` groups recorded at task scope.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_items: Vec<ItemGroup>,

    /// `Output Property` values in arrival order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_properties: Vec<Property>,

    /// File copies mined from copy-task messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_copies: Vec<FileCopy>,

    /// Sub-builds spawned by this task.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<Project>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

impl Build {
    /// Total number of projects in the tree, root included.
    pub fn project_count(&self) -> usize {
        fn count(project: &Project) -> usize {
            let nested: usize = project
                .targets
                .iter()
                .flat_map(|t| t.tasks.iter())
                .flat_map(|task| task.projects.iter())
                .map(count)
                .sum();
            let direct: usize = project.children.iter().map(count).sum();
            1 + nested + direct
        }
        count(&self.project)
    }

    /// All diagnostics of error severity.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == crate::model::DiagnosticSeverity::Error)
    }

    /// All diagnostics of warning severity.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == crate::model::DiagnosticSeverity::Warning)
    }
}
