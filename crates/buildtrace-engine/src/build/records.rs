//! Mutable in-flight records, built incrementally while the event stream is
//! live and frozen into the immutable model by the assembler.
//!
//! Projects live in an arena (`Vec<ProjectRecord>`); parent/child links
//! between projects are arena indexes so sub-builds can be attached before
//! their parents finish. Targets and tasks nest directly inside their owners
//! in start order.

use chrono::{DateTime, Utc};

use buildtrace_types::{
    FileCopy, InternedString, ItemAction, ItemGroup, Message, Property, TaskParameter,
};

pub(crate) struct BuildRecord {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub succeeded: Option<bool>,
    pub environment: Vec<Property>,
    pub messages: Vec<Message>,
}

impl BuildRecord {
    pub fn new(start_time: DateTime<Utc>, environment: Vec<Property>) -> Self {
        Self {
            start_time,
            end_time: None,
            succeeded: None,
            environment,
            messages: Vec::new(),
        }
    }
}

/// Evaluation passes for one project file.
///
/// Keyed by file name, not evaluation id: the engine reuses evaluation ids
/// across unrelated projects, so the id alone cannot identify a record.
pub(crate) struct EvaluationRecord {
    pub project_file: InternedString,
    pub evaluation_ids: Vec<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub messages: Vec<Message>,
}

impl EvaluationRecord {
    pub fn new(project_file: InternedString, start_time: DateTime<Utc>) -> Self {
        Self {
            project_file,
            evaluation_ids: Vec::new(),
            start_time,
            end_time: None,
            messages: Vec::new(),
        }
    }
}

pub(crate) struct ProjectRecord {
    pub id: i32,
    pub node_id: Option<i32>,

    /// True when this project was attached under a parent project or task.
    /// Exactly one record must remain parentless: the root of the build.
    pub has_parent: bool,

    pub name: InternedString,
    pub project_file: InternedString,
    pub tools_version: Option<InternedString>,
    pub global_properties: Vec<Property>,
    pub properties: Vec<Property>,
    pub items: Vec<ItemGroup>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub succeeded: Option<bool>,
    pub targets: Vec<TargetRecord>,

    /// Arena indexes of sub-builds nested directly under this project.
    pub children: Vec<usize>,
    pub messages: Vec<Message>,
}

pub(crate) struct TargetRecord {
    pub id: i32,
    pub node_id: Option<i32>,
    pub name: InternedString,
    pub source_file: InternedString,
    pub parent_target: Option<InternedString>,
    pub reason: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub succeeded: Option<bool>,
    pub output_items: Vec<ItemGroup>,
    pub property_sets: Vec<Property>,
    pub item_actions: Vec<ItemAction>,
    pub tasks: Vec<TaskRecord>,
    pub messages: Vec<Message>,
}

pub(crate) struct TaskRecord {
    pub id: i32,
    pub node_id: Option<i32>,
    pub name: InternedString,
    pub from_assembly: InternedString,
    pub source_file: InternedString,
    pub command_line: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub succeeded: Option<bool>,
    pub parameters: Vec<TaskParameter>,
    pub output_items: Vec<ItemGroup>,
    pub output_properties: Vec<Property>,
    pub file_copies: Vec<FileCopy>,

    /// Arena indexes of sub-builds spawned by this task.
    pub child_projects: Vec<usize>,
    pub messages: Vec<Message>,
}
