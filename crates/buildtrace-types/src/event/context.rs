use serde::{Deserialize, Serialize};

/// Numeric identifiers attached to every build event by the engine.
///
/// Each id is a small integer that is unique only while the entity it names
/// is open; the engine reuses ids across unrelated, non-overlapping entities
/// over the life of a large build. `None` means the id is not populated for
/// this event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEventContext {
    /// Project evaluation id. Not guaranteed unique across projects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_id: Option<i64>,

    /// Project context id (execution, not evaluation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i32>,

    /// Target id within the build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<i32>,

    /// Task id within the build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i32>,

    /// Build node (worker process) the event was raised on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<i32>,
}

impl BuildEventContext {
    pub fn build_level() -> Self {
        Self::default()
    }

    pub fn for_project(project_id: i32) -> Self {
        Self {
            project_id: Some(project_id),
            ..Self::default()
        }
    }

    pub fn for_target(project_id: i32, target_id: i32) -> Self {
        Self {
            project_id: Some(project_id),
            target_id: Some(target_id),
            ..Self::default()
        }
    }

    pub fn for_task(project_id: i32, target_id: i32, task_id: i32) -> Self {
        Self {
            project_id: Some(project_id),
            target_id: Some(target_id),
            task_id: Some(task_id),
            ..Self::default()
        }
    }

    /// The most specific scope this context names: task > target > project >
    /// evaluation > build-level.
    pub fn scope(&self) -> EventScope {
        if let Some(task_id) = self.task_id {
            EventScope::Task(task_id)
        } else if let Some(target_id) = self.target_id {
            EventScope::Target(target_id)
        } else if let Some(project_id) = self.project_id {
            EventScope::Project(project_id)
        } else if let Some(evaluation_id) = self.evaluation_id {
            EventScope::Evaluation(evaluation_id)
        } else {
            EventScope::Build
        }
    }

    /// True when no id at all is populated.
    pub fn is_build_level(&self) -> bool {
        matches!(self.scope(), EventScope::Build)
    }
}

/// Resolved routing scope for an event, carrying the id that selected it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventScope {
    Task(i32),
    Target(i32),
    Project(i32),
    Evaluation(i64),
    Build,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_prefers_most_specific_id() {
        let ctx = BuildEventContext::for_task(1, 2, 3);
        assert_eq!(ctx.scope(), EventScope::Task(3));

        let ctx = BuildEventContext::for_target(1, 2);
        assert_eq!(ctx.scope(), EventScope::Target(2));

        let ctx = BuildEventContext::for_project(1);
        assert_eq!(ctx.scope(), EventScope::Project(1));

        assert_eq!(BuildEventContext::build_level().scope(), EventScope::Build);
    }

    #[test]
    fn test_scope_evaluation() {
        let ctx = BuildEventContext {
            evaluation_id: Some(7),
            ..Default::default()
        };
        assert_eq!(ctx.scope(), EventScope::Evaluation(7));
        assert!(!ctx.is_build_level());
    }
}
