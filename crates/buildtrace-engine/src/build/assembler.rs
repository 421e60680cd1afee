//! Freeze pass: turns the correlator's in-flight records into the immutable
//! build tree.
//!
//! Runs exactly once, after the event stream ends. Records whose finish
//! never arrived freeze with [`Outcome::Incomplete`]. Sub-builds are moved
//! out of the project arena by index; a child's arena index is always
//! greater than its parent's (children start after their parents), so
//! taking records out of their slots during recursion never revisits one.

use buildtrace_types::{Build, Diagnostic, EvaluatedProject, Outcome, Project, Target, Task};

use crate::build::records::{
    BuildRecord, EvaluationRecord, ProjectRecord, TargetRecord, TaskRecord,
};
use crate::error::{Error, Result};

pub(crate) fn assemble(
    build: Option<BuildRecord>,
    projects: Vec<ProjectRecord>,
    evaluations: Vec<EvaluationRecord>,
    diagnostics: Vec<Diagnostic>,
) -> Result<Build> {
    let build = build.ok_or_else(|| {
        Error::Assembly("no build record; the build-started event never arrived".into())
    })?;

    let roots: Vec<usize> = projects
        .iter()
        .enumerate()
        .filter(|(_, record)| !record.has_parent)
        .map(|(index, _)| index)
        .collect();
    let root = match roots.as_slice() {
        [root] => *root,
        [] => {
            return Err(Error::Assembly(
                "no root project; every project claims a parent".into(),
            ));
        }
        _ => {
            return Err(Error::Assembly(format!(
                "ambiguous build tree: {} parentless projects",
                roots.len()
            )));
        }
    };

    let mut slots: Vec<Option<ProjectRecord>> = projects.into_iter().map(Some).collect();
    let project = freeze_project(&mut slots, root);

    Ok(Build {
        start_time: build.start_time,
        end_time: build.end_time,
        outcome: Outcome::from_flag(build.succeeded),
        environment: build.environment,
        messages: build.messages,
        project,
        evaluated_projects: evaluations.into_iter().map(freeze_evaluation).collect(),
        diagnostics,
    })
}

fn freeze_project(slots: &mut Vec<Option<ProjectRecord>>, index: usize) -> Project {
    let Some(record) = slots[index].take() else {
        unreachable!("project arena index {} frozen twice", index);
    };

    let targets = record
        .targets
        .into_iter()
        .map(|target| freeze_target(slots, target))
        .collect();
    let children = record
        .children
        .into_iter()
        .map(|child| freeze_project(slots, child))
        .collect();

    Project {
        id: record.id,
        node_id: record.node_id,
        name: record.name,
        project_file: record.project_file,
        tools_version: record.tools_version,
        global_properties: record.global_properties,
        properties: record.properties,
        items: record.items,
        start_time: record.start_time,
        end_time: record.end_time,
        outcome: Outcome::from_flag(record.succeeded),
        targets,
        children,
        messages: record.messages,
    }
}

fn freeze_target(slots: &mut Vec<Option<ProjectRecord>>, record: TargetRecord) -> Target {
    let tasks = record
        .tasks
        .into_iter()
        .map(|task| freeze_task(slots, task))
        .collect();

    Target {
        id: record.id,
        node_id: record.node_id,
        name: record.name,
        source_file: record.source_file,
        parent_target: record.parent_target,
        reason: record.reason,
        start_time: record.start_time,
        end_time: record.end_time,
        outcome: Outcome::from_flag(record.succeeded),
        output_items: record.output_items,
        property_sets: record.property_sets,
        item_actions: record.item_actions,
        tasks,
        messages: record.messages,
    }
}

fn freeze_task(slots: &mut Vec<Option<ProjectRecord>>, record: TaskRecord) -> Task {
    let projects = record
        .child_projects
        .into_iter()
        .map(|child| freeze_project(slots, child))
        .collect();

    Task {
        id: record.id,
        node_id: record.node_id,
        name: record.name,
        from_assembly: record.from_assembly,
        source_file: record.source_file,
        command_line: record.command_line,
        start_time: record.start_time,
        end_time: record.end_time,
        outcome: Outcome::from_flag(record.succeeded),
        parameters: record.parameters,
        output_items: record.output_items,
        output_properties: record.output_properties,
        file_copies: record.file_copies,
        projects,
        messages: record.messages,
    }
}

fn freeze_evaluation(record: EvaluationRecord) -> EvaluatedProject {
    EvaluatedProject {
        project_file: record.project_file,
        evaluation_ids: record.evaluation_ids,
        start_time: record.start_time,
        end_time: record.end_time,
        messages: record.messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn project(id: i32, has_parent: bool) -> ProjectRecord {
        ProjectRecord {
            id,
            node_id: None,
            has_parent,
            name: "App".into(),
            project_file: "App.csproj".into(),
            tools_version: None,
            global_properties: Vec::new(),
            properties: Vec::new(),
            items: Vec::new(),
            start_time: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            end_time: None,
            succeeded: Some(true),
            targets: Vec::new(),
            children: Vec::new(),
            messages: Vec::new(),
        }
    }

    fn build_record() -> BuildRecord {
        BuildRecord::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            Vec::new(),
        )
    }

    #[test]
    fn test_assemble_requires_build_record() {
        let result = assemble(None, vec![project(1, false)], Vec::new(), Vec::new());
        assert!(matches!(result, Err(Error::Assembly(_))));
    }

    #[test]
    fn test_assemble_rejects_missing_root() {
        let result = assemble(
            Some(build_record()),
            vec![project(1, true)],
            Vec::new(),
            Vec::new(),
        );
        assert!(matches!(result, Err(Error::Assembly(_))));
    }

    #[test]
    fn test_assemble_rejects_multiple_roots() {
        let result = assemble(
            Some(build_record()),
            vec![project(1, false), project(2, false)],
            Vec::new(),
            Vec::new(),
        );
        assert!(matches!(result, Err(Error::Assembly(_))));
    }

    #[test]
    fn test_unfinished_records_freeze_incomplete() {
        let mut record = project(1, false);
        record.succeeded = None;

        let build = assemble(Some(build_record()), vec![record], Vec::new(), Vec::new())
            .expect("single root assembles");
        assert_eq!(build.project.outcome, Outcome::Incomplete);
        assert_eq!(build.outcome, Outcome::Incomplete);
    }

    #[test]
    fn test_nested_children_are_attached() {
        let mut root = project(1, false);
        root.children.push(1);

        let build = assemble(
            Some(build_record()),
            vec![root, project(2, true)],
            Vec::new(),
            Vec::new(),
        )
        .expect("tree assembles");
        assert_eq!(build.project.children.len(), 1);
        assert_eq!(build.project.children[0].id, 2);
        assert_eq!(build.project_count(), 2);
    }
}
