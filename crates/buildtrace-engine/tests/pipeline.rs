//! End-to-end reconstruction tests: raw event streams in, frozen trees out.

use chrono::{DateTime, Duration, TimeZone, Utc};

use buildtrace_engine::{build_log, export_raw_json, export_text, Error, LogBuilder};
use buildtrace_types::{
    BuildEvent, BuildEventContext, BuildEventPayload, BuildFinishedPayload, BuildStartedPayload,
    DiagnosticPayload, DiagnosticSeverity, EvaluationFinishedPayload, EvaluationStartedPayload,
    JsonLinesSource, MessagePayload, Outcome, ProjectFinishedPayload, ProjectStartedPayload,
    TargetFinishedPayload, TargetStartedPayload, TaskFinishedPayload, TaskParameter,
    TaskStartedPayload,
};

fn ts(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::seconds(seconds)
}

fn event(seconds: i64, context: BuildEventContext, payload: BuildEventPayload) -> BuildEvent {
    BuildEvent::new(ts(seconds), context, payload)
}

fn build_started() -> BuildEventPayload {
    BuildEventPayload::BuildStarted(BuildStartedPayload {
        environment: [("Configuration".to_string(), "Debug".to_string())]
            .into_iter()
            .collect(),
    })
}

fn project_started(name: &str, file: &str) -> BuildEventPayload {
    BuildEventPayload::ProjectStarted(ProjectStartedPayload {
        message: format!("Project \"{}\" (Build target(s)):", name),
        project_file: file.to_string(),
        tools_version: Some("Current".to_string()),
        global_properties: Vec::new(),
        properties: vec![
            ("OutDir".to_string(), "bin\\Debug\\".to_string()),
            ("Configuration".to_string(), "Debug".to_string()),
        ],
        items: Vec::new(),
        parent_project_id: None,
        parent_task_id: None,
    })
}

fn target_started(name: &str) -> BuildEventPayload {
    BuildEventPayload::TargetStarted(TargetStartedPayload {
        name: name.to_string(),
        source_file: "Foo.csproj".to_string(),
        parent_target: None,
        reason: None,
    })
}

fn task_started(name: &str) -> BuildEventPayload {
    BuildEventPayload::TaskStarted(TaskStartedPayload {
        name: name.to_string(),
        source_file: "Microsoft.CSharp.targets".to_string(),
        command_line: None,
    })
}

fn message(text: &str) -> BuildEventPayload {
    BuildEventPayload::Message(MessagePayload {
        text: text.to_string(),
        importance: None,
    })
}

fn finished(succeeded: bool) -> BuildFinishedPayload {
    BuildFinishedPayload { succeeded }
}

/// A minimal well-formed stream: one project, one target, one task, all
/// succeeding.
fn scaffold() -> Vec<BuildEvent> {
    vec![
        event(0, BuildEventContext::build_level(), build_started()),
        event(
            1,
            BuildEventContext {
                evaluation_id: Some(1),
                ..Default::default()
            },
            BuildEventPayload::EvaluationStarted(EvaluationStartedPayload {
                project_file: "Foo.csproj".to_string(),
            }),
        ),
        event(
            2,
            BuildEventContext {
                evaluation_id: Some(1),
                ..Default::default()
            },
            BuildEventPayload::EvaluationFinished(EvaluationFinishedPayload {
                project_file: "Foo.csproj".to_string(),
            }),
        ),
        event(
            3,
            BuildEventContext::for_project(1),
            project_started("Foo", "Foo.csproj"),
        ),
        event(4, BuildEventContext::for_target(1, 10), target_started("Build")),
        event(5, BuildEventContext::for_task(1, 10, 100), task_started("Csc")),
        event(
            6,
            BuildEventContext::for_task(1, 10, 100),
            BuildEventPayload::TaskFinished(TaskFinishedPayload { succeeded: true }),
        ),
        event(
            7,
            BuildEventContext::for_target(1, 10),
            BuildEventPayload::TargetFinished(TargetFinishedPayload { succeeded: true }),
        ),
        event(
            8,
            BuildEventContext::for_project(1),
            BuildEventPayload::ProjectFinished(ProjectFinishedPayload { succeeded: true }),
        ),
        event(
            9,
            BuildEventContext::build_level(),
            BuildEventPayload::BuildFinished(finished(true)),
        ),
    ]
}

#[test]
fn test_round_trip_reconstructs_tree() {
    let build = build_log(&scaffold()).unwrap();

    assert_eq!(build.outcome, Outcome::Succeeded);
    assert_eq!(build.environment.len(), 1);
    assert_eq!(build.project_count(), 1);
    assert!(build.diagnostics.is_empty());

    let project = &build.project;
    assert_eq!(project.name.as_str(), "Foo");
    assert_eq!(project.project_file.as_str(), "Foo.csproj");
    assert_eq!(project.outcome, Outcome::Succeeded);
    // Properties come out sorted by name.
    assert_eq!(project.properties[0].name.as_str(), "Configuration");
    assert_eq!(project.properties[1].name.as_str(), "OutDir");

    assert_eq!(project.targets.len(), 1);
    let target = &project.targets[0];
    assert_eq!(target.name.as_str(), "Build");
    assert_eq!(target.outcome, Outcome::Succeeded);

    assert_eq!(target.tasks.len(), 1);
    let task = &target.tasks[0];
    assert_eq!(task.name.as_str(), "Csc");
    assert_eq!(task.outcome, Outcome::Succeeded);
    assert_eq!(task.end_time, Some(ts(6)));

    assert_eq!(build.evaluated_projects.len(), 1);
    assert_eq!(build.evaluated_projects[0].evaluation_ids, vec![1]);
    assert_eq!(build.evaluated_projects[0].end_time, Some(ts(2)));
}

#[test]
fn test_task_parameter_message_is_structured() {
    let mut events = scaffold();
    events.insert(
        6,
        event(
            5,
            BuildEventContext::for_task(1, 10, 100),
            message("Task Parameter:\n    Sources=\n        Program.cs\n            Link = src\\Program.cs\n"),
        ),
    );

    let build = build_log(&events).unwrap();
    let task = &build.project.targets[0].tasks[0];

    assert_eq!(task.parameters.len(), 1);
    match &task.parameters[0] {
        TaskParameter::Items(group) => {
            assert_eq!(group.name.as_str(), "Sources");
            assert_eq!(group.items[0].text.as_str(), "Program.cs");
            assert_eq!(group.items[0].metadata[0].name.as_str(), "Link");
        }
        other => panic!("Unexpected parameter: {:?}", other),
    }
    // Structured messages do not also appear as free text.
    assert!(task.messages.is_empty());
}

#[test]
fn test_using_task_notice_resolves_assembly() {
    let mut events = scaffold();
    events.insert(
        5,
        event(
            4,
            BuildEventContext::for_target(1, 10),
            message("Using \"Csc\" task from assembly \"Microsoft.Build.Tasks.Core.dll\"."),
        ),
    );

    let build = build_log(&events).unwrap();
    let task = &build.project.targets[0].tasks[0];
    assert_eq!(task.from_assembly.as_str(), "Microsoft.Build.Tasks.Core.dll");
}

#[test]
fn test_file_copy_attached_to_task() {
    let mut events = scaffold();
    events.insert(
        6,
        event(
            5,
            BuildEventContext::for_task(1, 10, 100),
            message("Copying file from \"obj\\Foo.dll\" to \"bin\\Foo.dll\"."),
        ),
    );

    let build = build_log(&events).unwrap();
    let task = &build.project.targets[0].tasks[0];

    assert_eq!(task.file_copies.len(), 1);
    assert_eq!(task.file_copies[0].source.as_str(), "obj\\Foo.dll");
    assert!(task.file_copies[0].copied);
    assert!(task.messages.is_empty());
}

#[test]
fn test_rar_dump_mined_into_parameters_and_outputs() {
    let mut events = scaffold();
    events[5] = event(
        5,
        BuildEventContext::for_task(1, 10, 100),
        task_started("ResolveAssemblyReference"),
    );
    events.insert(
        6,
        event(
            5,
            BuildEventContext::for_task(1, 10, 100),
            message(
                "Assemblies:\n    System.Xml\nPrimary reference \"System.Xml\".\n    System.Xml.dll",
            ),
        ),
    );

    let build = build_log(&events).unwrap();
    let task = &build.project.targets[0].tasks[0];

    assert_eq!(task.parameters.len(), 1);
    match &task.parameters[0] {
        TaskParameter::Items(group) => assert_eq!(group.name.as_str(), "Assemblies"),
        other => panic!("Unexpected parameter: {:?}", other),
    }
    assert_eq!(task.output_items.len(), 1);
    assert_eq!(
        task.output_items[0].name.as_str(),
        "Primary reference \"System.Xml\""
    );
}

#[test]
fn test_duplicate_project_start_becomes_diagnostic() {
    let mut events = scaffold();
    events.insert(
        4,
        event(
            3,
            BuildEventContext::for_project(1),
            project_started("Foo", "Foo.csproj"),
        ),
    );

    let build = build_log(&events).unwrap();

    // One project in the tree, one synthetic error about the duplicate.
    assert_eq!(build.project_count(), 1);
    let errors: Vec<_> = build.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].project_id, Some(1));
    assert!(errors[0].text.as_str().contains("already open"));
}

#[test]
fn test_unmatched_target_finish_becomes_diagnostic() {
    let mut events = scaffold();
    events.insert(
        4,
        event(
            4,
            BuildEventContext::for_target(1, 99),
            BuildEventPayload::TargetFinished(TargetFinishedPayload { succeeded: true }),
        ),
    );

    let build = build_log(&events).unwrap();
    assert_eq!(build.project.targets.len(), 1);
    let errors: Vec<_> = build.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].target_id, Some(99));
}

#[test]
fn test_truncated_stream_freezes_incomplete() {
    // Drop everything after the task started: no finishes at all.
    let events: Vec<BuildEvent> = scaffold().into_iter().take(6).collect();

    let build = build_log(&events).unwrap();
    assert_eq!(build.outcome, Outcome::Incomplete);
    assert_eq!(build.project.outcome, Outcome::Incomplete);
    assert_eq!(build.project.targets[0].outcome, Outcome::Incomplete);
    assert_eq!(build.project.targets[0].tasks[0].outcome, Outcome::Incomplete);
}

#[test]
fn test_warning_kept_with_scope_ids() {
    let mut events = scaffold();
    events.insert(
        6,
        event(
            5,
            BuildEventContext::for_task(1, 10, 100),
            BuildEventPayload::Warning(DiagnosticPayload {
                text: "Variable 'x' is declared but never used".to_string(),
                code: Some("CS0168".to_string()),
                file: Some("Program.cs".to_string()),
                project_file: Some("Foo.csproj".to_string()),
                subcategory: None,
                line: Some(12),
                column: Some(9),
                end_line: None,
                end_column: None,
            }),
        ),
    );

    let build = build_log(&events).unwrap();
    assert_eq!(build.outcome, Outcome::Succeeded);

    let warnings: Vec<_> = build.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity, DiagnosticSeverity::Warning);
    assert_eq!(warnings[0].code.as_ref().unwrap().as_str(), "CS0168");
    assert_eq!(warnings[0].project_id, Some(1));
    assert_eq!(warnings[0].task_id, Some(100));
}

#[test]
fn test_builder_is_single_use() {
    let builder = LogBuilder::new();
    for e in scaffold() {
        builder.handle_event(&e).unwrap();
    }
    builder.finish().unwrap();

    assert!(matches!(builder.finish(), Err(Error::AlreadyFinished)));
    let late = event(10, BuildEventContext::build_level(), message("late"));
    assert!(matches!(
        builder.handle_event(&late),
        Err(Error::AlreadyFinished)
    ));
}

#[test]
fn test_missing_build_started_fails_assembly() {
    let events: Vec<BuildEvent> = scaffold().into_iter().skip(1).collect();
    assert!(matches!(build_log(&events), Err(Error::Assembly(_))));
}

#[test]
fn test_sub_build_nests_under_spawning_task() {
    let mut events = scaffold();
    let msbuild_task = event(
        5,
        BuildEventContext::for_task(1, 10, 100),
        task_started("MSBuild"),
    );
    events[5] = msbuild_task;

    let mut child = ProjectStartedPayload {
        message: "Project \"Bar\" (Build target(s)):".to_string(),
        project_file: "Bar.csproj".to_string(),
        tools_version: None,
        global_properties: Vec::new(),
        properties: Vec::new(),
        items: Vec::new(),
        parent_project_id: Some(1),
        parent_task_id: Some(100),
    };
    child.global_properties.push(("TargetFramework".to_string(), "net8.0".to_string()));
    events.insert(
        6,
        event(
            6,
            BuildEventContext::for_project(2),
            BuildEventPayload::ProjectStarted(child),
        ),
    );
    events.insert(
        7,
        event(
            7,
            BuildEventContext::for_project(2),
            BuildEventPayload::ProjectFinished(ProjectFinishedPayload { succeeded: true }),
        ),
    );

    let build = build_log(&events).unwrap();
    assert_eq!(build.project_count(), 2);

    let task = &build.project.targets[0].tasks[0];
    assert_eq!(task.projects.len(), 1);
    assert_eq!(task.projects[0].name.as_str(), "Bar");
    assert_eq!(
        task.projects[0].global_properties[0].name.as_str(),
        "TargetFramework"
    );
}

#[test]
fn test_build_level_noise_is_suppressed() {
    let mut events = scaffold();
    events.insert(
        1,
        event(
            0,
            BuildEventContext::build_level(),
            message("Search paths being used for resolution: {CandidateAssemblyFiles}"),
        ),
    );
    events.insert(
        2,
        event(
            0,
            BuildEventContext::build_level(),
            message("The target \"Pack\" does not exist in the project, and will be ignored"),
        ),
    );
    events.insert(
        3,
        event(0, BuildEventContext::build_level(), message("node 1 ready")),
    );

    let build = build_log(&events).unwrap();
    assert_eq!(build.messages.len(), 1);
    assert_eq!(build.messages[0].text.as_str(), "node 1 ready");
}

#[test]
fn test_text_export_outline() {
    let build = build_log(&scaffold()).unwrap();
    let text = export_text(&build);

    assert!(text.starts_with("Build succeeded {\n"));
    assert!(text.ends_with("}\n"));
    assert!(text.contains("Configuration = Debug"));
    assert!(text.contains("Project Foo (Foo.csproj) succeeded {"));
    assert!(text.contains("Target Build succeeded {"));
    assert!(text.contains("Task Csc succeeded"));
    assert!(text.contains("Evaluations {"));
}

#[test]
fn test_raw_json_export_replays_identically() {
    let events = scaffold();
    let serialized = export_raw_json(&events).unwrap();

    let builder = LogBuilder::new();
    let replayed = builder
        .process(JsonLinesSource::new(serialized.as_bytes()))
        .unwrap();
    let direct = build_log(&events).unwrap();

    assert_eq!(replayed.project_count(), direct.project_count());
    assert_eq!(replayed.outcome, direct.outcome);
    assert_eq!(replayed.project.name, direct.project.name);
    assert_eq!(
        replayed.project.targets[0].tasks[0].name,
        direct.project.targets[0].tasks[0].name
    );
}
