//! Exporters for reconstructed builds and raw event streams.
//!
//! The text exporter renders the frozen tree as an indented, brace-delimited
//! outline for human inspection and snapshot-style assertions. The raw
//! exporter writes the unmodified event stream as JSON lines, the same
//! format [`buildtrace_types::JsonLinesSource`] reads back.

use std::fmt::Write as _;
use std::io::Write;

use buildtrace_types::{
    Build, BuildEvent, Diagnostic, DiagnosticSeverity, Outcome, Project, Target, Task,
};

use crate::error::Result;

/// Render a frozen build as indented, brace-delimited text.
pub fn export_text(build: &Build) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Build {} {{", outcome_label(build.outcome));
    if !build.environment.is_empty() {
        let _ = writeln!(out, "  Environment {{");
        for property in &build.environment {
            let _ = writeln!(out, "    {} = {}", property.name, property.value);
        }
        let _ = writeln!(out, "  }}");
    }
    render_project(&mut out, &build.project, 1);

    if !build.evaluated_projects.is_empty() {
        let _ = writeln!(out, "  Evaluations {{");
        for evaluation in &build.evaluated_projects {
            let _ = writeln!(out, "    {}", evaluation.project_file);
        }
        let _ = writeln!(out, "  }}");
    }
    if !build.diagnostics.is_empty() {
        let _ = writeln!(out, "  Diagnostics {{");
        for diagnostic in &build.diagnostics {
            render_diagnostic(&mut out, diagnostic);
        }
        let _ = writeln!(out, "  }}");
    }
    out.push_str("}\n");
    out
}

/// Write the text rendering to a writer.
pub fn write_text<W: Write>(build: &Build, mut writer: W) -> Result<()> {
    writer.write_all(export_text(build).as_bytes())?;
    Ok(())
}

/// Serialize an event stream as JSON lines, one event per line.
pub fn export_raw_json(events: &[BuildEvent]) -> Result<String> {
    let mut out = String::new();
    for event in events {
        out.push_str(&serde_json::to_string(event)?);
        out.push('\n');
    }
    Ok(out)
}

/// Write an event stream as JSON lines to a writer.
pub fn write_raw_json<W: Write>(events: &[BuildEvent], mut writer: W) -> Result<()> {
    for event in events {
        serde_json::to_writer(&mut writer, event)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

fn render_project(out: &mut String, project: &Project, depth: usize) {
    let indent = "  ".repeat(depth);
    let header = format!(
        "Project {} ({}) {}",
        project.name,
        project.project_file,
        outcome_label(project.outcome)
    );

    if project.targets.is_empty() && project.children.is_empty() {
        let _ = writeln!(out, "{}{}", indent, header);
        return;
    }

    let _ = writeln!(out, "{}{} {{", indent, header);
    for target in &project.targets {
        render_target(out, target, depth + 1);
    }
    for child in &project.children {
        render_project(out, child, depth + 1);
    }
    let _ = writeln!(out, "{}}}", indent);
}

fn render_target(out: &mut String, target: &Target, depth: usize) {
    let indent = "  ".repeat(depth);
    let header = format!("Target {} {}", target.name, outcome_label(target.outcome));

    if target.tasks.is_empty() {
        let _ = writeln!(out, "{}{}", indent, header);
        return;
    }

    let _ = writeln!(out, "{}{} {{", indent, header);
    for task in &target.tasks {
        render_task(out, task, depth + 1);
    }
    let _ = writeln!(out, "{}}}", indent);
}

fn render_task(out: &mut String, task: &Task, depth: usize) {
    let indent = "  ".repeat(depth);
    let header = format!("Task {} {}", task.name, outcome_label(task.outcome));

    if task.file_copies.is_empty() && task.projects.is_empty() {
        let _ = writeln!(out, "{}{}", indent, header);
        return;
    }

    let _ = writeln!(out, "{}{} {{", indent, header);
    for copy in &task.file_copies {
        let verb = if copy.copied { "copied" } else { "skipped" };
        let _ = writeln!(
            out,
            "{}  {} {} -> {}",
            indent, verb, copy.source, copy.destination
        );
    }
    for project in &task.projects {
        render_project(out, project, depth + 1);
    }
    let _ = writeln!(out, "{}}}", indent);
}

fn render_diagnostic(out: &mut String, diagnostic: &Diagnostic) {
    let severity = match diagnostic.severity {
        DiagnosticSeverity::Warning => "warning",
        DiagnosticSeverity::Error => "error",
    };
    match &diagnostic.code {
        Some(code) => {
            let _ = writeln!(out, "    {} {}: {}", severity, code, diagnostic.text);
        }
        None => {
            let _ = writeln!(out, "    {}: {}", severity, diagnostic.text);
        }
    }
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Succeeded => "succeeded",
        Outcome::Failed => "failed",
        Outcome::Incomplete => "incomplete",
    }
}
