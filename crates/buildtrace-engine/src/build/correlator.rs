use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use regex::Regex;

use buildtrace_types::{
    Build, BuildEvent, BuildEventContext, BuildEventPayload, BuildStartedPayload, Diagnostic,
    DiagnosticPayload, DiagnosticSeverity, EvaluationFinishedPayload, EvaluationStartedPayload,
    InternedString, Item, ItemAction, ItemActionKind, ItemGroup, ItemPayload, Message,
    ProjectFinishedPayload, ProjectStartedPayload, Property, StringInterner,
    TargetFinishedPayload, TargetStartedPayload, TaskFinishedPayload, TaskParameter,
    TaskStartedPayload,
};

use crate::build::assembler;
use crate::build::records::{
    BuildRecord, EvaluationRecord, ProjectRecord, TargetRecord, TaskRecord,
};
use crate::error::{Error, Result};
use crate::text::{
    self, MessageKind, ParsedItem, ParsedItemGroup, ParsedPayload, RarAnalysis, StructuredMessage,
};

use buildtrace_types::EventSource;

/// The fixed-format project start message, `Project "X" (targets):`.
static PROJECT_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^Project "([^"]+)""#).expect("static pattern"));

const RAR_TASK_NAME: &str = "ResolveAssemblyReference";

/// Evaluation chatter suppressed from build-level messages, but only when
/// the event carries no context ids at all. Anywhere else these are ordinary
/// messages.
const NOISE_PREFIXES: &[&str] = &["Search paths being used", "Overriding target"];
const NOISE_FRAGMENT: &str = "does not exist in the project, and will be ignored";

/// Single-pass, single-use reconstruction of a build tree from the raw
/// event stream.
///
/// Events may be delivered from multiple engine worker threads; every entry
/// point serializes behind one coarse lock. Correctness of the shared lookup
/// tables matters far more than event-handling latency here, since logging
/// must never perturb the build itself.
///
/// Per-event consistency failures (duplicate open ids, finishes without a
/// matching start, malformed structured text) are converted into synthetic
/// error diagnostics and the stream continues; only violations of the
/// single-use contract ([`Error::AlreadyFinished`]) propagate to the caller.
pub struct LogBuilder {
    state: Mutex<CorrelatorState>,

    /// Diagnostics live outside the correlator state: warnings and errors
    /// may arrive with partial or no context and must never be dropped.
    diagnostics: Mutex<Vec<Diagnostic>>,

    interner: StringInterner,
}

#[derive(Default)]
struct CorrelatorState {
    build: Option<BuildRecord>,

    /// Arena of every project ever started, in start order.
    projects: Vec<ProjectRecord>,

    /// Context id -> arena index, for projects whose finish has not arrived.
    /// Ids are unique only while open; the engine reuses them afterwards.
    open_projects: HashMap<i32, usize>,
    open_targets: HashMap<i32, TargetSlot>,
    open_tasks: HashMap<i32, TaskSlot>,

    /// Evaluations in first-seen order of project file.
    evaluations: Vec<EvaluationRecord>,
    evaluations_by_file: HashMap<String, usize>,
    evaluations_by_id: HashMap<i64, usize>,

    /// Task name -> assembly path, mined from "Using task" notices.
    task_assemblies: HashMap<String, InternedString>,

    finished: bool,
}

#[derive(Debug, Clone, Copy)]
struct TargetSlot {
    project: usize,
    target: usize,
}

#[derive(Debug, Clone, Copy)]
struct TaskSlot {
    project: usize,
    target: usize,
    task: usize,
}

fn target_mut(state: &mut CorrelatorState, slot: TargetSlot) -> &mut TargetRecord {
    &mut state.projects[slot.project].targets[slot.target]
}

fn task_mut(state: &mut CorrelatorState, slot: TaskSlot) -> &mut TaskRecord {
    &mut state.projects[slot.project].targets[slot.target].tasks[slot.task]
}

fn open_task_slot(state: &CorrelatorState, context: &BuildEventContext) -> Option<TaskSlot> {
    context
        .task_id
        .and_then(|id| state.open_tasks.get(&id).copied())
}

fn open_target_slot(state: &CorrelatorState, context: &BuildEventContext) -> Option<TargetSlot> {
    context
        .target_id
        .and_then(|id| state.open_targets.get(&id).copied())
}

fn open_project_index(state: &CorrelatorState, context: &BuildEventContext) -> Option<usize> {
    context
        .project_id
        .and_then(|id| state.open_projects.get(&id).copied())
}

impl LogBuilder {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CorrelatorState::default()),
            diagnostics: Mutex::new(Vec::new()),
            interner: StringInterner::new(),
        }
    }

    /// Deliver one event.
    ///
    /// Returns `Err(AlreadyFinished)` only when the builder has already been
    /// finished; every other failure is recorded as a diagnostic and the
    /// call succeeds.
    pub fn handle_event(&self, event: &BuildEvent) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.finished {
            return Err(Error::AlreadyFinished);
        }

        if let Err(err) = self.apply(&mut state, event) {
            self.record_failure(event, &err);
        }
        Ok(())
    }

    /// Drive a whole event source through the builder and assemble the
    /// frozen model. The replay entry point for saved logs.
    pub fn process<S: EventSource>(&self, mut source: S) -> Result<Build> {
        while let Some(event) = source.next_event().map_err(Error::from)? {
            self.handle_event(&event)?;
        }
        self.finish()
    }

    /// Freeze all collected records into the immutable build tree.
    ///
    /// Callable exactly once; the builder rejects all further events and
    /// finish calls afterwards.
    pub fn finish(&self) -> Result<Build> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.finished {
            return Err(Error::AlreadyFinished);
        }
        state.finished = true;

        let diagnostics = std::mem::take(
            &mut *self.diagnostics.lock().unwrap_or_else(|e| e.into_inner()),
        );
        let build = state.build.take();
        let projects = std::mem::take(&mut state.projects);
        let evaluations = std::mem::take(&mut state.evaluations);
        assembler::assemble(build, projects, evaluations, diagnostics)
    }

    fn apply(&self, state: &mut CorrelatorState, event: &BuildEvent) -> Result<()> {
        match &event.payload {
            BuildEventPayload::BuildStarted(payload) => {
                self.on_build_started(state, event, payload)
            }
            BuildEventPayload::BuildFinished(payload) => {
                on_build_finished(state, event, payload)
            }
            BuildEventPayload::EvaluationStarted(payload) => {
                self.on_evaluation_started(state, event, payload)
            }
            BuildEventPayload::EvaluationFinished(payload) => {
                on_evaluation_finished(state, event, payload)
            }
            BuildEventPayload::ProjectStarted(payload) => {
                self.on_project_started(state, event, payload)
            }
            BuildEventPayload::ProjectFinished(payload) => {
                on_project_finished(state, event, payload)
            }
            BuildEventPayload::TargetStarted(payload) => {
                self.on_target_started(state, event, payload)
            }
            BuildEventPayload::TargetFinished(payload) => {
                on_target_finished(state, event, payload)
            }
            BuildEventPayload::TaskStarted(payload) => {
                self.on_task_started(state, event, payload)
            }
            BuildEventPayload::TaskFinished(payload) => {
                on_task_finished(state, event, payload)
            }
            BuildEventPayload::Message(payload) => self.on_message(state, event, &payload.text),
            BuildEventPayload::Status(payload) => self.on_message(state, event, &payload.text),
            BuildEventPayload::Custom(payload) => self.on_message(state, event, &payload.text),
            BuildEventPayload::Warning(payload) => {
                self.push_diagnostic(DiagnosticSeverity::Warning, event, payload);
                Ok(())
            }
            BuildEventPayload::Error(payload) => {
                self.push_diagnostic(DiagnosticSeverity::Error, event, payload);
                Ok(())
            }
        }
    }

    fn on_build_started(
        &self,
        state: &mut CorrelatorState,
        event: &BuildEvent,
        payload: &BuildStartedPayload,
    ) -> Result<()> {
        if state.build.is_some() {
            return Err(Error::Consistency("build already started".to_string()));
        }

        let environment = payload
            .environment
            .iter()
            .map(|(name, value)| self.property(name, value))
            .collect();
        state.build = Some(BuildRecord::new(event.timestamp, environment));
        Ok(())
    }

    fn on_evaluation_started(
        &self,
        state: &mut CorrelatorState,
        event: &BuildEvent,
        payload: &EvaluationStartedPayload,
    ) -> Result<()> {
        let index = match state.evaluations_by_file.get(&payload.project_file) {
            Some(&index) => index,
            None => {
                let index = state.evaluations.len();
                state.evaluations.push(EvaluationRecord::new(
                    self.interner.intern(&payload.project_file),
                    event.timestamp,
                ));
                state
                    .evaluations_by_file
                    .insert(payload.project_file.clone(), index);
                index
            }
        };

        // Evaluation ids repeat across unrelated projects (engine quirk);
        // accumulate rather than reject.
        if let Some(id) = event.context.evaluation_id {
            let record = &mut state.evaluations[index];
            if !record.evaluation_ids.contains(&id) {
                record.evaluation_ids.push(id);
            }
            state.evaluations_by_id.insert(id, index);
        }
        Ok(())
    }

    fn on_project_started(
        &self,
        state: &mut CorrelatorState,
        event: &BuildEvent,
        payload: &ProjectStartedPayload,
    ) -> Result<()> {
        let id = event
            .context
            .project_id
            .ok_or_else(|| Error::Consistency("project started without a context id".into()))?;
        if state.open_projects.contains_key(&id) {
            return Err(Error::Consistency(format!(
                "project context id {} is already open",
                id
            )));
        }

        let captures = PROJECT_NAME_RE.captures(&payload.message).ok_or_else(|| {
            Error::Consistency(format!(
                "malformed project started message: {:?}",
                payload.message
            ))
        })?;
        let name = self.interner.intern(&captures[1]);

        let index = state.projects.len();
        let mut has_parent = false;

        // Attach under the spawning task when it is still open, else under
        // the parent project, else leave as a root candidate. Unresolvable
        // parent ids are a tolerated anomaly, not an error.
        if let Some(slot) = payload
            .parent_task_id
            .and_then(|task_id| state.open_tasks.get(&task_id).copied())
        {
            task_mut(state, slot).child_projects.push(index);
            has_parent = true;
        } else if let Some(parent_index) = payload
            .parent_project_id
            .and_then(|project_id| state.open_projects.get(&project_id).copied())
        {
            state.projects[parent_index].children.push(index);
            has_parent = true;
        }

        state.projects.push(ProjectRecord {
            id,
            node_id: event.context.node_id,
            has_parent,
            name,
            project_file: self.interner.intern(&payload.project_file),
            tools_version: payload
                .tools_version
                .as_deref()
                .map(|v| self.interner.intern(v)),
            global_properties: self.sorted_properties(&payload.global_properties),
            properties: self.sorted_properties(&payload.properties),
            items: self.group_items(&payload.items),
            start_time: event.timestamp,
            end_time: None,
            succeeded: None,
            targets: Vec::new(),
            children: Vec::new(),
            messages: Vec::new(),
        });
        state.open_projects.insert(id, index);
        Ok(())
    }

    fn on_target_started(
        &self,
        state: &mut CorrelatorState,
        event: &BuildEvent,
        payload: &TargetStartedPayload,
    ) -> Result<()> {
        let id = event
            .context
            .target_id
            .ok_or_else(|| Error::Consistency("target started without a target id".into()))?;
        let project_index = open_project_index(state, &event.context).ok_or_else(|| {
            Error::Consistency(format!(
                "target \"{}\" started without an open enclosing project",
                payload.name
            ))
        })?;
        if state.open_targets.contains_key(&id) {
            return Err(Error::Consistency(format!(
                "target id {} is already open",
                id
            )));
        }

        let record = TargetRecord {
            id,
            node_id: event.context.node_id,
            name: self.interner.intern(&payload.name),
            source_file: self.interner.intern(&payload.source_file),
            parent_target: payload
                .parent_target
                .as_deref()
                .map(|t| self.interner.intern(t)),
            reason: payload.reason.clone(),
            start_time: event.timestamp,
            end_time: None,
            succeeded: None,
            output_items: Vec::new(),
            property_sets: Vec::new(),
            item_actions: Vec::new(),
            tasks: Vec::new(),
            messages: Vec::new(),
        };

        let project = &mut state.projects[project_index];
        let target_index = project.targets.len();
        project.targets.push(record);
        state.open_targets.insert(
            id,
            TargetSlot {
                project: project_index,
                target: target_index,
            },
        );
        Ok(())
    }

    fn on_task_started(
        &self,
        state: &mut CorrelatorState,
        event: &BuildEvent,
        payload: &TaskStartedPayload,
    ) -> Result<()> {
        let id = event
            .context
            .task_id
            .ok_or_else(|| Error::Consistency("task started without a task id".into()))?;
        let project_index = open_project_index(state, &event.context).ok_or_else(|| {
            Error::Consistency(format!(
                "task \"{}\" started without an open enclosing project",
                payload.name
            ))
        })?;
        let target_slot = open_target_slot(state, &event.context).ok_or_else(|| {
            Error::Consistency(format!(
                "task \"{}\" started without an open enclosing target",
                payload.name
            ))
        })?;
        if target_slot.project != project_index {
            return Err(Error::Consistency(format!(
                "task \"{}\" context ids disagree: target belongs to a different project",
                payload.name
            )));
        }
        if state.open_tasks.contains_key(&id) {
            return Err(Error::Consistency(format!("task id {} is already open", id)));
        }

        // Best-effort: assembly resolution notices usually precede first
        // use, but nothing guarantees it. Unknown stays empty.
        let from_assembly = state
            .task_assemblies
            .get(&payload.name)
            .cloned()
            .unwrap_or_else(|| self.interner.intern(""));

        let record = TaskRecord {
            id,
            node_id: event.context.node_id,
            name: self.interner.intern(&payload.name),
            from_assembly,
            source_file: self.interner.intern(&payload.source_file),
            command_line: payload.command_line.clone(),
            start_time: event.timestamp,
            end_time: None,
            succeeded: None,
            parameters: Vec::new(),
            output_items: Vec::new(),
            output_properties: Vec::new(),
            file_copies: Vec::new(),
            child_projects: Vec::new(),
            messages: Vec::new(),
        };

        let target = target_mut(state, target_slot);
        let task_index = target.tasks.len();
        target.tasks.push(record);
        state.open_tasks.insert(
            id,
            TaskSlot {
                project: target_slot.project,
                target: target_slot.target,
                task: task_index,
            },
        );
        Ok(())
    }

    fn on_message(
        &self,
        state: &mut CorrelatorState,
        event: &BuildEvent,
        text: &str,
    ) -> Result<()> {
        match text::parse_structured(text) {
            Some(Ok(StructuredMessage::UsingTask {
                task_name,
                assembly,
            })) => {
                state
                    .task_assemblies
                    .insert(task_name, self.interner.intern(&assembly));
                // The notice stays visible as an ordinary message too.
                self.append_message(state, event, text)
            }
            Some(Ok(StructuredMessage::FileCopy {
                source,
                destination,
                copied,
            })) => {
                if let Some(slot) = open_task_slot(state, &event.context) {
                    let copy = buildtrace_types::FileCopy {
                        source: self.interner.intern(&source),
                        destination: self.interner.intern(&destination),
                        copied,
                    };
                    task_mut(state, slot).file_copies.push(copy);
                    Ok(())
                } else {
                    self.append_message(state, event, text)
                }
            }
            Some(Ok(StructuredMessage::Fielded { kind, payload })) => {
                self.apply_fielded(state, event, kind, payload)
            }
            Some(Err(err)) => Err(err),
            None => {
                if let Some(slot) = open_task_slot(state, &event.context) {
                    let is_rar = task_mut(state, slot).name.as_str() == RAR_TASK_NAME;
                    if is_rar && text.contains('\n') {
                        if let Some(analysis) = text::parse_rar_message(text) {
                            self.apply_rar(state, slot, analysis);
                            return Ok(());
                        }
                    }
                }
                self.append_message(state, event, text)
            }
        }
    }

    /// Apply a parsed prefix message at the most specific open scope.
    fn apply_fielded(
        &self,
        state: &mut CorrelatorState,
        event: &BuildEvent,
        kind: MessageKind,
        payload: ParsedPayload,
    ) -> Result<()> {
        if let Some(slot) = open_task_slot(state, &event.context) {
            match kind {
                MessageKind::TaskParameter => {
                    let parameter = match payload {
                        ParsedPayload::NameValue { name, value } => {
                            TaskParameter::Property(self.property(&name, &value))
                        }
                        ParsedPayload::ItemGroup(group) => {
                            TaskParameter::Items(self.freeze_group(group))
                        }
                    };
                    task_mut(state, slot).parameters.push(parameter);
                    Ok(())
                }
                MessageKind::OutputItems => {
                    let group = self.group_from_payload(payload);
                    task_mut(state, slot).output_items.push(group);
                    Ok(())
                }
                MessageKind::OutputProperty => match payload {
                    ParsedPayload::NameValue { name, value } => {
                        let property = self.property(&name, &value);
                        task_mut(state, slot).output_properties.push(property);
                        Ok(())
                    }
                    ParsedPayload::ItemGroup(_) => Err(Error::MalformedMessage(
                        "Output Property: carried an item block".into(),
                    )),
                },
                // Property/item mutations belong to the enclosing target
                // even when raised with task context.
                MessageKind::SetProperty
                | MessageKind::AddedItems
                | MessageKind::RemovedItems => {
                    let target_slot = TargetSlot {
                        project: slot.project,
                        target: slot.target,
                    };
                    self.apply_target_fielded(state, target_slot, kind, payload)
                }
            }
        } else if let Some(slot) = open_target_slot(state, &event.context) {
            match kind {
                MessageKind::TaskParameter | MessageKind::OutputProperty => {
                    Err(Error::Consistency(format!(
                        "{} message outside an open task",
                        kind.prefix()
                    )))
                }
                MessageKind::OutputItems => {
                    let group = self.group_from_payload(payload);
                    target_mut(state, slot).output_items.push(group);
                    Ok(())
                }
                MessageKind::SetProperty | MessageKind::AddedItems | MessageKind::RemovedItems => {
                    self.apply_target_fielded(state, slot, kind, payload)
                }
            }
        } else {
            Err(Error::Consistency(format!(
                "{} message outside task/target scope",
                kind.prefix()
            )))
        }
    }

    fn apply_target_fielded(
        &self,
        state: &mut CorrelatorState,
        slot: TargetSlot,
        kind: MessageKind,
        payload: ParsedPayload,
    ) -> Result<()> {
        match kind {
            MessageKind::SetProperty => match payload {
                ParsedPayload::NameValue { name, value } => {
                    let property = self.property(&name, &value);
                    target_mut(state, slot).property_sets.push(property);
                    Ok(())
                }
                ParsedPayload::ItemGroup(_) => Err(Error::MalformedMessage(
                    "Set Property: carried an item block".into(),
                )),
            },
            MessageKind::AddedItems | MessageKind::RemovedItems => {
                let action_kind = if kind == MessageKind::AddedItems {
                    ItemActionKind::Add
                } else {
                    ItemActionKind::Remove
                };
                let action = ItemAction {
                    kind: action_kind,
                    group: self.group_from_payload(payload),
                };
                target_mut(state, slot).item_actions.push(action);
                Ok(())
            }
            _ => unreachable!("only target-scoped kinds reach here"),
        }
    }

    fn apply_rar(&self, state: &mut CorrelatorState, slot: TaskSlot, analysis: RarAnalysis) {
        let inputs: Vec<TaskParameter> = analysis
            .inputs
            .into_iter()
            .map(|parameter| {
                TaskParameter::Items(self.freeze_group(ParsedItemGroup {
                    name: parameter.name,
                    items: parameter.items,
                }))
            })
            .collect();
        let results: Vec<ItemGroup> = analysis
            .results
            .into_iter()
            .map(|parameter| {
                self.freeze_group(ParsedItemGroup {
                    name: parameter.name,
                    items: parameter.items,
                })
            })
            .collect();

        let task = task_mut(state, slot);
        task.parameters.extend(inputs);
        task.output_items.extend(results);
    }

    /// Append free text to the most specific resolvable open scope,
    /// falling through populated-but-closed ids toward the build level.
    fn append_message(
        &self,
        state: &mut CorrelatorState,
        event: &BuildEvent,
        text: &str,
    ) -> Result<()> {
        let message = Message::new(event.timestamp, self.interner.intern(text));

        if let Some(slot) = open_task_slot(state, &event.context) {
            task_mut(state, slot).messages.push(message);
            return Ok(());
        }
        if let Some(slot) = open_target_slot(state, &event.context) {
            target_mut(state, slot).messages.push(message);
            return Ok(());
        }
        if let Some(index) = open_project_index(state, &event.context) {
            state.projects[index].messages.push(message);
            return Ok(());
        }
        if let Some(&index) = event
            .context
            .evaluation_id
            .and_then(|id| state.evaluations_by_id.get(&id))
        {
            state.evaluations[index].messages.push(message);
            return Ok(());
        }

        if event.context.is_build_level() && is_evaluation_noise(text) {
            return Ok(());
        }

        let build = state
            .build
            .as_mut()
            .ok_or_else(|| Error::Consistency("message before build started".into()))?;
        build.messages.push(message);
        Ok(())
    }

    fn push_diagnostic(
        &self,
        severity: DiagnosticSeverity,
        event: &BuildEvent,
        payload: &DiagnosticPayload,
    ) {
        let intern_opt =
            |value: &Option<String>| value.as_deref().map(|v| self.interner.intern(v));

        let diagnostic = Diagnostic {
            severity,
            text: self.interner.intern(&payload.text),
            timestamp: event.timestamp,
            code: intern_opt(&payload.code),
            file: intern_opt(&payload.file),
            project_file: intern_opt(&payload.project_file),
            subcategory: intern_opt(&payload.subcategory),
            line: payload.line,
            column: payload.column,
            end_line: payload.end_line,
            end_column: payload.end_column,
            project_id: event.context.project_id,
            target_id: event.context.target_id,
            task_id: event.context.task_id,
        };

        self.diagnostics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(diagnostic);
    }

    /// A per-event failure becomes a synthetic error diagnostic; the
    /// triggering event's intended mutation is lost but the stream lives on.
    fn record_failure(&self, event: &BuildEvent, err: &Error) {
        let diagnostic = Diagnostic {
            severity: DiagnosticSeverity::Error,
            text: self.interner.intern(&err.to_string()),
            timestamp: event.timestamp,
            code: None,
            file: None,
            project_file: None,
            subcategory: None,
            line: None,
            column: None,
            end_line: None,
            end_column: None,
            project_id: event.context.project_id,
            target_id: event.context.target_id,
            task_id: event.context.task_id,
        };

        self.diagnostics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(diagnostic);
    }

    fn property(&self, name: &str, value: &str) -> Property {
        Property::new(self.interner.intern(name), self.interner.intern(value))
    }

    fn sorted_properties(&self, pairs: &[(String, String)]) -> Vec<Property> {
        let mut sorted: Vec<&(String, String)> = pairs.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        sorted
            .into_iter()
            .map(|(name, value)| self.property(name, value))
            .collect()
    }

    /// Group raw project-start items by item type, preserving first-seen
    /// order of item types and arrival order within each type.
    fn group_items(&self, items: &[(String, ItemPayload)]) -> Vec<ItemGroup> {
        let mut groups: Vec<ItemGroup> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for (item_type, payload) in items {
            let item = Item {
                text: self.interner.intern(&payload.text),
                metadata: payload
                    .metadata
                    .iter()
                    .map(|(name, value)| self.property(name, value))
                    .collect(),
                notes: Vec::new(),
            };

            match index.get(item_type.as_str()) {
                Some(&at) => groups[at].items.push(item),
                None => {
                    index.insert(item_type, groups.len());
                    groups.push(ItemGroup {
                        name: self.interner.intern(item_type),
                        items: vec![item],
                    });
                }
            }
        }
        groups
    }

    fn freeze_item(&self, item: ParsedItem) -> Item {
        Item {
            text: self.interner.intern(&item.text),
            metadata: item
                .metadata
                .iter()
                .map(|(name, value)| self.property(name, value))
                .collect(),
            notes: item.notes,
        }
    }

    fn freeze_group(&self, group: ParsedItemGroup) -> ItemGroup {
        ItemGroup {
            name: self.interner.intern(&group.name),
            items: group
                .items
                .into_iter()
                .map(|item| self.freeze_item(item))
                .collect(),
        }
    }

    /// Single-line `name=value` forms describe a one-item group.
    fn group_from_payload(&self, payload: ParsedPayload) -> ItemGroup {
        match payload {
            ParsedPayload::ItemGroup(group) => self.freeze_group(group),
            ParsedPayload::NameValue { name, value } => {
                let items = if value.is_empty() {
                    Vec::new()
                } else {
                    vec![Item::new(self.interner.intern(&value))]
                };
                ItemGroup {
                    name: self.interner.intern(&name),
                    items,
                }
            }
        }
    }
}

impl Default for LogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn on_build_finished(
    state: &mut CorrelatorState,
    event: &BuildEvent,
    payload: &buildtrace_types::BuildFinishedPayload,
) -> Result<()> {
    let build = state
        .build
        .as_mut()
        .ok_or_else(|| Error::Consistency("build finished without build started".into()))?;
    build.end_time = Some(event.timestamp);
    build.succeeded = Some(payload.succeeded);
    Ok(())
}

fn on_evaluation_finished(
    state: &mut CorrelatorState,
    event: &BuildEvent,
    payload: &EvaluationFinishedPayload,
) -> Result<()> {
    let index = state
        .evaluations_by_file
        .get(&payload.project_file)
        .copied()
        .ok_or_else(|| {
            Error::Consistency(format!(
                "evaluation of {:?} finished without a matching start",
                payload.project_file
            ))
        })?;
    state.evaluations[index].end_time = Some(event.timestamp);
    Ok(())
}

fn on_project_finished(
    state: &mut CorrelatorState,
    event: &BuildEvent,
    payload: &ProjectFinishedPayload,
) -> Result<()> {
    let id = event
        .context
        .project_id
        .ok_or_else(|| Error::Consistency("project finished without a context id".into()))?;
    let index = state.open_projects.remove(&id).ok_or_else(|| {
        Error::Consistency(format!(
            "project finished for id {} without a matching start",
            id
        ))
    })?;

    let project = &mut state.projects[index];
    project.end_time = Some(event.timestamp);
    project.succeeded = Some(payload.succeeded);
    Ok(())
}

fn on_target_finished(
    state: &mut CorrelatorState,
    event: &BuildEvent,
    payload: &TargetFinishedPayload,
) -> Result<()> {
    let id = event
        .context
        .target_id
        .ok_or_else(|| Error::Consistency("target finished without a target id".into()))?;
    let slot = state.open_targets.remove(&id).ok_or_else(|| {
        Error::Consistency(format!(
            "target finished for id {} without a matching start",
            id
        ))
    })?;

    let target = target_mut(state, slot);
    target.end_time = Some(event.timestamp);
    target.succeeded = Some(payload.succeeded);
    Ok(())
}

fn on_task_finished(
    state: &mut CorrelatorState,
    event: &BuildEvent,
    payload: &TaskFinishedPayload,
) -> Result<()> {
    let id = event
        .context
        .task_id
        .ok_or_else(|| Error::Consistency("task finished without a task id".into()))?;
    let slot = state.open_tasks.remove(&id).ok_or_else(|| {
        Error::Consistency(format!(
            "task finished for id {} without a matching start",
            id
        ))
    })?;

    let task = task_mut(state, slot);
    task.end_time = Some(event.timestamp);
    task.succeeded = Some(payload.succeeded);
    Ok(())
}

fn is_evaluation_noise(text: &str) -> bool {
    NOISE_PREFIXES.iter().any(|prefix| text.starts_with(prefix))
        || text.contains(NOISE_FRAGMENT)
}
