//! Parser for `ResolveAssemblyReference` progress messages.
//!
//! The task reports its inputs and resolution results in one big indented
//! text dump with its own convention: un-indented lines introduce a named
//! parameter, 4-space lines are item names under the current parameter, and
//! 8-space-or-deeper lines are metadata or nested diagnostic notes.
//!
//! Whether a top-level line is an input or a result is decided by a marker
//! heuristic: once a result-shaped line ("Primary reference ...",
//! "Dependency ...") has been seen, every later un-indented line is a
//! result. This is best-effort text mining against human-readable output;
//! unattributable lines are skipped rather than raised.

use buildtrace_types::normalize_newlines;

use crate::text::message::ParsedItem;

/// Marker phrases whose appearance flips classification to results.
const RESULT_MARKERS: &[&str] = &[
    "Primary reference ",
    "Dependency ",
    "Unified Dependency ",
    "Unified primary reference ",
];

/// Note prefixes attached to the current item as free text instead of
/// metadata.
const NOTE_PREFIXES: &[&str] = &["For SearchPath", "Considered"];

/// One named parameter mined from the dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RarParameter {
    pub name: String,
    pub items: Vec<ParsedItem>,
}

/// Inputs and results of one `ResolveAssemblyReference` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RarAnalysis {
    pub inputs: Vec<RarParameter>,
    pub results: Vec<RarParameter>,
}

/// Mine a `ResolveAssemblyReference` message. Returns `None` when no
/// parameter structure could be recovered at all.
pub fn parse_rar_message(text: &str) -> Option<RarAnalysis> {
    let normalized = normalize_newlines(text);

    let mut analysis = RarAnalysis::default();
    let mut current: Option<(RarParameter, bool)> = None;
    let mut seen_result = false;

    for raw_line in normalized.split('\n') {
        if raw_line.trim().is_empty() {
            continue;
        }

        let content = raw_line.trim_start_matches(' ');
        let leading = raw_line.len() - content.len();
        let content = content.trim_end();

        if leading == 0 {
            flush(&mut analysis, current.take());
            if is_result_shaped(content) {
                seen_result = true;
            }
            let name = content.trim_end_matches([':', '.']).to_string();
            current = Some((RarParameter { name, items: Vec::new() }, seen_result));
        } else if leading <= 4 {
            if let Some((parameter, _)) = current.as_mut() {
                parameter.items.push(ParsedItem::new(content));
            }
        } else {
            let Some(item) = current
                .as_mut()
                .and_then(|(parameter, _)| parameter.items.last_mut())
            else {
                continue;
            };

            if NOTE_PREFIXES.iter().any(|p| content.starts_with(p)) {
                item.notes.push(content.to_string());
            } else if let Some(idx) = content.find('=') {
                let name = content[..idx].trim().to_string();
                let value = content[idx + 1..].trim().to_string();
                item.metadata.push((name, value));
            } else {
                item.notes.push(content.to_string());
            }
        }
    }

    flush(&mut analysis, current.take());

    if analysis.inputs.is_empty() && analysis.results.is_empty() {
        None
    } else {
        Some(analysis)
    }
}

fn flush(analysis: &mut RarAnalysis, parameter: Option<(RarParameter, bool)>) {
    if let Some((parameter, is_result)) = parameter {
        if is_result {
            analysis.results.push(parameter);
        } else {
            analysis.inputs.push(parameter);
        }
    }
}

fn is_result_shaped(line: &str) -> bool {
    RESULT_MARKERS.iter().any(|marker| line.starts_with(marker))
}
