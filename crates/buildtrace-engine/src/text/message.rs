use buildtrace_types::normalize_newlines;

use crate::error::{Error, Result};
use crate::text::copying;

/// Structured message families, keyed by recognized line prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    TaskParameter,
    OutputItems,
    OutputProperty,
    SetProperty,
    AddedItems,
    RemovedItems,
}

impl MessageKind {
    const ALL: [MessageKind; 6] = [
        MessageKind::TaskParameter,
        MessageKind::OutputItems,
        MessageKind::OutputProperty,
        MessageKind::SetProperty,
        MessageKind::AddedItems,
        MessageKind::RemovedItems,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            MessageKind::TaskParameter => "Task Parameter:",
            MessageKind::OutputItems => "Output Item(s):",
            MessageKind::OutputProperty => "Output Property:",
            MessageKind::SetProperty => "Set Property:",
            MessageKind::AddedItems => "Added Item(s):",
            MessageKind::RemovedItems => "Removed Item(s):",
        }
    }
}

const USING_TASK_PREFIX: &str = "Using \"";
const USING_TASK_MID: &str = "\" task from assembly \"";
const USING_TASK_SUFFIX: &str = "\".";

/// One item mined from a multi-line payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedItem {
    /// Item spec, usually a file path.
    pub text: String,

    /// Metadata key/value pairs in arrival order.
    pub metadata: Vec<(String, String)>,

    /// Free-text notes (assembly resolution diagnostics and the like).
    pub notes: Vec<String>,
}

impl ParsedItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Vec::new(),
            notes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedItemGroup {
    pub name: String,
    pub items: Vec<ParsedItem>,
}

/// Payload shape of a recognized structured message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedPayload {
    /// Single-line `name=value` form. `value` is empty when no `=` appears.
    NameValue { name: String, value: String },

    /// Multi-line indented item block.
    ItemGroup(ParsedItemGroup),
}

/// A fully recognized structured message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredMessage {
    Fielded {
        kind: MessageKind,
        payload: ParsedPayload,
    },

    /// `Using "X" task from assembly "Y".` resolution notice.
    UsingTask { task_name: String, assembly: String },

    /// A copy-task file operation.
    FileCopy {
        source: String,
        destination: String,
        copied: bool,
    },
}

/// Recognize and parse a structured message.
///
/// Returns `None` for ordinary free text, `Some(Err)` when a recognized
/// prefix carries a payload that does not follow the expected grammar (a
/// consistency error scoped to this message only), and `Some(Ok)` on success.
pub fn parse_structured(text: &str) -> Option<Result<StructuredMessage>> {
    for kind in MessageKind::ALL {
        if let Some(rest) = text.strip_prefix(kind.prefix()) {
            return Some(parse_fielded(kind, rest));
        }
    }

    if text.starts_with(USING_TASK_PREFIX) {
        return Some(parse_using_task(text));
    }

    if let Some((source, destination, copied)) = copying::parse_copy_message(text) {
        return Some(Ok(StructuredMessage::FileCopy {
            source,
            destination,
            copied,
        }));
    }

    None
}

/// Parse the payload after a recognized prefix.
///
/// A newline immediately after the prefix (one optional separating space
/// allowed) introduces a multi-line item block; anything else is a single
/// `name=value` payload.
fn parse_fielded(kind: MessageKind, rest: &str) -> Result<StructuredMessage> {
    let normalized = normalize_newlines(rest);
    let rest = normalized.strip_prefix(' ').unwrap_or(&normalized);

    let payload = if let Some(body) = rest.strip_prefix('\n') {
        ParsedPayload::ItemGroup(parse_item_block(kind, body)?)
    } else {
        let (name, value) = split_name_value(rest.trim_end());
        ParsedPayload::NameValue { name, value }
    };

    Ok(StructuredMessage::Fielded { kind, payload })
}

/// Split on the first `=` only. No `=` yields an empty value.
fn split_name_value(text: &str) -> (String, String) {
    match text.find('=') {
        Some(idx) => (
            text[..idx].trim().to_string(),
            text[idx + 1..].trim().to_string(),
        ),
        None => (text.trim().to_string(), String::new()),
    }
}

/// Parse a multi-line item block using the indentation grammar:
/// 4 spaces introduces the group name (trailing `=` stripped), 8 spaces
/// starts a new item, deeper lines with `=` are metadata, and anything else
/// continues the previous metadata value.
fn parse_item_block(kind: MessageKind, body: &str) -> Result<ParsedItemGroup> {
    let mut group_name: Option<String> = None;
    let mut items: Vec<ParsedItem> = Vec::new();

    for raw_line in body.split('\n') {
        if raw_line.trim().is_empty() {
            continue;
        }

        let content = raw_line.trim_start_matches(' ');
        let leading = raw_line.len() - content.len();
        let content = content.trim_end();

        match leading {
            4 => {
                if group_name.is_some() {
                    return Err(malformed(kind, "more than one item-group name line"));
                }
                group_name = Some(content.strip_suffix('=').unwrap_or(content).to_string());
            }
            8 => {
                if group_name.is_none() {
                    return Err(malformed(kind, "item line before the item-group name"));
                }
                items.push(ParsedItem::new(content));
            }
            _ => {
                let Some(item) = items.last_mut() else {
                    return Err(malformed(kind, "indented line before any item"));
                };

                if leading > 8 && content.contains('=') {
                    let (name, value) = split_name_value(content);
                    if item.metadata.iter().any(|(existing, _)| *existing == name) {
                        return Err(malformed(
                            kind,
                            &format!("duplicate metadata key \"{}\"", name),
                        ));
                    }
                    item.metadata.push((name, value));
                } else {
                    let Some((_, value)) = item.metadata.last_mut() else {
                        return Err(malformed(kind, "continuation line with no metadata value"));
                    };
                    value.push('\n');
                    value.push_str(content);
                }
            }
        }
    }

    let name = group_name.ok_or_else(|| malformed(kind, "missing item-group name line"))?;
    Ok(ParsedItemGroup { name, items })
}

fn malformed(kind: MessageKind, detail: &str) -> Error {
    Error::MalformedMessage(format!("{} payload: {}", kind.prefix(), detail))
}

fn parse_using_task(text: &str) -> Result<StructuredMessage> {
    let parse = || {
        let rest = text.strip_prefix(USING_TASK_PREFIX)?;
        let mid = rest.find(USING_TASK_MID)?;
        let task_name = &rest[..mid];
        let rest = &rest[mid + USING_TASK_MID.len()..];
        let assembly = rest.strip_suffix(USING_TASK_SUFFIX)?;
        Some((task_name.to_string(), assembly.to_string()))
    };

    match parse() {
        Some((task_name, assembly)) => Ok(StructuredMessage::UsingTask {
            task_name,
            assembly,
        }),
        None => Err(Error::MalformedMessage(format!(
            "unparseable using-task notice: {:?}",
            text
        ))),
    }
}
