use serde::{Deserialize, Serialize};

use crate::intern::InternedString;

/// A name/value pair: an evaluated property, a global property, or one piece
/// of item metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: InternedString,
    pub value: InternedString,
}

impl Property {
    pub fn new(name: InternedString, value: InternedString) -> Self {
        Self { name, value }
    }
}

/// A file-like entry with attached metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Item spec, usually a file path.
    pub text: InternedString,

    /// Metadata in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<Property>,

    /// Free-text notes attached during log mining (assembly resolution
    /// "Considered"/"For SearchPath" lines and the like).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Item {
    pub fn new(text: InternedString) -> Self {
        Self {
            text,
            metadata: Vec::new(),
            notes: Vec::new(),
        }
    }
}

/// A named, ordered collection of items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemGroup {
    /// Item type name, e.g. `Compile` or `ReferencePath`.
    pub name: InternedString,

    pub items: Vec<Item>,
}

/// What an item-operation message did to an item group during target
/// execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemActionKind {
    Add,
    Remove,
}

/// One `Added Item(s)` / `Removed Item(s)` operation recorded under a target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemAction {
    pub kind: ItemActionKind,
    pub group: ItemGroup,
}

/// One parameter passed into a task: either a scalar or an item list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskParameter {
    Property(Property),
    Items(ItemGroup),
}

/// A file copy operation mined from a copy task's messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCopy {
    pub source: InternedString,
    pub destination: InternedString,

    /// False for "Did not copy" (up-to-date skip).
    pub copied: bool,
}
