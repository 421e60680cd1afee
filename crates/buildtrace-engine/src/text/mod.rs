//! Parsers that mine structured data out of semi-structured log message text.
//!
//! Build engines report their richest data (item groups, task parameters,
//! copy operations) as formatted free text for backward compatibility with
//! older log consumers. These parsers recognize the fixed prefixes and
//! indentation conventions and recover the structure.

mod copying;
mod message;
mod rar;

pub use message::{
    parse_structured, MessageKind, ParsedItem, ParsedItemGroup, ParsedPayload, StructuredMessage,
};
pub use rar::{parse_rar_message, RarAnalysis, RarParameter};
