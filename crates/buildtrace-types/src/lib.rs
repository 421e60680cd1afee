pub mod error;
pub mod event;
pub mod intern;
pub mod model;

pub use error::{Error, Result};
pub use event::*;
pub use intern::{normalize_newlines, InternedString, StringInterner};
pub use model::*;
