pub mod context;
pub mod event;
pub mod payload;
pub mod source;

pub use context::*;
pub use event::*;
pub use payload::*;
pub use source::*;
