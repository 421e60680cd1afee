pub mod build;
pub mod diagnostic;
pub mod item;

pub use build::*;
pub use diagnostic::*;
pub use item::*;
