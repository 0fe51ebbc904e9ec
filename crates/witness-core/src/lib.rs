#[macro_use]
pub mod macros;

pub mod assemble;
pub mod ast;
pub mod attachment;
pub mod capture;
pub mod emit;
pub mod error;
pub mod output;
pub mod pretty;
pub mod printer;
pub mod signature;
pub mod span;

// Re-export commonly used items for convenience
pub use tracing;

pub use assemble::{
    expand, expand_with, expander_for, ProtocolWitnessExpander, TypeWitnessExpander,
    WitnessExpander,
};
pub use attachment::{AttachmentSite, TargetKind, WitnessOptions};
pub use output::{Expansion, Placement};
pub use pretty::PrettyOptions;
pub use printer::{render, render_indented};

// Alias for error types
pub type Error = crate::error::Error;
pub type Result<T> = crate::error::Result<T>;
