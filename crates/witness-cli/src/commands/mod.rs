//! Command implementations for the witness CLI

pub mod completions;
pub mod expand;
pub mod parse;

// Re-export command functions
pub use completions::completions_command;
pub use expand::expand_command;
pub use parse::parse_command;

use crate::{CliError, Result};
use std::path::Path;

/// Read a source file, naming it in the error.
pub(crate) fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|err| {
        CliError::Io(std::io::Error::new(
            err.kind(),
            format!("Failed to read file {}: {err}", path.display()),
        ))
    })
}
