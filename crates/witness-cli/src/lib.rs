//! Witness CLI Library
//!
//! Command implementations behind the `witness` binary: configuration loading,
//! file expansion and diagnostic rendering.

pub mod cli;
pub mod commands;
pub mod diagnostics;

// CLI-specific error handling
pub mod error {
    use crate::diagnostics::SourceError;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum CliError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Configuration error: {0}")]
        Config(String),

        #[error("Parse error: {0}")]
        Parse(String),

        #[error("{0}")]
        Expansion(Box<SourceError>),

        #[error("Invalid input: {0}")]
        InvalidInput(String),
    }

    impl From<SourceError> for CliError {
        fn from(error: SourceError) -> Self {
            CliError::Expansion(Box::new(error))
        }
    }

    pub type Result<T> = std::result::Result<T, CliError>;
}

pub use error::{CliError, Result};
