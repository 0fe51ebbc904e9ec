use crate::ast::DeclKind;
use miette::{Diagnostic, SourceSpan};
use std::result;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The attachment attribute sits on a declaration kind it cannot expand.
    #[error("@{attribute} can only be attached to {expected}; found {found} `{name}`")]
    #[diagnostic(
        code(witness::invalid_attachment_target),
        help("move @{attribute} onto {expected}")
    )]
    InvalidAttachmentTarget {
        attribute: String,
        expected: String,
        found: DeclKind,
        name: String,
        #[label("attached here")]
        span: Option<SourceSpan>,
    },
    #[error("Parse error: {0}")]
    #[diagnostic(code(witness::parse))]
    Parse(String),
    #[error("Generic error: {0}")]
    Generic(String),
}

pub type Result<T> = result::Result<T, Error>;

// Convert from eyre::Report to our Error type
impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Generic(e.to_string())
    }
}
