//! Diagnostic and error reporting utilities

use crate::{CliError, Result};
use miette::{Diagnostic, GraphicalReportHandler, LabeledSpan, NamedSource, SourceCode};
use std::fmt::Display;
use std::path::Path;
use thiserror::Error;

/// Set up enhanced error reporting with miette
pub fn setup_error_reporting() -> Result<()> {
    // Install miette as the global error handler
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .map_err(|e| CliError::Config(format!("Failed to setup error reporting: {}", e)))?;

    Ok(())
}

/// A generator error together with the file it was raised for, so labels
/// render against the source text.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct SourceError {
    pub error: witness_core::Error,
    pub src: NamedSource<String>,
}

impl SourceError {
    pub fn new(path: &Path, source: &str, error: witness_core::Error) -> Self {
        Self {
            error,
            src: NamedSource::new(path.display().to_string(), source.to_string()),
        }
    }
}

impl Diagnostic for SourceError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.error.code()
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.error.help()
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        self.error.labels()
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.src)
    }
}

/// Render errors that carry source context through the graphical handler.
/// Returns `false` when the error has nothing beyond its message.
pub fn render_cli_error(error: &CliError) -> bool {
    let CliError::Expansion(diagnostic) = error else {
        return false;
    };
    let mut out = String::new();
    match GraphicalReportHandler::new().render_report(&mut out, diagnostic.as_ref()) {
        Ok(()) => {
            eprint!("{out}");
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use witness_core::ast::DeclKind;

    fn misattached() -> SourceError {
        let source = "@Witness\nstruct Thing {}\n";
        let error = witness_core::Error::InvalidAttachmentTarget {
            attribute: "Witness".to_string(),
            expected: "a protocol".to_string(),
            found: DeclKind::Struct,
            name: "Thing".to_string(),
            span: Some((0, source.len() - 1).into()),
        };
        SourceError::new(Path::new("Thing.swift"), source, error)
    }

    #[test]
    fn test_source_error_keeps_core_diagnostic() {
        let error = misattached();
        assert_eq!(
            error.code().map(|code| code.to_string()).as_deref(),
            Some("witness::invalid_attachment_target")
        );
        let labels: Vec<LabeledSpan> = error.labels().into_iter().flatten().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 0);
        assert!(error.source_code().is_some());
    }

    #[test]
    fn test_only_expansion_errors_render_with_source() {
        assert!(render_cli_error(&CliError::from(misattached())));
        assert!(!render_cli_error(&CliError::InvalidInput("nothing".to_string())));
    }
}
