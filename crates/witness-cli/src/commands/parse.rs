//! Dump decoded declarations as JSON

use crate::commands::read_source;
use crate::diagnostics::SourceError;
use crate::{cli::WitnessConfig, CliError, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Arguments for the parse command
#[derive(Debug, Clone, Args)]
pub struct ParseArgs {
    /// Swift source file to decode
    pub file: PathBuf,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn parse_command(args: ParseArgs, _config: &WitnessConfig) -> Result<()> {
    let source = read_source(&args.file)?;
    println!("{}", parse_to_json(&args.file, &source, args.pretty)?);
    Ok(())
}

/// Every declaration in `source`, nested ones included, as a JSON array.
pub fn parse_to_json(path: &Path, source: &str, pretty: bool) -> Result<String> {
    let declarations = witness_swift::parse_str(source)
        .map_err(|error| SourceError::new(path, source, error))?;
    debug!(file = %path.display(), count = declarations.len(), "decoded declarations");

    let json = if pretty {
        serde_json::to_string_pretty(&declarations)
    } else {
        serde_json::to_string(&declarations)
    };
    json.map_err(|err| CliError::Parse(format!("Failed to serialize declarations: {err}")))
}
