//! Expand attached declarations in Swift sources

use crate::commands::read_source;
use crate::diagnostics::SourceError;
use crate::{cli::WitnessConfig, CliError, Result};
use clap::{Args, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info};
use witness_core::ast::Declaration;
use witness_core::{expand_with, render, AttachmentSite, PrettyOptions, TargetKind, WitnessOptions};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TargetArg {
    Struct,
    Class,
}

impl From<TargetArg> for TargetKind {
    fn from(target: TargetArg) -> Self {
        match target {
            TargetArg::Struct => TargetKind::Struct,
            TargetArg::Class => TargetKind::Class,
        }
    }
}

/// Arguments for the expand command
#[derive(Debug, Clone, Args)]
pub struct ExpandArgs {
    /// Swift sources (or JSON requests with --json) to expand
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output file, or directory when several inputs are given
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Default witness shape when the attachment does not say
    #[arg(long, value_enum)]
    pub target: Option<TargetArg>,

    /// Attribute placed on every generated witness (repeatable)
    #[arg(long = "attribute")]
    pub attributes: Vec<String>,

    /// Read pre-decoded declarations as JSON instead of Swift source
    #[arg(long)]
    pub json: bool,
}

/// One pre-decoded expansion request.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRequest {
    pub declaration: Declaration,
    pub site: AttachmentSite,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonInput {
    One(JsonRequest),
    Many(Vec<JsonRequest>),
}

/// Options shared by every file of one invocation.
#[derive(Debug, Clone)]
pub struct ExpandSettings {
    pub defaults: WitnessOptions,
    pub pretty: PrettyOptions,
    pub json: bool,
}

impl ExpandSettings {
    /// Configuration first, then command-line flags on top.
    pub fn resolve(args: &ExpandArgs, config: &WitnessConfig) -> Result<Self> {
        let mut defaults = config.witness_options()?;
        if let Some(target) = args.target {
            defaults.target = target.into();
        }
        if !args.attributes.is_empty() {
            defaults.attributes.clear();
            for attribute in &args.attributes {
                defaults = defaults.with_attribute(attribute);
            }
        }
        Ok(Self {
            defaults,
            pretty: config.pretty_options(),
            json: args.json,
        })
    }
}

/// Execute the expand command
pub async fn expand_command(args: ExpandArgs, config: &WitnessConfig) -> Result<()> {
    if args.files.is_empty() {
        return Err(CliError::InvalidInput(
            "Must specify at least one file".to_string(),
        ));
    }
    let settings = Arc::new(ExpandSettings::resolve(&args, config)?);

    let mut tasks = JoinSet::new();
    for (index, path) in args.files.iter().cloned().enumerate() {
        let settings = Arc::clone(&settings);
        tasks.spawn_blocking(move || {
            let result = expand_file(&path, &settings);
            (index, path, result)
        });
    }

    let mut outputs = Vec::with_capacity(args.files.len());
    while let Some(joined) = tasks.join_next().await {
        let (index, path, result) = joined
            .map_err(|err| CliError::InvalidInput(format!("Expansion task failed: {err}")))?;
        outputs.push((index, path, result?));
    }
    outputs.sort_by_key(|(index, _, _)| *index);

    let many = outputs.len() > 1;
    for (_, path, text) in &outputs {
        match &args.output {
            Some(output) => {
                let target = output_path(output, path, many, settings.json);
                write_output(&target, text)?;
                info!(input = %path.display(), output = %target.display(), "wrote expansion");
            }
            None => print!("{text}"),
        }
    }
    Ok(())
}

/// Expand one input file and return the text to write.
pub fn expand_file(path: &Path, settings: &ExpandSettings) -> Result<String> {
    let source = read_source(path)?;
    debug!(file = %path.display(), json = settings.json, "expanding");
    if settings.json {
        expand_json(path, &source, settings)
    } else {
        let expanded = witness_swift::expand_source(&source, &settings.defaults, &settings.pretty)
            .map_err(|error| SourceError::new(path, &source, error))?;
        if expanded.is_unchanged() {
            debug!(file = %path.display(), "no attachments found");
        }
        Ok(expanded.text)
    }
}

fn expand_json(path: &Path, source: &str, settings: &ExpandSettings) -> Result<String> {
    let input: JsonInput = serde_json::from_str(source).map_err(|err| {
        CliError::Parse(format!("Failed to decode {}: {err}", path.display()))
    })?;
    let requests = match input {
        JsonInput::One(request) => vec![request],
        JsonInput::Many(requests) => requests,
    };

    let mut rendered = Vec::with_capacity(requests.len());
    for request in &requests {
        let expansion = expand_with(&request.declaration, &request.site, &settings.defaults)
            .map_err(|error| SourceError::new(path, source, error))?;
        rendered.push(render(&expansion, &settings.pretty));
    }
    Ok(rendered.join("\n"))
}

fn output_path(output: &Path, input: &Path, many: bool, json: bool) -> PathBuf {
    if !many && !output.is_dir() {
        return output.to_path_buf();
    }
    let file_name = match (json, input.file_stem()) {
        (true, Some(stem)) => PathBuf::from(stem).with_extension("swift"),
        _ => input.file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("out.swift")),
    };
    output.join(file_name)
}

fn write_output(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_for_single_and_many_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Out.swift");
        assert_eq!(output_path(&file, Path::new("In.swift"), false, false), file);
        assert_eq!(
            output_path(dir.path(), Path::new("src/In.swift"), false, false),
            dir.path().join("In.swift")
        );
        assert_eq!(
            output_path(Path::new("gen"), Path::new("decl.json"), true, true),
            Path::new("gen").join("decl.swift")
        );
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = WitnessConfig::default();
        config.defaults.attributes = vec!["Sendable".to_string()];
        let args = ExpandArgs {
            files: vec![PathBuf::from("a.swift")],
            output: None,
            target: Some(TargetArg::Class),
            attributes: vec!["MainActor".to_string()],
            json: false,
        };
        let settings = ExpandSettings::resolve(&args, &config).unwrap();
        assert_eq!(settings.defaults.target, TargetKind::Class);
        assert_eq!(settings.defaults.attributes, vec!["@MainActor".to_string()]);
    }
}
