//! Integration tests for the witness CLI

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;
use witness_cli::cli::WitnessConfig;
use witness_cli::commands::expand::{expand_command, ExpandArgs, TargetArg};
use witness_cli::CliError;

const MARKER: &str = "@Witness\nprotocol Marker {}\n";

const SERVICE: &str = "\
@Witnessed(typeName: \"Mock\")
struct Service {
    var client: Client
}
";

fn expand_args(files: Vec<std::path::PathBuf>, output: std::path::PathBuf) -> ExpandArgs {
    ExpandArgs {
        files,
        output: Some(output),
        target: None,
        attributes: Vec::new(),
        json: false,
    }
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("witness").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("witness"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("witness").unwrap();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_expand_prints_to_stdout() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("Marker.swift");
    fs::write(&input, MARKER).unwrap();

    let mut cmd = Command::cargo_bin("witness").unwrap();
    cmd.arg("expand").arg(&input);
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("protocol Marker {}\n\nstruct MarkerWitness: Marker {"))
        .stdout(predicate::str::contains("@Witness").not());
}

#[test]
fn test_cli_rejects_misattached_witness() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("Thing.swift");
    fs::write(&input, "@Witness\nstruct Thing {}\n").unwrap();

    let mut cmd = Command::cargo_bin("witness").unwrap();
    cmd.arg("expand").arg(&input);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("can only be attached to a protocol"));
}

#[tokio::test]
async fn test_expand_many_files_into_directory() {
    let temp_dir = TempDir::new().unwrap();
    let marker = temp_dir.path().join("Marker.swift");
    let service = temp_dir.path().join("Service.swift");
    fs::write(&marker, MARKER).unwrap();
    fs::write(&service, SERVICE).unwrap();
    let out_dir = temp_dir.path().join("generated");

    let args = expand_args(vec![marker, service], out_dir.clone());
    expand_command(args, &WitnessConfig::default()).await.unwrap();

    let marker_out = fs::read_to_string(out_dir.join("Marker.swift")).unwrap();
    assert!(marker_out.contains("struct MarkerWitness: Marker {"));

    let service_out = fs::read_to_string(out_dir.join("Service.swift")).unwrap();
    assert!(service_out.starts_with("struct Service {\n    var client: Client\n\n    struct Mock {\n"));
    assert!(service_out.contains("        static let production: Mock = {\n"));
}

#[tokio::test]
async fn test_config_and_flags_set_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("Marker.swift");
    fs::write(&input, MARKER).unwrap();
    let output = temp_dir.path().join("Marker.generated.swift");

    let config: WitnessConfig = toml::from_str("[formatting]\nindent_size = 2\n").unwrap();
    let mut args = expand_args(vec![input], output.clone());
    args.target = Some(TargetArg::Class);
    args.attributes = vec!["MainActor".to_string()];
    expand_command(args, &config).await.unwrap();

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("@MainActor\nfinal class MarkerWitness: Marker {\n  static func erase() -> any Marker {\n"));
}

#[tokio::test]
async fn test_expand_json_request() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("marker.json");
    fs::write(
        &input,
        r#"{
            "declaration": { "kind": "protocol", "name": "Marker", "members": [] },
            "site": { "attribute": "Witness", "arguments": [] }
        }"#,
    )
    .unwrap();
    let output = temp_dir.path().join("out");
    fs::create_dir(&output).unwrap();

    let mut args = expand_args(vec![input], output.clone());
    args.json = true;
    expand_command(args, &WitnessConfig::default()).await.unwrap();

    let text = fs::read_to_string(output.join("marker.swift")).unwrap();
    let expected = "\
struct MarkerWitness: Marker {
    static func erase() -> any Marker {
        MarkerWitness()
    }
}

extension Marker where Self == MarkerWitness {
    static func witness() -> MarkerWitness {
        MarkerWitness()
    }
}

extension Marker {
    func toWitness() -> MarkerWitness {
        MarkerWitness()
    }
}
";
    assert_eq!(text, expected);
}

#[tokio::test]
async fn test_missing_file_is_an_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let args = expand_args(
        vec![temp_dir.path().join("Missing.swift")],
        temp_dir.path().join("out.swift"),
    );
    let err = expand_command(args, &WitnessConfig::default()).await.unwrap_err();
    assert!(matches!(err, CliError::Io(_)));
}
