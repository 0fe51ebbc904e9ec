// Splicing tests: attached Swift source in, expanded Swift source out.

use pretty_assertions::assert_eq;
use witness_core::ast::DeclKind;
use witness_core::error::Error;
use witness_core::{Placement, PrettyOptions, Result, TargetKind, WitnessOptions};
use witness_swift::expand_source;

fn expand(source: &str) -> Result<String> {
    let expanded = expand_source(source, &WitnessOptions::default(), &PrettyOptions::default())?;
    Ok(expanded.text)
}

#[test]
fn test_peer_witness_follows_the_protocol() -> Result<()> {
    let source = "\
import Foundation

@Witness
protocol Marker {}
";
    let expected = "\
import Foundation

protocol Marker {}

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
    assert_eq!(expand(source)?, expected);
    Ok(())
}

#[test]
fn test_member_witness_goes_inside_the_body() -> Result<()> {
    let source = "\
@Witnessed
struct Service {
    var client: Client
}
";
    let expected = "\
struct Service {
    var client: Client

    struct Witness {
        var client: Client

        static func erase(client: Client) -> Witness {
            Witness(client: client)
        }

        static let production: Witness = {
            let base = Service()
            return Witness(client: base.client)
        }()
    }
}
";
    assert_eq!(expand(source)?, expected);
    Ok(())
}

#[test]
fn test_single_line_body_is_opened_up() -> Result<()> {
    let expected = "\
struct Empty {
    struct Witness {
        static func erase() -> Witness {
            Witness()
        }

        static let production: Witness = Witness()
    }
}";
    assert_eq!(expand("@Witnessed struct Empty {}")?, expected);
    Ok(())
}

#[test]
fn test_nested_protocol_is_indented() -> Result<()> {
    let source = "\
enum Services {
    @Witness
    protocol Marker {}
}
";
    let expanded = expand(source)?;
    assert!(expanded.starts_with("enum Services {\n    protocol Marker {}\n\n    struct MarkerWitness: Marker {\n"));
    assert!(expanded.contains("\n    extension Marker where Self == MarkerWitness {\n        static func witness() -> MarkerWitness {\n"));
    assert!(expanded.ends_with("    }\n}\n"));
    Ok(())
}

#[test]
fn test_expansion_is_idempotent() -> Result<()> {
    let source = "\
@Witness(targetType: .class)
public protocol Clock {
    var now: Date { get }
    func sleep(for duration: Duration) async throws
}
";
    let once = expand_source(source, &WitnessOptions::default(), &PrettyOptions::default())?;
    assert_eq!(once.expansions.len(), 1);
    assert_eq!(once.expansions[0].placement, Placement::Peer);
    assert!(once.text.contains("public final class ClockWitness: Clock {"));

    let twice = expand_source(&once.text, &WitnessOptions::default(), &PrettyOptions::default())?;
    assert!(twice.is_unchanged());
    assert_eq!(twice.text, once.text);
    Ok(())
}

#[test]
fn test_configured_defaults_apply_under_site_arguments() -> Result<()> {
    let defaults = WitnessOptions::default()
        .with_target(TargetKind::Class)
        .with_attribute("MainActor");
    let options = PrettyOptions { indent_size: 2 };

    let plain = expand_source("@Witness protocol Marker {}", &defaults, &options)?;
    assert!(plain.text.contains("@MainActor\nfinal class MarkerWitness: Marker {\n  static func erase()"));

    let overridden = expand_source("@Witness(targetType: .struct) protocol Marker {}", &defaults, &options)?;
    assert!(overridden.text.contains("@MainActor\nstruct MarkerWitness: Marker {"));
    Ok(())
}

#[test]
fn test_misattached_witness_points_at_the_declaration() {
    let source = "import Foundation\n\n@Witness\nstruct Thing {}\n";
    let err = expand(source).unwrap_err();
    match err {
        Error::InvalidAttachmentTarget { found, span, .. } => {
            assert_eq!(found, DeclKind::Struct);
            let span = span.expect("declaration span");
            assert_eq!(span.offset(), 19);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_source_without_attachments_is_untouched() -> Result<()> {
    let source = "struct Plain {\n    let value: Int\n}\n";
    assert_eq!(expand(source)?, source);
    Ok(())
}
