//! Witness assembly: validates the attachment target, captures members once and
//! composes the emitted members and factories into the final declarations.

use tracing::{debug, info};

use crate::ast::{DeclKind, Declaration};
use crate::bail;
use crate::attachment::{AttachmentSite, TargetKind, WitnessOptions};
use crate::capture::capture_members;
use crate::emit::factory::{conversion_extensions, erase_function, initializer, production_accessor};
use crate::emit::member::{emit_function, emit_property};
use crate::emit::EmitContext;
use crate::error::{Error, Result};
use crate::output::{Expansion, MemberDecl, Placement, TypeDecl, TypeKeyword};

pub const WITNESS_SUFFIX: &str = "Witness";
pub const DEFAULT_NESTED_NAME: &str = "Witness";
pub const DEFAULT_PRODUCTION_NAME: &str = "production";

/// One attachment attribute and the expansion it triggers.
pub trait WitnessExpander: Send + Sync {
    /// Attribute name without `@`.
    fn attribute_name(&self) -> &'static str;

    /// Expand with fully resolved options.
    fn expand_with(&self, decl: &Declaration, options: &WitnessOptions) -> Result<Expansion>;

    fn expand(&self, decl: &Declaration, site: &AttachmentSite) -> Result<Expansion> {
        self.expand_with(decl, &WitnessOptions::from_site(site))
    }
}

/// `@Witness` on a protocol: a conforming peer type plus a conversion
/// extension on the protocol.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProtocolWitnessExpander;

/// `@Witnessed` on a concrete type: a nested witness plus a production
/// accessor built from a default host value.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeWitnessExpander;

fn invalid_target(attribute: &str, expected: &str, decl: &Declaration) -> Error {
    Error::InvalidAttachmentTarget {
        attribute: attribute.to_string(),
        expected: expected.to_string(),
        found: decl.kind,
        name: decl.name.clone(),
        span: decl.span.map(Into::into),
    }
}

fn type_keyword(target: TargetKind) -> TypeKeyword {
    match target {
        TargetKind::Struct => TypeKeyword::Struct,
        TargetKind::Class => TypeKeyword::FinalClass,
    }
}

/// The witness type's body: wrapper/backing pairs for properties, then for
/// functions, then the erasure factory (and initializer for classes).
fn witness_type(ctx: &EmitContext<'_>, options: &WitnessOptions) -> TypeDecl {
    let mut witness = TypeDecl::new(type_keyword(ctx.target), ctx.type_name.clone());
    witness.attributes = options.attributes.clone();
    witness.access = ctx.access;

    let properties = ctx
        .captured
        .properties
        .iter()
        .enumerate()
        .flat_map(|(index, prop)| emit_property(ctx, index, prop))
        .collect();
    witness.push_section(properties);

    let functions = ctx
        .captured
        .functions
        .iter()
        .enumerate()
        .flat_map(|(index, func)| emit_function(ctx, index, func))
        .collect();
    witness.push_section(functions);

    let mut factory = vec![MemberDecl::Function(erase_function(ctx))];
    if let Some(init) = initializer(ctx) {
        factory.push(MemberDecl::Initializer(init));
    }
    witness.push_section(factory);
    witness
}

impl WitnessExpander for ProtocolWitnessExpander {
    fn attribute_name(&self) -> &'static str {
        "Witness"
    }

    fn expand_with(&self, decl: &Declaration, options: &WitnessOptions) -> Result<Expansion> {
        if decl.kind != DeclKind::Protocol {
            return Err(invalid_target(self.attribute_name(), "a protocol", decl));
        }

        let captured = capture_members(decl);
        let type_name = format!("{}{}", decl.name, WITNESS_SUFFIX);
        let ctx = EmitContext::new(&captured, decl.access, options.target, type_name)
            .with_protocol(&decl.name);

        let mut witness = witness_type(&ctx, options);
        witness.conformances.push(decl.name.clone());
        let mut declarations = vec![witness];
        declarations.extend(conversion_extensions(&ctx, &decl.name));

        info!(
            protocol = %decl.name,
            witness = %ctx.type_name,
            target = ?ctx.target,
            "expanded protocol witness"
        );
        Ok(Expansion {
            placement: Placement::Peer,
            declarations,
        })
    }
}

impl WitnessExpander for TypeWitnessExpander {
    fn attribute_name(&self) -> &'static str {
        "Witnessed"
    }

    fn expand_with(&self, decl: &Declaration, options: &WitnessOptions) -> Result<Expansion> {
        if decl.kind == DeclKind::Protocol {
            return Err(invalid_target(
                self.attribute_name(),
                "a struct, class, enum, actor or extension",
                decl,
            ));
        }

        let captured = capture_members(decl);
        let type_name = options
            .type_name
            .clone()
            .unwrap_or_else(|| DEFAULT_NESTED_NAME.to_string());
        let production_name = options
            .production_instance_name
            .as_deref()
            .unwrap_or(DEFAULT_PRODUCTION_NAME);
        let ctx = EmitContext::new(&captured, decl.access, options.target, type_name);

        let mut witness = witness_type(&ctx, options);
        debug!(host = %decl.name, production = production_name, "adding production accessor");
        witness.push_section(vec![MemberDecl::Property(production_accessor(
            &ctx,
            &decl.name,
            production_name,
        ))]);

        info!(
            host = %decl.name,
            witness = %witness.name,
            target = ?ctx.target,
            "expanded nested witness"
        );
        Ok(Expansion {
            placement: Placement::Member,
            declarations: vec![witness],
        })
    }
}

static PROTOCOL_WITNESS: ProtocolWitnessExpander = ProtocolWitnessExpander;
static TYPE_WITNESS: TypeWitnessExpander = TypeWitnessExpander;

/// Every attachment attribute this crate understands.
pub fn expanders() -> [&'static dyn WitnessExpander; 2] {
    [&PROTOCOL_WITNESS, &TYPE_WITNESS]
}

pub fn expander_for(attribute: &str) -> Option<&'static dyn WitnessExpander> {
    let attribute = attribute.trim_start_matches('@');
    expanders()
        .into_iter()
        .find(|expander| expander.attribute_name() == attribute)
}

/// Dispatch on the site's attribute and expand.
pub fn expand(decl: &Declaration, site: &AttachmentSite) -> Result<Expansion> {
    expand_with(decl, site, &WitnessOptions::default())
}

/// Like [`expand`], with `defaults` applied underneath the site's arguments.
pub fn expand_with(
    decl: &Declaration,
    site: &AttachmentSite,
    defaults: &WitnessOptions,
) -> Result<Expansion> {
    let Some(expander) = expander_for(&site.attribute) else {
        bail!("no expander for attribute @{}", site.attribute);
    };
    let options = defaults.clone().overlay(site);
    expander.expand_with(decl, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Accessors, ComputedMember, Effects, Modifiers};

    fn clock() -> Declaration {
        Declaration::new(DeclKind::Protocol, "Clock").with_member(ComputedMember {
            modifiers: Modifiers::default(),
            attributes: vec![],
            name: "now".into(),
            ty: "Date".into(),
            accessors: Accessors {
                getter: Effects::NONE,
                has_setter: false,
            },
        })
    }

    #[test]
    fn dispatches_on_attribute_name() {
        assert_eq!(expander_for("@Witness").map(|e| e.attribute_name()), Some("Witness"));
        assert_eq!(expander_for("Witnessed").map(|e| e.attribute_name()), Some("Witnessed"));
        assert!(expander_for("Observable").is_none());
    }

    #[test]
    fn unknown_attribute_is_an_error() {
        let err = expand(&clock(), &AttachmentSite::new("Mock")).unwrap_err();
        assert!(err.to_string().contains("@Mock"));
    }

    #[test]
    fn protocol_expansion_is_a_peer_pair() {
        let expansion = expand(&clock(), &AttachmentSite::new("Witness")).unwrap();
        assert_eq!(expansion.placement, Placement::Peer);
        let witness = expansion.witness().unwrap();
        assert_eq!(witness.name, "ClockWitness");
        assert_eq!(witness.conformances, vec!["Clock"]);
        let extensions: Vec<_> = expansion.extensions().collect();
        assert_eq!(extensions.len(), 2);
        assert!(extensions.iter().all(|extension| extension.name == "Clock"));
        assert_eq!(
            witness.find_function("erase").unwrap().return_type.as_deref(),
            Some("any Clock")
        );
    }

    #[test]
    fn configured_defaults_sit_under_site_arguments() {
        let defaults = WitnessOptions::default().with_target(TargetKind::Class);
        let expansion = expand_with(&clock(), &AttachmentSite::new("Witness"), &defaults).unwrap();
        assert_eq!(expansion.witness().unwrap().keyword, TypeKeyword::FinalClass);
    }
}
