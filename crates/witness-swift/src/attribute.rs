//! Attachment attributes (`@Witness(...)`) decoded into attachment sites.

use nom::sequence::terminated;
use nom::Parser;
use witness_core::ast::Attribute;
use witness_core::attachment::{AttachmentArgument, AttachmentSite};
use witness_core::expander_for;

use crate::lexer::{identifier, parenthesized, split_top_level, symbol, ws, PResult};

/// Whether `attribute` triggers an expansion.
pub fn is_attachment(attribute: &Attribute) -> bool {
    expander_for(&attribute.name).is_some()
}

fn label(input: &str) -> PResult<'_, String> {
    terminated(identifier, symbol(":")).parse(input)
}

fn argument(text: &str) -> AttachmentArgument {
    match label(text) {
        Ok((value, label)) => AttachmentArgument {
            label: Some(label),
            value: value.trim().to_string(),
        },
        Err(_) => AttachmentArgument {
            label: None,
            value: text.trim().to_string(),
        },
    }
}

pub fn attachment_site(attribute: &Attribute) -> AttachmentSite {
    let mut site = AttachmentSite::new(attribute.name.clone());
    if let Some(arguments) = &attribute.arguments {
        site.arguments = split_top_level(arguments, false)
            .into_iter()
            .map(argument)
            .collect();
    }
    site
}

/// Name of the first attachment attribute `input` starts with, if any.
pub fn leading_attachment(input: &str) -> Option<String> {
    let (mut input, _) = ws(input).ok()?;
    while let Some(rest) = input.strip_prefix('@') {
        let (rest, name) = identifier(rest).ok()?;
        if expander_for(&name).is_some() {
            return Some(name);
        }
        // Skip this attribute's arguments, if any, and keep looking.
        let rest = if rest.starts_with('(') {
            parenthesized(rest).map_or(rest, |(after, _)| after)
        } else {
            rest
        };
        let (rest, _) = ws(rest).ok()?;
        input = rest;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn labels_are_split_from_values() {
        let attribute = Attribute::new(
            "Witness",
            Some(r#"targetType: .class, attributeNames: ["Sendable", "available(iOS 17, *)"]"#.into()),
        );
        let site = attachment_site(&attribute);
        assert_eq!(site.attribute, "Witness");
        assert_eq!(site.argument("targetType"), Some(".class"));
        assert_eq!(
            site.argument("attributeNames"),
            Some(r#"["Sendable", "available(iOS 17, *)"]"#)
        );
    }

    #[test]
    fn bare_attribute_has_no_arguments() {
        let site = attachment_site(&Attribute::new("Witnessed", None));
        assert!(site.arguments.is_empty());
    }

    #[test]
    fn finds_attachment_behind_other_attributes() {
        assert_eq!(
            leading_attachment("@MainActor @Witness(targetType: .class)\nprotocol P {"),
            Some("Witness".to_string())
        );
        assert_eq!(leading_attachment("@MainActor\nfinal class C {}"), None);
    }
}
