//! Attachment-site arguments and the options they configure.

use tracing::warn;

use crate::{common_enum, common_struct};

common_enum! {
    /// Shape of the generated witness.
    #[derive(Copy, Default)]
    #[serde(rename_all = "lowercase")]
    pub enum TargetKind {
        /// Value semantics; the default.
        #[default]
        Struct,
        /// Reference semantics, emitted as a `final class`.
        Class,
    }
}

impl TargetKind {
    /// Accepts `.struct`, `TargetType.class`, `class`, `value`, `reference`.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim().rsplit('.').next()?.trim();
        match word {
            "struct" | "value" | "valueType" => Some(TargetKind::Struct),
            "class" | "reference" | "referenceType" => Some(TargetKind::Class),
            _ => None,
        }
    }
}

common_struct! {
    /// One `label: value` argument of the attachment attribute, value kept as
    /// source text.
    pub struct AttachmentArgument {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub label: Option<String>,
        pub value: String,
    }
}

common_struct! {
    /// The attribute node a declaration was attached by.
    pub struct AttachmentSite {
        /// Attribute name without `@`, e.g. `Witness`.
        pub attribute: String,
        #[serde(default)]
        pub arguments: Vec<AttachmentArgument>,
    }
}

impl AttachmentSite {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.push(AttachmentArgument {
            label: Some(label.into()),
            value: value.into(),
        });
        self
    }

    pub fn argument(&self, label: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|arg| arg.label.as_deref() == Some(label))
            .map(|arg| arg.value.as_str())
    }
}

pub const TARGET_TYPE: &str = "targetType";
pub const ATTRIBUTE_NAMES: &str = "attributeNames";
pub const TYPE_NAME: &str = "typeName";
pub const PRODUCTION_INSTANCE_NAME: &str = "productionInstanceName";

/// Options of one expansion, decoded from its attachment site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WitnessOptions {
    pub target: TargetKind,
    /// Attribute lines placed on the generated type, each starting with `@`.
    pub attributes: Vec<String>,
    pub type_name: Option<String>,
    pub production_instance_name: Option<String>,
}

impl WitnessOptions {
    pub fn from_site(site: &AttachmentSite) -> Self {
        WitnessOptions::default().overlay(site)
    }

    /// Apply the site's arguments on top of `self`; arguments the site does
    /// not spell keep their current value.
    pub fn overlay(self, site: &AttachmentSite) -> Self {
        let mut options = self;
        for argument in &site.arguments {
            let Some(label) = argument.label.as_deref() else {
                warn!(value = %argument.value, "ignoring unlabeled attachment argument");
                continue;
            };
            match label {
                TARGET_TYPE => match TargetKind::parse(&argument.value) {
                    Some(target) => options.target = target,
                    None => warn!(value = %argument.value, "unknown targetType, keeping the current target"),
                },
                ATTRIBUTE_NAMES => match string_list(&argument.value) {
                    Some(names) => options.attributes = names.iter().map(|n| attribute_line(n)).collect(),
                    None => warn!(value = %argument.value, "attributeNames must be string literals"),
                },
                TYPE_NAME => match string_literal(&argument.value) {
                    Some(name) => options.type_name = Some(name),
                    None => warn!(value = %argument.value, "typeName must be a string literal"),
                },
                PRODUCTION_INSTANCE_NAME => match string_literal(&argument.value) {
                    Some(name) => options.production_instance_name = Some(name),
                    None => {
                        warn!(value = %argument.value, "productionInstanceName must be a string literal")
                    }
                },
                other => warn!(label = other, "ignoring unknown attachment argument"),
            }
        }
        options
    }

    pub fn with_target(mut self, target: TargetKind) -> Self {
        self.target = target;
        self
    }

    pub fn with_attribute(mut self, attribute: &str) -> Self {
        self.attributes.push(attribute_line(attribute));
        self
    }
}

/// `Foo` and `@Foo` both become `@Foo`.
pub fn attribute_line(name: &str) -> String {
    let name = name.trim();
    if name.starts_with('@') {
        name.to_string()
    } else {
        format!("@{name}")
    }
}

// Swift string literals without interpolation share JSON's syntax.
fn string_literal(text: &str) -> Option<String> {
    serde_json::from_str::<String>(text.trim()).ok()
}

fn string_list(text: &str) -> Option<Vec<String>> {
    serde_json::from_str::<Vec<String>>(text.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_all_arguments() {
        let site = AttachmentSite::new("Witnessed")
            .with_argument(TARGET_TYPE, ".class")
            .with_argument(ATTRIBUTE_NAMES, r#"["Foo", "Bar(x: true)"]"#)
            .with_argument(TYPE_NAME, r#""Mock""#)
            .with_argument(PRODUCTION_INSTANCE_NAME, r#""live""#);
        let options = WitnessOptions::from_site(&site);
        assert_eq!(options.target, TargetKind::Class);
        assert_eq!(options.attributes, vec!["@Foo", "@Bar(x: true)"]);
        assert_eq!(options.type_name.as_deref(), Some("Mock"));
        assert_eq!(options.production_instance_name.as_deref(), Some("live"));
    }

    #[test]
    fn absent_and_empty_arguments_use_defaults() {
        let options = WitnessOptions::from_site(&AttachmentSite::new("Witness"));
        assert_eq!(options, WitnessOptions::default());

        let site = AttachmentSite::new("Witness").with_argument(ATTRIBUTE_NAMES, "[]");
        assert!(WitnessOptions::from_site(&site).attributes.is_empty());
    }

    #[test]
    fn site_arguments_override_configured_defaults() {
        let defaults = WitnessOptions::default()
            .with_target(TargetKind::Class)
            .with_attribute("MainActor");
        let site = AttachmentSite::new("Witness").with_argument(ATTRIBUTE_NAMES, r#"["Sendable"]"#);
        let options = defaults.overlay(&site);
        assert_eq!(options.target, TargetKind::Class);
        assert_eq!(options.attributes, vec!["@Sendable"]);
    }

    #[test]
    fn unknown_target_falls_back_to_struct() {
        let site = AttachmentSite::new("Witness").with_argument(TARGET_TYPE, ".enum");
        assert_eq!(WitnessOptions::from_site(&site).target, TargetKind::Struct);
    }
}
