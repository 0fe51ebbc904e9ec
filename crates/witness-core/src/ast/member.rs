use derive_more::From;

use crate::ast::{Access, Attribute};
use crate::{common_enum, common_struct};

common_enum! {
    #[derive(Copy)]
    #[serde(rename_all = "lowercase")]
    pub enum Binding {
        Let,
        Var,
    }
}

impl Binding {
    pub fn keyword(self) -> &'static str {
        match self {
            Binding::Let => "let",
            Binding::Var => "var",
        }
    }
}

common_struct! {
    /// Effect qualifiers on a getter, function or closure type.
    #[derive(Copy, Default)]
    pub struct Effects {
        #[serde(default, rename = "async")]
        pub is_async: bool,
        #[serde(default, rename = "throws")]
        pub is_throwing: bool,
    }
}

impl Effects {
    pub const NONE: Effects = Effects {
        is_async: false,
        is_throwing: false,
    };

    pub fn new(is_async: bool, is_throwing: bool) -> Self {
        Self {
            is_async,
            is_throwing,
        }
    }

    pub fn is_none(&self) -> bool {
        !self.is_async && !self.is_throwing
    }

    pub fn union(self, other: Effects) -> Effects {
        Effects {
            is_async: self.is_async || other.is_async,
            is_throwing: self.is_throwing || other.is_throwing,
        }
    }
}

common_struct! {
    #[derive(Default)]
    pub struct Modifiers {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub access: Option<Access>,
        /// The `x` in `public private(set) var`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub setter_access: Option<Access>,
        #[serde(default, rename = "static")]
        pub is_static: bool,
        #[serde(default, rename = "lazy")]
        pub is_lazy: bool,
        #[serde(default, rename = "mutating")]
        pub is_mutating: bool,
    }
}

impl Modifiers {
    pub fn is_restricted(&self) -> bool {
        self.access.is_some_and(Access::is_restricted)
    }

    pub fn setter_is_restricted(&self) -> bool {
        self.setter_access.is_some_and(Access::is_restricted)
    }
}

common_enum! {
    /// Classified default-value expression of a stored property.
    #[serde(rename_all = "lowercase")]
    pub enum DefaultValue {
        /// `Foo()`, `Foo.init(x: 1)`, `{ ... }()`: the result is computed.
        Call { callee: String, text: String },
        /// A bare closure literal `{ ... }`.
        Closure(String),
        /// Literals and everything else.
        Other(String),
    }
}

impl DefaultValue {
    pub fn text(&self) -> &str {
        match self {
            DefaultValue::Call { text, .. } => text,
            DefaultValue::Closure(text) | DefaultValue::Other(text) => text,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self, DefaultValue::Call { .. })
    }

    /// The type a call default constructs, when it names one directly.
    pub fn inferred_type(&self) -> Option<String> {
        let DefaultValue::Call { callee, .. } = self else {
            return None;
        };
        let callee = callee.trim();
        let callee = callee.strip_suffix(".init").unwrap_or(callee);
        let last = callee.rsplit('.').next()?;
        let starts_upper = last.chars().next().is_some_and(char::is_uppercase);
        let is_path = callee
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '<' | '>' | ',' | ' ' | '[' | ']' | ':' | '?'));
        (starts_upper && is_path).then(|| callee.to_string())
    }
}

common_struct! {
    pub struct StoredMember {
        #[serde(default)]
        pub modifiers: Modifiers,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub attributes: Vec<Attribute>,
        pub binding: Binding,
        pub name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub ty: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub default: Option<DefaultValue>,
    }
}

common_struct! {
    #[derive(Default)]
    pub struct Accessors {
        #[serde(default)]
        pub getter: Effects,
        #[serde(default)]
        pub has_setter: bool,
    }
}

common_struct! {
    /// A property with an accessor block, including protocol requirements such
    /// as `var x: Int { get }`.
    pub struct ComputedMember {
        #[serde(default)]
        pub modifiers: Modifiers,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub attributes: Vec<Attribute>,
        pub name: String,
        pub ty: String,
        #[serde(default)]
        pub accessors: Accessors,
    }
}

common_struct! {
    pub struct Parameter {
        /// External argument label; `_` when the label is discarded.
        pub label: String,
        /// Internal name when it differs from the label.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
        pub ty: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub default: Option<String>,
    }
}

impl Parameter {
    pub fn new(label: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            name: None,
            ty: ty.into(),
            default: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_unlabeled(&self) -> bool {
        self.label == "_"
    }

    /// Name the parameter is referred to by inside a body. Discarded names get
    /// a positional stand-in so a forwarding call can always reference them.
    pub fn binding_name(&self, index: usize) -> String {
        match self.name.as_deref() {
            Some(name) if name != "_" => name.to_string(),
            _ if !self.is_unlabeled() => self.label.clone(),
            _ => format!("arg{index}"),
        }
    }

    pub fn is_inout(&self) -> bool {
        self.ty.trim_start().starts_with("inout ")
    }
}

common_struct! {
    pub struct FunctionMember {
        #[serde(default)]
        pub modifiers: Modifiers,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub attributes: Vec<Attribute>,
        pub name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub generics: Option<String>,
        #[serde(default)]
        pub params: Vec<Parameter>,
        #[serde(default)]
        pub effects: Effects,
        /// The `E` of a typed `throws(E)`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub thrown_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub return_type: Option<String>,
    }
}

common_struct! {
    /// Anything the engine never captures: initializers, subscripts, associated
    /// types, nested declarations.
    pub struct OtherMember {
        pub kind: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
    }
}

common_enum! {
    #[derive(From)]
    #[serde(tag = "member", rename_all = "lowercase")]
    pub enum Member {
        Stored(StoredMember),
        Computed(ComputedMember),
        Function(FunctionMember),
        Other(OtherMember),
    }
}

impl Member {
    pub fn name(&self) -> Option<&str> {
        match self {
            Member::Stored(member) => Some(&member.name),
            Member::Computed(member) => Some(&member.name),
            Member::Function(member) => Some(&member.name),
            Member::Other(member) => member.name.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn effect_flags_use_swift_keywords_as_field_names() {
        let json = serde_json::to_value(Effects::new(true, false)).unwrap();
        assert_eq!(json, serde_json::json!({ "async": true, "throws": false }));
    }

    #[test]
    fn modifier_flags_default_when_absent() {
        let modifiers: Modifiers =
            serde_json::from_str(r#"{ "access": "public", "mutating": true }"#).unwrap();
        assert_eq!(modifiers.access, Some(Access::Public));
        assert!(modifiers.is_mutating);
        assert!(!modifiers.is_static && !modifiers.is_lazy);
    }

    #[test]
    fn typed_throws_round_trips_through_json() {
        let member: Member = serde_json::from_str(
            r#"{ "member": "function", "name": "fetch", "effects": { "throws": true }, "thrown_type": "NetError" }"#,
        )
        .unwrap();
        let Member::Function(function) = member else {
            panic!("expected a function member");
        };
        assert_eq!(function.thrown_type.as_deref(), Some("NetError"));
        assert!(function.effects.is_throwing);
    }
}
