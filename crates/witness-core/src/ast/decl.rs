use std::fmt;

use crate::ast::Member;
use crate::span::Span;
use crate::{common_enum, common_struct};

common_enum! {
    /// Access modifier exactly as written. "Nothing written" is `None` at the use
    /// site and is never replaced by `Internal`.
    #[derive(Copy)]
    #[serde(rename_all = "lowercase")]
    pub enum Access {
        Open,
        Public,
        Package,
        Internal,
        FilePrivate,
        Private,
    }
}

impl Access {
    pub fn keyword(self) -> &'static str {
        match self {
            Access::Open => "open",
            Access::Public => "public",
            Access::Package => "package",
            Access::Internal => "internal",
            Access::FilePrivate => "fileprivate",
            Access::Private => "private",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "open" => Access::Open,
            "public" => Access::Public,
            "package" => Access::Package,
            "internal" => Access::Internal,
            "fileprivate" => Access::FilePrivate,
            "private" => Access::Private,
            _ => return None,
        })
    }

    /// Private and file-scoped members never reach generated output.
    pub fn is_restricted(self) -> bool {
        matches!(self, Access::Private | Access::FilePrivate)
    }

    /// `open` only applies to overridable class members; generated structs and
    /// final classes carry `public` instead.
    pub fn narrowed(self) -> Self {
        match self {
            Access::Open => Access::Public,
            other => other,
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

common_enum! {
    #[derive(Copy)]
    #[serde(rename_all = "lowercase")]
    pub enum DeclKind {
        Protocol,
        Struct,
        Class,
        Enum,
        Actor,
        Extension,
    }
}

impl DeclKind {
    pub fn keyword(self) -> &'static str {
        match self {
            DeclKind::Protocol => "protocol",
            DeclKind::Struct => "struct",
            DeclKind::Class => "class",
            DeclKind::Enum => "enum",
            DeclKind::Actor => "actor",
            DeclKind::Extension => "extension",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "protocol" => DeclKind::Protocol,
            "struct" => DeclKind::Struct,
            "class" => DeclKind::Class,
            "enum" => DeclKind::Enum,
            "actor" => DeclKind::Actor,
            "extension" => DeclKind::Extension,
            _ => return None,
        })
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

common_struct! {
    /// An attribute such as `@available(iOS 15, *)`, kept as opaque text.
    pub struct Attribute {
        pub name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub arguments: Option<String>,
    }
}

impl Attribute {
    pub fn new(name: impl Into<String>, arguments: Option<String>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Source text including the leading `@`.
    pub fn text(&self) -> String {
        match &self.arguments {
            Some(arguments) => format!("@{}({})", self.name, arguments),
            None => format!("@{}", self.name),
        }
    }
}

common_struct! {
    /// A type-level declaration. The `Protocol` kind is the interface a witness
    /// is derived from; the other kinds are valid hosts for nested witnesses.
    pub struct Declaration {
        pub kind: DeclKind,
        pub name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub access: Option<Access>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub attributes: Vec<Attribute>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub inherited: Vec<String>,
        #[serde(default)]
        pub members: Vec<Member>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub span: Option<Span>,
    }
}

impl Declaration {
    pub fn new(kind: DeclKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            access: None,
            attributes: Vec::new(),
            inherited: Vec::new(),
            members: Vec::new(),
            span: None,
        }
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = Some(access);
        self
    }

    pub fn with_member(mut self, member: impl Into<Member>) -> Self {
        self.members.push(member.into());
        self
    }
}
