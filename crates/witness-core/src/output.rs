//! Output model: the declarations an expansion hands back, before rendering.

use crate::ast::{Access, Binding, Effects, Parameter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKeyword {
    Struct,
    FinalClass,
    Extension,
}

impl TypeKeyword {
    pub fn text(self) -> &'static str {
        match self {
            TypeKeyword::Struct => "struct",
            TypeKeyword::FinalClass => "final class",
            TypeKeyword::Extension => "extension",
        }
    }
}

/// A generated type or extension. Members are grouped into sections that
/// the printer separates with blank lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub attributes: Vec<String>,
    pub access: Option<Access>,
    pub keyword: TypeKeyword,
    pub name: String,
    pub conformances: Vec<String>,
    /// Generic requirements, e.g. `Self == ClockWitness`, without `where`.
    pub where_clause: Option<String>,
    pub sections: Vec<Vec<MemberDecl>>,
}

impl TypeDecl {
    pub fn new(keyword: TypeKeyword, name: impl Into<String>) -> Self {
        Self {
            attributes: Vec::new(),
            access: None,
            keyword,
            name: name.into(),
            conformances: Vec::new(),
            where_clause: None,
            sections: Vec::new(),
        }
    }

    pub fn push_section(&mut self, section: Vec<MemberDecl>) {
        if !section.is_empty() {
            self.sections.push(section);
        }
    }

    pub fn members(&self) -> impl Iterator<Item = &MemberDecl> {
        self.sections.iter().flatten()
    }

    pub fn find_property(&self, name: &str) -> Option<&PropertyDecl> {
        self.members().find_map(|member| match member {
            MemberDecl::Property(prop) if prop.name == name => Some(prop),
            _ => None,
        })
    }

    pub fn find_function(&self, name: &str) -> Option<&FunctionDecl> {
        self.members().find_map(|member| match member {
            MemberDecl::Function(func) if func.name == name => Some(func),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberDecl {
    Property(PropertyDecl),
    Function(FunctionDecl),
    Initializer(InitializerDecl),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyBody {
    /// `var x: T`
    Stored,
    /// `var x: T = <expr>`
    Initialized(String),
    /// `let x: T = {` statements `}()`
    InitializedBlock(Vec<String>),
    /// `var x: T { <expr> }`
    Getter(String),
    /// `var x: T { get async throws { <expr> } }`
    EffectfulGetter { effects: Effects, expr: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDecl {
    pub access: Option<Access>,
    pub is_static: bool,
    pub binding: Binding,
    pub name: String,
    pub ty: String,
    pub body: PropertyBody,
}

impl PropertyDecl {
    pub fn new(name: impl Into<String>, ty: impl Into<String>, body: PropertyBody) -> Self {
        Self {
            access: None,
            is_static: false,
            binding: Binding::Var,
            name: name.into(),
            ty: ty.into(),
            body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub attributes: Vec<String>,
    pub access: Option<Access>,
    pub is_static: bool,
    pub name: String,
    pub params: Vec<Parameter>,
    pub effects: Effects,
    pub return_type: Option<String>,
    pub body: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializerDecl {
    pub access: Option<Access>,
    pub params: Vec<Parameter>,
    pub body: Vec<String>,
}

/// Where the host inserts an expansion's declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Alongside the attached declaration.
    Peer,
    /// Inside the attached declaration's body.
    Member,
}

/// Everything one expansion produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub placement: Placement,
    pub declarations: Vec<TypeDecl>,
}

impl Expansion {
    pub fn witness(&self) -> Option<&TypeDecl> {
        self.declarations
            .iter()
            .find(|decl| decl.keyword != TypeKeyword::Extension)
    }

    pub fn extensions(&self) -> impl Iterator<Item = &TypeDecl> {
        self.declarations
            .iter()
            .filter(|decl| decl.keyword == TypeKeyword::Extension)
    }
}
