//! Type declarations and their members.
//!
//! Only the shapes the generator reads are decoded structurally: declaration
//! headers, properties, functions and accessor blocks. Everything else in a
//! body is kept as an opaque [`OtherMember`] and anything else at file level is
//! skipped.

use eyre::eyre;
use nom::{
    branch::alt,
    character::complete::char,
    combinator::{opt, peek, recognize, value},
    error::{Error, ErrorKind},
    multi::{many0, separated_list1},
    sequence::preceded,
    Parser,
};
use tracing::{debug, trace};
use witness_core::ast::{
    Access, Accessors, Attribute, Binding, ComputedMember, DeclKind, Declaration, DefaultValue,
    Effects, FunctionMember, Member, Modifiers, OtherMember, Parameter, StoredMember,
};
use witness_core::attachment::AttachmentSite;
use witness_core::span::Span;

use crate::attribute::{attachment_site, is_attachment, leading_attachment};
use crate::lexer::*;

/// An attachment attribute and the source range it occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub site: AttachmentSite,
    pub span: Span,
}

/// A decoded declaration plus the source positions splicing needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDeclaration {
    pub decl: Declaration,
    pub attachments: Vec<Attachment>,
    /// From the first attribute through the closing brace.
    pub span: Span,
    /// Offset of the closing brace of the body.
    pub body_close: usize,
    /// Nesting level; file-level declarations are 0.
    pub depth: usize,
    pub nested: Vec<SourceDeclaration>,
}

impl SourceDeclaration {
    /// This declaration followed by every nested one, depth first.
    pub fn walk(&self) -> Vec<&SourceDeclaration> {
        let mut out = vec![self];
        for nested in &self.nested {
            out.extend(nested.walk());
        }
        out
    }
}

// =============================================================================
// Attributes and Modifiers
// =============================================================================

fn attribute<'a>(full: &'a str, input: &'a str) -> PResult<'a, (Attribute, Span)> {
    let (input, _) = ws(input)?;
    let start = position(full, input);
    let (input, _) = char('@').parse(input)?;
    let (input, name) = raw_identifier(input)?;
    // Arguments must follow the name directly.
    let (input, arguments) = if input.starts_with('(') {
        let (input, arguments) = parenthesized(input)?;
        (input, Some(arguments.trim().to_string()))
    } else {
        (input, None)
    };
    let end = position(full, input);
    Ok((
        input,
        (Attribute::new(name, arguments), Span::from_range(start..end)),
    ))
}

fn attributes<'a>(full: &'a str, input: &'a str) -> PResult<'a, Vec<(Attribute, Span)>> {
    many0(|i| attribute(full, i)).parse(input)
}

#[derive(Debug, Clone, Copy)]
enum Modifier {
    Access(Access),
    SetterAccess(Access),
    Static,
    Lazy,
    Mutating,
    Ignored,
}

fn modifier(input: &str) -> PResult<'_, Modifier> {
    let (rest, word) = identifier(input)?;
    if let Some(access) = Access::from_keyword(&word) {
        if let Ok((rest, _)) = (symbol("("), keyword("set"), symbol(")")).parse(rest) {
            return Ok((rest, Modifier::SetterAccess(access)));
        }
        return Ok((rest, Modifier::Access(access)));
    }
    match word.as_str() {
        "static" => Ok((rest, Modifier::Static)),
        // `class var` / `class func` are type members; `class Foo` is a declaration.
        "class" => {
            let member = alt((
                keyword("var"),
                keyword("let"),
                keyword("func"),
                keyword("subscript"),
                keyword("final"),
            ));
            peek(member).parse(rest)?;
            Ok((rest, Modifier::Static))
        }
        "lazy" => Ok((rest, Modifier::Lazy)),
        "mutating" => Ok((rest, Modifier::Mutating)),
        "weak" | "unowned" => {
            let (rest, _) = opt(parenthesized).parse(rest)?;
            Ok((rest, Modifier::Ignored))
        }
        "final" | "override" | "nonmutating" | "nonisolated" | "dynamic"
        | "optional" | "required" | "convenience" | "indirect" | "distributed" | "isolated"
        | "consuming" | "borrowing" | "prefix" | "postfix" | "infix" => {
            Ok((rest, Modifier::Ignored))
        }
        _ => fail(input),
    }
}

fn modifiers(input: &str) -> PResult<'_, Modifiers> {
    let (input, words) = many0(modifier).parse(input)?;
    let mut modifiers = Modifiers::default();
    for word in words {
        match word {
            Modifier::Access(access) => modifiers.access = Some(access),
            Modifier::SetterAccess(access) => modifiers.setter_access = Some(access),
            Modifier::Static => modifiers.is_static = true,
            Modifier::Lazy => modifiers.is_lazy = true,
            Modifier::Mutating => modifiers.is_mutating = true,
            Modifier::Ignored => {}
        }
    }
    Ok((input, modifiers))
}

// =============================================================================
// Declarations
// =============================================================================

fn decl_kind(input: &str) -> PResult<'_, DeclKind> {
    alt((
        value(DeclKind::Protocol, keyword("protocol")),
        value(DeclKind::Struct, keyword("struct")),
        value(DeclKind::Class, keyword("class")),
        value(DeclKind::Enum, keyword("enum")),
        value(DeclKind::Actor, keyword("actor")),
        value(DeclKind::Extension, keyword("extension")),
    ))
    .parse(input)
}

/// `Name` or `Outer.Inner`.
fn type_path(input: &str) -> PResult<'_, String> {
    let (input, _) = ws(input)?;
    let (input, path) = recognize(separated_list1(char('.'), raw_identifier)).parse(input)?;
    Ok((input, path.replace('`', "")))
}

/// Parse a type declaration with its body, nested declarations included.
pub fn declaration<'a>(
    full: &'a str,
    input: &'a str,
    depth: usize,
) -> PResult<'a, SourceDeclaration> {
    let (input, _) = ws(input)?;
    let start = position(full, input);
    let (input, attributes) = attributes(full, input)?;
    let (input, modifiers) = modifiers(input)?;
    let (input, kind) = decl_kind(input)?;
    let (input, name) = type_path(input)?;
    let (input, _) = opt(generic_clause).parse(input)?;
    let (input, inherited) =
        opt(preceded(symbol(":"), balanced(Stop::INHERITANCE))).parse(input)?;
    let (input, _) = opt(preceded(keyword("where"), balanced(Stop::DECL_WHERE))).parse(input)?;
    let (input, _) = symbol("{")(input)?;
    let (input, body) = body(full, input, depth + 1)?;
    let (input, _) = ws(input)?;
    let body_close = position(full, input);
    let (input, _) = char('}').parse(input)?;
    let span = Span::from_range(start..position(full, input));

    let mut decl = Declaration::new(kind, name);
    decl.access = modifiers.access;
    decl.inherited = inherited
        .map(|text| split_top_level(text, true).into_iter().map(String::from).collect())
        .unwrap_or_default();
    decl.members = body.members;
    decl.span = Some(span);

    let mut attachments = Vec::new();
    for (attribute, span) in attributes {
        if is_attachment(&attribute) {
            attachments.push(Attachment {
                site: attachment_site(&attribute),
                span,
            });
        } else {
            decl.attributes.push(attribute);
        }
    }
    debug!(
        kind = %decl.kind,
        name = %decl.name,
        members = decl.members.len(),
        attachments = attachments.len(),
        "parsed declaration"
    );

    Ok((
        input,
        SourceDeclaration {
            decl,
            attachments,
            span,
            body_close,
            depth,
            nested: body.nested,
        },
    ))
}

#[derive(Default)]
struct Body {
    members: Vec<Member>,
    nested: Vec<SourceDeclaration>,
}

enum Item {
    Member(Member),
    Nested(SourceDeclaration),
}

fn attachment_failure(input: &str) -> nom::Err<Error<&str>> {
    nom::Err::Failure(Error::new(input, ErrorKind::Verify))
}

fn body<'a>(full: &'a str, mut input: &'a str, depth: usize) -> PResult<'a, Body> {
    let mut body = Body::default();
    loop {
        let (rest, _) = ws(input)?;
        input = rest;
        if input.is_empty() || input.starts_with('}') {
            return Ok((input, body));
        }
        if let Some(rest) = input.strip_prefix(';') {
            input = rest;
            continue;
        }
        match member_item(full, input, depth) {
            Ok((rest, Item::Member(member))) => {
                body.members.push(member);
                input = rest;
            }
            Ok((rest, Item::Nested(nested))) => {
                body.members.push(Member::Other(OtherMember {
                    kind: nested.decl.kind.keyword().to_string(),
                    name: Some(nested.decl.name.clone()),
                }));
                body.nested.push(nested);
                input = rest;
            }
            Err(nom::Err::Failure(error)) => return Err(nom::Err::Failure(error)),
            Err(_) => {
                trace!(at = position(full, input), "skipping unrecognized statement");
                input = skip_statement(input);
            }
        }
    }
}

// =============================================================================
// Members
// =============================================================================

fn member_item<'a>(full: &'a str, input: &'a str, depth: usize) -> PResult<'a, Item> {
    match declaration(full, input, depth) {
        Ok((rest, nested)) => return Ok((rest, Item::Nested(nested))),
        Err(nom::Err::Failure(error)) => return Err(nom::Err::Failure(error)),
        // Attachments only apply to type declarations; never fall through.
        Err(_) if leading_attachment(input).is_some() => return Err(attachment_failure(input)),
        Err(_) => {}
    }
    let (input, attributes) = attributes(full, input)?;
    let attributes: Vec<Attribute> = attributes.into_iter().map(|(attr, _)| attr).collect();
    let (input, modifiers) = modifiers(input)?;

    let binding = alt((
        value(Binding::Let, keyword("let")),
        value(Binding::Var, keyword("var")),
    ))
    .parse(input);
    if let Ok((input, binding)) = binding {
        let (input, member) = property(input, binding, modifiers, attributes)?;
        return Ok((input, Item::Member(member)));
    }
    if let Ok((input, _)) = keyword("func")(input) {
        let (input, member) = function(input, modifiers, attributes)?;
        return Ok((input, Item::Member(member)));
    }
    let (input, member) = other_member(input)?;
    Ok((input, Item::Member(member)))
}

fn property(
    input: &str,
    binding: Binding,
    modifiers: Modifiers,
    attributes: Vec<Attribute>,
) -> PResult<'_, Member> {
    let (input, name) = identifier(input)?;
    let (input, ty) = opt(preceded(symbol(":"), balanced(Stop::TYPE_ANNOTATION))).parse(input)?;
    let (input, default) = opt(preceded(symbol("="), balanced(Stop::EXPRESSION))).parse(input)?;

    if let (Some(ty), None) = (ty, default) {
        if let Ok((input, block)) = braced(input) {
            let member = accessor_member(modifiers, attributes, binding, name, ty, block);
            return Ok((input, member));
        }
    }

    let member = StoredMember {
        modifiers,
        attributes,
        binding,
        name,
        ty: ty.map(String::from),
        default: default.map(classify_default),
    };
    Ok((input, member.into()))
}

fn effects_after(words: &[&str]) -> Effects {
    let mut effects = Effects::NONE;
    for word in words {
        match *word {
            "async" => effects.is_async = true,
            "throws" | "rethrows" => effects.is_throwing = true,
            _ => break,
        }
    }
    effects
}

/// A property followed by `{ ... }`: a protocol requirement, a computed
/// property, or a stored property with observers.
fn accessor_member(
    modifiers: Modifiers,
    attributes: Vec<Attribute>,
    binding: Binding,
    name: String,
    ty: &str,
    block: &str,
) -> Member {
    let words: Vec<&str> = top_level_words(block)
        .into_iter()
        .filter(|word| !matches!(*word, "mutating" | "nonmutating"))
        .collect();
    let explicit = matches!(
        words.first().copied(),
        Some("get" | "set" | "_read" | "_modify" | "unsafeAddress" | "unsafeMutableAddress")
    );
    let observed = words.iter().any(|word| matches!(*word, "willSet" | "didSet"));

    if observed && !explicit {
        return StoredMember {
            modifiers,
            attributes,
            binding,
            name,
            ty: Some(ty.to_string()),
            default: None,
        }
        .into();
    }

    let accessors = if explicit {
        Accessors {
            getter: words
                .iter()
                .position(|word| *word == "get")
                .map(|index| effects_after(&words[index + 1..]))
                .unwrap_or_default(),
            has_setter: words.iter().any(|word| matches!(*word, "set" | "_modify")),
        }
    } else {
        // Implicit getter.
        Accessors::default()
    };
    ComputedMember {
        modifiers,
        attributes,
        name,
        ty: ty.to_string(),
        accessors,
    }
    .into()
}

/// Classify a stored property's default-value expression.
pub fn classify_default(text: &str) -> DefaultValue {
    let text = text.trim();
    if let Some(body) = text.strip_prefix('{') {
        let (rest, _) = scan(body, Stop::ENCLOSED);
        let invoked = rest
            .strip_prefix('}')
            .is_some_and(|after| after.trim() == "()");
        return if invoked {
            DefaultValue::Call {
                callee: String::new(),
                text: text.to_string(),
            }
        } else {
            DefaultValue::Closure(text.to_string())
        };
    }
    if text.ends_with(')') {
        if let Some(open) = text.find('(') {
            let callee = text[..open].trim();
            let (rest, _) = scan(&text[open + 1..], Stop::ENCLOSED);
            let closes_at_end = rest == ")";
            let is_path = !callee.is_empty()
                && callee.chars().all(|c| {
                    is_ident_char(c) || matches!(c, '.' | '<' | '>' | ',' | ' ' | '[' | ']' | ':' | '?')
                });
            if closes_at_end && is_path {
                return DefaultValue::Call {
                    callee: callee.to_string(),
                    text: text.to_string(),
                };
            }
        }
    }
    DefaultValue::Other(text.to_string())
}

fn parameter(input: &str) -> PResult<'_, Parameter> {
    let (input, label) = identifier(input)?;
    let (input, name) = opt(identifier).parse(input)?;
    let (input, _) = symbol(":")(input)?;
    let (input, ty) = balanced(Stop::PARAM_TYPE)(input)?;
    let (input, default) = opt(preceded(symbol("="), balanced(Stop::PARAM_DEFAULT))).parse(input)?;
    Ok((
        input,
        Parameter {
            label,
            name,
            ty: ty.to_string(),
            default: default.map(String::from),
        },
    ))
}

fn parameters(input: &str) -> PResult<'_, Vec<Parameter>> {
    let (input, _) = symbol("(")(input)?;
    let (input, params) = opt(separated_list1(symbol(","), parameter)).parse(input)?;
    let (input, _) = opt(symbol(",")).parse(input)?;
    let (input, _) = symbol(")")(input)?;
    Ok((input, params.unwrap_or_default()))
}

#[derive(Debug, Clone, Copy)]
enum EffectWord<'a> {
    Async,
    Throws(Option<&'a str>),
}

/// `async`, `throws` and `rethrows` in any order, plus the `E` of a typed
/// `throws(E)`. `throws(any Error)` is plain `throws`.
fn effects(input: &str) -> PResult<'_, (Effects, Option<String>)> {
    let throws = preceded(
        alt((keyword("throws"), keyword("rethrows"))),
        opt(parenthesized),
    )
    .map(EffectWord::Throws);
    let (input, words) =
        many0(alt((value(EffectWord::Async, keyword("async")), throws))).parse(input)?;
    let mut effects = Effects::NONE;
    let mut thrown_type = None;
    for word in words {
        match word {
            EffectWord::Async => effects.is_async = true,
            EffectWord::Throws(ty) => {
                effects.is_throwing = true;
                thrown_type = ty
                    .map(str::trim)
                    .filter(|ty| !matches!(*ty, "any Error" | "Error"))
                    .map(String::from);
            }
        }
    }
    Ok((input, (effects, thrown_type)))
}

fn function(input: &str, modifiers: Modifiers, attributes: Vec<Attribute>) -> PResult<'_, Member> {
    let (input, name) = identifier(input)?;
    let (input, generics) = opt(generic_clause).parse(input)?;
    let (input, params) = parameters(input)?;
    let (input, (effects, thrown_type)) = effects(input)?;
    let (input, return_type) = opt(preceded(symbol("->"), balanced(Stop::RETURN_TYPE))).parse(input)?;
    let (input, _) = opt(preceded(keyword("where"), balanced(Stop::FUNC_WHERE))).parse(input)?;
    let (input, _) = opt(braced).parse(input)?;

    let member = FunctionMember {
        modifiers,
        attributes,
        name,
        generics,
        params,
        effects,
        thrown_type,
        return_type: return_type.map(String::from),
    };
    Ok((input, member.into()))
}

/// Initializers, subscripts, cases, associated types and the like.
fn other_member(input: &str) -> PResult<'_, Member> {
    let (rest, kind) = identifier(input)?;
    let (_, name) = opt(identifier).parse(rest)?;
    let name = name.filter(|_| !rest.trim_start().starts_with('('));
    Ok((skip_statement(input), OtherMember { kind, name }.into()))
}

// =============================================================================
// Files
// =============================================================================

/// Decode every type declaration in a Swift source file.
///
/// Statements that are not type declarations are skipped. A declaration that
/// carries an attachment attribute but cannot be decoded is an error, so an
/// expansion is never dropped silently.
pub fn parse_file(source: &str) -> eyre::Result<Vec<SourceDeclaration>> {
    let mut declarations = Vec::new();
    let mut input = source;
    loop {
        if let Ok((rest, _)) = ws(input) {
            input = rest;
        }
        if input.is_empty() {
            break;
        }
        match declaration(source, input, 0) {
            Ok((rest, decl)) => {
                declarations.push(decl);
                input = rest;
            }
            Err(nom::Err::Failure(error)) => {
                let (line, column) = line_col(source, position(source, error.input));
                return Err(eyre!(
                    "could not parse the attached declaration at {line}:{column}"
                ));
            }
            Err(_) => {
                if let Some(attribute) = leading_attachment(input) {
                    let (line, column) = line_col(source, position(source, input));
                    return Err(eyre!(
                        "could not parse the declaration attached with @{attribute} at {line}:{column}"
                    ));
                }
                input = skip_statement(input);
            }
        }
    }
    Ok(declarations)
}
