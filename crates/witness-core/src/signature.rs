//! Closure-type rendering. Every place that spells effect qualifiers or a
//! closure type goes through this module so the `async throws ->` order is
//! decided exactly once.

use itertools::Itertools;

use crate::ast::{Effects, Parameter};
use crate::capture::{CapturedFunction, CapturedProperty};

/// `async`, `throws`, `async throws`, or nothing.
pub fn effect_keywords(effects: Effects) -> Option<&'static str> {
    match (effects.is_async, effects.is_throwing) {
        (true, true) => Some("async throws"),
        (true, false) => Some("async"),
        (false, true) => Some("throws"),
        (false, false) => None,
    }
}

/// Call-site prefix matching [`effect_keywords`]: `try await `, `await `, `try `.
pub fn effect_markers(effects: Effects) -> &'static str {
    match (effects.is_async, effects.is_throwing) {
        (true, true) => "try await ",
        (true, false) => "await ",
        (false, true) => "try ",
        (false, false) => "",
    }
}

/// `(<params>) [async] [throws] -> <ret|Void>`
pub fn closure_type<'a>(
    param_types: impl IntoIterator<Item = &'a str>,
    effects: Effects,
    return_type: Option<&str>,
) -> String {
    let params = param_types.into_iter().map(str::trim).join(", ");
    let ret = return_type.unwrap_or("Void");
    match effect_keywords(effects) {
        Some(keywords) => format!("({params}) {keywords} -> {ret}"),
        None => format!("({params}) -> {ret}"),
    }
}

pub fn function_closure_type(func: &CapturedFunction) -> String {
    closure_type(
        func.params.iter().map(|param| param.ty.as_str()),
        func.effects(),
        func.return_type.as_deref(),
    )
}

/// Type of the slot backing a property: the value itself, or a zero-argument
/// closure when reading it may suspend or fail.
pub fn property_backing_type(prop: &CapturedProperty) -> String {
    if prop.is_deferred() {
        closure_type(std::iter::empty(), prop.effects(), Some(&prop.ty))
    } else {
        prop.ty.clone()
    }
}

/// Parameter type at a declaration boundary. Function types are retained
/// past the call, so they must be `@escaping`.
pub fn escaping(ty: &str) -> String {
    let (attributes, _) = split_type_attributes(ty);
    if is_function_type(ty) && !attributes.contains(&"escaping") {
        format!("@escaping {ty}")
    } else {
        ty.to_string()
    }
}

/// Rendered `label name: Type = default` parameter clause.
pub fn parameter_clause(params: &[Parameter]) -> String {
    params
        .iter()
        .enumerate()
        .map(|(index, param)| {
            let mut out = match param.name.as_deref() {
                Some(name) if name != "_" => format!("{} {}", param.label, name),
                _ if param.is_unlabeled() => format!("_ {}", param.binding_name(index)),
                _ => param.label.clone(),
            };
            out.push_str(": ");
            out.push_str(param.ty.trim());
            if let Some(default) = &param.default {
                out.push_str(" = ");
                out.push_str(default);
            }
            out
        })
        .join(", ")
}

pub fn is_void(ty: &str) -> bool {
    matches!(ty.trim(), "Void" | "()")
}

/// Names of the leading type attributes, e.g. `Sendable` and `MainActor`,
/// and the type they apply to.
fn split_type_attributes(mut ty: &str) -> (Vec<&str>, &str) {
    let mut names = Vec::new();
    loop {
        ty = ty.trim_start();
        let Some(rest) = ty.strip_prefix('@') else {
            return (names, ty);
        };
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let (name, mut rest) = rest.split_at(end);
        if rest.starts_with('(') {
            match matching_paren(rest) {
                Some(close) => rest = &rest[close + 1..],
                None => return (names, ty),
            }
        }
        names.push(name);
        ty = rest;
    }
}

fn strip_type_attributes(ty: &str) -> &str {
    split_type_attributes(ty).1
}

/// Byte index of the paren closing the one `text` starts with.
fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut prev = ' ';
    for (index, ch) in text.char_indices() {
        let is_arrow = ch == '>' && prev == '-';
        prev = ch;
        match ch {
            '(' | '[' | '<' => depth += 1,
            ')' | ']' | '>' if !is_arrow => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a function type into its parameter list text and return type text.
fn split_function_type(ty: &str) -> Option<(&str, &str)> {
    let ty = strip_type_attributes(ty).trim();
    if !ty.starts_with('(') {
        return None;
    }
    let close = matching_paren(ty)?;
    let params = &ty[1..close];
    let mut rest = ty[close + 1..].trim_start();
    for keyword in ["async", "throws", "rethrows"] {
        if let Some(stripped) = rest.strip_prefix(keyword) {
            rest = stripped.trim_start();
        }
    }
    let ret = rest.strip_prefix("->")?;
    Some((params, ret.trim()))
}

/// True for `(A) -> B` shapes; `((A) -> B)?` is an optional and is not.
pub fn is_function_type(ty: &str) -> bool {
    split_function_type(ty).is_some()
}

/// Number of parameters of a function type, if `ty` is one.
pub fn function_type_arity(ty: &str) -> Option<usize> {
    let (params, _) = split_function_type(ty)?;
    if params.trim().is_empty() {
        return Some(0);
    }
    let mut depth = 0usize;
    let mut count = 1;
    let mut prev = ' ';
    for ch in params.chars() {
        let is_arrow = ch == '>' && prev == '-';
        prev = ch;
        match ch {
            '(' | '[' | '<' => depth += 1,
            ')' | ']' | '>' if !is_arrow => depth = depth.saturating_sub(1),
            ',' if depth == 0 => count += 1,
            _ => {}
        }
    }
    Some(count)
}

pub fn function_type_returns_void(ty: &str) -> bool {
    split_function_type(ty).is_some_and(|(_, ret)| is_void(ret))
}

/// A closure literal that ignores its arguments and returns a default value,
/// e.g. `{ _, _ in }` or `{ .init() }`.
pub fn noop_closure(arity: usize, returns_void: bool) -> String {
    let placeholders = vec!["_"; arity].join(", ");
    match (arity, returns_void) {
        (0, true) => "{ }".to_string(),
        (0, false) => "{ .init() }".to_string(),
        (_, true) => format!("{{ {placeholders} in }}"),
        (_, false) => format!("{{ {placeholders} in .init() }}"),
    }
}
