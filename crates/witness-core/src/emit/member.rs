//! Wrapper and backing members for captured properties and functions.

use itertools::Itertools;
use tracing::trace;

use crate::ast::{Access, Binding, Effects};
use crate::capture::{CapturedFunction, CapturedProperty};
use crate::emit::{EmitContext, MemberRef};
use crate::output::{FunctionDecl, MemberDecl, PropertyBody, PropertyDecl};
use crate::signature::{
    effect_markers, function_closure_type, function_type_arity, function_type_returns_void,
    noop_closure, property_backing_type,
};

fn property(
    access: Option<Access>,
    is_static: bool,
    name: &str,
    ty: &str,
    body: PropertyBody,
) -> MemberDecl {
    MemberDecl::Property(PropertyDecl {
        access,
        is_static,
        binding: Binding::Var,
        name: name.to_string(),
        ty: ty.to_string(),
        body,
    })
}

/// Default for a static stored slot: `{ .init() }()`, or a no-op closure when
/// the slot itself holds a closure.
fn static_default(ty: &str) -> String {
    match function_type_arity(ty) {
        Some(arity) => noop_closure(arity, function_type_returns_void(ty)),
        None => "{ .init() }()".to_string(),
    }
}

/// Members for one captured property, in emission order.
pub fn emit_property(ctx: &EmitContext<'_>, index: usize, prop: &CapturedProperty) -> Vec<MemberDecl> {
    let access = ctx.access;
    let backing = ctx.names.backing(MemberRef::Property(index));

    // Synchronous statics are the slot themselves, with a usable default.
    if prop.is_static && !prop.is_deferred() {
        trace!(name = %prop.name, "static stored property");
        let body = PropertyBody::Initialized(static_default(&prop.ty));
        return vec![property(access, true, &prop.name, &prop.ty, body)];
    }

    // Read-write properties are directly substitutable.
    if !prop.is_read_only {
        trace!(name = %prop.name, "read-write property");
        return vec![property(access, false, &prop.name, &prop.ty, PropertyBody::Stored)];
    }

    let wrapper_body = if prop.is_deferred() {
        let effects = prop.effects();
        PropertyBody::EffectfulGetter {
            effects,
            expr: format!("{}{}()", effect_markers(effects), backing),
        }
    } else {
        PropertyBody::Getter(backing.to_string())
    };
    let backing_body = if prop.is_static {
        PropertyBody::Initialized(noop_closure(0, false))
    } else {
        PropertyBody::Stored
    };
    trace!(name = %prop.name, backing, "wrapped property");
    vec![
        property(access, prop.is_static, &prop.name, &prop.ty, wrapper_body),
        property(
            access,
            prop.is_static,
            backing,
            &property_backing_type(prop),
            backing_body,
        ),
    ]
}

/// `[try ][await ]_f(a, &b, c)`
pub fn forwarding_call(callee: &str, func: &CapturedFunction) -> String {
    let args = func
        .params
        .iter()
        .enumerate()
        .map(|(index, param)| {
            let name = param.binding_name(index);
            if param.is_inout() {
                format!("&{name}")
            } else {
                name
            }
        })
        .join(", ");
    format!("{}{}({})", effect_markers(func.effects()), callee, args)
}

/// Forwarding function plus backing closure for one captured function.
pub fn emit_function(ctx: &EmitContext<'_>, index: usize, func: &CapturedFunction) -> Vec<MemberDecl> {
    let backing = ctx.names.backing(MemberRef::Function(index));
    let access = func.access.map(Access::narrowed).or(ctx.access);

    let wrapper = FunctionDecl {
        attributes: func.attributes.iter().map(|attr| attr.text()).collect(),
        access,
        is_static: func.is_static,
        name: func.name.clone(),
        params: func.params.clone(),
        effects: Effects::new(func.is_async, func.is_throwing),
        return_type: func.return_type.clone(),
        body: vec![forwarding_call(backing, func)],
    };

    // Statics never pass through the factory, so they need a default body.
    let backing_body = if func.is_static {
        PropertyBody::Initialized(noop_closure(func.params.len(), func.return_type.is_none()))
    } else {
        PropertyBody::Stored
    };
    trace!(name = %func.name, backing, "wrapped function");
    vec![
        MemberDecl::Function(wrapper),
        property(
            ctx.access,
            func.is_static,
            backing,
            &function_closure_type(func),
            backing_body,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Parameter;
    use crate::attachment::TargetKind;
    use crate::capture::Captured;
    use crate::pretty::PrettyOptions;
    use crate::printer::render;
    use pretty_assertions::assert_eq;

    fn prop(name: &str, ty: &str) -> CapturedProperty {
        CapturedProperty {
            name: name.into(),
            ty: ty.into(),
            is_read_only: true,
            is_async: false,
            is_throwing: false,
            is_static: false,
        }
    }

    fn func(name: &str, params: Vec<Parameter>) -> CapturedFunction {
        CapturedFunction {
            name: name.into(),
            params,
            return_type: None,
            is_async: false,
            is_throwing: false,
            is_static: false,
            is_mutating: false,
            access: None,
            attributes: vec![],
        }
    }

    fn render_all(members: &[MemberDecl]) -> String {
        members
            .iter()
            .map(|member| render(member, &PrettyOptions::default()))
            .collect()
    }

    fn emit_single_property(prop: CapturedProperty) -> String {
        let captured = Captured {
            properties: vec![prop],
            functions: vec![],
        };
        let ctx = EmitContext::new(&captured, None, TargetKind::Struct, "Witness");
        render_all(&emit_property(&ctx, 0, &captured.properties[0]))
    }

    fn emit_single_function(func: CapturedFunction) -> String {
        let captured = Captured {
            properties: vec![],
            functions: vec![func],
        };
        let ctx = EmitContext::new(&captured, None, TargetKind::Struct, "Witness");
        render_all(&emit_function(&ctx, 0, &captured.functions[0]))
    }

    #[test]
    fn failable_property_backs_onto_throwing_closure() {
        let mut value = prop("config", "Config");
        value.is_throwing = true;
        assert_eq!(
            emit_single_property(value),
            "var config: Config {\n    get throws { try _config() }\n}\nvar _config: () throws -> Config\n"
        );
    }

    #[test]
    fn static_closure_property_defaults_to_noop() {
        let mut handler = prop("onEvent", "(Event, Int) -> Void");
        handler.is_static = true;
        assert_eq!(
            emit_single_property(handler),
            "static var onEvent: (Event, Int) -> Void = { _, _ in }\n"
        );
    }

    #[test]
    fn static_async_property_keeps_wrapper() {
        let mut now = prop("now", "Date");
        now.is_static = true;
        now.is_async = true;
        assert_eq!(
            emit_single_property(now),
            "static var now: Date {\n    get async { await _now() }\n}\nstatic var _now: () async -> Date = { .init() }\n"
        );
    }

    #[test]
    fn forwards_inout_and_unnamed_parameters() {
        let mut update = func(
            "update",
            vec![
                Parameter::new("_", "inout State").with_name("state"),
                Parameter::new("_", "Action"),
            ],
        );
        update.is_throwing = true;
        update.return_type = Some("Effect".into());
        assert_eq!(
            emit_single_function(update),
            "func update(_ state: inout State, _ arg1: Action) throws -> Effect {\n    try _update(&state, arg1)\n}\nvar _update: (inout State, Action) throws -> Effect\n"
        );
    }

    #[test]
    fn static_function_gets_placeholder_closure() {
        let mut log = func(
            "log",
            vec![Parameter::new("_", "String").with_name("message"), Parameter::new("level", "Int")],
        );
        log.is_static = true;
        assert_eq!(
            emit_single_function(log),
            "static func log(_ message: String, level: Int) {\n    _log(message, level)\n}\nstatic var _log: (String, Int) -> Void = { _, _ in }\n"
        );
    }
}
