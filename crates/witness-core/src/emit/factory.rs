//! Factories: the static erasure function, the reference-type initializer, the
//! conversion extensions on the attached protocol and the production accessor.

use itertools::Itertools;

use crate::ast::{Binding, Effects, Parameter};
use crate::attachment::TargetKind;
use crate::capture::CapturedFunction;
use crate::emit::{EmitContext, MemberRef};
use crate::output::{
    FunctionDecl, InitializerDecl, MemberDecl, PropertyBody, PropertyDecl, TypeDecl, TypeKeyword,
};
use crate::signature::{effect_markers, escaping, function_closure_type, property_backing_type};

pub const ERASE_FUNCTION: &str = "erase";
pub const WITNESS_CONSTRUCTOR: &str = "witness";
pub const CONVERSION_METHOD: &str = "toWitness";

/// One parameter of the erasure function: an instance member's slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryParam {
    pub member: MemberRef,
    pub label: String,
    /// Declared type, `@escaping` applied.
    pub ty: String,
    /// Stored member the argument lands in.
    pub stored: String,
}

/// Parameters for every non-static captured member, properties first.
pub fn factory_params(ctx: &EmitContext<'_>) -> Vec<FactoryParam> {
    let props = ctx
        .captured
        .properties
        .iter()
        .enumerate()
        .filter(|(_, prop)| !prop.is_static)
        .map(|(index, prop)| {
            let member = MemberRef::Property(index);
            let stored = if prop.is_read_only {
                ctx.names.backing(member).to_string()
            } else {
                prop.name.clone()
            };
            FactoryParam {
                member,
                label: ctx.names.parameter_label(member).to_string(),
                ty: escaping(&property_backing_type(prop)),
                stored,
            }
        });
    let funcs = ctx
        .captured
        .functions
        .iter()
        .enumerate()
        .filter(|(_, func)| !func.is_static)
        .map(|(index, func)| {
            let member = MemberRef::Function(index);
            FactoryParam {
                member,
                label: ctx.names.parameter_label(member).to_string(),
                ty: escaping(&function_closure_type(func)),
                stored: ctx.names.backing(member).to_string(),
            }
        });
    props.chain(funcs).collect()
}

fn parameters(params: &[FactoryParam]) -> Vec<Parameter> {
    params
        .iter()
        .map(|param| Parameter::new(param.label.clone(), param.ty.clone()))
        .collect()
}

/// `Witness(...)` with one argument per parameter. Structs go through the
/// memberwise initializer (labels are stored names); classes through the
/// explicit initializer (labels are parameter labels).
fn construct(
    ctx: &EmitContext<'_>,
    params: &[FactoryParam],
    value: impl Fn(&FactoryParam) -> String,
) -> String {
    let args = params
        .iter()
        .map(|param| {
            let label = match ctx.target {
                TargetKind::Struct => &param.stored,
                TargetKind::Class => &param.label,
            };
            format!("{}: {}", label, value(param))
        })
        .join(", ");
    format!("{}({})", ctx.type_name, args)
}

/// `static func erase(...) -> any Protocol`, building the witness from raw
/// closures. Nested witnesses have no protocol and return themselves.
pub fn erase_function(ctx: &EmitContext<'_>) -> FunctionDecl {
    let params = factory_params(ctx);
    FunctionDecl {
        attributes: vec![],
        access: ctx.access,
        is_static: true,
        name: ERASE_FUNCTION.to_string(),
        params: parameters(&params),
        effects: Effects::NONE,
        return_type: Some(ctx.erased_type()),
        body: vec![construct(ctx, &params, |param| param.label.clone())],
    }
}

/// Explicit initializer for reference witnesses; `None` for structs, whose
/// memberwise initializer already covers every stored slot.
pub fn initializer(ctx: &EmitContext<'_>) -> Option<InitializerDecl> {
    if ctx.target != TargetKind::Class {
        return None;
    }
    let params = factory_params(ctx);
    Some(InitializerDecl {
        access: ctx.access,
        params: parameters(&params),
        body: params
            .iter()
            .map(|param| format!("self.{} = {}", param.stored, param.label))
            .collect(),
    })
}

/// How `receiver`'s own member is passed into the witness.
fn captured_value(ctx: &EmitContext<'_>, receiver: &str, member: MemberRef) -> String {
    match member {
        MemberRef::Property(index) => {
            let prop = &ctx.captured.properties[index];
            if prop.is_deferred() {
                format!("{{ {}{}.{} }}", effect_markers(prop.effects()), receiver, prop.name)
            } else {
                format!("{}.{}", receiver, prop.name)
            }
        }
        MemberRef::Function(index) => {
            let func = &ctx.captured.functions[index];
            if func.is_mutating {
                mutating_closure(receiver, func)
            } else {
                format!("{}.{}", receiver, func.reference())
            }
        }
    }
}

/// A mutating method cannot be referenced unapplied, so it is called on a
/// mutable copy of the receiver: `{ a, b in var copy = self; return copy.f(x: a, b) }`.
fn mutating_closure(receiver: &str, func: &CapturedFunction) -> String {
    let names: Vec<String> = func
        .params
        .iter()
        .enumerate()
        .map(|(index, param)| param.binding_name(index))
        .collect();
    let mut copy = String::from("copy");
    while names.contains(&copy) {
        copy.push('_');
    }
    let args = func
        .params
        .iter()
        .zip(&names)
        .map(|(param, name)| {
            let value = if param.is_inout() {
                format!("&{name}")
            } else {
                name.clone()
            };
            if param.is_unlabeled() {
                value
            } else {
                format!("{}: {}", param.label, value)
            }
        })
        .join(", ");
    let head = if names.is_empty() {
        String::new()
    } else {
        format!(" {} in", names.join(", "))
    };
    format!(
        "{{{head} var {copy} = {receiver}; return {}{copy}.{}({args}) }}",
        effect_markers(func.effects()),
        func.name
    )
}

/// `extension Protocol where Self == Witness { static func witness(...) }`,
/// which makes `.witness(...)` resolve wherever the protocol is expected, and
/// `extension Protocol { func toWitness() }` for every conforming value.
pub fn conversion_extensions(ctx: &EmitContext<'_>, protocol: &str) -> Vec<TypeDecl> {
    let params = factory_params(ctx);
    let constructor = FunctionDecl {
        attributes: vec![],
        access: ctx.access,
        is_static: true,
        name: WITNESS_CONSTRUCTOR.to_string(),
        params: parameters(&params),
        effects: Effects::NONE,
        return_type: Some(ctx.type_name.clone()),
        body: vec![construct(ctx, &params, |param| param.label.clone())],
    };
    let conversion = FunctionDecl {
        attributes: vec![],
        access: ctx.access,
        is_static: false,
        name: CONVERSION_METHOD.to_string(),
        params: vec![],
        effects: ctx.captured.instance_effects(),
        return_type: Some(ctx.type_name.clone()),
        body: vec![construct(ctx, &params, |param| {
            captured_value(ctx, "self", param.member)
        })],
    };

    let mut constrained = TypeDecl::new(TypeKeyword::Extension, protocol);
    constrained.where_clause = Some(format!("Self == {}", ctx.type_name));
    constrained.push_section(vec![MemberDecl::Function(constructor)]);

    let mut extension = TypeDecl::new(TypeKeyword::Extension, protocol);
    extension.push_section(vec![MemberDecl::Function(conversion)]);
    vec![constrained, extension]
}

/// `static let production: Witness = { let base = Host(); return Witness(...) }()`
pub fn production_accessor(ctx: &EmitContext<'_>, host: &str, name: &str) -> PropertyDecl {
    let params = factory_params(ctx);
    let body = if params.is_empty() {
        PropertyBody::Initialized(construct(ctx, &params, |param| param.label.clone()))
    } else {
        PropertyBody::InitializedBlock(vec![
            format!("let base = {host}()"),
            format!(
                "return {}",
                construct(ctx, &params, |param| captured_value(ctx, "base", param.member))
            ),
        ])
    };
    PropertyDecl {
        access: ctx.access,
        is_static: true,
        binding: Binding::Let,
        name: name.to_string(),
        ty: ctx.type_name.clone(),
        body,
    }
}
