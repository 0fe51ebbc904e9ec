//! Member extraction: selects the members a witness must make substitutable
//! and normalizes their modifier flags.

use tracing::debug;

use crate::ast::{
    Access, Attribute, Binding, ComputedMember, Declaration, Effects, FunctionMember, Member,
    Parameter, StoredMember,
};
use crate::signature;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedProperty {
    pub name: String,
    pub ty: String,
    pub is_read_only: bool,
    pub is_async: bool,
    pub is_throwing: bool,
    pub is_static: bool,
}

impl CapturedProperty {
    pub fn effects(&self) -> Effects {
        Effects::new(self.is_async, self.is_throwing)
    }

    /// Whether the backing slot holds a zero-argument closure instead of the
    /// value itself.
    pub fn is_deferred(&self) -> bool {
        self.is_read_only && !self.effects().is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFunction {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: Option<String>,
    pub is_async: bool,
    pub is_throwing: bool,
    pub is_static: bool,
    /// Calling it requires a mutable receiver.
    pub is_mutating: bool,
    pub access: Option<Access>,
    pub attributes: Vec<Attribute>,
}

impl CapturedFunction {
    pub fn effects(&self) -> Effects {
        Effects::new(self.is_async, self.is_throwing)
    }

    /// Selector-style reference, e.g. `fetch(id:_:)`, used when a function is
    /// passed as a value.
    pub fn reference(&self) -> String {
        if self.params.is_empty() {
            return self.name.clone();
        }
        let labels: String = self
            .params
            .iter()
            .map(|param| format!("{}:", param.label))
            .collect();
        format!("{}({})", self.name, labels)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    pub properties: Vec<CapturedProperty>,
    pub functions: Vec<CapturedFunction>,
}

impl Captured {
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.functions.is_empty()
    }

    pub fn instance_properties(&self) -> impl Iterator<Item = &CapturedProperty> {
        self.properties.iter().filter(|prop| !prop.is_static)
    }

    pub fn instance_functions(&self) -> impl Iterator<Item = &CapturedFunction> {
        self.functions.iter().filter(|func| !func.is_static)
    }

    pub fn has_instance_members(&self) -> bool {
        self.instance_properties().next().is_some() || self.instance_functions().next().is_some()
    }

    /// Union of the effects of every instance member.
    pub fn instance_effects(&self) -> Effects {
        let props = self.instance_properties().map(CapturedProperty::effects);
        let funcs = self.instance_functions().map(CapturedFunction::effects);
        props.chain(funcs).fold(Effects::NONE, Effects::union)
    }
}

/// Walk the member list once, in declaration order.
pub fn capture_members(decl: &Declaration) -> Captured {
    let mut captured = Captured::default();
    for member in &decl.members {
        match member {
            Member::Stored(stored) => {
                if let Some(prop) = capture_stored(stored) {
                    captured.properties.push(prop);
                }
            }
            Member::Computed(computed) => {
                if let Some(prop) = capture_computed(computed) {
                    captured.properties.push(prop);
                }
            }
            Member::Function(function) => {
                if let Some(func) = capture_function(function) {
                    captured.functions.push(func);
                }
            }
            Member::Other(other) => {
                debug!(kind = %other.kind, name = ?other.name, "member is never witnessed");
            }
        }
    }
    debug!(
        decl = %decl.name,
        properties = captured.properties.len(),
        functions = captured.functions.len(),
        "captured members"
    );
    captured
}

fn capture_stored(stored: &StoredMember) -> Option<CapturedProperty> {
    if stored.modifiers.is_restricted() {
        debug!(name = %stored.name, "skipping restricted property");
        return None;
    }
    if let Some(default) = &stored.default {
        if !default.is_call() {
            debug!(name = %stored.name, "skipping plainly initialized property");
            return None;
        }
    }
    let Some(ty) = stored
        .ty
        .clone()
        .or_else(|| stored.default.as_ref().and_then(|d| d.inferred_type()))
    else {
        debug!(name = %stored.name, "skipping property without a determinate type");
        return None;
    };
    let is_lazy = stored.modifiers.is_lazy;
    let is_read_only =
        !is_lazy && (stored.binding == Binding::Let || stored.modifiers.setter_is_restricted());
    Some(CapturedProperty {
        name: stored.name.clone(),
        ty,
        is_read_only,
        is_async: false,
        is_throwing: false,
        is_static: stored.modifiers.is_static,
    })
}

fn capture_computed(computed: &ComputedMember) -> Option<CapturedProperty> {
    if computed.modifiers.is_restricted() {
        debug!(name = %computed.name, "skipping restricted property");
        return None;
    }
    let is_read_only =
        !computed.accessors.has_setter || computed.modifiers.setter_is_restricted();
    // Effectful accessors only exist on get-only properties.
    let effects = if is_read_only {
        computed.accessors.getter
    } else {
        Effects::NONE
    };
    Some(CapturedProperty {
        name: computed.name.clone(),
        ty: computed.ty.clone(),
        is_read_only,
        is_async: effects.is_async,
        is_throwing: effects.is_throwing,
        is_static: computed.modifiers.is_static,
    })
}

fn capture_function(function: &FunctionMember) -> Option<CapturedFunction> {
    if function.modifiers.is_restricted() {
        debug!(name = %function.name, "skipping restricted function");
        return None;
    }
    if function.generics.is_some() {
        debug!(name = %function.name, "skipping generic function");
        return None;
    }
    // A closure slot cannot spell a typed throw that still satisfies the requirement.
    if let Some(thrown) = &function.thrown_type {
        debug!(name = %function.name, thrown = %thrown, "skipping function with a typed throw");
        return None;
    }
    Some(CapturedFunction {
        name: function.name.clone(),
        params: function.params.clone(),
        return_type: function
            .return_type
            .clone()
            .filter(|ty| !signature::is_void(ty)),
        is_async: function.effects.is_async,
        is_throwing: function.effects.is_throwing,
        is_static: function.modifiers.is_static,
        is_mutating: function.modifiers.is_mutating,
        access: function.modifiers.access,
        attributes: function.attributes.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Accessors, DeclKind, DefaultValue, Modifiers};

    fn stored(name: &str, binding: Binding, ty: Option<&str>, default: Option<DefaultValue>) -> StoredMember {
        StoredMember {
            modifiers: Modifiers::default(),
            attributes: vec![],
            binding,
            name: name.into(),
            ty: ty.map(String::from),
            default,
        }
    }

    #[test]
    fn plain_defaults_are_not_captured() {
        let decl = Declaration::new(DeclKind::Struct, "Counter")
            .with_member(stored(
                "count",
                Binding::Var,
                None,
                Some(DefaultValue::Other("0".into())),
            ))
            .with_member(stored(
                "client",
                Binding::Let,
                None,
                Some(DefaultValue::Call {
                    callee: "HTTPClient".into(),
                    text: "HTTPClient()".into(),
                }),
            ));

        let captured = capture_members(&decl);
        assert_eq!(captured.properties.len(), 1);
        assert_eq!(captured.properties[0].name, "client");
        assert_eq!(captured.properties[0].ty, "HTTPClient");
        assert!(captured.properties[0].is_read_only);
    }

    #[test]
    fn restricted_members_are_dropped() {
        let mut hidden = stored("secret", Binding::Let, Some("String"), None);
        hidden.modifiers.access = Some(Access::Private);
        let mut scoped = FunctionMember {
            modifiers: Modifiers::default(),
            attributes: vec![],
            name: "reset".into(),
            generics: None,
            params: vec![],
            effects: Effects::NONE,
            thrown_type: None,
            return_type: None,
        };
        scoped.modifiers.access = Some(Access::FilePrivate);

        let decl = Declaration::new(DeclKind::Struct, "Vault")
            .with_member(hidden)
            .with_member(scoped);
        assert!(capture_members(&decl).is_empty());
    }

    #[test]
    fn untyped_call_default_without_type_name_is_skipped() {
        let decl = Declaration::new(DeclKind::Struct, "Cache").with_member(stored(
            "store",
            Binding::Let,
            None,
            Some(DefaultValue::Call {
                callee: ".init".into(),
                text: ".init()".into(),
            }),
        ));
        assert!(capture_members(&decl).is_empty());
    }

    #[test]
    fn getter_effects_are_kept_only_for_read_only_properties() {
        let decl = Declaration::new(DeclKind::Protocol, "Session").with_member(ComputedMember {
            modifiers: Modifiers::default(),
            attributes: vec![],
            name: "token".into(),
            ty: "String".into(),
            accessors: Accessors {
                getter: Effects::new(true, true),
                has_setter: false,
            },
        });
        let captured = capture_members(&decl);
        let token = &captured.properties[0];
        assert!(token.is_read_only && token.is_async && token.is_throwing);
        assert!(token.is_deferred());
        assert_eq!(captured.instance_effects(), Effects::new(true, true));
    }

    #[test]
    fn private_setter_makes_property_read_only() {
        let mut member = stored("state", Binding::Var, Some("State"), None);
        member.modifiers.setter_access = Some(Access::Private);
        let decl = Declaration::new(DeclKind::Struct, "Machine").with_member(member);
        assert!(capture_members(&decl).properties[0].is_read_only);
    }

    #[test]
    fn function_reference_lists_labels() {
        let func = CapturedFunction {
            name: "move".into(),
            params: vec![
                Parameter::new("_", "Int").with_name("x"),
                Parameter::new("to", "Point"),
            ],
            return_type: None,
            is_async: false,
            is_throwing: false,
            is_static: false,
            is_mutating: false,
            access: None,
            attributes: vec![],
        };
        assert_eq!(func.reference(), "move(_:to:)");
    }

    #[test]
    fn typed_throws_are_not_captured() {
        let fetch = FunctionMember {
            modifiers: Modifiers::default(),
            attributes: vec![],
            name: "fetch".into(),
            generics: None,
            params: vec![],
            effects: Effects::new(false, true),
            thrown_type: Some("NetError".into()),
            return_type: Some("Data".into()),
        };
        let mut bump = fetch.clone();
        bump.name = "bump".into();
        bump.thrown_type = None;
        bump.modifiers.is_mutating = true;

        let decl = Declaration::new(DeclKind::Protocol, "Remote")
            .with_member(fetch)
            .with_member(bump);
        let captured = capture_members(&decl);
        assert_eq!(captured.functions.len(), 1);
        assert_eq!(captured.functions[0].name, "bump");
        assert!(captured.functions[0].is_mutating);
    }
}
