//! Member and factory emission on top of captured members.

pub mod factory;
pub mod member;
mod naming;

pub use naming::{BackingNames, MemberRef, BACKING_MARKER};

use crate::ast::Access;
use crate::attachment::TargetKind;
use crate::capture::Captured;

/// Everything the emitters need to know about the witness being built.
pub struct EmitContext<'a> {
    pub captured: &'a Captured,
    pub names: BackingNames,
    /// Modifier propagated from the attached declaration.
    pub access: Option<Access>,
    pub target: TargetKind,
    pub type_name: String,
    /// Protocol the witness conforms to, when it was attached to one.
    pub protocol: Option<String>,
}

impl<'a> EmitContext<'a> {
    pub fn new(
        captured: &'a Captured,
        access: Option<Access>,
        target: TargetKind,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            names: BackingNames::assign(captured),
            captured,
            access: access.map(Access::narrowed),
            target,
            type_name: type_name.into(),
            protocol: None,
        }
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// What the erasure function hands back: the protocol's existential when
    /// there is one, so callers never name the concrete witness.
    pub fn erased_type(&self) -> String {
        match &self.protocol {
            Some(protocol) => format!("any {protocol}"),
            None => self.type_name.clone(),
        }
    }
}
