use std::collections::HashSet;

use tracing::debug;

use crate::capture::Captured;

/// Marker prefixed to a member name to name its backing closure.
pub const BACKING_MARKER: char = '_';

/// Identifies a captured member by collection and position, since overloaded
/// functions share a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberRef {
    Property(usize),
    Function(usize),
}

/// Backing-slot names for every captured member.
///
/// A backing name is the member name with the marker prefixed, repeated until
/// it clashes with neither a captured member nor a previously assigned
/// backing name.
#[derive(Debug, Clone)]
pub struct BackingNames {
    properties: Vec<String>,
    functions: Vec<String>,
}

impl BackingNames {
    pub fn assign(captured: &Captured) -> Self {
        let mut taken: HashSet<String> = captured
            .properties
            .iter()
            .map(|prop| prop.name.clone())
            .chain(captured.functions.iter().map(|func| func.name.clone()))
            .collect();

        let mut reserve = |name: &str| -> String {
            let mut candidate = format!("{BACKING_MARKER}{name}");
            while taken.contains(&candidate) {
                candidate.insert(0, BACKING_MARKER);
            }
            if candidate.len() > name.len() + 1 {
                debug!(member = name, backing = %candidate, "mangled backing name");
            }
            taken.insert(candidate.clone());
            candidate
        };

        let properties = captured
            .properties
            .iter()
            .map(|prop| reserve(&prop.name))
            .collect();
        let functions = captured
            .functions
            .iter()
            .map(|func| reserve(&func.name))
            .collect();
        Self {
            properties,
            functions,
        }
    }

    pub fn backing(&self, member: MemberRef) -> &str {
        match member {
            MemberRef::Property(index) => &self.properties[index],
            MemberRef::Function(index) => &self.functions[index],
        }
    }

    /// Label a factory parameter for `member` uses: the backing name with one
    /// marker removed, so overloads stay distinct.
    pub fn parameter_label(&self, member: MemberRef) -> &str {
        let backing = self.backing(member);
        backing.strip_prefix(BACKING_MARKER).unwrap_or(backing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CapturedFunction, CapturedProperty};

    fn prop(name: &str) -> CapturedProperty {
        CapturedProperty {
            name: name.into(),
            ty: "Int".into(),
            is_read_only: true,
            is_async: false,
            is_throwing: false,
            is_static: false,
        }
    }

    fn func(name: &str) -> CapturedFunction {
        CapturedFunction {
            name: name.into(),
            params: vec![],
            return_type: None,
            is_async: false,
            is_throwing: false,
            is_static: false,
            is_mutating: false,
            access: None,
            attributes: vec![],
        }
    }

    #[test]
    fn plain_names_get_single_marker() {
        let captured = Captured {
            properties: vec![prop("count")],
            functions: vec![func("reset")],
        };
        let names = BackingNames::assign(&captured);
        assert_eq!(names.backing(MemberRef::Property(0)), "_count");
        assert_eq!(names.backing(MemberRef::Function(0)), "_reset");
        assert_eq!(names.parameter_label(MemberRef::Function(0)), "reset");
    }

    #[test]
    fn user_names_starting_with_marker_do_not_collide() {
        let captured = Captured {
            properties: vec![prop("value"), prop("_value")],
            functions: vec![],
        };
        let names = BackingNames::assign(&captured);
        assert_eq!(names.backing(MemberRef::Property(0)), "__value");
        assert_eq!(names.backing(MemberRef::Property(1)), "___value");
    }

    #[test]
    fn overloads_get_distinct_slots() {
        let captured = Captured {
            properties: vec![],
            functions: vec![func("load"), func("load")],
        };
        let names = BackingNames::assign(&captured);
        assert_eq!(names.backing(MemberRef::Function(0)), "_load");
        assert_eq!(names.backing(MemberRef::Function(1)), "__load");
        assert_eq!(names.parameter_label(MemberRef::Function(1)), "_load");
    }
}
