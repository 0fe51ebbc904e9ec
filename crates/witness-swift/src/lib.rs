//! Swift-subset front-end: decodes type declarations into the core model and
//! splices generated witnesses back into the source.

pub mod attribute;
pub mod lexer;
pub mod parser;
pub mod splice;

pub use parser::{parse_file, Attachment, SourceDeclaration};
pub use splice::{expand_source, AppliedExpansion, ExpandedSource};

use witness_core::ast::Declaration;

/// Every type declaration in `source`, nested ones included, outermost first.
pub fn parse_str(source: &str) -> witness_core::Result<Vec<Declaration>> {
    let declarations = parse_file(source)?;
    Ok(declarations
        .iter()
        .flat_map(SourceDeclaration::walk)
        .map(|decl| decl.decl.clone())
        .collect())
}
