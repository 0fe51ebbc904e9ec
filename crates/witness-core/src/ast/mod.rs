//! Closed declaration model consumed by the derivation engine.
//!
//! Front-ends decode whatever tree their parser produces into these types once;
//! everything downstream matches on them exhaustively and never sees parser
//! node shapes.

mod decl;
mod member;

pub use decl::*;
pub use member::*;
