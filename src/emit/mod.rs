//! Back-end code generators (C7–C9): JSON Schema, TypeScript, and Python,
//! sharing the same source type map.

pub mod json_schema;
pub mod python;
pub mod syntax_checker;
pub mod typescript;

pub use syntax_checker::{NullSyntaxChecker, ProcessSyntaxChecker, SyntaxChecker};
