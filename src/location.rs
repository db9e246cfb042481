//! Source locations carried by every AST node.
//!
//! Line/column pairs, 0-indexed, collapsed into a single flat struct since
//! every AST node in this language owns exactly one span, never a point.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A byte/line/column span in a source file.
///
/// Immutable after construction. `file` is `None` for the entry unit being
/// compiled and `Some(path)` for locations that originated in an imported
/// unit, so diagnostics can point back across file boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub file: Option<String>,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            line,
            column,
            end_line,
            end_column,
            file: None,
        }
    }

    /// A zero-width location at a single point, used for synthesized nodes
    /// (e.g. a degenerate single-element union) that have no span of their
    /// own beyond their sole child.
    pub fn point(line: usize, column: usize) -> Self {
        Self::new(line, column, line, column)
    }

    /// A synthetic zero location for AST nodes decoded from a JSON document
    /// (workflow/policy bodies), which carry no lexical byte offsets.
    pub fn dummy() -> Self {
        Self::point(0, 0)
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Smallest span containing both `self` and `other`. Used when building
    /// a parent node's location from its first and last child.
    pub fn merge(&self, other: &SourceLocation) -> SourceLocation {
        let (start, _) = if (self.line, self.column) <= (other.line, other.column) {
            ((self.line, self.column), ())
        } else {
            ((other.line, other.column), ())
        };
        let end = if (self.end_line, self.end_column) >= (other.end_line, other.end_column) {
            (self.end_line, self.end_column)
        } else {
            (other.end_line, other.end_column)
        };
        SourceLocation {
            line: start.0,
            column: start.1,
            end_line: end.0,
            end_column: end.1,
            file: self.file.clone().or_else(|| other.file.clone()),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

impl PartialOrd for SourceLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SourceLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.line, self.column).cmp(&(other.line, other.column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_takes_earliest_start_and_latest_end() {
        let a = SourceLocation::new(1, 0, 1, 5);
        let b = SourceLocation::new(2, 0, 3, 2);
        let m = a.merge(&b);
        assert_eq!(m, SourceLocation::new(1, 0, 3, 2));
    }

    #[test]
    fn ordering_is_by_line_then_column() {
        let a = SourceLocation::point(1, 10);
        let b = SourceLocation::point(2, 0);
        assert!(a < b);
    }
}
