//! Unified diagnostic type: one record with a `code` and a `category`
//! shared across every phase, carrying a location and machine-readable code
//! instead of a phase-tagged message string.

use std::fmt;
use std::io;

use termcolor::{Color, ColorSpec, WriteColor};

use crate::location::SourceLocation;

/// Which phase produced a diagnostic, used for filtering and for the
/// early-termination ceiling in the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Syntax,
    Semantic,
    Validation,
    Type,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Syntax => "syntax",
            Category::Semantic => "semantic",
            Category::Validation => "validation",
            Category::Type => "type",
        };
        write!(f, "{}", s)
    }
}

/// Machine-readable diagnostic codes. New codes should be added here rather
/// than inlined as strings so exhaustive matches at call sites catch typos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    UnexpectedChar,
    UnexpectedToken,
    ParseError,
    CircularImport,
    DuplicateType,
    DuplicateEnum,
    DuplicatePolicyId,
    DuplicateNodeId,
    DuplicateField,
    DuplicateEnumValue,
    InvalidTypeReference,
    InvalidConstraintRange,
    InvalidEnumValueName,
    InvalidEnumValueType,
    InvalidEnforcementMode,
    InvalidEnforcementAction,
    InvalidEdgeReference,
    CycleDetected,
    TriggerHasIncomingEdge,
    OutputHasOutgoingEdge,
    ConditionNeedsTwoOutgoing,
    StringTooShort,
    StringTooLong,
    InvalidDateTimeFormat,
    InvalidDateTimePattern,
    InvalidRegoPackage,
    InvalidRegoDefaultAllow,
    InvalidSemver,
    ValidationTerminated,
    DeprecatedLegacyIdField,
}

impl Code {
    pub fn as_str(&self) -> &'static str {
        match self {
            Code::UnexpectedChar => "UNEXPECTED_CHAR",
            Code::UnexpectedToken => "UNEXPECTED_TOKEN",
            Code::ParseError => "PARSE_ERROR",
            Code::CircularImport => "CIRCULAR_IMPORT",
            Code::DuplicateType => "DUPLICATE_TYPE",
            Code::DuplicateEnum => "DUPLICATE_ENUM",
            Code::DuplicatePolicyId => "DUPLICATE_POLICY_ID",
            Code::DuplicateNodeId => "DUPLICATE_NODE_ID",
            Code::DuplicateField => "DUPLICATE_FIELD",
            Code::DuplicateEnumValue => "DUPLICATE_ENUM_VALUE",
            Code::InvalidTypeReference => "INVALID_TYPE_REFERENCE",
            Code::InvalidConstraintRange => "INVALID_CONSTRAINT_RANGE",
            Code::InvalidEnumValueName => "INVALID_ENUM_VALUE_NAME",
            Code::InvalidEnumValueType => "INVALID_ENUM_VALUE_TYPE",
            Code::InvalidEnforcementMode => "INVALID_ENFORCEMENT_MODE",
            Code::InvalidEnforcementAction => "INVALID_ENFORCEMENT_ACTION",
            Code::InvalidEdgeReference => "INVALID_EDGE_REFERENCE",
            Code::CycleDetected => "CYCLE_DETECTED",
            Code::TriggerHasIncomingEdge => "TRIGGER_HAS_INCOMING_EDGE",
            Code::OutputHasOutgoingEdge => "OUTPUT_HAS_OUTGOING_EDGE",
            Code::ConditionNeedsTwoOutgoing => "CONDITION_NEEDS_TWO_OUTGOING",
            Code::StringTooShort => "STRING_TOO_SHORT",
            Code::StringTooLong => "STRING_TOO_LONG",
            Code::InvalidDateTimeFormat => "INVALID_DATE_TIME_FORMAT",
            Code::InvalidDateTimePattern => "INVALID_DATE_TIME_PATTERN",
            Code::InvalidRegoPackage => "INVALID_REGO_PACKAGE",
            Code::InvalidRegoDefaultAllow => "INVALID_REGO_DEFAULT_ALLOW",
            Code::InvalidSemver => "INVALID_SEMVER",
            Code::ValidationTerminated => "VALIDATION_TERMINATED",
            Code::DeprecatedLegacyIdField => "DEPRECATED_LEGACY_ID_FIELD",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Code::UnexpectedChar | Code::UnexpectedToken | Code::ParseError => Category::Syntax,
            Code::InvalidConstraintRange | Code::InvalidTypeReference => Category::Type,
            Code::StringTooShort
            | Code::StringTooLong
            | Code::InvalidEnumValueName
            | Code::InvalidEnumValueType
            | Code::InvalidEnforcementMode
            | Code::InvalidEnforcementAction
            | Code::InvalidDateTimeFormat
            | Code::InvalidDateTimePattern
            | Code::InvalidRegoPackage
            | Code::InvalidRegoDefaultAllow
            | Code::InvalidSemver
            | Code::ValidationTerminated
            | Code::DeprecatedLegacyIdField => Category::Validation,
            _ => Category::Semantic,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub message: String,
    pub location: SourceLocation,
    pub code: Code,
}

impl Diagnostic {
    pub fn new(code: Code, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            location,
            code,
        }
    }

    pub fn category(&self) -> Category {
        self.code.category()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.location,
            self.code.category(),
            self.code.as_str(),
            self.message
        )
    }
}

impl std::error::Error for Diagnostic {}

impl Diagnostic {
    /// Writes this diagnostic the way a CLI front-end would print it to a
    /// terminal: the category tag colored by severity, everything else
    /// matching `Display`. Takes any `WriteColor` so callers can target a
    /// real terminal, a `Buffer` in tests, or a color-stripping writer when
    /// output isn't a tty.
    pub fn render_colored(&self, out: &mut dyn WriteColor) -> io::Result<()> {
        out.set_color(ColorSpec::new().set_fg(Some(category_color(self.code.category()))).set_bold(true))?;
        write!(out, "{}", self.code.category())?;
        out.reset()?;
        writeln!(out, " [{}] {}: {}", self.location, self.code.as_str(), self.message)
    }
}

fn category_color(category: Category) -> Color {
    match category {
        Category::Syntax | Category::Type => Color::Red,
        Category::Semantic | Category::Validation => Color::Yellow,
    }
}

/// Renders a whole diagnostic batch in source order, one line each.
pub fn render_diagnostics(diagnostics: &[Diagnostic], out: &mut dyn WriteColor) -> io::Result<()> {
    for diagnostic in diagnostics {
        diagnostic.render_colored(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod render_tests {
    use super::*;
    use termcolor::Buffer;

    #[test]
    fn render_colored_includes_code_and_message() {
        let diagnostic = Diagnostic::new(
            Code::DuplicateType,
            "`Foo` is already declared",
            SourceLocation::dummy(),
        );
        let mut buffer = Buffer::no_color();
        diagnostic.render_colored(&mut buffer).unwrap();
        let rendered = String::from_utf8(buffer.into_inner()).unwrap();
        assert!(rendered.contains("DUPLICATE_TYPE"));
        assert!(rendered.contains("`Foo` is already declared"));
    }

    #[test]
    fn render_diagnostics_writes_one_line_per_entry() {
        let diagnostics = vec![
            Diagnostic::new(Code::ParseError, "unexpected token", SourceLocation::dummy()),
            Diagnostic::new(Code::CycleDetected, "a -> b -> a", SourceLocation::dummy()),
        ];
        let mut buffer = Buffer::no_color();
        render_diagnostics(&diagnostics, &mut buffer).unwrap();
        let rendered = String::from_utf8(buffer.into_inner()).unwrap();
        assert_eq!(rendered.lines().count(), 2);
    }
}
