//! Type-level AST nodes: enums, type declarations, field bodies, and the
//! `TypeExpr` tagged union.

use crate::location::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    Any,
    Null,
}

impl Primitive {
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Integer => "integer",
            Primitive::Number => "number",
            Primitive::Boolean => "boolean",
            Primitive::Object => "object",
            Primitive::Array => "array",
            Primitive::Any => "any",
            Primitive::Null => "null",
        }
    }
}

/// A type expression: the right-hand side of a field's `: type` or an
/// array/union/optional/constrained combinator over one.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Primitive {
        kind: Primitive,
        location: SourceLocation,
    },
    /// A name resolving (post-validation) to an `EnumDef` or `TypeDef`.
    /// Case-sensitive; resolution happens in the validator, not here.
    Reference {
        name: String,
        location: SourceLocation,
    },
    Array {
        element: Box<TypeExpr>,
        location: SourceLocation,
    },
    /// Non-empty by construction; the parser collapses a single-element
    /// union down to that element.
    Union {
        variants: Vec<TypeExpr>,
        location: SourceLocation,
    },
    Optional {
        inner: Box<TypeExpr>,
        location: SourceLocation,
    },
    /// `min`/`max` are the numeric range the textual grammar produces
    /// (`(0..120)`). `format`/`pattern` are never set by the parser; they
    /// arrive only from a JSON Schema import whose `string` property carries
    /// a `format`/`pattern` keyword — recorded here rather than overloading
    /// `min`/`max` with date strings.
    Constrained {
        base: Box<TypeExpr>,
        min: Option<i64>,
        max: Option<i64>,
        format: Option<String>,
        pattern: Option<String>,
        location: SourceLocation,
    },
}

impl TypeExpr {
    pub fn location(&self) -> &SourceLocation {
        match self {
            TypeExpr::Primitive { location, .. }
            | TypeExpr::Reference { location, .. }
            | TypeExpr::Array { location, .. }
            | TypeExpr::Union { location, .. }
            | TypeExpr::Optional { location, .. }
            | TypeExpr::Constrained { location, .. } => location,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub type_expr: TypeExpr,
    pub optional: bool,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeBody {
    pub fields: Vec<FieldDef>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub body: Option<TypeBody>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub name: String,
    pub values: Vec<(String, SourceLocation)>,
    pub location: SourceLocation,
}
