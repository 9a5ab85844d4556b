//! Type system definitions for the AST.
//!
//! This module defines both sides of the type system:
//!
//! - [`TypeSpec`], the type annotation exactly as written in a declaration
//! - [`VarType`], the resolved type the checker and generator reason about
//!
//! Literals start out "untyped": an integer literal only becomes INTEGER or
//! REAL once it meets a declared type, and a string literal only becomes a
//! STRING (or a CHAR) in context.

use std::fmt::Display;

use super::expressions::Expr;

/// A type as written in the source: `integer` or `array[1..10] of real`.
#[derive(Debug, Clone)]
pub enum TypeSpec {
    Simple(String),
    Array { ranges: Vec<Range>, element: String },
}

impl TypeSpec {
    pub fn simple(name: &str) -> Self {
        TypeSpec::Simple(name.to_string())
    }

    pub fn array(ranges: Vec<Range>, element: &str) -> Self {
        TypeSpec::Array {
            ranges,
            element: element.to_string(),
        }
    }
}

/// `start..end` inside an array type.
#[derive(Debug, Clone)]
pub struct Range {
    pub start: Expr,
    pub end: Expr,
}

impl Range {
    pub fn new(start: Expr, end: Expr) -> Self {
        Range { start, end }
    }

    /// Shorthand for a range with literal bounds.
    pub fn literal(start: i64, end: i64) -> Self {
        Range {
            start: Expr::int(start),
            end: Expr::int(end),
        }
    }
}

/// One dimension of an array. A bound is `None` when it is not a
/// compile-time constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimension {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl Dimension {
    pub fn new(start: i64, end: i64) -> Self {
        Dimension {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Number of elements, when both bounds are known and the count fits in
    /// an `i64`.
    pub fn len(&self) -> Option<i64> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start <= end => end.checked_sub(start)?.checked_add(1),
            _ => None,
        }
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bound = |b: Option<i64>| b.map_or_else(|| String::from("?"), |b| b.to_string());
        write!(f, "{}..{}", bound(self.start), bound(self.end))
    }
}

/// Resolved type of a symbol or expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VarType {
    Integer,
    Real,
    Boolean,
    String,
    Char,
    /// An integer literal not yet bound to INTEGER or REAL.
    UntypedInteger,
    /// A string literal not yet bound to STRING.
    UntypedString,
    /// A one-character string literal, usable as STRING or as CHAR.
    UntypedChar,
    Array(Box<VarType>),
    /// The type of an expression that already produced a diagnostic.
    /// Every check involving it passes silently.
    Unknown,
}

impl VarType {
    /// Resolves a simple type name. Names are case-insensitive.
    pub fn from_name(name: &str) -> Option<VarType> {
        match name.to_ascii_lowercase().as_str() {
            "integer" => Some(VarType::Integer),
            "real" => Some(VarType::Real),
            "boolean" => Some(VarType::Boolean),
            "string" => Some(VarType::String),
            "char" => Some(VarType::Char),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, VarType::Unknown)
    }

    /// INTEGER or an untyped integer literal.
    pub fn is_integral(&self) -> bool {
        matches!(self, VarType::Integer | VarType::UntypedInteger)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            VarType::Integer | VarType::Real | VarType::UntypedInteger
        )
    }

    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            VarType::String | VarType::UntypedString | VarType::UntypedChar
        )
    }
}

impl Display for VarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VarType::Integer => write!(f, "INTEGER"),
            VarType::Real => write!(f, "REAL"),
            VarType::Boolean => write!(f, "BOOLEAN"),
            VarType::String => write!(f, "STRING"),
            VarType::Char => write!(f, "CHAR"),
            VarType::UntypedInteger => write!(f, "integer literal"),
            VarType::UntypedString => write!(f, "string literal"),
            VarType::UntypedChar => write!(f, "character literal"),
            VarType::Array(element) => write!(f, "ARRAY OF {}", element),
            VarType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}
