use std::fmt::Display;

use thiserror::Error;

use crate::{ast::types::VarType, Position};

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> Position {
        self.position
    }

    pub fn get_error_impl(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::DuplicateDeclaration { .. } => "DuplicateDeclaration",
            ErrorImpl::Undeclared { .. } => "Undeclared",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::InvalidRange { .. } => "InvalidRange",
            ErrorImpl::InvalidRangeBounds { .. } => "InvalidRangeBounds",
            ErrorImpl::InvalidIndexType { .. } => "InvalidIndexType",
            ErrorImpl::NotIndexable { .. } => "NotIndexable",
            ErrorImpl::IndexCountMismatch { .. } => "IndexCountMismatch",
            ErrorImpl::TypeMismatch { .. } => "TypeMismatch",
            ErrorImpl::InvalidAssignmentTarget { .. } => "InvalidAssignmentTarget",
            ErrorImpl::InvalidOperandTypes { .. } => "InvalidOperandTypes",
            ErrorImpl::InvalidOperandType { .. } => "InvalidOperandType",
            ErrorImpl::NonBooleanCondition { .. } => "NonBooleanCondition",
            ErrorImpl::BreakOutsideLoop => "BreakOutsideLoop",
            ErrorImpl::ContinueOutsideLoop => "ContinueOutsideLoop",
            ErrorImpl::ArityMismatch { .. } => "ArityMismatch",
            ErrorImpl::ParameterTypeMismatch { .. } => "ParameterTypeMismatch",
            ErrorImpl::MissingReturnValue { .. } => "MissingReturnValue",
            ErrorImpl::NotCallable { .. } => "NotCallable",
            ErrorImpl::NotAFunction { .. } => "NotAFunction",
            ErrorImpl::InvalidReadTarget { .. } => "InvalidReadTarget",
            ErrorImpl::UnusedVariable { .. } => "UnusedVariable",
            ErrorImpl::InvalidInput { .. } => "InvalidInput",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::DuplicateDeclaration { name } => {
                ErrorTip::Suggestion(format!("`{}` is already declared in this scope", name))
            }
            ErrorImpl::Undeclared { name } => {
                ErrorTip::Suggestion(format!("Declare `{}` in a `var` section before using it", name))
            }
            ErrorImpl::UnknownType { name } => ErrorTip::Suggestion(format!(
                "Unknown type `{}`, expected integer, real, boolean, string or char",
                name
            )),
            ErrorImpl::InvalidRange { start, end } if start > end => ErrorTip::Suggestion(format!(
                "The lower bound {} is greater than the upper bound {}",
                start, end
            )),
            ErrorImpl::InvalidRange { .. } => {
                ErrorTip::Suggestion(String::from("The range has more elements than can be addressed"))
            }
            ErrorImpl::InvalidRangeBounds { .. } => {
                ErrorTip::Suggestion(String::from("Array bounds must be integers"))
            }
            ErrorImpl::InvalidIndexType { .. } => {
                ErrorTip::Suggestion(String::from("Indices must be integer expressions"))
            }
            ErrorImpl::NotIndexable { name, .. } => {
                ErrorTip::Suggestion(format!("Only arrays and strings can be indexed, `{}` is neither", name))
            }
            ErrorImpl::IndexCountMismatch { expected, received, .. } => ErrorTip::Suggestion(format!(
                "Expected {} indices, received {}",
                expected, received
            )),
            ErrorImpl::TypeMismatch { expected, received, .. } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::InvalidAssignmentTarget { name, .. } => {
                ErrorTip::Suggestion(format!("`{}` cannot be assigned to", name))
            }
            ErrorImpl::InvalidOperandTypes { .. } | ErrorImpl::InvalidOperandType { .. } => ErrorTip::None,
            ErrorImpl::NonBooleanCondition { .. } => {
                ErrorTip::Suggestion(String::from("Use a comparison to produce a boolean condition"))
            }
            ErrorImpl::BreakOutsideLoop | ErrorImpl::ContinueOutsideLoop => ErrorTip::None,
            ErrorImpl::ArityMismatch { expected, received, .. } => ErrorTip::Suggestion(format!(
                "Expected {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::ParameterTypeMismatch { expected, received, .. } => ErrorTip::Suggestion(format!(
                "Expected argument type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::MissingReturnValue { function } => ErrorTip::Suggestion(format!(
                "Assign a value to `{}` inside its body",
                function
            )),
            ErrorImpl::NotCallable { .. } | ErrorImpl::NotAFunction { .. } => ErrorTip::None,
            ErrorImpl::InvalidReadTarget { .. } => ErrorTip::Suggestion(String::from(
                "Only integer, real and string variables can be read",
            )),
            ErrorImpl::UnusedVariable { name } => {
                ErrorTip::Suggestion(format!("Remove `{}` or use it", name))
            }
            ErrorImpl::InvalidInput { .. } => ErrorTip::Suggestion(String::from(
                "Run the type checker and only generate code for programs it accepts",
            )),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.position.is_null() {
            write!(f, "{}", self.internal_error)
        } else {
            write!(f, "{}: {}", self.position, self.internal_error)
        }
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("{name:?} is already declared in this scope")]
    DuplicateDeclaration { name: String },
    #[error("undeclared identifier {name:?}")]
    Undeclared { name: String },
    #[error("unknown type {name:?}")]
    UnknownType { name: String },
    #[error("invalid array range {start}..{end}")]
    InvalidRange { start: i64, end: i64 },
    #[error("array range must be of INTEGER type, got {start} and {end}")]
    InvalidRangeBounds { start: VarType, end: VarType },
    #[error("index of {name:?} must be an integer, got {received}")]
    InvalidIndexType { name: String, received: VarType },
    #[error("{name:?} of type {ty} is not an array or string")]
    NotIndexable { name: String, ty: VarType },
    #[error("{name:?} expects {expected} indices, got {received}")]
    IndexCountMismatch {
        name: String,
        expected: usize,
        received: usize,
    },
    #[error("type mismatch in {context}: expected {expected}, got {received}")]
    TypeMismatch {
        context: String,
        expected: VarType,
        received: VarType,
    },
    #[error("cannot assign to {kind} {name:?}")]
    InvalidAssignmentTarget { name: String, kind: String },
    #[error("invalid operands {left} and {right} for operator {operator}")]
    InvalidOperandTypes {
        operator: String,
        left: VarType,
        right: VarType,
    },
    #[error("invalid operand {operand} for unary operator {operator}")]
    InvalidOperandType { operator: String, operand: VarType },
    #[error("condition in {construct} statement must be BOOLEAN, got {received}")]
    NonBooleanCondition { construct: String, received: VarType },
    #[error("break statement must be inside a loop")]
    BreakOutsideLoop,
    #[error("continue statement must be inside a loop")]
    ContinueOutsideLoop,
    #[error("{routine:?} expects {expected} arguments, got {received}")]
    ArityMismatch {
        routine: String,
        expected: usize,
        received: usize,
    },
    #[error("type mismatch in argument {index} of {routine:?}: expected {expected}, got {received}")]
    ParameterTypeMismatch {
        routine: String,
        index: usize,
        expected: VarType,
        received: VarType,
    },
    #[error("function {function:?} does not assign a return value")]
    MissingReturnValue { function: String },
    #[error("{name:?} is not a procedure or function")]
    NotCallable { name: String },
    #[error("procedure {name:?} does not return a value")]
    NotAFunction { name: String },
    #[error("cannot read into {target}")]
    InvalidReadTarget { target: String },
    #[error("variable {name:?} is declared but never used")]
    UnusedVariable { name: String },
    #[error("invalid input for code generation: {construct}")]
    InvalidInput { construct: String },
}
