//! Unit tests for error handling.
//!
//! This module contains tests for error types and error reporting.

use crate::ast::types::VarType;
use crate::errors::errors::{Error, ErrorImpl, ErrorTip};
use crate::Position;

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::Undeclared {
            name: "y".to_string(),
        },
        Position(3),
    );

    assert_eq!(error.get_error_name(), "Undeclared");
    assert_eq!(error.get_position().0, 3);
}

#[test]
fn test_error_display_includes_line() {
    let error = Error::new(
        ErrorImpl::Undeclared {
            name: "y".to_string(),
        },
        Position(3),
    );

    assert_eq!(error.to_string(), "line 3: undeclared identifier \"y\"");
}

#[test]
fn test_error_display_without_line() {
    let error = Error::new(ErrorImpl::BreakOutsideLoop, Position::null());

    assert_eq!(error.to_string(), "break statement must be inside a loop");
}

#[test]
fn test_type_mismatch_error() {
    let error = Error::new(
        ErrorImpl::TypeMismatch {
            context: "assignment to \"x\"".to_string(),
            expected: VarType::Integer,
            received: VarType::UntypedString,
        },
        Position(7),
    );

    assert_eq!(error.get_error_name(), "TypeMismatch");
    assert_eq!(
        error.to_string(),
        "line 7: type mismatch in assignment to \"x\": expected INTEGER, got string literal"
    );
}

#[test]
fn test_operand_error_message() {
    let error = Error::new(
        ErrorImpl::InvalidOperandTypes {
            operator: "div".to_string(),
            left: VarType::Real,
            right: VarType::Integer,
        },
        Position(2),
    );

    assert_eq!(error.get_error_name(), "InvalidOperandTypes");
    assert!(error.to_string().contains("REAL and INTEGER for operator div"));
}

#[test]
fn test_arity_mismatch_error() {
    let error = Error::new(
        ErrorImpl::ArityMismatch {
            routine: "sum".to_string(),
            expected: 2,
            received: 3,
        },
        Position(5),
    );

    assert_eq!(error.get_error_name(), "ArityMismatch");
    assert_eq!(error.get_tip().to_string(), "Expected 2 arguments, received 3");
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(ErrorImpl::ContinueOutsideLoop, Position(1));

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_suggestion() {
    let error = Error::new(
        ErrorImpl::MissingReturnValue {
            function: "square".to_string(),
        },
        Position(4),
    );

    match error.get_tip() {
        ErrorTip::Suggestion(tip) => assert!(tip.contains("square")),
        _ => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_invalid_input_error() {
    let error = Error::new(
        ErrorImpl::InvalidInput {
            construct: "break outside of a loop".to_string(),
        },
        Position(9),
    );

    assert_eq!(error.get_error_name(), "InvalidInput");
    assert_eq!(
        error.get_error_impl(),
        &ErrorImpl::InvalidInput {
            construct: "break outside of a loop".to_string()
        }
    );
}
