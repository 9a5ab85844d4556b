//! Unit tests for the syntax tree helpers.

use super::expressions::{BinOp, Expr, Literal, UnOp};
use super::types::{Dimension, VarType};

#[test]
fn test_type_names_are_case_insensitive() {
    assert_eq!(VarType::from_name("Integer"), Some(VarType::Integer));
    assert_eq!(VarType::from_name("STRING"), Some(VarType::String));
    assert_eq!(VarType::from_name("real"), Some(VarType::Real));
    assert_eq!(VarType::from_name("record"), None);
}

#[test]
fn test_literal_types_are_untyped() {
    assert_eq!(Literal::Integer(3).get_type(), VarType::UntypedInteger);
    assert_eq!(Literal::String("ab".into()).get_type(), VarType::UntypedString);
    assert_eq!(Literal::String("a".into()).get_type(), VarType::UntypedChar);
    assert_eq!(Literal::String("".into()).get_type(), VarType::UntypedString);
    assert_eq!(Literal::Integer(3).declared_type(), VarType::Integer);
    assert_eq!(Literal::Boolean(true).get_type(), VarType::Boolean);
}

#[test]
fn test_integer_constant_folding() {
    let expr = Expr::binary(
        Expr::int(2),
        BinOp::Mul,
        Expr::binary(Expr::int(3), BinOp::Add, Expr::int(4)),
    );
    assert_eq!(expr.as_integer_constant(), Some(14));

    let negative = Expr::unary(UnOp::Neg, Expr::int(5));
    assert_eq!(negative.as_integer_constant(), Some(-5));
    assert_eq!(Expr::unary(UnOp::Neg, Expr::int(i64::MIN)).as_integer_constant(), None);
}

#[test]
fn test_non_constant_expressions_do_not_fold() {
    assert_eq!(Expr::var("n").as_integer_constant(), None);
    assert_eq!(
        Expr::binary(Expr::int(1), BinOp::IntDiv, Expr::int(0)).as_integer_constant(),
        None
    );
    assert_eq!(
        Expr::binary(Expr::int(1), BinOp::Lt, Expr::int(2)).as_integer_constant(),
        None
    );
}

#[test]
fn test_dimension_length() {
    assert_eq!(Dimension::new(1, 10).len(), Some(10));
    assert_eq!(Dimension::new(-2, 2).len(), Some(5));
    assert_eq!(Dimension { start: None, end: Some(3) }.len(), None);
    assert_eq!(Dimension::new(i64::MIN, i64::MAX).len(), None);
    assert_eq!(Dimension::new(1, 10).to_string(), "1..10");
}

#[test]
fn test_type_display() {
    assert_eq!(VarType::Array(Box::new(VarType::Integer)).to_string(), "ARRAY OF INTEGER");
    assert_eq!(VarType::UntypedInteger.to_string(), "integer literal");
}
