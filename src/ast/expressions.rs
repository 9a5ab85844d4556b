use std::fmt::Display;

use crate::Position;

use super::types::VarType;

// LITERALS

/// A literal as it appears in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Real(f64),
    String(String),
    Boolean(bool),
}

impl Literal {
    /// The literal's type before any context is applied.
    pub fn get_type(&self) -> VarType {
        match self {
            Literal::Integer(_) => VarType::UntypedInteger,
            Literal::Real(_) => VarType::Real,
            Literal::String(value) if value.chars().count() == 1 => VarType::UntypedChar,
            Literal::String(_) => VarType::UntypedString,
            Literal::Boolean(_) => VarType::Boolean,
        }
    }

    /// The type a constant declared with this literal takes.
    pub fn declared_type(&self) -> VarType {
        match self {
            Literal::Integer(_) => VarType::Integer,
            Literal::Real(_) => VarType::Real,
            Literal::String(_) => VarType::String,
            Literal::Boolean(_) => VarType::Boolean,
        }
    }
}

// OPERATORS

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    /// `/`, always real division
    Divide,
    /// `div`
    IntDiv,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

impl Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Divide => "/",
            BinOp::IntDiv => "div",
            BinOp::Mod => "mod",
            BinOp::Eq => "=",
            BinOp::NotEq => "<>",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    Neg,
    Not,
}

impl Display for UnOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnOp::Neg => write!(f, "-"),
            UnOp::Not => write!(f, "not"),
        }
    }
}

// EXPRESSIONS

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    Identifier(String),
    /// `a[i]`, `m[i, j]` or `s[i]` on a string
    ArrayAccess {
        name: String,
        indices: Vec<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    FunctionCall {
        name: String,
        arguments: Vec<Expr>,
    },
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub position: Position,
}

impl Expr {
    pub fn new(kind: ExprKind, position: Position) -> Self {
        Expr { kind, position }
    }

    pub fn at(mut self, line: u32) -> Self {
        self.position = Position(line);
        self
    }

    pub fn literal(literal: Literal) -> Self {
        Expr::new(ExprKind::Literal(literal), Position::null())
    }

    pub fn int(value: i64) -> Self {
        Expr::literal(Literal::Integer(value))
    }

    pub fn real(value: f64) -> Self {
        Expr::literal(Literal::Real(value))
    }

    pub fn string(value: &str) -> Self {
        Expr::literal(Literal::String(value.to_string()))
    }

    pub fn boolean(value: bool) -> Self {
        Expr::literal(Literal::Boolean(value))
    }

    pub fn var(name: &str) -> Self {
        Expr::new(ExprKind::Identifier(name.to_string()), Position::null())
    }

    pub fn index(name: &str, indices: Vec<Expr>) -> Self {
        Expr::new(
            ExprKind::ArrayAccess {
                name: name.to_string(),
                indices,
            },
            Position::null(),
        )
    }

    pub fn binary(left: Expr, op: BinOp, right: Expr) -> Self {
        let position = left.position;
        Expr::new(
            ExprKind::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            position,
        )
    }

    pub fn unary(op: UnOp, operand: Expr) -> Self {
        let position = operand.position;
        Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            position,
        )
    }

    pub fn call(name: &str, arguments: Vec<Expr>) -> Self {
        Expr::new(
            ExprKind::FunctionCall {
                name: name.to_string(),
                arguments,
            },
            Position::null(),
        )
    }

    /// Folds an integer constant expression built from literals.
    ///
    /// Named constants are not resolved here; callers that know the scope
    /// handle identifiers themselves.
    pub fn as_integer_constant(&self) -> Option<i64> {
        match &self.kind {
            ExprKind::Literal(Literal::Integer(value)) => Some(*value),
            ExprKind::Unary {
                op: UnOp::Neg,
                operand,
            } => operand.as_integer_constant()?.checked_neg(),
            ExprKind::Binary { left, op, right } => {
                let (left, right) = (left.as_integer_constant()?, right.as_integer_constant()?);
                match op {
                    BinOp::Add => left.checked_add(right),
                    BinOp::Sub => left.checked_sub(right),
                    BinOp::Mul => left.checked_mul(right),
                    BinOp::IntDiv => left.checked_div(right),
                    BinOp::Mod => left.checked_rem(right),
                    _ => None,
                }
            }
            _ => None,
        }
    }

}
