//! Operator and assignment compatibility tables.
//!
//! Both tables are built once and never mutated. Lookups involving
//! [`VarType::Unknown`] always succeed so that a single undeclared name does
//! not cascade into operator or assignment errors further up the tree.

use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};

use crate::ast::{
    expressions::{BinOp, UnOp},
    types::VarType,
};

use crate::ast::types::VarType::{Boolean, Char, Integer, Real, UntypedChar, UntypedInteger, UntypedString};

lazy_static! {
    pub static ref BINARY_RULES: HashMap<(BinOp, VarType, VarType), VarType> = {
        let mut map = HashMap::new();

        for op in [BinOp::Add, BinOp::Sub, BinOp::Mul] {
            map.insert((op, Integer, Integer), Integer);
            map.insert((op, Integer, UntypedInteger), Integer);
            map.insert((op, UntypedInteger, Integer), Integer);
            map.insert((op, UntypedInteger, UntypedInteger), UntypedInteger);
            for (left, right) in [
                (Real, Real),
                (Integer, Real),
                (Real, Integer),
                (UntypedInteger, Real),
                (Real, UntypedInteger),
            ] {
                map.insert((op, left, right), Real);
            }
        }

        for left in [VarType::String, UntypedString, UntypedChar] {
            for right in [VarType::String, UntypedString, UntypedChar] {
                map.insert((BinOp::Add, left.clone(), right), VarType::String);
            }
        }

        for left in [Integer, Real, UntypedInteger] {
            for right in [Integer, Real, UntypedInteger] {
                map.insert((BinOp::Divide, left.clone(), right), Real);
            }
        }

        for op in [BinOp::IntDiv, BinOp::Mod] {
            for left in [Integer, UntypedInteger] {
                for right in [Integer, UntypedInteger] {
                    map.insert((op, left.clone(), right), Integer);
                }
            }
        }

        for op in [BinOp::Eq, BinOp::NotEq, BinOp::Lt, BinOp::LtEq, BinOp::Gt, BinOp::GtEq] {
            for left in [Integer, Real, UntypedInteger] {
                for right in [Integer, Real, UntypedInteger] {
                    map.insert((op, left.clone(), right), Boolean);
                }
            }
            for left in [VarType::String, UntypedString, UntypedChar] {
                for right in [VarType::String, UntypedString, UntypedChar] {
                    map.insert((op, left.clone(), right), Boolean);
                }
            }
            // A CHAR only compares with a CHAR or a one-character literal.
            for (left, right) in [(Char, Char), (Char, UntypedChar), (UntypedChar, Char)] {
                map.insert((op, left, right), Boolean);
            }
        }

        for op in [BinOp::Eq, BinOp::NotEq, BinOp::And, BinOp::Or] {
            map.insert((op, Boolean, Boolean), Boolean);
        }

        map
    };

    pub static ref UNARY_RULES: HashMap<(UnOp, VarType), VarType> = {
        let mut map = HashMap::new();
        map.insert((UnOp::Not, Boolean), Boolean);
        map.insert((UnOp::Neg, Integer), Integer);
        map.insert((UnOp::Neg, Real), Real);
        map.insert((UnOp::Neg, UntypedInteger), UntypedInteger);
        map
    };

    /// Declared type -> source types that may be stored into it.
    pub static ref COMPATIBILITY: HashMap<VarType, HashSet<VarType>> = {
        let mut map = HashMap::new();
        map.insert(Integer, HashSet::from([Integer, UntypedInteger]));
        map.insert(Real, HashSet::from([Real, Integer, UntypedInteger]));
        map.insert(Boolean, HashSet::from([Boolean]));
        map.insert(VarType::String, HashSet::from([VarType::String, UntypedString, UntypedChar]));
        map.insert(Char, HashSet::from([Char, UntypedChar]));
        map
    };
}

/// Result type of `left <op> right`, or `None` when the table has no entry.
pub fn binary_result(op: BinOp, left: &VarType, right: &VarType) -> Option<VarType> {
    if left.is_unknown() || right.is_unknown() {
        return Some(if op.is_comparison() || op.is_logical() {
            Boolean
        } else {
            VarType::Unknown
        });
    }
    BINARY_RULES.get(&(op, left.clone(), right.clone())).cloned()
}

/// Result type of `<op> operand`, or `None` when the table has no entry.
pub fn unary_result(op: UnOp, operand: &VarType) -> Option<VarType> {
    if operand.is_unknown() {
        return Some(match op {
            UnOp::Not => Boolean,
            UnOp::Neg => VarType::Unknown,
        });
    }
    UNARY_RULES.get(&(op, operand.clone())).cloned()
}

/// Whether a value of type `source` can be stored into a `target`.
pub fn is_compatible(target: &VarType, source: &VarType) -> bool {
    if target.is_unknown() || source.is_unknown() {
        return true;
    }
    match COMPATIBILITY.get(target) {
        Some(allowed) => allowed.contains(source),
        None => target == source,
    }
}

/// Compatibility in either direction, as needed by `case` labels.
pub fn is_mutually_compatible(left: &VarType, right: &VarType) -> bool {
    is_compatible(left, right) || is_compatible(right, left)
}

/// The type an untyped literal settles on when nothing else constrains it.
pub fn settle(ty: VarType) -> VarType {
    match ty {
        UntypedInteger => Integer,
        UntypedString | UntypedChar => VarType::String,
        other => other,
    }
}
