#![allow(clippy::module_inception)]

//! Semantic analysis and code generation for a small Pascal dialect.
//!
//! The crate consumes an already-parsed [`ast::Program`] and runs two passes
//! over it:
//!
//! 1. [`type_checker::type_checker::type_check`] resolves names through a
//!    scoped symbol table and validates every declaration, statement and
//!    expression, collecting all diagnostics instead of stopping at the first.
//! 2. [`compiler::compiler::generate`] lowers a checked tree into a flat
//!    instruction stream for a stack machine with global slots and labels.

use std::fmt::Display;

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod type_checker;

/// Source line of a syntax tree node. Line `0` means the position is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position(pub u32);

impl Position {
    pub fn null() -> Self {
        Position(0)
    }

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "<unknown line>")
        } else {
            write!(f, "line {}", self.0)
        }
    }
}

/// Options shared by both passes.
#[derive(Debug, Clone)]
pub struct Config {
    /// Report variables that are declared but never referenced.
    pub warn_unused: bool,
    /// Wrap the generated program in `START` / `STOP`.
    pub emit_boundaries: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            warn_unused: true,
            emit_boundaries: true,
        }
    }
}
