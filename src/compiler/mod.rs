//! Code generation module for the compiler.
//!
//! This module lowers a type-checked program into instructions for a stack
//! machine with global storage slots. It handles:
//!
//! - Slot allocation for variables, parameters and function results
//! - Label allocation for conditionals, loops and subroutines
//! - Lowering of expressions and statements
//! - Array allocation and element addressing
//!
//! Generation trusts the type checker. A construct the checker would have
//! rejected aborts generation with an `InvalidInput` error.

pub mod compiler;
pub mod expr;
pub mod instructions;
pub mod stmt;
