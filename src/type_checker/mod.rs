//! Type checking and semantic analysis module.
//!
//! This module validates a parsed program before code generation. It:
//!
//! - Resolves every name through a stack of scopes
//! - Checks operator, assignment and argument types against fixed tables
//! - Validates array ranges, loop control and routine calls
//! - Reports unused variables as warnings
//!
//! Checking never stops at the first problem: every diagnostic is collected
//! and returned together, in the order the tree was walked.

pub mod rules;
pub mod symbol_table;
pub mod type_checker;
