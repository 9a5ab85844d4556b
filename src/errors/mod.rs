//! Error types and error handling for the compiler.
//!
//! This module defines the error types used by both passes. It includes:
//!
//! - Error structures with source line information
//! - Specific error variants for semantic analysis and code generation
//! - Error formatting and display functionality
//! - Helpful error messages and suggestions

pub mod errors;

#[cfg(test)]
mod tests;
