/// AST (Abstract Syntax Tree) module
/// Contains the syntax tree contract consumed by both passes
///
/// Submodules:
/// - ast: Program, blocks and declarations
/// - expressions: Expression nodes, literals and operators
/// - statements: Statement nodes
/// - types: Type annotations as written and the resolved type model
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;

#[cfg(test)]
mod tests;
