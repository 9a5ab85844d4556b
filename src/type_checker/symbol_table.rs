//! Scoped symbol table.
//!
//! Scopes form a stack: the bottom entry is the global scope holding the
//! built-in routines, and every block, procedure or function body pushes a
//! new one. Lookup walks from the innermost scope outwards.

use std::{collections::HashMap, fmt::Display};

use crate::{
    ast::types::{Dimension, VarType},
    errors::errors::{Error, ErrorImpl},
    Position,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Constant,
    Procedure,
    Function,
}

impl Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Constant => "constant",
            SymbolKind::Procedure => "procedure",
            SymbolKind::Function => "function",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutineSignature {
    pub params: Vec<(String, VarType)>,
    pub return_type: Option<VarType>,
    /// Built-in I/O routines accept any number of arguments of any type.
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolDetail {
    Scalar,
    Array(Vec<Dimension>),
    Routine(RoutineSignature),
    /// The implicit variable a function assigns its result to.
    FunctionResult,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: VarType,
    pub initialized: bool,
    pub used: bool,
    pub position: Position,
    pub detail: SymbolDetail,
}

impl Symbol {
    fn with(name: &str, kind: SymbolKind, ty: VarType, position: Position, detail: SymbolDetail) -> Self {
        Symbol {
            name: name.to_string(),
            kind,
            ty,
            initialized: false,
            used: false,
            position,
            detail,
        }
    }

    pub fn variable(name: &str, ty: VarType, position: Position) -> Self {
        Symbol::with(name, SymbolKind::Variable, ty, position, SymbolDetail::Scalar)
    }

    pub fn array(name: &str, element: VarType, dimensions: Vec<Dimension>, position: Position) -> Self {
        Symbol::with(
            name,
            SymbolKind::Variable,
            VarType::Array(Box::new(element)),
            position,
            SymbolDetail::Array(dimensions),
        )
    }

    pub fn parameter(name: &str, ty: VarType, position: Position) -> Self {
        let mut symbol = Symbol::with(name, SymbolKind::Parameter, ty, position, SymbolDetail::Scalar);
        symbol.initialized = true;
        symbol
    }

    pub fn constant(name: &str, ty: VarType, position: Position) -> Self {
        let mut symbol = Symbol::with(name, SymbolKind::Constant, ty, position, SymbolDetail::Scalar);
        symbol.initialized = true;
        symbol
    }

    pub fn procedure(name: &str, params: Vec<(String, VarType)>, position: Position) -> Self {
        Symbol::with(
            name,
            SymbolKind::Procedure,
            VarType::Unknown,
            position,
            SymbolDetail::Routine(RoutineSignature {
                params,
                return_type: None,
                variadic: false,
            }),
        )
    }

    pub fn function(name: &str, params: Vec<(String, VarType)>, return_type: VarType, position: Position) -> Self {
        Symbol::with(
            name,
            SymbolKind::Function,
            return_type.clone(),
            position,
            SymbolDetail::Routine(RoutineSignature {
                params,
                return_type: Some(return_type),
                variadic: false,
            }),
        )
    }

    pub fn function_result(name: &str, ty: VarType, position: Position) -> Self {
        Symbol::with(name, SymbolKind::Variable, ty, position, SymbolDetail::FunctionResult)
    }

    fn builtin_io(name: &str) -> Self {
        Symbol::with(
            name,
            SymbolKind::Procedure,
            VarType::Unknown,
            Position::null(),
            SymbolDetail::Routine(RoutineSignature {
                params: vec![],
                return_type: None,
                variadic: true,
            }),
        )
    }

    pub fn signature(&self) -> Option<&RoutineSignature> {
        match &self.detail {
            SymbolDetail::Routine(signature) => Some(signature),
            _ => None,
        }
    }

    pub fn dimensions(&self) -> Option<&[Dimension]> {
        match &self.detail {
            SymbolDetail::Array(dimensions) => Some(dimensions),
            _ => None,
        }
    }

    pub fn is_function_result(&self) -> bool {
        self.detail == SymbolDetail::FunctionResult
    }
}

#[derive(Debug, Default)]
struct Scope {
    symbols: Vec<Symbol>,
    index: HashMap<String, usize>,
}

impl Scope {
    fn get(&self, name: &str) -> Option<&Symbol> {
        self.index.get(name).map(|&i| &self.symbols[i])
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.index.get(name).map(|&i| &mut self.symbols[i])
    }

    fn insert(&mut self, symbol: Symbol) {
        self.index.insert(symbol.name.clone(), self.symbols.len());
        self.symbols.push(symbol);
    }
}

#[derive(Debug)]
pub struct SymbolTable {
    global: Scope,
    scopes: Vec<Scope>,
}

impl SymbolTable {
    /// Creates a table holding only the global scope, seeded with the
    /// built-in routines.
    pub fn new() -> Self {
        let mut global = Scope::default();
        for name in ["writeln", "write", "readln", "read"] {
            global.insert(Symbol::builtin_io(name));
        }
        global.insert(Symbol::function(
            "length",
            vec![(String::from("s"), VarType::String)],
            VarType::Integer,
            Position::null(),
        ));

        SymbolTable {
            global,
            scopes: vec![],
        }
    }

    /// Number of scopes, the global one included.
    pub fn depth(&self) -> usize {
        self.scopes.len() + 1
    }

    fn current(&self) -> &Scope {
        self.scopes.last().unwrap_or(&self.global)
    }

    fn current_mut(&mut self) -> &mut Scope {
        match self.scopes.last_mut() {
            Some(scope) => scope,
            None => &mut self.global,
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::default());
        tracing::debug!(depth = self.depth(), "enter scope");
    }

    /// Pops the current scope and returns an `UnusedVariable` warning for
    /// every variable in it that was never looked up. The global scope is
    /// never popped.
    pub fn exit_scope(&mut self) -> Vec<Error> {
        let Some(scope) = self.scopes.pop() else {
            return vec![];
        };
        tracing::debug!(depth = self.depth() + 1, symbols = scope.symbols.len(), "exit scope");

        scope
            .symbols
            .into_iter()
            .filter(|symbol| symbol.kind == SymbolKind::Variable && !symbol.used && !symbol.is_function_result())
            .map(|symbol| {
                tracing::warn!(name = %symbol.name, line = symbol.position.0, "unused variable");
                Error::new(ErrorImpl::UnusedVariable { name: symbol.name }, symbol.position)
            })
            .collect()
    }

    /// Adds a symbol to the current scope. Shadowing an outer scope is
    /// allowed, redeclaring within the same scope is not.
    pub fn define(&mut self, symbol: Symbol) -> Result<(), Error> {
        let scope = self.current_mut();

        if scope.get(&symbol.name).is_some() {
            return Err(Error::new(
                ErrorImpl::DuplicateDeclaration { name: symbol.name },
                symbol.position,
            ));
        }

        scope.insert(symbol);
        Ok(())
    }

    /// Finds the nearest symbol called `name` and marks it as used.
    pub fn lookup(&mut self, name: &str, position: Position) -> Result<&mut Symbol, Error> {
        self.find(name, false)
            .ok_or_else(|| Error::new(ErrorImpl::Undeclared { name: name.to_string() }, position))
    }

    /// Like [`SymbolTable::lookup`], but skips the implicit result variable
    /// of an enclosing function so that recursive calls reach the function.
    pub fn lookup_callable(&mut self, name: &str, position: Position) -> Result<&mut Symbol, Error> {
        self.find(name, true)
            .ok_or_else(|| Error::new(ErrorImpl::Undeclared { name: name.to_string() }, position))
    }

    fn find(&mut self, name: &str, skip_results: bool) -> Option<&mut Symbol> {
        let scopes = self
            .scopes
            .iter_mut()
            .rev()
            .chain(std::iter::once(&mut self.global));

        for scope in scopes {
            match scope.get_mut(name) {
                Some(symbol) if skip_results && symbol.is_function_result() => continue,
                Some(symbol) => {
                    symbol.used = true;
                    return Some(symbol);
                }
                None => {}
            }
        }
        None
    }

    /// Looks only at the current scope, without marking anything as used.
    pub fn get_local(&self, name: &str) -> Option<&Symbol> {
        self.current().get(name)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}
