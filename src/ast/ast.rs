use crate::Position;

use super::{expressions::Literal, statements::Stmt, types::TypeSpec};

/// Root of the tree: `program <name>; <block>.`
#[derive(Debug, Clone)]
pub struct Program {
    pub name: String,
    pub block: Block,
    pub position: Position,
}

impl Program {
    pub fn new(name: &str, block: Block) -> Self {
        Program {
            name: name.to_string(),
            block,
            position: Position(1),
        }
    }
}

/// Declarations followed by a `begin ... end` statement part.
///
/// Every block opens its own scope, both for the program itself and for
/// each procedure or function body.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub consts: Vec<ConstDecl>,
    pub vars: Vec<VarDecl>,
    pub routines: Vec<RoutineDecl>,
    pub body: Vec<Stmt>,
}

impl Block {
    pub fn new(vars: Vec<VarDecl>, body: Vec<Stmt>) -> Self {
        Block {
            consts: vec![],
            vars,
            routines: vec![],
            body,
        }
    }

    pub fn with_consts(mut self, consts: Vec<ConstDecl>) -> Self {
        self.consts = consts;
        self
    }

    pub fn with_routines(mut self, routines: Vec<RoutineDecl>) -> Self {
        self.routines = routines;
        self
    }
}

/// `const <name> = <literal>;`
#[derive(Debug, Clone)]
pub struct ConstDecl {
    pub name: String,
    pub value: Literal,
    pub position: Position,
}

/// `var a, b, c: <type>;`
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub names: Vec<String>,
    pub ty: TypeSpec,
    pub position: Position,
}

impl VarDecl {
    pub fn new(names: &[&str], ty: TypeSpec, line: u32) -> Self {
        VarDecl {
            names: names.iter().map(|name| name.to_string()).collect(),
            ty,
            position: Position(line),
        }
    }
}

#[derive(Debug, Clone)]
pub enum RoutineDecl {
    Procedure(ProcedureDecl),
    Function(FunctionDecl),
}

impl RoutineDecl {
    pub fn name(&self) -> &str {
        match self {
            RoutineDecl::Procedure(procedure) => &procedure.name,
            RoutineDecl::Function(function) => &function.name,
        }
    }

    pub fn params(&self) -> &[Param] {
        match self {
            RoutineDecl::Procedure(procedure) => &procedure.params,
            RoutineDecl::Function(function) => &function.params,
        }
    }

    pub fn block(&self) -> &Block {
        match self {
            RoutineDecl::Procedure(procedure) => &procedure.block,
            RoutineDecl::Function(function) => &function.block,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            RoutineDecl::Procedure(procedure) => procedure.position,
            RoutineDecl::Function(function) => function.position,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcedureDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub block: Block,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: TypeSpec,
    pub block: Block,
    pub position: Position,
}

/// A formal parameter. Parameters are passed by value.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: TypeSpec,
    pub position: Position,
}

impl Param {
    pub fn new(name: &str, ty: TypeSpec, line: u32) -> Self {
        Param {
            name: name.to_string(),
            ty,
            position: Position(line),
        }
    }
}
