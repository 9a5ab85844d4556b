use crate::Position;

use super::expressions::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForDirection {
    To,
    DownTo,
}

/// One arm of a `case` statement: `1, 2: stmt`.
#[derive(Debug, Clone)]
pub struct CaseOption {
    pub values: Vec<Expr>,
    pub body: Stmt,
}

impl CaseOption {
    pub fn new(values: Vec<Expr>, body: Stmt) -> Self {
        CaseOption { values, body }
    }
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Empty,
    /// `begin ... end`
    Compound(Vec<Stmt>),
    Assign {
        target: String,
        value: Expr,
    },
    ArrayAssign {
        target: String,
        indices: Vec<Expr>,
        value: Expr,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    /// `repeat <body> until <condition>`
    Repeat {
        body: Vec<Stmt>,
        condition: Expr,
    },
    /// `for <variable> := <start> to|downto <limit> do <body>`
    For {
        variable: String,
        start: Expr,
        direction: ForDirection,
        limit: Expr,
        body: Box<Stmt>,
    },
    ProcedureCall {
        name: String,
        arguments: Vec<Expr>,
    },
    Writeln {
        arguments: Vec<Expr>,
    },
    /// Targets are identifiers or array/string element accesses.
    Readln {
        targets: Vec<Expr>,
    },
    Break,
    Continue,
    Case {
        selector: Expr,
        options: Vec<CaseOption>,
        else_branch: Option<Box<Stmt>>,
    },
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub position: Position,
}

impl Stmt {
    pub fn new(kind: StmtKind, line: u32) -> Self {
        Stmt {
            kind,
            position: Position(line),
        }
    }

    pub fn empty() -> Self {
        Stmt::new(StmtKind::Empty, 0)
    }

    pub fn compound(body: Vec<Stmt>, line: u32) -> Self {
        Stmt::new(StmtKind::Compound(body), line)
    }

    pub fn assign(target: &str, value: Expr, line: u32) -> Self {
        Stmt::new(
            StmtKind::Assign {
                target: target.to_string(),
                value,
            },
            line,
        )
    }

    pub fn array_assign(target: &str, indices: Vec<Expr>, value: Expr, line: u32) -> Self {
        Stmt::new(
            StmtKind::ArrayAssign {
                target: target.to_string(),
                indices,
                value,
            },
            line,
        )
    }

    pub fn if_then(condition: Expr, then_branch: Stmt, else_branch: Option<Stmt>, line: u32) -> Self {
        Stmt::new(
            StmtKind::If {
                condition,
                then_branch: Box::new(then_branch),
                else_branch: else_branch.map(Box::new),
            },
            line,
        )
    }

    pub fn while_do(condition: Expr, body: Stmt, line: u32) -> Self {
        Stmt::new(
            StmtKind::While {
                condition,
                body: Box::new(body),
            },
            line,
        )
    }

    pub fn repeat_until(body: Vec<Stmt>, condition: Expr, line: u32) -> Self {
        Stmt::new(StmtKind::Repeat { body, condition }, line)
    }

    pub fn for_loop(
        variable: &str,
        start: Expr,
        direction: ForDirection,
        limit: Expr,
        body: Stmt,
        line: u32,
    ) -> Self {
        Stmt::new(
            StmtKind::For {
                variable: variable.to_string(),
                start,
                direction,
                limit,
                body: Box::new(body),
            },
            line,
        )
    }

    pub fn call(name: &str, arguments: Vec<Expr>, line: u32) -> Self {
        Stmt::new(
            StmtKind::ProcedureCall {
                name: name.to_string(),
                arguments,
            },
            line,
        )
    }

    pub fn writeln(arguments: Vec<Expr>, line: u32) -> Self {
        Stmt::new(StmtKind::Writeln { arguments }, line)
    }

    pub fn readln(targets: Vec<Expr>, line: u32) -> Self {
        Stmt::new(StmtKind::Readln { targets }, line)
    }

    pub fn case_of(
        selector: Expr,
        options: Vec<CaseOption>,
        else_branch: Option<Stmt>,
        line: u32,
    ) -> Self {
        Stmt::new(
            StmtKind::Case {
                selector,
                options,
                else_branch: else_branch.map(Box::new),
            },
            line,
        )
    }
}
