use std::{collections::HashSet, fmt::Display};

use crate::{
    ast::{
        ast::{Block, Program, RoutineDecl},
        expressions::{Expr, ExprKind},
        statements::{Stmt, StmtKind},
        types::{Dimension, Range, TypeSpec, VarType},
    },
    errors::errors::{Error, ErrorImpl},
    Config, Position,
};

use super::{
    rules::{binary_result, is_compatible, is_mutually_compatible, unary_result},
    symbol_table::{Symbol, SymbolKind, SymbolTable},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A message produced while checking. Warnings never fail a check.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub error: Error,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn get_error_name(&self) -> &str {
        self.error.get_error_name()
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "error: {}", self.error),
            Severity::Warning => write!(f, "warning: {}", self.error),
        }
    }
}

/// A declared type after resolving its annotation.
enum ResolvedType {
    Scalar(VarType),
    Array(VarType, Vec<Dimension>),
}

#[derive(Debug)]
pub struct TypeChecker {
    pub symbols: SymbolTable,
    pub diagnostics: Vec<Diagnostic>,
    pub config: Config,
    loop_depth: usize,
    /// Names already reported as redeclared, per open scope.
    redeclared: Vec<HashSet<String>>,
}

impl TypeChecker {
    pub fn new(config: Config) -> Self {
        TypeChecker {
            symbols: SymbolTable::new(),
            diagnostics: vec![],
            config,
            loop_depth: 0,
            redeclared: vec![HashSet::new()],
        }
    }

    pub fn report(&mut self, error: Error) {
        tracing::trace!(kind = error.get_error_name(), %error, "semantic error");
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            error,
        });
    }

    pub fn warn(&mut self, error: Error) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            error,
        });
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn enter_scope(&mut self) {
        self.symbols.enter_scope();
        self.redeclared.push(HashSet::new());
    }

    pub fn exit_scope(&mut self) {
        let unused = self.symbols.exit_scope();
        self.redeclared.pop();
        if self.config.warn_unused {
            for warning in unused {
                self.warn(warning);
            }
        }
    }

    /// Defines a symbol, reporting a redeclaration once per name and scope.
    pub fn define(&mut self, symbol: Symbol) {
        let name = symbol.name.clone();
        if let Err(error) = self.symbols.define(symbol) {
            let first_report = match self.redeclared.last_mut() {
                Some(reported) => reported.insert(name),
                None => true,
            };
            if first_report {
                self.report(error);
            }
        }
    }

    fn mark_initialized(&mut self, name: &str) {
        if let Ok(symbol) = self.symbols.lookup(name, Position::null()) {
            symbol.initialized = true;
        }
    }
}

fn resolve_simple_type(type_checker: &mut TypeChecker, name: &str, position: Position) -> VarType {
    match VarType::from_name(name) {
        Some(ty) => ty,
        None => {
            type_checker.report(Error::new(ErrorImpl::UnknownType { name: name.to_string() }, position));
            VarType::Unknown
        }
    }
}

fn type_check_range(type_checker: &mut TypeChecker, range: &Range, position: Position) -> Dimension {
    let start_type = type_check_expr(type_checker, &range.start);
    let end_type = type_check_expr(type_checker, &range.end);

    let valid = |ty: &VarType| ty.is_integral() || ty.is_unknown();
    if !valid(&start_type) || !valid(&end_type) {
        type_checker.report(Error::new(
            ErrorImpl::InvalidRangeBounds {
                start: start_type,
                end: end_type,
            },
            position,
        ));
        return Dimension {
            start: None,
            end: None,
        };
    }

    // Only literal bounds can be checked here.
    let start = range.start.as_integer_constant();
    let end = range.end.as_integer_constant();
    let dimension = Dimension { start, end };
    if let (Some(start), Some(end)) = (start, end) {
        if dimension.len().is_none() {
            type_checker.report(Error::new(ErrorImpl::InvalidRange { start, end }, position));
        }
    }

    dimension
}

fn resolve_type_spec(type_checker: &mut TypeChecker, spec: &TypeSpec, position: Position) -> ResolvedType {
    match spec {
        TypeSpec::Simple(name) => ResolvedType::Scalar(resolve_simple_type(type_checker, name, position)),
        TypeSpec::Array { ranges, element } => {
            let element = resolve_simple_type(type_checker, element, position);
            let dimensions = ranges
                .iter()
                .map(|range| type_check_range(type_checker, range, position))
                .collect();
            ResolvedType::Array(element, dimensions)
        }
    }
}

fn resolved_var_type(resolved: &ResolvedType) -> VarType {
    match resolved {
        ResolvedType::Scalar(ty) => ty.clone(),
        ResolvedType::Array(element, _) => VarType::Array(Box::new(element.clone())),
    }
}

/// Checks the declarations and statements of a block inside the scope that
/// is already current.
pub fn type_check_block(type_checker: &mut TypeChecker, block: &Block) {
    for constant in block.consts.iter() {
        type_checker.define(Symbol::constant(
            &constant.name,
            constant.value.declared_type(),
            constant.position,
        ));
    }

    for declaration in block.vars.iter() {
        let resolved = resolve_type_spec(type_checker, &declaration.ty, declaration.position);
        for name in declaration.names.iter() {
            let symbol = match &resolved {
                ResolvedType::Scalar(ty) => Symbol::variable(name, ty.clone(), declaration.position),
                ResolvedType::Array(element, dimensions) => {
                    Symbol::array(name, element.clone(), dimensions.clone(), declaration.position)
                }
            };
            type_checker.define(symbol);
        }
    }

    for routine in block.routines.iter() {
        type_check_routine(type_checker, routine);
    }

    for stmt in block.body.iter() {
        type_check_stmt(type_checker, stmt);
    }
}

pub fn type_check_routine(type_checker: &mut TypeChecker, routine: &RoutineDecl) {
    let mut params = vec![];
    let mut param_symbols = vec![];
    for param in routine.params() {
        let resolved = resolve_type_spec(type_checker, &param.ty, param.position);
        params.push((param.name.clone(), resolved_var_type(&resolved)));

        let mut symbol = match resolved {
            ResolvedType::Scalar(ty) => Symbol::parameter(&param.name, ty, param.position),
            ResolvedType::Array(element, dimensions) => Symbol::array(&param.name, element, dimensions, param.position),
        };
        symbol.kind = SymbolKind::Parameter;
        symbol.initialized = true;
        param_symbols.push(symbol);
    }

    let return_type = match routine {
        RoutineDecl::Procedure(procedure) => {
            type_checker.define(Symbol::procedure(&procedure.name, params, procedure.position));
            None
        }
        RoutineDecl::Function(function) => {
            let return_type = resolve_simple_return(type_checker, &function.return_type, function.position);
            type_checker.define(Symbol::function(
                &function.name,
                params,
                return_type.clone(),
                function.position,
            ));
            Some(return_type)
        }
    };

    type_checker.enter_scope();
    for symbol in param_symbols {
        type_checker.define(symbol);
    }
    if let Some(return_type) = &return_type {
        type_checker.define(Symbol::function_result(routine.name(), return_type.clone(), routine.position()));
    }

    type_check_block(type_checker, routine.block());

    if return_type.is_some() {
        let assigned = type_checker
            .symbols
            .get_local(routine.name())
            .map_or(true, |symbol| symbol.initialized);
        if !assigned {
            type_checker.report(Error::new(
                ErrorImpl::MissingReturnValue {
                    function: routine.name().to_string(),
                },
                routine.position(),
            ));
        }
    }
    type_checker.exit_scope();
}

fn resolve_simple_return(type_checker: &mut TypeChecker, spec: &TypeSpec, position: Position) -> VarType {
    let resolved = resolve_type_spec(type_checker, spec, position);
    resolved_var_type(&resolved)
}

/// Checks `target := value`. Returns the target's declared type when the
/// target resolved to an assignable symbol.
fn type_check_assignment(
    type_checker: &mut TypeChecker,
    target: &str,
    value: &Expr,
    position: Position,
) -> Option<VarType> {
    let target_type = match type_checker.symbols.lookup(target, position) {
        Ok(symbol) => match symbol.kind {
            SymbolKind::Variable | SymbolKind::Parameter => Ok(symbol.ty.clone()),
            kind => Err(Error::new(
                ErrorImpl::InvalidAssignmentTarget {
                    name: target.to_string(),
                    kind: kind.to_string(),
                },
                position,
            )),
        },
        Err(error) => Err(error),
    };

    let value_type = type_check_expr(type_checker, value);

    match target_type {
        Ok(target_type) => {
            if is_compatible(&target_type, &value_type) {
                type_checker.mark_initialized(target);
            } else {
                type_checker.report(Error::new(
                    ErrorImpl::TypeMismatch {
                        context: format!("assignment to {:?}", target),
                        expected: target_type.clone(),
                        received: value_type,
                    },
                    position,
                ));
            }
            Some(target_type)
        }
        Err(error) => {
            type_checker.report(error);
            None
        }
    }
}

fn type_check_condition(type_checker: &mut TypeChecker, condition: &Expr, construct: &str, position: Position) {
    let condition_type = type_check_expr(type_checker, condition);
    if condition_type != VarType::Boolean && !condition_type.is_unknown() {
        type_checker.report(Error::new(
            ErrorImpl::NonBooleanCondition {
                construct: construct.to_string(),
                received: condition_type,
            },
            position,
        ));
    }
}

fn type_check_loop_body(type_checker: &mut TypeChecker, body: &Stmt) {
    type_checker.loop_depth += 1;
    type_check_stmt(type_checker, body);
    type_checker.loop_depth -= 1;
}

pub fn type_check_stmt(type_checker: &mut TypeChecker, stmt: &Stmt) {
    let position = stmt.position;
    match &stmt.kind {
        StmtKind::Empty => {}
        StmtKind::Compound(body) => {
            for stmt in body.iter() {
                type_check_stmt(type_checker, stmt);
            }
        }
        StmtKind::Assign { target, value } => {
            type_check_assignment(type_checker, target, value, position);
        }
        StmtKind::ArrayAssign { target, indices, value } => {
            let element_type = type_check_index_access(type_checker, target, indices, position);
            let is_string = type_checker
                .symbols
                .lookup(target, position)
                .map_or(false, |symbol| symbol.ty == VarType::String);
            let value_type = type_check_expr(type_checker, value);

            if is_string {
                type_checker.report(Error::new(
                    ErrorImpl::InvalidAssignmentTarget {
                        name: target.clone(),
                        kind: String::from("character of string"),
                    },
                    position,
                ));
            } else if !is_compatible(&element_type, &value_type) {
                type_checker.report(Error::new(
                    ErrorImpl::TypeMismatch {
                        context: format!("array assignment to {:?}", target),
                        expected: element_type,
                        received: value_type,
                    },
                    position,
                ));
            }
        }
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            type_check_condition(type_checker, condition, "if", position);
            type_check_stmt(type_checker, then_branch);
            if let Some(else_branch) = else_branch {
                type_check_stmt(type_checker, else_branch);
            }
        }
        StmtKind::While { condition, body } => {
            type_check_condition(type_checker, condition, "while", position);
            type_check_loop_body(type_checker, body);
        }
        StmtKind::Repeat { body, condition } => {
            type_checker.loop_depth += 1;
            for stmt in body.iter() {
                type_check_stmt(type_checker, stmt);
            }
            type_checker.loop_depth -= 1;
            // The condition may read what the body just assigned.
            type_check_condition(type_checker, condition, "repeat", position);
        }
        StmtKind::For {
            variable,
            start,
            limit,
            body,
            ..
        } => {
            let counter_type = type_check_assignment(type_checker, variable, start, position);
            if let Some(counter_type) = counter_type {
                if counter_type != VarType::Integer && !counter_type.is_unknown() {
                    type_checker.report(Error::new(
                        ErrorImpl::TypeMismatch {
                            context: format!("for loop counter {:?}", variable),
                            expected: VarType::Integer,
                            received: counter_type,
                        },
                        position,
                    ));
                }
            }

            let limit_type = type_check_expr(type_checker, limit);
            if !limit_type.is_integral() && !limit_type.is_unknown() {
                type_checker.report(Error::new(
                    ErrorImpl::TypeMismatch {
                        context: String::from("for loop limit"),
                        expected: VarType::Integer,
                        received: limit_type,
                    },
                    position,
                ));
            }

            type_check_loop_body(type_checker, body);
        }
        StmtKind::ProcedureCall { name, arguments } => {
            type_check_call(type_checker, name, arguments, position, true);
        }
        StmtKind::Writeln { arguments } => {
            type_check_write_arguments(type_checker, "writeln", arguments, position);
        }
        StmtKind::Readln { targets } => {
            for target in targets.iter() {
                type_check_read_target(type_checker, target);
            }
        }
        StmtKind::Break => {
            if type_checker.loop_depth == 0 {
                type_checker.report(Error::new(ErrorImpl::BreakOutsideLoop, position));
            }
        }
        StmtKind::Continue => {
            if type_checker.loop_depth == 0 {
                type_checker.report(Error::new(ErrorImpl::ContinueOutsideLoop, position));
            }
        }
        StmtKind::Case {
            selector,
            options,
            else_branch,
        } => {
            let selector_type = type_check_expr(type_checker, selector);
            for option in options.iter() {
                for value in option.values.iter() {
                    let value_type = type_check_expr(type_checker, value);
                    if !is_mutually_compatible(&selector_type, &value_type) {
                        type_checker.report(Error::new(
                            ErrorImpl::TypeMismatch {
                                context: String::from("case label"),
                                expected: selector_type.clone(),
                                received: value_type,
                            },
                            option.body.position,
                        ));
                    }
                }
                type_check_stmt(type_checker, &option.body);
            }
            if let Some(else_branch) = else_branch {
                type_check_stmt(type_checker, else_branch);
            }
        }
    }
}

fn type_check_write_arguments(type_checker: &mut TypeChecker, routine: &str, arguments: &[Expr], position: Position) {
    for (index, argument) in arguments.iter().enumerate() {
        let ty = type_check_expr(type_checker, argument);
        if let VarType::Array(_) = ty {
            type_checker.report(Error::new(
                ErrorImpl::ParameterTypeMismatch {
                    routine: routine.to_string(),
                    index: index + 1,
                    expected: VarType::String,
                    received: ty,
                },
                position,
            ));
        }
    }
}

fn type_check_read_target(type_checker: &mut TypeChecker, target: &Expr) {
    let readable = |ty: &VarType| {
        matches!(ty, VarType::Integer | VarType::Real | VarType::String | VarType::Unknown)
    };

    match &target.kind {
        ExprKind::Identifier(name) => {
            let symbol = match type_checker.symbols.lookup(name, target.position) {
                Ok(symbol) => symbol,
                Err(error) => {
                    type_checker.report(error);
                    return;
                }
            };

            let problem = match symbol.kind {
                SymbolKind::Variable | SymbolKind::Parameter if readable(&symbol.ty) => {
                    symbol.initialized = true;
                    None
                }
                SymbolKind::Variable | SymbolKind::Parameter => {
                    Some(format!("variable {:?} of type {}", name, symbol.ty))
                }
                kind => Some(format!("{} {:?}", kind, name)),
            };

            if let Some(description) = problem {
                type_checker.report(Error::new(
                    ErrorImpl::InvalidReadTarget {
                        target: description,
                    },
                    target.position,
                ));
            }
        }
        ExprKind::ArrayAccess { name, indices } => {
            let element_type = type_check_index_access(type_checker, name, indices, target.position);
            let is_string = type_checker
                .symbols
                .lookup(name, target.position)
                .map_or(false, |symbol| symbol.ty == VarType::String);
            if is_string || !readable(&element_type) {
                type_checker.report(Error::new(
                    ErrorImpl::InvalidReadTarget {
                        target: format!("element of {:?} of type {}", name, element_type),
                    },
                    target.position,
                ));
            }
        }
        _ => {
            type_check_expr(type_checker, target);
            type_checker.report(Error::new(
                ErrorImpl::InvalidReadTarget {
                    target: String::from("an expression"),
                },
                target.position,
            ));
        }
    }
}

/// Checks `name[indices]` and returns the element type: the array's element
/// type, or CHAR when indexing a string.
fn type_check_index_access(
    type_checker: &mut TypeChecker,
    name: &str,
    indices: &[Expr],
    position: Position,
) -> VarType {
    let base = match type_checker.symbols.lookup(name, position) {
        Ok(symbol) => match (&symbol.ty, symbol.dimensions()) {
            (VarType::Array(element), Some(dimensions)) => Ok(Some(((**element).clone(), dimensions.len()))),
            (VarType::String, _) => Ok(Some((VarType::Char, 1))),
            (VarType::Unknown, _) => Ok(None),
            (ty, _) => Err(Error::new(
                ErrorImpl::NotIndexable {
                    name: name.to_string(),
                    ty: ty.clone(),
                },
                position,
            )),
        },
        Err(error) => Err(error),
    };

    let index_types: Vec<VarType> = indices
        .iter()
        .map(|index| type_check_expr(type_checker, index))
        .collect();

    let (element, expected) = match base {
        Ok(Some(base)) => base,
        Ok(None) => return VarType::Unknown,
        Err(error) => {
            type_checker.report(error);
            return VarType::Unknown;
        }
    };

    if indices.len() != expected {
        type_checker.report(Error::new(
            ErrorImpl::IndexCountMismatch {
                name: name.to_string(),
                expected,
                received: indices.len(),
            },
            position,
        ));
    }

    for index_type in index_types {
        if !index_type.is_integral() && !index_type.is_unknown() {
            type_checker.report(Error::new(
                ErrorImpl::InvalidIndexType {
                    name: name.to_string(),
                    received: index_type,
                },
                position,
            ));
        }
    }

    element
}

/// Checks a call to `name`. Functions may be called as statements, in which
/// case the result is discarded; procedures may not appear in expressions.
fn type_check_call(
    type_checker: &mut TypeChecker,
    name: &str,
    arguments: &[Expr],
    position: Position,
    as_statement: bool,
) -> VarType {
    let callee = match type_checker.symbols.lookup_callable(name, position) {
        Ok(symbol) => match (symbol.kind, symbol.signature()) {
            (SymbolKind::Procedure, _) if !as_statement => Err(Error::new(
                ErrorImpl::NotAFunction { name: name.to_string() },
                position,
            )),
            (SymbolKind::Procedure | SymbolKind::Function, Some(signature)) => Ok(signature.clone()),
            _ => Err(Error::new(ErrorImpl::NotCallable { name: name.to_string() }, position)),
        },
        Err(error) => Err(error),
    };

    let signature = match callee {
        Ok(signature) => signature,
        Err(error) => {
            type_checker.report(error);
            for argument in arguments.iter() {
                type_check_expr(type_checker, argument);
            }
            return VarType::Unknown;
        }
    };

    if signature.variadic {
        if name == "read" || name == "readln" {
            for argument in arguments.iter() {
                type_check_read_target(type_checker, argument);
            }
        } else {
            type_check_write_arguments(type_checker, name, arguments, position);
        }
        return VarType::Unknown;
    }

    let return_type = signature.return_type.clone().unwrap_or(VarType::Unknown);

    if arguments.len() != signature.params.len() {
        type_checker.report(Error::new(
            ErrorImpl::ArityMismatch {
                routine: name.to_string(),
                expected: signature.params.len(),
                received: arguments.len(),
            },
            position,
        ));
        for argument in arguments.iter() {
            type_check_expr(type_checker, argument);
        }
        return return_type;
    }

    for (index, (argument, (_, expected))) in arguments.iter().zip(signature.params.iter()).enumerate() {
        let received = type_check_expr(type_checker, argument);
        if !is_compatible(expected, &received) {
            type_checker.report(Error::new(
                ErrorImpl::ParameterTypeMismatch {
                    routine: name.to_string(),
                    index: index + 1,
                    expected: expected.clone(),
                    received,
                },
                argument.position,
            ));
        }
    }

    return_type
}

pub fn type_check_expr(type_checker: &mut TypeChecker, expr: &Expr) -> VarType {
    let position = expr.position;
    match &expr.kind {
        ExprKind::Literal(literal) => literal.get_type(),
        ExprKind::Identifier(name) => {
            let resolved = match type_checker.symbols.lookup(name, position) {
                Ok(symbol) => match symbol.kind {
                    SymbolKind::Procedure => Err(Error::new(
                        ErrorImpl::NotAFunction { name: name.clone() },
                        position,
                    )),
                    // A bare function name outside its own body is a call
                    // without arguments.
                    SymbolKind::Function => match symbol.signature() {
                        Some(signature) if !signature.params.is_empty() => Err(Error::new(
                            ErrorImpl::ArityMismatch {
                                routine: name.clone(),
                                expected: signature.params.len(),
                                received: 0,
                            },
                            position,
                        )),
                        _ => Ok(symbol.ty.clone()),
                    },
                    _ => Ok(symbol.ty.clone()),
                },
                Err(error) => Err(error),
            };

            match resolved {
                Ok(ty) => ty,
                Err(error) => {
                    type_checker.report(error);
                    VarType::Unknown
                }
            }
        }
        ExprKind::ArrayAccess { name, indices } => type_check_index_access(type_checker, name, indices, position),
        ExprKind::Binary { left, op, right } => {
            let left_type = type_check_expr(type_checker, left);
            let right_type = type_check_expr(type_checker, right);
            match binary_result(*op, &left_type, &right_type) {
                Some(ty) => ty,
                None => {
                    type_checker.report(Error::new(
                        ErrorImpl::InvalidOperandTypes {
                            operator: op.to_string(),
                            left: left_type,
                            right: right_type,
                        },
                        position,
                    ));
                    VarType::Unknown
                }
            }
        }
        ExprKind::Unary { op, operand } => {
            let operand_type = type_check_expr(type_checker, operand);
            match unary_result(*op, &operand_type) {
                Some(ty) => ty,
                None => {
                    type_checker.report(Error::new(
                        ErrorImpl::InvalidOperandType {
                            operator: op.to_string(),
                            operand: operand_type,
                        },
                        position,
                    ));
                    VarType::Unknown
                }
            }
        }
        ExprKind::FunctionCall { name, arguments } => {
            type_check_call(type_checker, name, arguments, position, false)
        }
    }
}

pub fn type_check_program(type_checker: &mut TypeChecker, program: &Program) {
    type_checker.enter_scope();
    type_check_block(type_checker, &program.block);
    type_checker.exit_scope();
}

/// Checks `program` with the default [`Config`]. Returns whether the program
/// is free of errors, along with every diagnostic in the order found.
pub fn type_check(program: &Program) -> (bool, Vec<Diagnostic>) {
    type_check_with(program, &Config::default())
}

pub fn type_check_with(program: &Program, config: &Config) -> (bool, Vec<Diagnostic>) {
    tracing::debug!(program = %program.name, "type checking");

    let mut type_checker = TypeChecker::new(config.clone());
    type_check_program(&mut type_checker, program);

    let errors = type_checker.error_count();
    tracing::debug!(
        errors,
        warnings = type_checker.diagnostics.len() - errors,
        "type checking finished"
    );

    (errors == 0, type_checker.diagnostics)
}
