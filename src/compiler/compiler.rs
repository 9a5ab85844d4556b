//! Main code generation module.
//!
//! This module contains the [`Generator`] state and the program-level
//! driver. Generation walks a checked tree once and appends to an
//! [`InstructionStream`]: storage lives in numbered global slots handed out on
//! first write, and control flow is expressed with labels drawn from
//! counters that only ever increase.
//!
//! Layout of a generated program:
//!
//! ```text
//! START
//! <array allocations of the program block>
//! <main body>
//! STOP
//! <one subroutine per procedure or function>
//! ```

use std::collections::HashMap;

use crate::{
    ast::{
        ast::{Block, Program, RoutineDecl},
        expressions::{Expr, ExprKind, Literal},
        types::{Dimension, TypeSpec, VarType},
    },
    errors::errors::{Error, ErrorImpl},
    type_checker::type_checker::{type_check_with, Diagnostic, Severity},
    Config, Position,
};

use super::{
    instructions::{Instruction, InstructionStream, Label},
    stmt::gen_statement,
};

/// What the generator knows about a procedure or function.
#[derive(Debug, Clone)]
pub struct RoutineInfo {
    pub label: Label,
    /// One [`Binding::Variable`] or [`Binding::Array`] per parameter.
    pub params: Vec<Binding>,
    /// Slot key and type of a function's result.
    pub result: Option<(String, VarType)>,
}

/// A name as seen by the generator.
#[derive(Debug, Clone)]
pub enum Binding {
    Variable {
        key: String,
        ty: VarType,
    },
    /// The slot holds the address returned by `alloc`.
    Array {
        key: String,
        element: VarType,
        dims: Vec<(i64, i64)>,
    },
    FunctionResult {
        key: String,
        ty: VarType,
    },
    Constant(Literal),
    Routine(RoutineInfo),
}

impl Binding {
    pub fn var_type(&self) -> VarType {
        match self {
            Binding::Variable { ty, .. } | Binding::FunctionResult { ty, .. } => ty.clone(),
            Binding::Array { element, .. } => VarType::Array(Box::new(element.clone())),
            Binding::Constant(literal) => literal.declared_type(),
            Binding::Routine(info) => info
                .result
                .as_ref()
                .map_or(VarType::Unknown, |(_, ty)| ty.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct Frame {
    /// Qualifies slot keys so that shadowed names get their own storage.
    prefix: String,
    bindings: HashMap<String, Binding>,
}

/// Jump targets of the innermost enclosing loop.
#[derive(Debug)]
pub struct LoopContext {
    pub exit: Label,
    pub next: Label,
    /// Set once a `continue` jumps to `next`, so the marker is only placed
    /// when something refers to it.
    pub next_used: bool,
}

#[derive(Debug)]
pub struct Generator {
    pub config: Config,
    pub out: InstructionStream,
    pub loops: Vec<LoopContext>,

    slots: HashMap<String, usize>,
    next_slot: usize,
    loop_counter: usize,
    if_counter: usize,
    routine_counter: usize,
    frames: Vec<Frame>,
}

/// Number of elements spanned by `dims`, or `None` if it overflows.
pub fn element_count(dims: &[(i64, i64)]) -> Option<i64> {
    dims.iter()
        .try_fold(1i64, |count, &(start, end)| count.checked_mul(Dimension::new(start, end).len()?))
}

pub fn invalid_input(construct: impl Into<String>, position: Position) -> Error {
    Error::new(
        ErrorImpl::InvalidInput {
            construct: construct.into(),
        },
        position,
    )
}

impl Generator {
    pub fn new(config: Config) -> Self {
        Generator {
            config,
            out: InstructionStream::new(),
            loops: vec![],
            slots: HashMap::new(),
            next_slot: 0,
            loop_counter: 0,
            if_counter: 0,
            routine_counter: 0,
            frames: vec![],
        }
    }

    pub fn emit(&mut self, instruction: Instruction) {
        self.out.push(instruction);
    }

    /// Returns the slot for `key`, allocating the next free one if the key
    /// has never been seen. A read before any write also allocates.
    pub fn slot(&mut self, key: &str) -> usize {
        if let Some(&slot) = self.slots.get(key) {
            return slot;
        }

        let slot = self.next_slot;
        self.next_slot += 1;
        self.slots.insert(key.to_string(), slot);
        tracing::trace!(key, slot, "allocate slot");
        slot
    }

    pub fn slot_count(&self) -> usize {
        self.next_slot
    }

    pub fn next_loop_id(&mut self) -> usize {
        let id = self.loop_counter;
        self.loop_counter += 1;
        tracing::trace!(id, "allocate loop labels");
        id
    }

    pub fn next_if_id(&mut self) -> usize {
        let id = self.if_counter;
        self.if_counter += 1;
        tracing::trace!(id, "allocate conditional labels");
        id
    }

    fn enter_frame(&mut self, prefix: &str) {
        self.frames.push(Frame {
            prefix: prefix.to_string(),
            bindings: HashMap::new(),
        });
    }

    fn exit_frame(&mut self) {
        self.frames.pop();
    }

    fn key(&self, name: &str) -> String {
        match self.frames.last() {
            Some(frame) if !frame.prefix.is_empty() => format!("{}.{}", frame.prefix, name),
            _ => name.to_string(),
        }
    }

    fn bind(&mut self, name: &str, binding: Binding) {
        if let Some(frame) = self.frames.last_mut() {
            frame.bindings.insert(name.to_string(), binding);
        }
    }

    pub fn resolve(&self, name: &str) -> Option<&Binding> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.bindings.get(name))
    }

    /// Like [`Generator::resolve`], but sees through a function's result
    /// variable so that recursive calls reach the function itself.
    pub fn resolve_callable(&self, name: &str) -> Option<&Binding> {
        self.frames
            .iter()
            .rev()
            .filter_map(|frame| frame.bindings.get(name))
            .find(|binding| !matches!(binding, Binding::FunctionResult { .. }))
    }

    /// Value of an integer constant expression: a literal expression or the
    /// name of an integer constant.
    pub fn constant_value(&self, expr: &Expr) -> Option<i64> {
        match &expr.kind {
            ExprKind::Identifier(name) => match self.resolve(name) {
                Some(Binding::Constant(Literal::Integer(value))) => Some(*value),
                _ => None,
            },
            _ => expr.as_integer_constant(),
        }
    }

    fn resolve_type(&self, name: &str, position: Position) -> Result<VarType, Error> {
        VarType::from_name(name).ok_or_else(|| invalid_input(format!("unknown type {:?}", name), position))
    }

    fn binding_for(&self, key: String, spec: &TypeSpec, position: Position) -> Result<Binding, Error> {
        match spec {
            TypeSpec::Simple(name) => Ok(Binding::Variable {
                key,
                ty: self.resolve_type(name, position)?,
            }),
            TypeSpec::Array { ranges, element } => {
                let mut dims = vec![];
                for range in ranges.iter() {
                    let bounds = (self.constant_value(&range.start), self.constant_value(&range.end));
                    match bounds {
                        (Some(start), Some(end)) if start <= end => dims.push((start, end)),
                        _ => return Err(invalid_input("array bounds that are not constant", position)),
                    }
                }
                Ok(Binding::Array {
                    key,
                    element: self.resolve_type(element, position)?,
                    dims,
                })
            }
        }
    }

    /// Binds the constants, variables and routines declared in `block` in
    /// the current frame.
    fn declare_block(&mut self, block: &Block) -> Result<(), Error> {
        for constant in block.consts.iter() {
            self.bind(&constant.name, Binding::Constant(constant.value.clone()));
        }

        for declaration in block.vars.iter() {
            for name in declaration.names.iter() {
                let binding = self.binding_for(self.key(name), &declaration.ty, declaration.position)?;
                self.bind(name, binding);
            }
        }

        for routine in block.routines.iter() {
            let id = self.routine_counter;
            self.routine_counter += 1;

            let (kind, result_type) = match routine {
                RoutineDecl::Procedure(_) => ("PROC", None),
                RoutineDecl::Function(function) => {
                    let ty = match &function.return_type {
                        TypeSpec::Simple(name) => self.resolve_type(name, function.position)?,
                        TypeSpec::Array { .. } => {
                            return Err(invalid_input("function returning an array", function.position))
                        }
                    };
                    ("FUNC", Some(ty))
                }
            };
            let label = Label::new(format!("{}{}_{}", kind, id, routine.name()));

            let mut params = vec![];
            for param in routine.params() {
                let key = format!("{}.{}", label, param.name);
                params.push(self.binding_for(key, &param.ty, param.position)?);
            }
            let result = result_type.map(|ty| (format!("{}.{}", label, routine.name()), ty));

            self.bind(routine.name(), Binding::Routine(RoutineInfo { label, params, result }));
        }

        Ok(())
    }

    /// Allocates every array declared in `block`, in declaration order.
    fn gen_prologue(&mut self, block: &Block) -> Result<(), Error> {
        for declaration in block.vars.iter() {
            for name in declaration.names.iter() {
                if let Some(Binding::Array { key, dims, .. }) = self.resolve(name).cloned() {
                    let size = element_count(&dims)
                        .and_then(|size| usize::try_from(size).ok())
                        .ok_or_else(|| invalid_input("array size out of range", declaration.position))?;
                    self.emit(Instruction::Alloc(size));
                    let slot = self.slot(&key);
                    self.emit(Instruction::StoreG(slot));
                }
            }
        }
        Ok(())
    }

    fn gen_body(&mut self, block: &Block) -> Result<(), Error> {
        for stmt in block.body.iter() {
            gen_statement(self, stmt)?;
        }
        Ok(())
    }

    fn gen_routines(&mut self, block: &Block) -> Result<(), Error> {
        for routine in block.routines.iter() {
            self.gen_routine(routine)?;
        }
        Ok(())
    }

    fn gen_routine(&mut self, routine: &RoutineDecl) -> Result<(), Error> {
        let info = match self.resolve_callable(routine.name()) {
            Some(Binding::Routine(info)) => info.clone(),
            _ => return Err(invalid_input("routine without a declaration", routine.position())),
        };
        tracing::debug!(routine = routine.name(), label = %info.label, "generate routine");

        self.enter_frame(info.label.name());
        for (param, binding) in routine.params().iter().zip(info.params.iter()) {
            self.bind(&param.name, binding.clone());
        }
        if let Some((key, ty)) = &info.result {
            self.bind(
                routine.name(),
                Binding::FunctionResult {
                    key: key.clone(),
                    ty: ty.clone(),
                },
            );
        }

        self.emit(Instruction::Label(info.label.clone()));
        self.declare_block(routine.block())?;
        self.gen_prologue(routine.block())?;
        self.gen_body(routine.block())?;
        self.emit(Instruction::Return);

        self.gen_routines(routine.block())?;
        self.exit_frame();
        Ok(())
    }

    pub fn gen_program(&mut self, program: &Program) -> Result<(), Error> {
        self.enter_frame("");
        self.declare_block(&program.block)?;

        if self.config.emit_boundaries {
            self.emit(Instruction::Start);
        }
        self.gen_prologue(&program.block)?;
        self.gen_body(&program.block)?;
        if self.config.emit_boundaries {
            self.emit(Instruction::Stop);
        }

        self.gen_routines(&program.block)?;
        self.exit_frame();
        Ok(())
    }
}

/// Lowers a type-checked program with the default [`Config`].
pub fn generate(program: &Program) -> Result<InstructionStream, Error> {
    generate_with(program, &Config::default())
}

pub fn generate_with(program: &Program, config: &Config) -> Result<InstructionStream, Error> {
    tracing::debug!(program = %program.name, "generating code");

    let mut generator = Generator::new(config.clone());
    generator.gen_program(program)?;

    tracing::debug!(
        instructions = generator.out.len(),
        slots = generator.slot_count(),
        "code generation finished"
    );
    Ok(generator.out)
}

/// Type checks `program` and, only if that succeeds, generates code for it.
///
/// On success the stream is returned with any warnings. On failure every
/// diagnostic is returned and no code is generated.
pub fn compile(program: &Program, config: &Config) -> Result<(InstructionStream, Vec<Diagnostic>), Vec<Diagnostic>> {
    let (ok, diagnostics) = type_check_with(program, config);
    if !ok {
        return Err(diagnostics);
    }

    match generate_with(program, config) {
        Ok(stream) => Ok((stream, diagnostics)),
        Err(error) => Err(vec![Diagnostic {
            severity: Severity::Error,
            error,
        }]),
    }
}
