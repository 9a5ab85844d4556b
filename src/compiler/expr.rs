use crate::{
    ast::{
        expressions::{BinOp, Expr, ExprKind, Literal, UnOp},
        types::VarType,
    },
    errors::errors::Error,
    type_checker::rules::{binary_result, unary_result},
    Position,
};

use super::{
    compiler::{element_count, invalid_input, Binding, Generator, RoutineInfo},
    instructions::Instruction,
};

pub fn gen_literal(generator: &mut Generator, literal: &Literal) {
    let instruction = match literal {
        Literal::Integer(value) => Instruction::PushI(*value),
        Literal::Real(value) => Instruction::PushF(*value),
        Literal::String(value) => Instruction::PushS(value.clone()),
        Literal::Boolean(value) => Instruction::PushI(*value as i64),
    };
    generator.emit(instruction);
}

/// Static type of `expr`, computed from the generator's bindings without
/// emitting anything.
pub fn expr_type(generator: &Generator, expr: &Expr) -> Result<VarType, Error> {
    let position = expr.position;
    match &expr.kind {
        ExprKind::Literal(literal) => Ok(literal.get_type()),
        ExprKind::Identifier(name) => match generator.resolve(name) {
            Some(Binding::Routine(RoutineInfo { result: None, .. })) => Err(invalid_input(
                format!("procedure {:?} used as a value", name),
                position,
            )),
            Some(binding) => Ok(binding.var_type()),
            None => Err(invalid_input(format!("undeclared identifier {:?}", name), position)),
        },
        ExprKind::ArrayAccess { name, .. } => match generator.resolve(name) {
            Some(Binding::Array { element, .. }) => Ok(element.clone()),
            Some(binding) if binding.var_type() == VarType::String => Ok(VarType::Char),
            _ => Err(invalid_input(format!("index into {:?}", name), position)),
        },
        ExprKind::Binary { left, op, right } => {
            let left = expr_type(generator, left)?;
            let right = expr_type(generator, right)?;
            lowered_binary_type(*op, &left, &right, position)
        }
        ExprKind::Unary { op, operand } => {
            let operand = expr_type(generator, operand)?;
            unary_result(*op, &operand)
                .ok_or_else(|| invalid_input(format!("operator {} on {}", op, operand), position))
        }
        ExprKind::FunctionCall { name, .. } => match generator.resolve_callable(name) {
            Some(Binding::Routine(RoutineInfo {
                result: Some((_, ty)), ..
            })) => Ok(ty.clone()),
            None if name == "length" => Ok(VarType::Integer),
            _ => Err(invalid_input(format!("call to {:?} in an expression", name), position)),
        },
    }
}

/// Converts the value on top of the stack from `source` to `target` where
/// the machine representations differ.
pub fn coerce(generator: &mut Generator, target: &VarType, source: &VarType, position: Position) -> Result<(), Error> {
    match (target, source) {
        (VarType::Real, source) if source.is_integral() => generator.emit(Instruction::Itof),
        // Characters are held as character codes.
        (VarType::Char, VarType::UntypedChar) => {
            generator.emit(Instruction::PushI(0));
            generator.emit(Instruction::CharAt);
        }
        (VarType::Char, source) if source.is_textual() => {
            return Err(invalid_input(format!("{} stored into a CHAR", source), position));
        }
        (VarType::String, VarType::Char) => {
            return Err(invalid_input("CHAR value stored into a STRING", position));
        }
        _ => {}
    }
    Ok(())
}

/// Pushes the zero-based, row-major offset of `indices` into an array with
/// the given dimensions.
pub fn gen_offset(
    generator: &mut Generator,
    name: &str,
    dims: &[(i64, i64)],
    indices: &[Expr],
    position: Position,
) -> Result<(), Error> {
    if dims.len() != indices.len() {
        return Err(invalid_input(
            format!("{} indices into {:?}", indices.len(), name),
            position,
        ));
    }

    for (k, (index, (start, _))) in indices.iter().zip(dims.iter()).enumerate() {
        let stride = element_count(&dims[k + 1..])
            .ok_or_else(|| invalid_input(format!("array {:?} is too large", name), position))?;

        gen_expression(generator, index)?;
        if *start != 0 {
            generator.emit(Instruction::PushI(*start));
            generator.emit(Instruction::Sub);
        }
        if stride != 1 {
            generator.emit(Instruction::PushI(stride));
            generator.emit(Instruction::Mul);
        }
        if k > 0 {
            generator.emit(Instruction::Add);
        }
    }
    Ok(())
}

/// Evaluates the arguments, stores them into the parameter slots and calls
/// the routine. A function's result is left in its result slot.
pub fn gen_call(
    generator: &mut Generator,
    info: &RoutineInfo,
    name: &str,
    arguments: &[Expr],
    position: Position,
) -> Result<(), Error> {
    if arguments.len() != info.params.len() {
        return Err(invalid_input(
            format!("{} arguments to {:?}", arguments.len(), name),
            position,
        ));
    }

    let mut keys = vec![];
    for (argument, param) in arguments.iter().zip(info.params.iter()) {
        let key = match param {
            Binding::Variable { key, .. } | Binding::Array { key, .. } => key,
            _ => return Err(invalid_input(format!("parameter of {:?}", name), position)),
        };
        let source = gen_expression(generator, argument)?;
        coerce(generator, &param.var_type(), &source, argument.position)?;
        keys.push(key.clone());
    }

    // Every argument is on the stack before any parameter is overwritten.
    for key in keys.iter().rev() {
        let slot = generator.slot(key);
        generator.emit(Instruction::StoreG(slot));
    }

    generator.emit(Instruction::PushA(info.label.clone()));
    generator.emit(Instruction::Call);
    Ok(())
}

fn gen_function_call(
    generator: &mut Generator,
    info: &RoutineInfo,
    name: &str,
    arguments: &[Expr],
    position: Position,
) -> Result<VarType, Error> {
    let (key, ty) = match &info.result {
        Some(result) => result.clone(),
        None => {
            return Err(invalid_input(
                format!("procedure {:?} used as a value", name),
                position,
            ))
        }
    };

    gen_call(generator, info, name, arguments, position)?;
    let slot = generator.slot(&key);
    generator.emit(Instruction::PushG(slot));
    Ok(ty)
}

fn gen_operand(
    generator: &mut Generator,
    operand: &Expr,
    ty: &VarType,
    as_float: bool,
    as_char: bool,
) -> Result<(), Error> {
    gen_expression(generator, operand)?;
    if as_float {
        coerce(generator, &VarType::Real, ty, operand.position)?;
    }
    if as_char {
        coerce(generator, &VarType::Char, ty, operand.position)?;
    }
    Ok(())
}

/// Type of the value a binary operator leaves on the stack. `/` on two
/// integral operands is integer division, so its value is an INTEGER even
/// though the checker types it as REAL.
fn lowered_binary_type(op: BinOp, left: &VarType, right: &VarType, position: Position) -> Result<VarType, Error> {
    if op == BinOp::Divide && left.is_integral() && right.is_integral() {
        return Ok(VarType::Integer);
    }
    binary_result(op, left, right)
        .ok_or_else(|| invalid_input(format!("operator {} on {} and {}", op, left, right), position))
}

fn gen_binary(generator: &mut Generator, left: &Expr, op: BinOp, right: &Expr, position: Position) -> Result<VarType, Error> {
    let left_type = expr_type(generator, left)?;
    let right_type = expr_type(generator, right)?;
    let result = lowered_binary_type(op, &left_type, &right_type, position)?;

    let concat = op == BinOp::Add && result == VarType::String;
    let as_float = !op.is_logical()
        && !matches!(op, BinOp::IntDiv | BinOp::Mod)
        && left_type.is_numeric()
        && right_type.is_numeric()
        && (left_type == VarType::Real || right_type == VarType::Real);
    let as_char = op.is_comparison()
        && matches!(
            (&left_type, &right_type),
            (VarType::Char, VarType::UntypedChar) | (VarType::UntypedChar, VarType::Char)
        );

    gen_operand(generator, left, &left_type, as_float, as_char)?;
    gen_operand(generator, right, &right_type, as_float, as_char)?;

    let pick = |integer: Instruction, float: Instruction| if as_float { float } else { integer };
    let instructions = match op {
        BinOp::Add if concat => vec![Instruction::Concat],
        BinOp::Add => vec![pick(Instruction::Add, Instruction::FAdd)],
        BinOp::Sub => vec![pick(Instruction::Sub, Instruction::FSub)],
        BinOp::Mul => vec![pick(Instruction::Mul, Instruction::FMul)],
        BinOp::Divide => vec![pick(Instruction::Div, Instruction::FDiv)],
        BinOp::IntDiv => vec![Instruction::Div],
        BinOp::Mod => vec![Instruction::Mod],
        BinOp::Eq => vec![Instruction::Equal],
        BinOp::NotEq => vec![Instruction::Equal, Instruction::Not],
        BinOp::Lt => vec![pick(Instruction::Inf, Instruction::FInf)],
        BinOp::LtEq => vec![pick(Instruction::InfEq, Instruction::FInfEq)],
        BinOp::Gt => vec![pick(Instruction::Sup, Instruction::FSup)],
        BinOp::GtEq => vec![pick(Instruction::SupEq, Instruction::FSupEq)],
        BinOp::And => vec![Instruction::And],
        BinOp::Or => vec![Instruction::Or],
    };
    for instruction in instructions {
        generator.emit(instruction);
    }

    Ok(result)
}

/// Emits the code computing `expr`, left to right in post-order, and returns
/// its static type.
pub fn gen_expression(generator: &mut Generator, expr: &Expr) -> Result<VarType, Error> {
    let position = expr.position;
    match &expr.kind {
        ExprKind::Literal(literal) => {
            gen_literal(generator, literal);
            Ok(literal.get_type())
        }
        ExprKind::Identifier(name) => {
            let binding = generator
                .resolve(name)
                .cloned()
                .ok_or_else(|| invalid_input(format!("undeclared identifier {:?}", name), position))?;

            match binding {
                Binding::Variable { key, ty } | Binding::FunctionResult { key, ty } => {
                    let slot = generator.slot(&key);
                    generator.emit(Instruction::PushG(slot));
                    Ok(ty)
                }
                Binding::Array { key, element, .. } => {
                    let slot = generator.slot(&key);
                    generator.emit(Instruction::PushG(slot));
                    Ok(VarType::Array(Box::new(element)))
                }
                Binding::Constant(literal) => {
                    gen_literal(generator, &literal);
                    Ok(literal.declared_type())
                }
                Binding::Routine(info) => gen_function_call(generator, &info, name, &[], position),
            }
        }
        ExprKind::ArrayAccess { name, indices } => {
            let binding = generator.resolve(name).cloned();
            match binding {
                Some(Binding::Array { key, element, dims }) => {
                    let slot = generator.slot(&key);
                    generator.emit(Instruction::PushG(slot));
                    gen_offset(generator, name, &dims, indices, position)?;
                    generator.emit(Instruction::LoadN);
                    Ok(element)
                }
                Some(Binding::Variable {
                    key,
                    ty: VarType::String,
                })
                | Some(Binding::FunctionResult {
                    key,
                    ty: VarType::String,
                }) if indices.len() == 1 => {
                    let slot = generator.slot(&key);
                    generator.emit(Instruction::PushG(slot));
                    gen_expression(generator, &indices[0])?;
                    // Source strings are 1-based.
                    generator.emit(Instruction::PushI(1));
                    generator.emit(Instruction::Sub);
                    generator.emit(Instruction::CharAt);
                    Ok(VarType::Char)
                }
                _ => Err(invalid_input(format!("index into {:?}", name), position)),
            }
        }
        ExprKind::Binary { left, op, right } => gen_binary(generator, left, *op, right, position),
        ExprKind::Unary { op, operand } => {
            let operand_type = expr_type(generator, operand)?;
            let result = unary_result(*op, &operand_type)
                .ok_or_else(|| invalid_input(format!("operator {} on {}", op, operand_type), position))?;

            match op {
                UnOp::Neg if operand_type == VarType::Real => {
                    generator.emit(Instruction::PushF(0.0));
                    gen_expression(generator, operand)?;
                    generator.emit(Instruction::FSub);
                }
                UnOp::Neg => {
                    generator.emit(Instruction::PushI(0));
                    gen_expression(generator, operand)?;
                    generator.emit(Instruction::Sub);
                }
                UnOp::Not => {
                    gen_expression(generator, operand)?;
                    generator.emit(Instruction::Not);
                }
            }
            Ok(result)
        }
        ExprKind::FunctionCall { name, arguments } => match generator.resolve_callable(name).cloned() {
            Some(Binding::Routine(info)) => gen_function_call(generator, &info, name, arguments, position),
            None if name == "length" => {
                if arguments.len() != 1 {
                    return Err(invalid_input(format!("{} arguments to \"length\"", arguments.len()), position));
                }
                gen_expression(generator, &arguments[0])?;
                generator.emit(Instruction::StrLen);
                Ok(VarType::Integer)
            }
            _ => Err(invalid_input(format!("call to {:?}", name), position)),
        },
    }
}
