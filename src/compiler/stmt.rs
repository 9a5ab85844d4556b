use crate::{
    ast::{
        expressions::{Expr, ExprKind},
        statements::{CaseOption, ForDirection, Stmt, StmtKind},
        types::VarType,
    },
    errors::errors::Error,
    type_checker::rules::settle,
    Position,
};

use super::{
    compiler::{invalid_input, Binding, Generator, LoopContext},
    expr::{coerce, expr_type, gen_call, gen_expression, gen_offset},
    instructions::{Instruction, Label},
};

/// Slot key and type of a scalar assignment target.
fn scalar_target(generator: &Generator, name: &str, position: Position) -> Result<(String, VarType), Error> {
    match generator.resolve(name) {
        Some(Binding::Variable { key, ty }) | Some(Binding::FunctionResult { key, ty }) => {
            Ok((key.clone(), ty.clone()))
        }
        _ => Err(invalid_input(format!("assignment to {:?}", name), position)),
    }
}

fn gen_assignment(generator: &mut Generator, target: &str, value: &Expr, position: Position) -> Result<usize, Error> {
    let (key, ty) = scalar_target(generator, target, position)?;
    let source = gen_expression(generator, value)?;
    coerce(generator, &ty, &source, position)?;

    let slot = generator.slot(&key);
    generator.emit(Instruction::StoreG(slot));
    Ok(slot)
}

fn gen_write(generator: &mut Generator, arguments: &[Expr], newline: bool) -> Result<(), Error> {
    for argument in arguments.iter() {
        let ty = gen_expression(generator, argument)?;
        let instruction = match settle(ty) {
            VarType::Integer | VarType::Boolean => Instruction::WriteI,
            VarType::Real => Instruction::WriteF,
            VarType::String => Instruction::WriteS,
            VarType::Char => Instruction::WriteChr,
            ty => {
                return Err(invalid_input(
                    format!("writing a value of type {}", ty),
                    argument.position,
                ))
            }
        };
        generator.emit(instruction);
    }

    if newline {
        generator.emit(Instruction::WriteLn);
    }
    Ok(())
}

/// `read` leaves a string on the stack; convert it for the target.
fn gen_read_value(generator: &mut Generator, ty: &VarType, position: Position) -> Result<(), Error> {
    generator.emit(Instruction::Read);
    match ty {
        VarType::Integer => generator.emit(Instruction::Atoi),
        VarType::Real => generator.emit(Instruction::Atof),
        VarType::String => {}
        ty => return Err(invalid_input(format!("reading into a {}", ty), position)),
    }
    Ok(())
}

fn gen_read(generator: &mut Generator, targets: &[Expr]) -> Result<(), Error> {
    for target in targets.iter() {
        let position = target.position;
        match &target.kind {
            ExprKind::Identifier(name) => {
                let (key, ty) = scalar_target(generator, name, position)?;
                gen_read_value(generator, &ty, position)?;
                let slot = generator.slot(&key);
                generator.emit(Instruction::StoreG(slot));
            }
            ExprKind::ArrayAccess { name, indices } => match generator.resolve(name).cloned() {
                Some(Binding::Array { key, element, dims }) => {
                    let slot = generator.slot(&key);
                    generator.emit(Instruction::PushG(slot));
                    gen_offset(generator, name, &dims, indices, position)?;
                    gen_read_value(generator, &element, position)?;
                    generator.emit(Instruction::StoreN);
                }
                _ => return Err(invalid_input(format!("reading into {:?}", name), position)),
            },
            _ => return Err(invalid_input("reading into an expression", position)),
        }
    }
    Ok(())
}

fn gen_loop_body(generator: &mut Generator, body: &[Stmt], exit: &Label, next: &Label) -> Result<bool, Error> {
    generator.loops.push(LoopContext {
        exit: exit.clone(),
        next: next.clone(),
        next_used: false,
    });
    for stmt in body.iter() {
        gen_statement(generator, stmt)?;
    }
    Ok(generator.loops.pop().map_or(false, |context| context.next_used))
}

fn gen_case(
    generator: &mut Generator,
    selector: &Expr,
    options: &[CaseOption],
    else_branch: Option<&Stmt>,
    position: Position,
) -> Result<(), Error> {
    let id = generator.next_if_id();
    let end = Label::new(format!("ENDCASE{}", id));

    // The selector is evaluated once and kept in a slot no identifier can name.
    let selector_type = gen_expression(generator, selector)?;
    let selector_slot = generator.slot(&format!("#case{}", id));
    generator.emit(Instruction::StoreG(selector_slot));

    for (i, option) in options.iter().enumerate() {
        if option.values.is_empty() {
            return Err(invalid_input("case option without values", position));
        }

        let next = Label::new(format!("CASE{}_{}", id, i));
        for (j, value) in option.values.iter().enumerate() {
            generator.emit(Instruction::PushG(selector_slot));
            if selector_type.is_integral() && expr_type(generator, value)? == VarType::Real {
                generator.emit(Instruction::Itof);
            }
            let value_type = gen_expression(generator, value)?;
            coerce(generator, &selector_type, &value_type, value.position)?;
            generator.emit(Instruction::Equal);
            if j > 0 {
                generator.emit(Instruction::Or);
            }
        }
        generator.emit(Instruction::Jz(next.clone()));
        gen_statement(generator, &option.body)?;
        generator.emit(Instruction::Jump(end.clone()));
        generator.emit(Instruction::Label(next));
    }

    if let Some(else_branch) = else_branch {
        gen_statement(generator, else_branch)?;
    }
    generator.emit(Instruction::Label(end));
    Ok(())
}

pub fn gen_statement(generator: &mut Generator, statement: &Stmt) -> Result<(), Error> {
    let position = statement.position;
    match &statement.kind {
        StmtKind::Empty => {}
        StmtKind::Compound(body) => {
            for stmt in body.iter() {
                gen_statement(generator, stmt)?;
            }
        }
        StmtKind::Assign { target, value } => {
            gen_assignment(generator, target, value, position)?;
        }
        StmtKind::ArrayAssign { target, indices, value } => match generator.resolve(target).cloned() {
            Some(Binding::Array { key, element, dims }) => {
                let slot = generator.slot(&key);
                generator.emit(Instruction::PushG(slot));
                gen_offset(generator, target, &dims, indices, position)?;
                let source = gen_expression(generator, value)?;
                coerce(generator, &element, &source, position)?;
                generator.emit(Instruction::StoreN);
            }
            _ => return Err(invalid_input(format!("element assignment to {:?}", target), position)),
        },
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            gen_expression(generator, condition)?;

            let id = generator.next_if_id();
            let else_label = Label::new(format!("ELSE{}", id));
            let end_label = Label::new(format!("ENDIF{}", id));

            generator.emit(Instruction::Jz(else_label.clone()));
            gen_statement(generator, then_branch)?;
            generator.emit(Instruction::Jump(end_label.clone()));
            generator.emit(Instruction::Label(else_label));
            if let Some(else_branch) = else_branch {
                gen_statement(generator, else_branch)?;
            }
            generator.emit(Instruction::Label(end_label));
        }
        StmtKind::While { condition, body } => {
            let id = generator.next_loop_id();
            let start = Label::new(format!("WHILE{}", id));
            let end = Label::new(format!("ENDWHILE{}", id));

            generator.emit(Instruction::Label(start.clone()));
            gen_expression(generator, condition)?;
            generator.emit(Instruction::Jz(end.clone()));
            gen_loop_body(generator, std::slice::from_ref(&**body), &end, &start)?;
            generator.emit(Instruction::Jump(start));
            generator.emit(Instruction::Label(end));
        }
        StmtKind::Repeat { body, condition } => {
            let id = generator.next_loop_id();
            let start = Label::new(format!("REPEAT{}", id));
            let end = Label::new(format!("ENDREPEAT{}", id));
            let next = Label::new(format!("CONT{}", id));

            generator.emit(Instruction::Label(start.clone()));
            if gen_loop_body(generator, body, &end, &next)? {
                generator.emit(Instruction::Label(next));
            }
            gen_expression(generator, condition)?;
            generator.emit(Instruction::Jz(start));
            generator.emit(Instruction::Label(end));
        }
        StmtKind::For {
            variable,
            start,
            direction,
            limit,
            body,
        } => {
            let slot = gen_assignment(generator, variable, start, position)?;

            let id = generator.next_loop_id();
            let loop_start = Label::new(format!("FOR{}", id));
            let loop_end = Label::new(format!("OUT{}", id));
            let next = Label::new(format!("CONT{}", id));

            let (compare, step) = match direction {
                ForDirection::To => (Instruction::InfEq, Instruction::Add),
                ForDirection::DownTo => (Instruction::SupEq, Instruction::Sub),
            };

            generator.emit(Instruction::Label(loop_start.clone()));
            generator.emit(Instruction::PushG(slot));
            gen_expression(generator, limit)?;
            generator.emit(compare);
            generator.emit(Instruction::Jz(loop_end.clone()));

            if gen_loop_body(generator, std::slice::from_ref(&**body), &loop_end, &next)? {
                generator.emit(Instruction::Label(next));
            }

            generator.emit(Instruction::PushG(slot));
            generator.emit(Instruction::PushI(1));
            generator.emit(step);
            generator.emit(Instruction::StoreG(slot));
            generator.emit(Instruction::Jump(loop_start));
            generator.emit(Instruction::Label(loop_end));
        }
        StmtKind::ProcedureCall { name, arguments } => match generator.resolve_callable(name).cloned() {
            Some(Binding::Routine(info)) => gen_call(generator, &info, name, arguments, position)?,
            None => match name.as_str() {
                "writeln" => gen_write(generator, arguments, true)?,
                "write" => gen_write(generator, arguments, false)?,
                "readln" | "read" => gen_read(generator, arguments)?,
                _ => return Err(invalid_input(format!("call to undeclared {:?}", name), position)),
            },
            Some(_) => return Err(invalid_input(format!("call to {:?}", name), position)),
        },
        StmtKind::Writeln { arguments } => gen_write(generator, arguments, true)?,
        StmtKind::Readln { targets } => gen_read(generator, targets)?,
        StmtKind::Break => {
            let exit = match generator.loops.last() {
                Some(context) => context.exit.clone(),
                None => return Err(invalid_input("break outside of a loop", position)),
            };
            generator.emit(Instruction::Jump(exit));
        }
        StmtKind::Continue => {
            let next = match generator.loops.last_mut() {
                Some(context) => {
                    context.next_used = true;
                    context.next.clone()
                }
                None => return Err(invalid_input("continue outside of a loop", position)),
            };
            generator.emit(Instruction::Jump(next));
        }
        StmtKind::Case {
            selector,
            options,
            else_branch,
        } => gen_case(generator, selector, options, else_branch.as_deref(), position)?,
    }
    Ok(())
}
