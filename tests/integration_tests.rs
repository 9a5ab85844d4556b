//! Integration tests for end-to-end compilation.
//!
//! These tests build syntax trees through the public constructors, run the
//! type checker and, when it succeeds, the code generator.
//!
//! Set `PASCAL_VM_LOG=debug` to see the passes' tracing output.

use std::collections::HashSet;

use pascal_vm::{
    ast::{
        ast::{Block, FunctionDecl, Param, Program, RoutineDecl, VarDecl},
        expressions::{BinOp, Expr},
        statements::{ForDirection, Stmt, StmtKind},
        types::{Range, TypeSpec},
    },
    compiler::{
        compiler::{compile, generate_with},
        instructions::{Instruction, InstructionStream},
    },
    type_checker::type_checker::type_check,
    Config,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    if let Ok(filter) = EnvFilter::try_from_env("PASCAL_VM_LOG") {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}

fn integer(names: &[&str]) -> VarDecl {
    VarDecl::new(names, TypeSpec::simple("integer"), 2)
}

fn error_names(program: &Program) -> Vec<String> {
    let (_, diagnostics) = type_check(program);
    diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|d| d.get_error_name().to_string())
        .collect()
}

/// Every label referenced by a jump is placed exactly once, and no label is
/// placed twice.
fn assert_labels_consistent(stream: &InstructionStream) {
    let placed = stream.labels();
    let unique: HashSet<_> = placed.iter().collect();
    assert_eq!(unique.len(), placed.len(), "duplicate label in\n{}", stream);

    for target in stream.targets() {
        let count = placed.iter().filter(|label| **label == target).count();
        assert_eq!(count, 1, "label {} placed {} times in\n{}", target, count, stream);
    }
}

#[test]
fn test_compile_simple_program() {
    init_tracing();

    let program = Program::new(
        "p",
        Block::new(
            vec![integer(&["x"])],
            vec![
                Stmt::assign("x", Expr::binary(Expr::int(2), BinOp::Add, Expr::int(3)), 3),
                Stmt::writeln(vec![Expr::var("x")], 4),
            ],
        ),
    );

    let (stream, warnings) = compile(&program, &Config::default()).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(
        stream.lines(),
        vec!["START", "pushi 2", "pushi 3", "add", "storeg 0", "pushg 0", "writei", "writeln", "STOP"]
    );
}

#[test]
fn test_undeclared_variable_produces_no_code() {
    init_tracing();

    let program = Program::new("p", Block::new(vec![], vec![Stmt::assign("y", Expr::int(1), 1)]));

    let diagnostics = compile(&program, &Config::default()).unwrap_err();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].get_error_name(), "Undeclared");
    assert!(diagnostics[0].to_string().contains("\"y\""));
}

#[test]
fn test_for_loop_labels_match() {
    let program = Program::new(
        "p",
        Block::new(
            vec![integer(&["i"])],
            vec![Stmt::for_loop(
                "i",
                Expr::int(1),
                ForDirection::To,
                Expr::int(3),
                Stmt::writeln(vec![Expr::var("i")], 3),
                3,
            )],
        ),
    );

    let (stream, _) = compile(&program, &Config::default()).unwrap();
    let lines = stream.lines();

    let start = lines.iter().position(|l| l == "FOR0:").unwrap();
    let end = lines.iter().position(|l| l == "OUT0:").unwrap();
    assert!(start < end);
    assert_eq!(lines[start + 3], "infeq");
    assert_eq!(lines[start + 4], "jz OUT0");
    assert_eq!(lines[end - 1], "jump FOR0");
    assert_eq!(&lines[end - 5..end - 1], &["pushg 0", "pushi 1", "add", "storeg 0"]);
    assert_labels_consistent(&stream);
}

#[test]
fn test_undeclared_condition_reports_once() {
    let program = Program::new(
        "p",
        Block::new(
            vec![],
            vec![Stmt::if_then(
                Expr::binary(Expr::var("x").at(2), BinOp::Gt, Expr::int(0)),
                Stmt::writeln(vec![Expr::string("pos")], 2),
                Some(Stmt::writeln(vec![Expr::string("neg")], 2)),
                2,
            )],
        ),
    );

    assert_eq!(error_names(&program), vec!["Undeclared"]);
    assert!(compile(&program, &Config::default()).is_err());
}

#[test]
fn test_redeclaration_reported_once() {
    let program = Program::new(
        "p",
        Block::new(
            vec![integer(&["x"]), integer(&["x"]), integer(&["x"])],
            vec![Stmt::assign("x", Expr::int(1), 3)],
        ),
    );

    assert_eq!(error_names(&program), vec!["DuplicateDeclaration"]);
}

#[test]
fn test_each_stray_break_and_continue_reported() {
    let program = Program::new(
        "p",
        Block::new(
            vec![],
            vec![
                Stmt::new(StmtKind::Break, 2),
                Stmt::while_do(Expr::boolean(true), Stmt::new(StmtKind::Break, 3), 3),
                Stmt::new(StmtKind::Continue, 4),
            ],
        ),
    );

    assert_eq!(error_names(&program), vec!["BreakOutsideLoop", "ContinueOutsideLoop"]);
}

#[test]
fn test_nested_control_flow_labels_are_unique() {
    // while i < 10 do begin
    //   for j := 1 to i do if j mod 2 = 0 then continue else writeln(j);
    //   repeat i := i + 1; if i > 5 then break until i > 3
    // end
    let program = Program::new(
        "p",
        Block::new(
            vec![integer(&["i", "j"])],
            vec![
                Stmt::assign("i", Expr::int(0), 3),
                Stmt::while_do(
                    Expr::binary(Expr::var("i"), BinOp::Lt, Expr::int(10)),
                    Stmt::compound(
                        vec![
                            Stmt::for_loop(
                                "j",
                                Expr::int(1),
                                ForDirection::To,
                                Expr::var("i"),
                                Stmt::if_then(
                                    Expr::binary(
                                        Expr::binary(Expr::var("j"), BinOp::Mod, Expr::int(2)),
                                        BinOp::Eq,
                                        Expr::int(0),
                                    ),
                                    Stmt::new(StmtKind::Continue, 6),
                                    Some(Stmt::writeln(vec![Expr::var("j")], 6)),
                                    6,
                                ),
                                5,
                            ),
                            Stmt::repeat_until(
                                vec![
                                    Stmt::assign("i", Expr::binary(Expr::var("i"), BinOp::Add, Expr::int(1)), 7),
                                    Stmt::if_then(
                                        Expr::binary(Expr::var("i"), BinOp::Gt, Expr::int(5)),
                                        Stmt::new(StmtKind::Break, 8),
                                        None,
                                        8,
                                    ),
                                ],
                                Expr::binary(Expr::var("i"), BinOp::Gt, Expr::int(3)),
                                7,
                            ),
                        ],
                        4,
                    ),
                    4,
                ),
            ],
        ),
    );

    let (stream, _) = compile(&program, &Config::default()).unwrap();
    assert_labels_consistent(&stream);

    let lines = stream.lines();
    for label in ["WHILE0:", "FOR1:", "CONT1:", "REPEAT2:", "ENDREPEAT2:", "ELSE0:", "ELSE1:"] {
        assert!(lines.contains(&label.to_string()), "missing {} in\n{}", label, stream);
    }
    assert!(lines.contains(&"jump ENDREPEAT2".to_string()));
}

#[test]
fn test_recursive_function_program() {
    let fact = RoutineDecl::Function(FunctionDecl {
        name: "fact".to_string(),
        params: vec![Param::new("n", TypeSpec::simple("integer"), 2)],
        return_type: TypeSpec::simple("integer"),
        block: Block::new(
            vec![],
            vec![Stmt::if_then(
                Expr::binary(Expr::var("n"), BinOp::LtEq, Expr::int(1)),
                Stmt::assign("fact", Expr::int(1), 3),
                Some(Stmt::assign(
                    "fact",
                    Expr::binary(
                        Expr::var("n"),
                        BinOp::Mul,
                        Expr::call("fact", vec![Expr::binary(Expr::var("n"), BinOp::Sub, Expr::int(1))]),
                    ),
                    4,
                )),
                3,
            )],
        ),
        position: pascal_vm::Position(2),
    });
    let program = Program::new(
        "p",
        Block::new(
            vec![],
            vec![Stmt::writeln(vec![Expr::call("fact", vec![Expr::int(5)])], 6)],
        )
        .with_routines(vec![fact]),
    );

    let (stream, _) = compile(&program, &Config::default()).unwrap();
    assert_labels_consistent(&stream);

    let calls = stream
        .iter()
        .filter(|i| matches!(i, Instruction::PushA(label) if label.name() == "FUNC0_fact"))
        .count();
    assert_eq!(calls, 2);

    let lines = stream.lines();
    let stop = lines.iter().position(|l| l == "STOP").unwrap();
    assert_eq!(lines[stop + 1], "FUNC0_fact:");
    assert_eq!(lines.last().map(String::as_str), Some("return"));
}

#[test]
fn test_array_sum_program() {
    let program = Program::new(
        "p",
        Block::new(
            vec![
                VarDecl::new(&["a"], TypeSpec::array(vec![Range::literal(1, 3)], "integer"), 2),
                integer(&["i", "total"]),
            ],
            vec![
                Stmt::for_loop(
                    "i",
                    Expr::int(1),
                    ForDirection::To,
                    Expr::int(3),
                    Stmt::readln(vec![Expr::index("a", vec![Expr::var("i")])], 4),
                    4,
                ),
                Stmt::assign("total", Expr::int(0), 5),
                Stmt::for_loop(
                    "i",
                    Expr::int(1),
                    ForDirection::To,
                    Expr::int(3),
                    Stmt::assign(
                        "total",
                        Expr::binary(Expr::var("total"), BinOp::Add, Expr::index("a", vec![Expr::var("i")])),
                        6,
                    ),
                    6,
                ),
                Stmt::writeln(vec![Expr::string("sum = "), Expr::var("total")], 7),
            ],
        ),
    );

    let (stream, warnings) = compile(&program, &Config::default()).unwrap();
    assert!(warnings.is_empty(), "{:?}", warnings);
    assert_labels_consistent(&stream);

    let lines = stream.lines();
    assert_eq!(&lines[..3], &["START", "alloc 3", "storeg 0"]);
    assert!(lines.windows(3).any(|w| w == ["read", "atoi", "storen"]));
    assert!(lines.windows(2).any(|w| w == ["loadn", "add"]));
    assert!(lines.windows(2).any(|w| w == ["pushs \"sum = \"", "writes"]));
}

#[test]
fn test_generation_without_boundaries() {
    let program = Program::new(
        "p",
        Block::new(vec![], vec![Stmt::writeln(vec![Expr::int(1)], 2)]),
    );
    let config = Config {
        emit_boundaries: false,
        ..Config::default()
    };

    let stream = generate_with(&program, &config).unwrap();
    assert_eq!(stream.lines(), vec!["pushi 1", "writei", "writeln"]);
}
