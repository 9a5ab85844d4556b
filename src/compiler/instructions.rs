//! Stack machine instructions and the stream the generator appends to.

use std::fmt::Display;

/// A jump target. Rendered as `NAME:` when placed, and as a bare `NAME`
/// when used as an operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(pub String);

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Label(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    PushI(i64),
    PushF(f64),
    PushS(String),
    PushG(usize),
    StoreG(usize),
    PushA(Label),

    Add,
    Sub,
    Mul,
    Div,
    Mod,
    FAdd,
    FSub,
    FMul,
    FDiv,
    Itof,
    Concat,

    Equal,
    Inf,
    InfEq,
    Sup,
    SupEq,
    FInf,
    FInfEq,
    FSup,
    FSupEq,
    And,
    Or,
    Not,

    CharAt,
    StrLen,
    Atoi,
    Atof,
    Read,
    WriteI,
    WriteF,
    WriteS,
    WriteChr,
    WriteLn,

    /// Allocates a block of `n` cells and pushes its address.
    Alloc(usize),
    LoadN,
    StoreN,

    Jump(Label),
    Jz(Label),
    /// A label marker, not an executable instruction.
    Label(Label),
    Call,
    Return,
    Start,
    Stop,
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::PushI(value) => write!(f, "pushi {}", value),
            // Debug keeps the decimal point on whole numbers.
            Instruction::PushF(value) => write!(f, "pushf {:?}", value),
            Instruction::PushS(value) => write!(f, "pushs \"{}\"", escape(value)),
            Instruction::PushG(slot) => write!(f, "pushg {}", slot),
            Instruction::StoreG(slot) => write!(f, "storeg {}", slot),
            Instruction::PushA(label) => write!(f, "pusha {}", label),
            Instruction::Add => write!(f, "add"),
            Instruction::Sub => write!(f, "sub"),
            Instruction::Mul => write!(f, "mul"),
            Instruction::Div => write!(f, "div"),
            Instruction::Mod => write!(f, "mod"),
            Instruction::FAdd => write!(f, "fadd"),
            Instruction::FSub => write!(f, "fsub"),
            Instruction::FMul => write!(f, "fmul"),
            Instruction::FDiv => write!(f, "fdiv"),
            Instruction::Itof => write!(f, "itof"),
            Instruction::Concat => write!(f, "concat"),
            Instruction::Equal => write!(f, "equal"),
            Instruction::Inf => write!(f, "inf"),
            Instruction::InfEq => write!(f, "infeq"),
            Instruction::Sup => write!(f, "sup"),
            Instruction::SupEq => write!(f, "supeq"),
            Instruction::FInf => write!(f, "finf"),
            Instruction::FInfEq => write!(f, "finfeq"),
            Instruction::FSup => write!(f, "fsup"),
            Instruction::FSupEq => write!(f, "fsupeq"),
            Instruction::And => write!(f, "and"),
            Instruction::Or => write!(f, "or"),
            Instruction::Not => write!(f, "not"),
            Instruction::CharAt => write!(f, "charat"),
            Instruction::StrLen => write!(f, "strlen"),
            Instruction::Atoi => write!(f, "atoi"),
            Instruction::Atof => write!(f, "atof"),
            Instruction::Read => write!(f, "read"),
            Instruction::WriteI => write!(f, "writei"),
            Instruction::WriteF => write!(f, "writef"),
            Instruction::WriteS => write!(f, "writes"),
            Instruction::WriteChr => write!(f, "writechr"),
            Instruction::WriteLn => write!(f, "writeln"),
            Instruction::Alloc(size) => write!(f, "alloc {}", size),
            Instruction::LoadN => write!(f, "loadn"),
            Instruction::StoreN => write!(f, "storen"),
            Instruction::Jump(label) => write!(f, "jump {}", label),
            Instruction::Jz(label) => write!(f, "jz {}", label),
            Instruction::Label(label) => write!(f, "{}:", label),
            Instruction::Call => write!(f, "call"),
            Instruction::Return => write!(f, "return"),
            Instruction::Start => write!(f, "START"),
            Instruction::Stop => write!(f, "STOP"),
        }
    }
}

/// Append-only buffer of generated instructions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstructionStream {
    instructions: Vec<Instruction>,
}

impl InstructionStream {
    pub fn new() -> Self {
        InstructionStream::default()
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Every instruction rendered on its own line, without line breaks.
    pub fn lines(&self) -> Vec<String> {
        self.instructions.iter().map(|i| i.to_string()).collect()
    }

    /// Labels placed in the stream, in order.
    pub fn labels(&self) -> Vec<&Label> {
        self.instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::Label(label) => Some(label),
                _ => None,
            })
            .collect()
    }

    /// Labels referenced by `jump`, `jz` and `pusha`.
    pub fn targets(&self) -> Vec<&Label> {
        self.instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::Jump(label) | Instruction::Jz(label) | Instruction::PushA(label) => Some(label),
                _ => None,
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a InstructionStream {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

impl Display for InstructionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for instruction in self.instructions.iter() {
            writeln!(f, "{}", instruction)?;
        }
        Ok(())
    }
}
