use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;

use crate::ir::{BinaryOp, IRInstruction, IRValue};

/// The abstract machine has exactly one general register. There is no
/// allocator: every instruction works through `R1`, and that is observable
/// output, not an oversight to fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Register {
    R1,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AsmOperand {
    Register(Register),
    Imm(i64),
    Pseudo(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AsmOp {
    Add,
    Sub,
    Mul,
    Div,
    CmpGt,
    CmpLt,
    CmpGe,
    CmpLe,
    CmpEq,
    CmpNe,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AsmInstruction {
    Mov {
        src: AsmOperand,
        dst: AsmOperand,
    },
    Binary {
        op: AsmOp,
        dst: Register,
        src: AsmOperand,
    },
    JumpIfFalse {
        condition: AsmOperand,
        target: String,
    },
    Jump {
        target: String,
    },
    Label {
        name: String,
    },
}

lazy_static! {
    static ref OPCODE_TABLE: HashMap<BinaryOp, AsmOp> = {
        let mut table = HashMap::new();
        table.insert(BinaryOp::Add, AsmOp::Add);
        table.insert(BinaryOp::Sub, AsmOp::Sub);
        table.insert(BinaryOp::Mul, AsmOp::Mul);
        table.insert(BinaryOp::Div, AsmOp::Div);
        table.insert(BinaryOp::Greater, AsmOp::CmpGt);
        table.insert(BinaryOp::Less, AsmOp::CmpLt);
        table.insert(BinaryOp::GreaterEqual, AsmOp::CmpGe);
        table.insert(BinaryOp::LessEqual, AsmOp::CmpLe);
        table.insert(BinaryOp::Equal, AsmOp::CmpEq);
        table.insert(BinaryOp::NotEqual, AsmOp::CmpNe);
        table
    };
}

fn operand(value: &IRValue) -> AsmOperand {
    match value {
        IRValue::Constant(n) => AsmOperand::Imm(*n),
        IRValue::Var(name) => AsmOperand::Pseudo(name.clone()),
        IRValue::Temp(n) => AsmOperand::Pseudo(format!("t{}", n)),
    }
}

// IR labels L{n} become target labels T{n}, keyed by the label's identity.
fn target_label(label: usize) -> String {
    format!("T{}", label)
}

/// Lowers optimized IR onto the single-register machine. Declaration
/// markers emit nothing; an operator missing from the opcode table degrades
/// to the `???` placeholder rather than failing.
pub fn codegen(instructions: &[IRInstruction]) -> Vec<AsmInstruction> {
    let mut asm = vec![];

    for instr in instructions {
        match instr {
            IRInstruction::Declare { .. } => {}
            IRInstruction::Binary { op, lhs, rhs, dst } => {
                asm.push(AsmInstruction::Mov {
                    src: operand(lhs),
                    dst: AsmOperand::Register(Register::R1),
                });
                asm.push(AsmInstruction::Binary {
                    op: OPCODE_TABLE.get(op).copied().unwrap_or(AsmOp::Unknown),
                    dst: Register::R1,
                    src: operand(rhs),
                });
                asm.push(AsmInstruction::Mov {
                    src: AsmOperand::Register(Register::R1),
                    dst: operand(dst),
                });
            }
            IRInstruction::Copy { src, dst } => {
                asm.push(AsmInstruction::Mov {
                    src: operand(src),
                    dst: AsmOperand::Register(Register::R1),
                });
                asm.push(AsmInstruction::Mov {
                    src: AsmOperand::Register(Register::R1),
                    dst: operand(dst),
                });
            }
            IRInstruction::JumpIfFalse { condition, target } => {
                asm.push(AsmInstruction::JumpIfFalse {
                    condition: operand(condition),
                    target: target_label(*target),
                });
            }
            IRInstruction::Jump(target) => {
                asm.push(AsmInstruction::Jump {
                    target: target_label(*target),
                });
            }
            IRInstruction::Label(label) => {
                asm.push(AsmInstruction::Label {
                    name: target_label(*label),
                });
            }
        }
    }

    asm
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::R1 => write!(f, "R1"),
        }
    }
}

impl fmt::Display for AsmOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmOperand::Register(reg) => write!(f, "{}", reg),
            AsmOperand::Imm(n) => write!(f, "{}", n),
            AsmOperand::Pseudo(name) => write!(f, "{}", name),
        }
    }
}

impl fmt::Display for AsmOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            AsmOp::Add => "ADD",
            AsmOp::Sub => "SUB",
            AsmOp::Mul => "MUL",
            AsmOp::Div => "DIV",
            AsmOp::CmpGt => "CMPGT",
            AsmOp::CmpLt => "CMPLT",
            AsmOp::CmpGe => "CMPGE",
            AsmOp::CmpLe => "CMPLE",
            AsmOp::CmpEq => "CMPEQ",
            AsmOp::CmpNe => "CMPNE",
            AsmOp::Unknown => "???",
        };
        write!(f, "{}", op)
    }
}

impl fmt::Display for AsmInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmInstruction::Mov { src, dst } => write!(f, "MOV {}, {}", dst, src),
            AsmInstruction::Binary { op, dst, src } => write!(f, "{} {}, {}", op, dst, src),
            AsmInstruction::JumpIfFalse { condition, target } => {
                write!(f, "if_false {} goto {}", condition, target)
            }
            AsmInstruction::Jump { target } => write!(f, "goto {}", target),
            AsmInstruction::Label { name } => write!(f, "{}:", name),
        }
    }
}
