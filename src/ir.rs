use std::fmt;

use crate::parser::ast::{BinaryExpressionKind, Expression, Program, Statement};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IRValue {
    Constant(i64),
    Var(String),
    Temp(usize),
}

impl IRValue {
    /// Generator-created temporaries are a distinct case, so `t1` can never
    /// be mistaken for a prefix of `t10` the way it could in a textual IR.
    pub fn is_temporary(&self) -> bool {
        matches!(self, IRValue::Temp(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    Equal,
    NotEqual,
}

impl From<BinaryExpressionKind> for BinaryOp {
    fn from(kind: BinaryExpressionKind) -> BinaryOp {
        match kind {
            BinaryExpressionKind::Add => BinaryOp::Add,
            BinaryExpressionKind::Sub => BinaryOp::Sub,
            BinaryExpressionKind::Mul => BinaryOp::Mul,
            BinaryExpressionKind::Div => BinaryOp::Div,
            BinaryExpressionKind::Greater => BinaryOp::Greater,
            BinaryExpressionKind::Less => BinaryOp::Less,
            BinaryExpressionKind::GreaterEqual => BinaryOp::GreaterEqual,
            BinaryExpressionKind::LessEqual => BinaryOp::LessEqual,
            BinaryExpressionKind::Equal => BinaryOp::Equal,
            BinaryExpressionKind::NotEqual => BinaryOp::NotEqual,
        }
    }
}

/// Three-address code. Instruction order is the only representation of
/// control flow; labels are plain markers in the sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum IRInstruction {
    Declare {
        name: String,
    },
    Copy {
        src: IRValue,
        dst: IRValue,
    },
    Binary {
        op: BinaryOp,
        lhs: IRValue,
        rhs: IRValue,
        dst: IRValue,
    },
    JumpIfFalse {
        condition: IRValue,
        target: usize,
    },
    Jump(usize),
    Label(usize),
}

/// Counter state for one IR-generation run. Built fresh per `generate`
/// call, so independent compilations both start at `t0`/`L0` and never
/// share numbering.
pub struct IRGen {
    temp_counter: usize,
    label_counter: usize,
}

impl Default for IRGen {
    fn default() -> Self {
        Self::new()
    }
}

impl IRGen {
    pub fn new() -> IRGen {
        IRGen {
            temp_counter: 0,
            label_counter: 0,
        }
    }

    fn make_temporary(&mut self) -> IRValue {
        let temp = self.temp_counter;
        self.temp_counter += 1;
        IRValue::Temp(temp)
    }

    fn make_label(&mut self) -> usize {
        let label = self.label_counter;
        self.label_counter += 1;
        label
    }

    pub fn generate(&mut self, program: &Program) -> Vec<IRInstruction> {
        let mut instructions = vec![];
        for statement in &program.statements {
            self.gen_statement(statement, &mut instructions);
        }
        instructions
    }

    fn gen_statement(&mut self, statement: &Statement, out: &mut Vec<IRInstruction>) {
        match statement {
            Statement::Declare(decl) => {
                out.push(IRInstruction::Declare {
                    name: decl.name.clone(),
                });
            }
            Statement::Assign(assign) => {
                let src = self.gen_expression(&assign.expr, out);
                out.push(IRInstruction::Copy {
                    src,
                    dst: IRValue::Var(assign.name.clone()),
                });
            }
            Statement::If(if_stmt) => {
                // A missing else arm lowers as an empty else branch through
                // the same label scheme.
                self.gen_conditional(&if_stmt.condition, &if_stmt.then_branch, None, out);
            }
            Statement::IfElse(if_else) => {
                self.gen_conditional(
                    &if_else.condition,
                    &if_else.then_branch,
                    Some(&*if_else.else_branch),
                    out,
                );
            }
            Statement::Block(block) => {
                // Blocks flatten into the enclosing sequence; no nesting
                // survives lowering.
                for stmt in &block.statements {
                    self.gen_statement(stmt, out);
                }
            }
        }
    }

    fn gen_conditional(
        &mut self,
        condition: &Expression,
        then_branch: &Statement,
        else_branch: Option<&Statement>,
        out: &mut Vec<IRInstruction>,
    ) {
        let condition = self.gen_expression(condition, out);

        let mut then_code = vec![];
        self.gen_statement(then_branch, &mut then_code);

        let mut else_code = vec![];
        if let Some(else_branch) = else_branch {
            self.gen_statement(else_branch, &mut else_code);
        }

        // Labels are allocated after both branches are lowered, so nested
        // conditionals number theirs first.
        let false_label = self.make_label();
        let end_label = self.make_label();

        out.push(IRInstruction::JumpIfFalse {
            condition,
            target: false_label,
        });
        out.extend(then_code);
        out.push(IRInstruction::Jump(end_label));
        out.push(IRInstruction::Label(false_label));
        out.extend(else_code);
        out.push(IRInstruction::Label(end_label));
    }

    // Post-order walk: leaves produce no code and return themselves, a
    // binary node lowers both sides into a fresh temporary.
    fn gen_expression(&mut self, expr: &Expression, out: &mut Vec<IRInstruction>) -> IRValue {
        match expr {
            Expression::Constant(n) => IRValue::Constant(*n),
            Expression::Variable(name) => IRValue::Var(name.clone()),
            Expression::Binary(binary) => {
                let lhs = self.gen_expression(&binary.lhs, out);
                let rhs = self.gen_expression(&binary.rhs, out);
                let dst = self.make_temporary();
                out.push(IRInstruction::Binary {
                    op: binary.kind.into(),
                    lhs,
                    rhs,
                    dst: dst.clone(),
                });
                dst
            }
        }
    }
}

/// Lowers a program with fresh counter state, so every run restarts at
/// `t0` and `L0`.
pub fn generate(program: &Program) -> Vec<IRInstruction> {
    IRGen::new().generate(program)
}

impl fmt::Display for IRValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IRValue::Constant(n) => write!(f, "{}", n),
            IRValue::Var(name) => write!(f, "{}", name),
            IRValue::Temp(n) => write!(f, "t{}", n),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Greater => ">",
            BinaryOp::Less => "<",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
        };
        write!(f, "{}", op)
    }
}

impl fmt::Display for IRInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IRInstruction::Declare { name } => write!(f, "int {};", name),
            IRInstruction::Copy { src, dst } => write!(f, "{} = {}", dst, src),
            IRInstruction::Binary { op, lhs, rhs, dst } => {
                write!(f, "{} = {} {} {}", dst, lhs, op, rhs)
            }
            IRInstruction::JumpIfFalse { condition, target } => {
                write!(f, "if_false {} goto L{}", condition, target)
            }
            IRInstruction::Jump(target) => write!(f, "goto L{}", target),
            IRInstruction::Label(label) => write!(f, "L{}:", label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::recursive_descent::parse;

    fn gen_lines(src: &str) -> Vec<String> {
        generate(&parse(src).unwrap())
            .iter()
            .map(|instr| instr.to_string())
            .collect()
    }

    #[test]
    fn straight_line_lowering() {
        assert_eq!(
            gen_lines("int x;\nint y;\nx = 10;\ny = x + 5;"),
            vec!["int x;", "int y;", "x = 10", "t0 = x + 5", "y = t0"]
        );
    }

    #[test]
    fn nested_expression_temporaries_are_post_order() {
        assert_eq!(
            gen_lines("x = (1 + 2) * (3 - 4);"),
            vec!["t0 = 1 + 2", "t1 = 3 - 4", "t2 = t0 * t1", "x = t2"]
        );
    }

    #[test]
    fn if_else_lowering() {
        assert_eq!(
            gen_lines("if (x > 1) y = 2; else y = 3;"),
            vec![
                "t0 = x > 1",
                "if_false t0 goto L0",
                "y = 2",
                "goto L1",
                "L0:",
                "y = 3",
                "L1:"
            ]
        );
    }

    #[test]
    fn if_without_else_gets_an_empty_false_branch() {
        assert_eq!(
            gen_lines("if (x > 1) y = 2;"),
            vec![
                "t0 = x > 1",
                "if_false t0 goto L0",
                "y = 2",
                "goto L1",
                "L0:",
                "L1:"
            ]
        );
    }

    #[test]
    fn nested_conditionals_number_labels_inside_out() {
        assert_eq!(
            gen_lines("if (a) { if (b) x = 1; else x = 2; } else x = 3;"),
            vec![
                "if_false a goto L2",
                "if_false b goto L0",
                "x = 1",
                "goto L1",
                "L0:",
                "x = 2",
                "L1:",
                "goto L3",
                "L2:",
                "x = 3",
                "L3:"
            ]
        );
    }

    #[test]
    fn nested_blocks_flatten() {
        assert_eq!(
            gen_lines("{ int x; { x = 1; { x = 2; } } }"),
            vec!["int x;", "x = 1", "x = 2"]
        );
    }

    #[test]
    fn counters_reset_between_runs() {
        let first = gen_lines("x = 1 + 2;");
        let second = gen_lines("y = 3 + 4;");
        assert_eq!(first[0], "t0 = 1 + 2");
        assert_eq!(second[0], "t0 = 3 + 4");
    }
}
