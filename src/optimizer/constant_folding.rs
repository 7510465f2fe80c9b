use crate::ir::{BinaryOp, IRInstruction, IRValue};

/// Replaces every binary instruction whose operands are both constants with
/// a copy of the computed result. Runs once, never to a fixpoint. An
/// operation that cannot be evaluated (division by zero, overflow) is left
/// untouched, silently.
pub fn constant_folding(instructions: &[IRInstruction]) -> Vec<IRInstruction> {
    let mut optimized_instructions = vec![];

    for instr in instructions {
        match instr {
            IRInstruction::Binary {
                op,
                lhs: IRValue::Constant(lhs),
                rhs: IRValue::Constant(rhs),
                dst,
            } => match evaluate(*op, *lhs, *rhs) {
                Some(result) => optimized_instructions.push(IRInstruction::Copy {
                    src: IRValue::Constant(result),
                    dst: dst.clone(),
                }),
                None => optimized_instructions.push(instr.clone()),
            },
            _ => optimized_instructions.push(instr.clone()),
        }
    }

    optimized_instructions
}

// Truncating integer division; relational operators yield 1 for true and
// 0 for false.
fn evaluate(op: BinaryOp, lhs: i64, rhs: i64) -> Option<i64> {
    match op {
        BinaryOp::Add => lhs.checked_add(rhs),
        BinaryOp::Sub => lhs.checked_sub(rhs),
        BinaryOp::Mul => lhs.checked_mul(rhs),
        BinaryOp::Div => lhs.checked_div(rhs),
        BinaryOp::Greater => Some((lhs > rhs) as i64),
        BinaryOp::Less => Some((lhs < rhs) as i64),
        BinaryOp::GreaterEqual => Some((lhs >= rhs) as i64),
        BinaryOp::LessEqual => Some((lhs <= rhs) as i64),
        BinaryOp::Equal => Some((lhs == rhs) as i64),
        BinaryOp::NotEqual => Some((lhs != rhs) as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary(op: BinaryOp, lhs: IRValue, rhs: IRValue) -> IRInstruction {
        IRInstruction::Binary {
            op,
            lhs,
            rhs,
            dst: IRValue::Temp(0),
        }
    }

    #[test]
    fn folds_every_operator_like_direct_evaluation() {
        let cases = [
            (BinaryOp::Add, 7, 3, 10),
            (BinaryOp::Sub, 7, 3, 4),
            (BinaryOp::Mul, 7, 3, 21),
            (BinaryOp::Div, 7, 3, 2),
            (BinaryOp::Div, -7, 3, -2),
            (BinaryOp::Greater, 7, 3, 1),
            (BinaryOp::Less, 7, 3, 0),
            (BinaryOp::GreaterEqual, 3, 3, 1),
            (BinaryOp::LessEqual, 7, 3, 0),
            (BinaryOp::Equal, 3, 3, 1),
            (BinaryOp::NotEqual, 3, 3, 0),
        ];
        for (op, lhs, rhs, expected) in cases {
            let folded = constant_folding(&[binary(
                op,
                IRValue::Constant(lhs),
                IRValue::Constant(rhs),
            )]);
            assert_eq!(
                folded,
                vec![IRInstruction::Copy {
                    src: IRValue::Constant(expected),
                    dst: IRValue::Temp(0),
                }],
                "{:?} {} {}",
                op,
                lhs,
                rhs
            );
        }
    }

    #[test]
    fn division_by_zero_passes_through_unfolded() {
        let instr = binary(BinaryOp::Div, IRValue::Constant(1), IRValue::Constant(0));
        assert_eq!(constant_folding(&[instr.clone()]), vec![instr]);
    }

    #[test]
    fn overflow_passes_through_unfolded() {
        let instr = binary(
            BinaryOp::Add,
            IRValue::Constant(i64::MAX),
            IRValue::Constant(1),
        );
        assert_eq!(constant_folding(&[instr.clone()]), vec![instr]);
    }

    #[test]
    fn non_constant_operands_are_untouched() {
        let instr = binary(
            BinaryOp::Add,
            IRValue::Var("x".to_string()),
            IRValue::Constant(5),
        );
        assert_eq!(constant_folding(&[instr.clone()]), vec![instr]);
    }

    #[test]
    fn folding_is_idempotent() {
        let instructions = vec![
            binary(BinaryOp::Mul, IRValue::Constant(5), IRValue::Constant(2)),
            IRInstruction::Copy {
                src: IRValue::Temp(0),
                dst: IRValue::Var("x".to_string()),
            },
        ];
        let once = constant_folding(&instructions);
        let twice = constant_folding(&once);
        assert_eq!(once, twice);
    }
}
