use crate::ir::{IRInstruction, IRValue};

/// Copy propagation plus dead-copy elimination in a single pass pair: one
/// rewriting traversal, then one filter. Never iterates to a fixpoint.
///
/// Every `Copy` with a temporary on either side is recorded as a
/// substitution `dst -> src` in insertion order. Chains such as
/// `t2 = t1; t1 = t0` resolve through that fixed order, applied
/// sequentially per operand, which keeps the output deterministic.
pub fn copy_propagation(instructions: &[IRInstruction]) -> Vec<IRInstruction> {
    let copies = collect_copies(instructions);

    let rewritten = instructions
        .iter()
        .map(|instr| {
            // The recorded copies are never substituted into themselves.
            if is_recorded_copy(instr, &copies) {
                instr.clone()
            } else {
                rewrite_instruction(instr, &copies)
            }
        })
        .collect::<Vec<_>>();

    // A recorded copy whose destination no longer appears in any operand
    // position of the rewritten sequence is dead.
    rewritten
        .iter()
        .filter(|instr| match instr {
            IRInstruction::Copy { dst, .. } => {
                !is_mapped(dst, &copies) || operand_is_used(dst, &rewritten)
            }
            _ => true,
        })
        .cloned()
        .collect()
}

fn collect_copies(instructions: &[IRInstruction]) -> Vec<(IRValue, IRValue)> {
    let mut copies: Vec<(IRValue, IRValue)> = vec![];
    for instr in instructions {
        if let IRInstruction::Copy { src, dst } = instr {
            if src.is_temporary() || dst.is_temporary() {
                // A re-copied destination keeps its original position in
                // the substitution order, with the newer source.
                match copies.iter_mut().find(|(d, _)| d == dst) {
                    Some(entry) => entry.1 = src.clone(),
                    None => copies.push((dst.clone(), src.clone())),
                }
            }
        }
    }
    copies
}

fn is_mapped(value: &IRValue, copies: &[(IRValue, IRValue)]) -> bool {
    copies.iter().any(|(dst, _)| dst == value)
}

fn is_recorded_copy(instr: &IRInstruction, copies: &[(IRValue, IRValue)]) -> bool {
    matches!(instr, IRInstruction::Copy { dst, .. } if is_mapped(dst, copies))
}

// Applies the substitutions to one operand, sequentially in insertion
// order. Matching is operand identity, never text.
fn substitute(value: &IRValue, copies: &[(IRValue, IRValue)]) -> IRValue {
    let mut value = value.clone();
    for (dst, src) in copies {
        if value == *dst {
            value = src.clone();
        }
    }
    value
}

// Destinations are never rewritten; only operand positions are.
fn rewrite_instruction(instr: &IRInstruction, copies: &[(IRValue, IRValue)]) -> IRInstruction {
    match instr {
        IRInstruction::Copy { src, dst } => IRInstruction::Copy {
            src: substitute(src, copies),
            dst: dst.clone(),
        },
        IRInstruction::Binary { op, lhs, rhs, dst } => IRInstruction::Binary {
            op: *op,
            lhs: substitute(lhs, copies),
            rhs: substitute(rhs, copies),
            dst: dst.clone(),
        },
        IRInstruction::JumpIfFalse { condition, target } => IRInstruction::JumpIfFalse {
            condition: substitute(condition, copies),
            target: *target,
        },
        IRInstruction::Declare { .. } | IRInstruction::Jump(_) | IRInstruction::Label(_) => {
            instr.clone()
        }
    }
}

fn operand_is_used(value: &IRValue, instructions: &[IRInstruction]) -> bool {
    instructions.iter().any(|instr| match instr {
        IRInstruction::Copy { src, .. } => src == value,
        IRInstruction::Binary { lhs, rhs, .. } => lhs == value || rhs == value,
        IRInstruction::JumpIfFalse { condition, .. } => condition == value,
        IRInstruction::Declare { .. } | IRInstruction::Jump(_) | IRInstruction::Label(_) => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> IRValue {
        IRValue::Var(name.to_string())
    }

    fn copy(src: IRValue, dst: IRValue) -> IRInstruction {
        IRInstruction::Copy { src, dst }
    }

    fn lines(instructions: &[IRInstruction]) -> Vec<String> {
        instructions.iter().map(|i| i.to_string()).collect()
    }

    #[test]
    fn chain_resolves_in_insertion_order() {
        let instructions = vec![
            copy(IRValue::Constant(1), IRValue::Temp(0)),
            copy(IRValue::Temp(0), IRValue::Temp(1)),
            IRInstruction::Binary {
                op: crate::ir::BinaryOp::Add,
                lhs: IRValue::Temp(1),
                rhs: IRValue::Constant(2),
                dst: var("y"),
            },
        ];
        // t1 rewrites to t0 (the t0 -> 1 mapping was already applied before
        // the t1 -> t0 mapping produced it), and the dead t1 copy drops.
        assert_eq!(
            lines(&copy_propagation(&instructions)),
            vec!["t0 = 1", "y = t0 + 2"]
        );
    }

    #[test]
    fn copies_without_a_temporary_are_not_recorded() {
        let instructions = vec![
            copy(IRValue::Constant(5), var("x")),
            copy(IRValue::Constant(3), var("x")),
        ];
        // Both stores survive: no redundant-store elimination here.
        assert_eq!(
            copy_propagation(&instructions),
            instructions
        );
    }

    #[test]
    fn branch_conditions_are_substituted() {
        let instructions = vec![
            copy(var("x"), IRValue::Temp(0)),
            IRInstruction::JumpIfFalse {
                condition: IRValue::Temp(0),
                target: 0,
            },
            IRInstruction::Label(0),
        ];
        assert_eq!(
            lines(&copy_propagation(&instructions)),
            vec!["if_false x goto L0", "L0:"]
        );
    }

    #[test]
    fn used_copies_are_kept() {
        let instructions = vec![
            copy(IRValue::Constant(1), IRValue::Temp(0)),
            IRInstruction::Binary {
                op: crate::ir::BinaryOp::Add,
                lhs: IRValue::Temp(0),
                rhs: IRValue::Temp(0),
                dst: IRValue::Temp(1),
            },
        ];
        // t0 maps to a constant, so its uses rewrite away and the copy dies;
        // t1 has no uses at all but is a Binary destination, not a copy, so
        // it stays.
        assert_eq!(
            lines(&copy_propagation(&instructions)),
            vec!["t1 = 1 + 1"]
        );
    }

    #[test]
    fn distinct_temporaries_never_alias() {
        // In the textual ancestor of this pass, substituting t1 could
        // clobber the prefix of t10. Operand identity makes that impossible.
        let instructions = vec![
            copy(var("x"), IRValue::Temp(1)),
            IRInstruction::Binary {
                op: crate::ir::BinaryOp::Add,
                lhs: IRValue::Temp(10),
                rhs: IRValue::Constant(1),
                dst: var("y"),
            },
        ];
        let optimized = copy_propagation(&instructions);
        assert_eq!(lines(&optimized), vec!["y = t10 + 1"]);
    }

    #[test]
    fn recorded_copy_is_not_substituted_into_itself() {
        let instructions = vec![
            copy(var("x"), IRValue::Temp(0)),
            copy(IRValue::Temp(0), var("x")),
            IRInstruction::Binary {
                op: crate::ir::BinaryOp::Add,
                lhs: IRValue::Temp(0),
                rhs: IRValue::Constant(1),
                dst: var("y"),
            },
        ];
        // `t0 = x` keeps its own source even though x maps to t0; the
        // consumer's `t0` round-trips x -> t0 through the ordered mappings.
        assert_eq!(
            lines(&copy_propagation(&instructions)),
            vec!["t0 = x", "x = t0", "y = t0 + 1"]
        );
    }
}
