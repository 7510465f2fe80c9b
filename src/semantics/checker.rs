use std::collections::HashSet;
use std::fmt;

use crate::parser::ast::{Expression, Program, Statement};

#[derive(Debug, Clone, PartialEq)]
pub enum SemanticError {
    AlreadyDeclared { name: String },
    UsedBeforeDeclaration { name: String },
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticError::AlreadyDeclared { name } => {
                write!(f, "Semantic Error: Variable '{}' already declared.", name)
            }
            SemanticError::UsedBeforeDeclaration { name } => {
                write!(
                    f,
                    "Semantic Error: Variable '{}' used before declaration.",
                    name
                )
            }
        }
    }
}

/// Flat, single-scope declaration check over the top-level statement list.
///
/// Known limitation, kept on purpose: the walk does not descend into the
/// statements of `Block`, `If` or `IfElse` bodies, and the expression walk
/// stops at relational operators. Every diagnostic is non-fatal; the
/// pipeline generates code even for a program that fails this check.
pub fn check(program: &Program) -> Vec<SemanticError> {
    let mut errors = vec![];
    let mut declared: HashSet<String> = HashSet::new();

    for statement in &program.statements {
        match statement {
            Statement::Declare(decl) => {
                if !declared.insert(decl.name.clone()) {
                    errors.push(SemanticError::AlreadyDeclared {
                        name: decl.name.clone(),
                    });
                }
            }
            Statement::Assign(assign) => {
                if !declared.contains(&assign.name) {
                    errors.push(SemanticError::UsedBeforeDeclaration {
                        name: assign.name.clone(),
                    });
                }
                check_expr(&assign.expr, &declared, &mut errors);
            }
            Statement::IfElse(if_else) => {
                check_expr(&if_else.condition, &declared, &mut errors);
            }
            Statement::If(_) | Statement::Block(_) => {}
        }
    }

    errors
}

// Recurses only through variables and the arithmetic operators; relational
// subtrees are not inspected.
fn check_expr(expr: &Expression, declared: &HashSet<String>, errors: &mut Vec<SemanticError>) {
    match expr {
        Expression::Variable(name) => {
            if !declared.contains(name) {
                errors.push(SemanticError::UsedBeforeDeclaration {
                    name: name.clone(),
                });
            }
        }
        Expression::Binary(binary) if binary.kind.is_arithmetic() => {
            check_expr(&binary.lhs, declared, errors);
            check_expr(&binary.rhs, declared, errors);
        }
        _ => {}
    }
}
