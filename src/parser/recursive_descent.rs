use std::collections::VecDeque;

use anyhow::{bail, Result};

use crate::{
    lexer::{Token, TokenKind},
    parser::ast::{
        AssignStatement, BinaryExpression, BinaryExpressionKind, BlockStatement,
        DeclareStatement, Expression, IfElseStatement, IfStatement, Program, Statement,
    },
};

/// Recursive-descent parser over the lexer's token stream. The first
/// unparseable token is terminal: no partial AST, no resynchronization.
pub struct Parser {
    pub tokens: VecDeque<Token>,
    pub current: Option<Token>,
    pub previous: Option<Token>,
}

impl Parser {
    pub fn new(tokens: VecDeque<Token>) -> Parser {
        Parser {
            tokens,
            current: None,
            previous: None,
        }
    }

    fn advance(&mut self) -> Option<Token> {
        self.previous = self.current.take();
        self.current = self.tokens.pop_front();
        self.previous.clone()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.current.as_ref().is_some_and(|token| {
            std::mem::discriminant(&token.kind) == std::mem::discriminant(kind)
        })
    }

    fn is_next(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(&mut self, kind: &TokenKind) -> Result<Token> {
        if self.check(kind) {
            return Ok(self.advance().unwrap());
        }
        self.error()
    }

    fn error<T>(&self) -> Result<T> {
        match &self.current {
            Some(token) => bail!(
                "Syntax error at token '{}', line {}",
                token.kind,
                token.line
            ),
            None => bail!("Syntax error at end of input"),
        }
    }

    pub fn parse(&mut self) -> Result<Program> {
        self.advance();
        let mut statements = vec![];
        while self.current.is_some() {
            statements.push(self.parse_statement()?);
        }
        if statements.is_empty() {
            return self.error();
        }
        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        if self.is_next(&[TokenKind::Int]) {
            self.parse_declaration()
        } else if self.check(&TokenKind::Identifier("".to_string())) {
            self.parse_assignment()
        } else if self.is_next(&[TokenKind::If]) {
            self.parse_if_statement()
        } else if self.is_next(&[TokenKind::LBrace]) {
            self.parse_block_statement()
        } else {
            self.error()
        }
    }

    fn parse_declaration(&mut self) -> Result<Statement> {
        let name = self
            .consume(&TokenKind::Identifier("".to_string()))?
            .as_string();
        self.consume(&TokenKind::Semicolon)?;
        Ok(Statement::Declare(DeclareStatement { name }))
    }

    fn parse_assignment(&mut self) -> Result<Statement> {
        let name = self.advance().unwrap().as_string();
        self.consume(&TokenKind::Equal)?;
        let expr = self.parse_expression()?;
        self.consume(&TokenKind::Semicolon)?;
        Ok(Statement::Assign(AssignStatement { name, expr }))
    }

    fn parse_if_statement(&mut self) -> Result<Statement> {
        self.consume(&TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.consume(&TokenKind::RParen)?;
        let then_branch = self.parse_statement()?;
        if self.is_next(&[TokenKind::Else]) {
            let else_branch = self.parse_statement()?;
            Ok(Statement::IfElse(IfElseStatement {
                condition,
                then_branch: then_branch.into(),
                else_branch: else_branch.into(),
            }))
        } else {
            Ok(Statement::If(IfStatement {
                condition,
                then_branch: then_branch.into(),
            }))
        }
    }

    fn parse_block_statement(&mut self) -> Result<Statement> {
        let mut statements = vec![];
        while self.current.is_some() && !self.check(&TokenKind::RBrace) {
            statements.push(self.parse_statement()?);
        }
        self.consume(&TokenKind::RBrace)?;
        Ok(Statement::Block(BlockStatement { statements }))
    }

    // Relational operators sit above the arithmetic layer and combine two
    // full additive expressions; they chain left-associatively, so
    // `a > b > c` parses. Deliberately loose, inherited from the grammar.
    fn parse_expression(&mut self) -> Result<Expression> {
        let mut expr = self.additive()?;
        while self.is_next(&[
            TokenKind::Greater,
            TokenKind::Less,
            TokenKind::GreaterEqual,
            TokenKind::LessEqual,
            TokenKind::DoubleEqual,
            TokenKind::BangEqual,
        ]) {
            let kind = match self.previous.as_ref().unwrap().kind {
                TokenKind::Greater => BinaryExpressionKind::Greater,
                TokenKind::Less => BinaryExpressionKind::Less,
                TokenKind::GreaterEqual => BinaryExpressionKind::GreaterEqual,
                TokenKind::LessEqual => BinaryExpressionKind::LessEqual,
                TokenKind::DoubleEqual => BinaryExpressionKind::Equal,
                TokenKind::BangEqual => BinaryExpressionKind::NotEqual,
                _ => unreachable!(),
            };
            let rhs = self.additive()?;
            expr = Expression::Binary(BinaryExpression {
                kind,
                lhs: expr.into(),
                rhs: rhs.into(),
            });
        }
        Ok(expr)
    }

    fn additive(&mut self) -> Result<Expression> {
        let mut expr = self.term()?;
        while self.is_next(&[TokenKind::Plus, TokenKind::Hyphen]) {
            let kind = match self.previous.as_ref().unwrap().kind {
                TokenKind::Plus => BinaryExpressionKind::Add,
                TokenKind::Hyphen => BinaryExpressionKind::Sub,
                _ => unreachable!(),
            };
            let rhs = self.term()?;
            expr = Expression::Binary(BinaryExpression {
                kind,
                lhs: expr.into(),
                rhs: rhs.into(),
            });
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expression> {
        let mut expr = self.factor()?;
        while self.is_next(&[TokenKind::Star, TokenKind::Slash]) {
            let kind = match self.previous.as_ref().unwrap().kind {
                TokenKind::Star => BinaryExpressionKind::Mul,
                TokenKind::Slash => BinaryExpressionKind::Div,
                _ => unreachable!(),
            };
            let rhs = self.factor()?;
            expr = Expression::Binary(BinaryExpression {
                kind,
                lhs: expr.into(),
                rhs: rhs.into(),
            });
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expression> {
        if self.is_next(&[TokenKind::Constant(0)]) {
            Ok(Expression::Constant(self.previous.as_ref().unwrap().as_const()))
        } else if self.is_next(&[TokenKind::Identifier("".to_string())]) {
            Ok(Expression::Variable(
                self.previous.as_ref().unwrap().as_string(),
            ))
        } else if self.is_next(&[TokenKind::LParen]) {
            let expr = self.parse_expression()?;
            self.consume(&TokenKind::RParen)?;
            Ok(expr)
        } else {
            self.error()
        }
    }
}

/// Tokenizes and parses in one step. Lexical errors are recoverable and do
/// not block the parse; a syntax error is terminal for the whole run.
pub fn parse(src: &str) -> Result<Program> {
    let (tokens, _) = crate::lexer::tokenize(src);
    Parser::new(tokens.into_iter().collect()).parse()
}
