use std::fmt;

use regex::Regex;

pub struct Lexer {
    src: String,
    pos: usize,
    line: usize,
    pub errors: Vec<LexicalError>,
    punctuation_re: Regex,
    punctuation_double_re: Regex,
    keyword_re: Regex,
    identifier_re: Regex,
    constant_re: Regex,
}

impl Lexer {
    pub fn new(src: String) -> Lexer {
        Lexer {
            src,
            pos: 0,
            line: 1,
            errors: vec![],
            punctuation_re: Regex::new(r"^[-+*/<>=(){};]").unwrap(),
            punctuation_double_re: Regex::new(r"^==|^!=|^>=|^<=").unwrap(),
            keyword_re: Regex::new(r"^int\b|^if\b|^else\b").unwrap(),
            identifier_re: Regex::new(r"^[a-zA-Z_]\w*").unwrap(),
            constant_re: Regex::new(r"^[0-9]+").unwrap(),
        }
    }
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while let Some(ch) = self.src[self.pos..].chars().next() {
                if !ch.is_whitespace() {
                    break;
                }
                if ch == '\n' {
                    self.line += 1;
                }
                self.pos += ch.len_utf8();
            }

            let src = &self.src[self.pos..];

            if src.is_empty() {
                return None;
            }

            let kind = if let Some(m) = self.punctuation_double_re.find(src) {
                self.pos += m.as_str().len();
                match m.as_str() {
                    "==" => TokenKind::DoubleEqual,
                    "!=" => TokenKind::BangEqual,
                    ">=" => TokenKind::GreaterEqual,
                    "<=" => TokenKind::LessEqual,
                    _ => unreachable!(),
                }
            } else if let Some(m) = self.punctuation_re.find(src) {
                self.pos += m.as_str().len();
                match m.as_str() {
                    "+" => TokenKind::Plus,
                    "-" => TokenKind::Hyphen,
                    "*" => TokenKind::Star,
                    "/" => TokenKind::Slash,
                    "<" => TokenKind::Less,
                    ">" => TokenKind::Greater,
                    "=" => TokenKind::Equal,
                    "(" => TokenKind::LParen,
                    ")" => TokenKind::RParen,
                    "{" => TokenKind::LBrace,
                    "}" => TokenKind::RBrace,
                    ";" => TokenKind::Semicolon,
                    _ => unreachable!(),
                }
            } else if let Some(m) = self.keyword_re.find(src) {
                self.pos += m.as_str().len();
                match m.as_str() {
                    "int" => TokenKind::Int,
                    "if" => TokenKind::If,
                    "else" => TokenKind::Else,
                    _ => unreachable!(),
                }
            } else if let Some(m) = self.constant_re.find(src) {
                self.pos += m.as_str().len();
                match m.as_str().parse::<i64>() {
                    Ok(n) => TokenKind::Constant(n),
                    Err(_) => {
                        self.errors.push(LexicalError::IntegerOutOfRange {
                            literal: m.as_str().to_string(),
                            line: self.line,
                        });
                        continue;
                    }
                }
            } else if let Some(m) = self.identifier_re.find(src) {
                self.pos += m.as_str().len();
                TokenKind::Identifier(m.as_str().to_string())
            } else {
                // Unrecognized character: report it, drop it, keep lexing.
                let ch = src.chars().next().unwrap();
                self.errors.push(LexicalError::IllegalCharacter {
                    ch,
                    line: self.line,
                });
                self.pos += ch.len_utf8();
                continue;
            };

            return Some(Token {
                kind,
                line: self.line,
            });
        }
    }
}

/// Drives the lexer to exhaustion. Lexing never aborts: unrecognized
/// characters are collected as recoverable errors and the (possibly
/// malformed) token stream is still handed on to the parser.
pub fn tokenize(src: &str) -> (Vec<Token>, Vec<LexicalError>) {
    let mut lexer = Lexer::new(src.to_string());
    let tokens = lexer.by_ref().collect();
    (tokens, lexer.errors)
}

#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

#[derive(Debug, PartialEq, Clone)]
pub enum TokenKind {
    Int,
    If,
    Else,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Plus,
    Hyphen,
    Star,
    Slash,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    DoubleEqual,
    BangEqual,
    Equal,
    Semicolon,
    Identifier(String),
    Constant(i64),
}

impl Token {
    pub fn as_string(&self) -> String {
        match &self.kind {
            TokenKind::Identifier(s) => s.to_owned(),
            _ => unreachable!(),
        }
    }

    pub fn as_const(&self) -> i64 {
        match self.kind {
            TokenKind::Constant(n) => n,
            _ => unreachable!(),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int => write!(f, "int"),
            TokenKind::If => write!(f, "if"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Hyphen => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Less => write!(f, "<"),
            TokenKind::Greater => write!(f, ">"),
            TokenKind::LessEqual => write!(f, "<="),
            TokenKind::GreaterEqual => write!(f, ">="),
            TokenKind::DoubleEqual => write!(f, "=="),
            TokenKind::BangEqual => write!(f, "!="),
            TokenKind::Equal => write!(f, "="),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Identifier(s) => write!(f, "{}", s),
            TokenKind::Constant(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum LexicalError {
    IllegalCharacter { ch: char, line: usize },
    IntegerOutOfRange { literal: String, line: usize },
}

impl fmt::Display for LexicalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexicalError::IllegalCharacter { ch, line } => {
                write!(f, "Illegal character '{}' at line {}", ch, line)
            }
            LexicalError::IntegerOutOfRange { literal, line } => {
                write!(f, "Integer literal '{}' out of range at line {}", literal, line)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("int x; if ifx else_"),
            vec![
                TokenKind::Int,
                TokenKind::Identifier("x".to_string()),
                TokenKind::Semicolon,
                TokenKind::If,
                TokenKind::Identifier("ifx".to_string()),
                TokenKind::Identifier("else_".to_string()),
            ]
        );
    }

    #[test]
    fn double_equal_is_one_token() {
        assert_eq!(
            kinds("x == 1"),
            vec![
                TokenKind::Identifier("x".to_string()),
                TokenKind::DoubleEqual,
                TokenKind::Constant(1),
            ]
        );
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(
            kinds(">= <= != > < ="),
            vec![
                TokenKind::GreaterEqual,
                TokenKind::LessEqual,
                TokenKind::BangEqual,
                TokenKind::Greater,
                TokenKind::Less,
                TokenKind::Equal,
            ]
        );
    }

    #[test]
    fn line_numbers_follow_newlines() {
        let (tokens, _) = tokenize("int x;\nx = 1;");
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[3].line, 2);
    }

    #[test]
    fn illegal_character_is_skipped_and_reported() {
        let (tokens, errors) = tokenize("x = 1 @ 2;");
        assert_eq!(
            errors,
            vec![LexicalError::IllegalCharacter { ch: '@', line: 1 }]
        );
        // The stream around the bad character survives intact.
        assert_eq!(
            tokens.iter().map(|t| t.kind.clone()).collect::<Vec<_>>(),
            vec![
                TokenKind::Identifier("x".to_string()),
                TokenKind::Equal,
                TokenKind::Constant(1),
                TokenKind::Constant(2),
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn out_of_range_literal_reports_the_whole_lexeme() {
        let (tokens, errors) = tokenize("x = 99999999999999999999;");
        assert_eq!(
            errors,
            vec![LexicalError::IntegerOutOfRange {
                literal: "99999999999999999999".to_string(),
                line: 1,
            }]
        );
        // The literal is dropped like any other lexical error; lexing
        // continues with the rest of the stream.
        assert_eq!(
            tokens.iter().map(|t| t.kind.clone()).collect::<Vec<_>>(),
            vec![
                TokenKind::Identifier("x".to_string()),
                TokenKind::Equal,
                TokenKind::Semicolon,
            ]
        );
    }
}
