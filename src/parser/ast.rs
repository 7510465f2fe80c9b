#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// `If` (no else arm) and `IfElse` are distinct shapes on purpose: the two
/// forms are handled differently downstream, so folding them into one
/// variant with an `Option` would blur that.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Declare(DeclareStatement),
    Assign(AssignStatement),
    If(IfStatement),
    IfElse(IfElseStatement),
    Block(BlockStatement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclareStatement {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStatement {
    pub name: String,
    pub expr: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_branch: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfElseStatement {
    pub condition: Expression,
    pub then_branch: Box<Statement>,
    pub else_branch: Box<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Constant(i64),
    Variable(String),
    Binary(BinaryExpression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub kind: BinaryExpressionKind,
    pub lhs: Box<Expression>,
    pub rhs: Box<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryExpressionKind {
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

impl BinaryExpressionKind {
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryExpressionKind::Add
                | BinaryExpressionKind::Sub
                | BinaryExpressionKind::Mul
                | BinaryExpressionKind::Div
        )
    }
}
