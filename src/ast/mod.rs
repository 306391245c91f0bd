pub mod printer;

use std::rc::Rc;

use serde::Serialize;

use crate::scanner::token::Span;

/// Root of a parsed source file.
#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub name: String,
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Stmt {
    Assign(AssignStmt),
    Block(BlockStmt),
    If(IfStmt),
    Empty(EmptyStmt),
    Expression(ExprStmt),
    While(WhileStmt),
    Return(ReturnStmt),
}

/// `target = value`. The target's form is checked when the statement runs.
#[derive(Debug, Clone, Serialize)]
pub struct AssignStmt {
    pub target: Expr,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockStmt {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: BlockStmt,
    /// Either another `If` or a `Block`.
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmptyStmt {
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExprStmt {
    pub expression: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: BlockStmt,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Expr {
    Array(ArrayExpr),
    Number(NumberExpr),
    Str(StringExpr),
    /// Shared so that function values can point back at their literal.
    Function(Rc<FunctionExpr>),
    Identifier(IdentExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Index(IndexExpr),
    Selector(SelectorExpr),
    Paren(ParenExpr),
    Call(CallExpr),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Self::Array(e) => e.span,
            Self::Number(e) => e.span,
            Self::Str(e) => e.span,
            Self::Function(e) => e.span,
            Self::Identifier(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Index(e) => e.span,
            Self::Selector(e) => e.span,
            Self::Paren(e) => e.span,
            Self::Call(e) => e.span,
        }
    }

    /// Short name of the expression form, used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Array(_) => "array literal",
            Self::Number(_) => "number literal",
            Self::Str(_) => "string literal",
            Self::Function(_) => "function literal",
            Self::Identifier(_) => "identifier",
            Self::Unary(_) => "unary expression",
            Self::Binary(_) => "binary expression",
            Self::Index(_) => "index expression",
            Self::Selector(_) => "selector expression",
            Self::Paren(_) => "parenthesized expression",
            Self::Call(_) => "call expression",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArrayExpr {
    pub elements: Vec<ArrayElement>,
    pub span: Span,
}

/// One element of an array literal: a bare value keyed by its position,
/// or an explicit `key: value` pair.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "element", content = "expr")]
pub enum ArrayElement {
    Positional(Expr),
    Pair(KeyValueExpr),
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyValueExpr {
    pub key: Expr,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumberExpr {
    pub value: i64,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct StringExpr {
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionExpr {
    pub params: Vec<IdentExpr>,
    pub body: BlockStmt,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct IdentExpr {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnaryExpr {
    pub operator: UnaryOp,
    pub operand: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum UnaryOp {
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "-")]
    Negate,
    #[strum(serialize = "!")]
    Not,
}

#[derive(Debug, Clone, Serialize)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub operator: BinaryOp,
    pub right: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum BinaryOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "%")]
    Remainder,
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
    #[strum(serialize = "==")]
    Equal,
    #[strum(serialize = "!=")]
    NotEqual,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = "<=")]
    LessEqual,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = ">=")]
    GreaterEqual,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexExpr {
    pub object: Box<Expr>,
    pub index: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectorExpr {
    pub object: Box<Expr>,
    pub field: IdentExpr,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParenExpr {
    pub expression: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub arguments: Vec<Expr>,
    pub span: Span,
}
