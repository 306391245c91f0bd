use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    Number,
    String,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    AndAnd,
    OrOr,
    EqualEqual,
    Less,
    Greater,
    Bang,
    BangEqual,
    LessEqual,
    GreaterEqual,

    // Punctuation
    LeftParen,
    LeftBracket,
    LeftBrace,
    Comma,
    Dot,
    RightParen,
    RightBracket,
    RightBrace,
    Semicolon,
    Colon,

    // Keywords
    If,
    Else,
    Func,
    Return,
    While,

    Identifier,

    Eof,
}

/// Precedence of the lowest binary operator (`||`).
pub const LOWEST_PRECEDENCE: u8 = 1;

impl TokenKind {
    /// Binary operator precedence, from 1 (`||`) to 5 (`* / %`).
    /// Returns 0 for tokens that are not binary operators.
    pub fn precedence(self) -> u8 {
        match self {
            Self::OrOr => 1,
            Self::AndAnd => 2,
            Self::EqualEqual
            | Self::BangEqual
            | Self::Less
            | Self::LessEqual
            | Self::Greater
            | Self::GreaterEqual => 3,
            Self::Plus | Self::Minus => 4,
            Self::Star | Self::Slash | Self::Percent => 5,
            _ => 0,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => write!(f, "NUMBER"),
            Self::String => write!(f, "STRING"),
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Star => write!(f, "*"),
            Self::Slash => write!(f, "/"),
            Self::Percent => write!(f, "%"),
            Self::Assign => write!(f, "="),
            Self::AndAnd => write!(f, "&&"),
            Self::OrOr => write!(f, "||"),
            Self::EqualEqual => write!(f, "=="),
            Self::Less => write!(f, "<"),
            Self::Greater => write!(f, ">"),
            Self::Bang => write!(f, "!"),
            Self::BangEqual => write!(f, "!="),
            Self::LessEqual => write!(f, "<="),
            Self::GreaterEqual => write!(f, ">="),
            Self::LeftParen => write!(f, "("),
            Self::LeftBracket => write!(f, "["),
            Self::LeftBrace => write!(f, "{{"),
            Self::Comma => write!(f, ","),
            Self::Dot => write!(f, "."),
            Self::RightParen => write!(f, ")"),
            Self::RightBracket => write!(f, "]"),
            Self::RightBrace => write!(f, "}}"),
            Self::Semicolon => write!(f, ";"),
            Self::Colon => write!(f, ":"),
            Self::If => write!(f, "if"),
            Self::Else => write!(f, "else"),
            Self::Func => write!(f, "func"),
            Self::Return => write!(f, "return"),
            Self::While => write!(f, "while"),
            Self::Identifier => write!(f, "IDENTIFIER"),
            Self::Eof => write!(f, "EOF"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// Byte offset one past the last byte of the span.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(&self, other: Span) -> Span {
        Span::new(self.offset, other.end().saturating_sub(self.offset))
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        miette::SourceSpan::new(span.offset.into(), span.len)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }
}

/// `offset..end Kind "lexeme"`, the line format of `--dump-tokens`.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{} {:?} {:?}",
            self.span.offset,
            self.span.end(),
            self.kind,
            self.lexeme
        )
    }
}

/// Exact-text lookup for operators, punctuation and keywords.
pub fn fixed_kind(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "+" => TokenKind::Plus,
        "-" => TokenKind::Minus,
        "*" => TokenKind::Star,
        "/" => TokenKind::Slash,
        "%" => TokenKind::Percent,
        "=" => TokenKind::Assign,
        "&&" => TokenKind::AndAnd,
        "||" => TokenKind::OrOr,
        "==" => TokenKind::EqualEqual,
        "<" => TokenKind::Less,
        ">" => TokenKind::Greater,
        "!" => TokenKind::Bang,
        "!=" => TokenKind::BangEqual,
        "<=" => TokenKind::LessEqual,
        ">=" => TokenKind::GreaterEqual,
        "(" => TokenKind::LeftParen,
        "[" => TokenKind::LeftBracket,
        "{" => TokenKind::LeftBrace,
        "," => TokenKind::Comma,
        "." => TokenKind::Dot,
        ")" => TokenKind::RightParen,
        "]" => TokenKind::RightBracket,
        "}" => TokenKind::RightBrace,
        ";" => TokenKind::Semicolon,
        ":" => TokenKind::Colon,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "func" => TokenKind::Func,
        "return" => TokenKind::Return,
        "while" => TokenKind::While,
        _ => return None,
    };
    Some(kind)
}
