use std::rc::Rc;

use tracing::debug;

use crate::ast::*;
use crate::error::CompileError;
use crate::scanner::token::{LOWEST_PRECEDENCE, Span, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    name: String,
}

impl Parser {
    /// An `Eof` token is appended when `tokens` does not already end with
    /// one, so hand-built token lists parse like scanner output.
    pub fn new(mut tokens: Vec<Token>, name: impl Into<String>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let end = tokens.last().map_or(0, |t| t.span.end());
            tokens.push(Token::new(TokenKind::Eof, "", Span::new(end, 0)));
        }
        Self {
            tokens,
            current: 0,
            name: name.into(),
        }
    }

    /// Parse a whole file. The first structural error aborts parsing.
    pub fn parse(mut self) -> Result<Program, CompileError> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.statement()?);
        }
        debug!(statements = statements.len(), name = %self.name, "parsed program");
        Ok(Program {
            name: self.name,
            statements,
        })
    }

    fn statement(&mut self) -> Result<Stmt, CompileError> {
        match self.peek().kind {
            TokenKind::LeftBrace => {
                let block = self.block()?;
                self.expect_terminator()?;
                Ok(Stmt::Block(block))
            }
            TokenKind::If => self.if_statement(),
            TokenKind::Semicolon => {
                let span = self.advance().span;
                Ok(Stmt::Empty(EmptyStmt { span }))
            }
            TokenKind::While => self.while_statement(),
            TokenKind::Return => self.return_statement(),
            TokenKind::Identifier | TokenKind::LeftBracket | TokenKind::LeftParen => {
                self.simple_statement()
            }
            _ => Err(self.error_at_current("expected statement")),
        }
    }

    /// A statement ends with `;` unless the next token closes a group.
    fn expect_terminator(&mut self) -> Result<(), CompileError> {
        match self.peek().kind {
            TokenKind::RightParen | TokenKind::RightBracket => Ok(()),
            _ => self.consume(TokenKind::Semicolon, "';'").map(|_| ()),
        }
    }

    fn block(&mut self) -> Result<BlockStmt, CompileError> {
        let start = self.current_span();
        self.consume(TokenKind::LeftBrace, "'{'")?;
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.statement()?);
        }
        self.consume(TokenKind::RightBrace, "'}' at end of block")?;
        Ok(BlockStmt {
            statements,
            span: self.span_from(start),
        })
    }

    fn if_statement(&mut self) -> Result<Stmt, CompileError> {
        let start = self.current_span();
        self.advance(); // consume 'if'
        let condition = self.expression()?;
        if !self.check(TokenKind::LeftBrace) {
            return Err(self.error_at_current("expected '{' before if body"));
        }
        let then_branch = self.block()?;

        let else_branch = if self.match_token(TokenKind::Else) {
            let branch = match self.peek().kind {
                TokenKind::If => self.if_statement()?,
                TokenKind::LeftBrace => {
                    let block = self.block()?;
                    self.expect_terminator()?;
                    Stmt::Block(block)
                }
                _ => {
                    return Err(
                        self.error_at_current("expected 'if' or '{' after 'else'")
                    );
                }
            };
            Some(Box::new(branch))
        } else {
            self.expect_terminator()?;
            None
        };

        Ok(Stmt::If(IfStmt {
            condition,
            then_branch,
            else_branch,
            span: self.span_from(start),
        }))
    }

    fn while_statement(&mut self) -> Result<Stmt, CompileError> {
        let start = self.current_span();
        self.advance(); // consume 'while'
        let condition = self.expression()?;
        if !self.check(TokenKind::LeftBrace) {
            return Err(self.error_at_current("expected '{' before while body"));
        }
        let body = self.block()?;
        Ok(Stmt::While(WhileStmt {
            condition,
            body,
            span: self.span_from(start),
        }))
    }

    fn return_statement(&mut self) -> Result<Stmt, CompileError> {
        let start = self.current_span();
        self.advance(); // consume 'return'
        let value = match self.peek().kind {
            TokenKind::Semicolon | TokenKind::RightBrace => None,
            _ => Some(self.expression()?),
        };
        self.expect_terminator()?;
        Ok(Stmt::Return(ReturnStmt {
            value,
            span: self.span_from(start),
        }))
    }

    /// Assignment or expression statement; both start with an expression.
    fn simple_statement(&mut self) -> Result<Stmt, CompileError> {
        let start = self.current_span();
        let expression = self.expression()?;
        if self.match_token(TokenKind::Assign) {
            let value = self.expression()?;
            self.expect_terminator()?;
            return Ok(Stmt::Assign(AssignStmt {
                target: expression,
                value,
                span: self.span_from(start),
            }));
        }
        self.expect_terminator()?;
        Ok(Stmt::Expression(ExprStmt {
            expression,
            span: self.span_from(start),
        }))
    }

    fn expression(&mut self) -> Result<Expr, CompileError> {
        self.binary(LOWEST_PRECEDENCE)
    }

    /// Precedence climbing: operators of equal precedence associate left.
    fn binary(&mut self, min_precedence: u8) -> Result<Expr, CompileError> {
        let mut left = self.unary()?;
        loop {
            let kind = self.peek().kind;
            let precedence = kind.precedence();
            if precedence == 0 || precedence < min_precedence {
                return Ok(left);
            }
            self.advance();
            let right = self.binary(precedence + 1)?;
            let span = left.span().to(right.span());
            left = Expr::Binary(BinaryExpr {
                left: Box::new(left),
                operator: token_to_binary_op(kind),
                right: Box::new(right),
                span,
            });
        }
    }

    fn unary(&mut self) -> Result<Expr, CompileError> {
        let operator = match self.peek().kind {
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Minus => UnaryOp::Negate,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.postfix(),
        };
        let start = self.advance().span;
        let operand = self.unary()?;
        let span = start.to(operand.span());
        Ok(Expr::Unary(UnaryExpr {
            operator,
            operand: Box::new(operand),
            span,
        }))
    }

    /// An operand followed by any chain of `.name`, `[index]` and `(args)`.
    fn postfix(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.operand()?;

        loop {
            if self.match_token(TokenKind::Dot) {
                let field = self.identifier("selector after '.'")?;
                let span = expr.span().to(field.span);
                expr = Expr::Selector(SelectorExpr {
                    object: Box::new(expr),
                    field,
                    span,
                });
            } else if self.match_token(TokenKind::LeftBracket) {
                let index = self.expression()?;
                self.consume(TokenKind::RightBracket, "']' in index expression")?;
                let span = expr.span().to(self.previous_span());
                expr = Expr::Index(IndexExpr {
                    object: Box::new(expr),
                    index: Box::new(index),
                    span,
                });
            } else if self.match_token(TokenKind::LeftParen) {
                let arguments =
                    self.comma_separated(TokenKind::RightParen, "')' at end of call", Self::expression)?;
                let span = expr.span().to(self.previous_span());
                expr = Expr::Call(CallExpr {
                    callee: Box::new(expr),
                    arguments,
                    span,
                });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn operand(&mut self) -> Result<Expr, CompileError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Identifier => Ok(Expr::Identifier(self.identifier("identifier")?)),
            TokenKind::Number => {
                self.advance();
                let value = token.lexeme.parse::<i64>().map_err(|e| {
                    CompileError::parse(
                        format!("invalid number '{}': {e}", token.lexeme),
                        token.span.offset,
                        token.span.len,
                    )
                })?;
                Ok(Expr::Number(NumberExpr {
                    value,
                    span: token.span,
                }))
            }
            TokenKind::String => {
                self.advance();
                Ok(Expr::Str(StringExpr {
                    value: token.lexeme,
                    span: token.span,
                }))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expression = self.expression()?;
                self.consume(TokenKind::RightParen, "')' following '('")?;
                Ok(Expr::Paren(ParenExpr {
                    expression: Box::new(expression),
                    span: self.span_from(token.span),
                }))
            }
            TokenKind::LeftBracket => {
                self.advance();
                let elements = self.comma_separated(
                    TokenKind::RightBracket,
                    "']' at end of array",
                    Self::array_element,
                )?;
                Ok(Expr::Array(ArrayExpr {
                    elements,
                    span: self.span_from(token.span),
                }))
            }
            TokenKind::Func => self.function_literal(),
            _ => Err(self.error_at_current("expected expression")),
        }
    }

    fn array_element(&mut self) -> Result<ArrayElement, CompileError> {
        let key = self.expression()?;
        if self.match_token(TokenKind::Colon) {
            let value = self.expression()?;
            let span = key.span().to(value.span());
            return Ok(ArrayElement::Pair(KeyValueExpr { key, value, span }));
        }
        Ok(ArrayElement::Positional(key))
    }

    fn function_literal(&mut self) -> Result<Expr, CompileError> {
        let start = self.current_span();
        self.advance(); // consume 'func'
        self.consume(TokenKind::LeftParen, "'(' at beginning of parameter list")?;
        let params = self.comma_separated(
            TokenKind::RightParen,
            "')' at end of parameter list",
            |p| p.identifier("parameter name"),
        )?;
        if !self.check(TokenKind::LeftBrace) {
            return Err(self.error_at_current("expected '{' at beginning of function body"));
        }
        let body = self.block()?;
        Ok(Expr::Function(Rc::new(FunctionExpr {
            params,
            body,
            span: self.span_from(start),
        })))
    }

    /// Parse `item (, item)* ,? close`, with the opening token already consumed.
    fn comma_separated<T>(
        &mut self,
        close: TokenKind,
        close_message: &str,
        mut item: impl FnMut(&mut Self) -> Result<T, CompileError>,
    ) -> Result<Vec<T>, CompileError> {
        let mut items = Vec::new();
        while !self.check(close) && !self.is_at_end() {
            items.push(item(self)?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        self.consume(close, close_message)?;
        Ok(items)
    }

    // --- Helper methods ---

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<&Token, CompileError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(&format!("expected {message}")))
        }
    }

    fn identifier(&mut self, context: &str) -> Result<IdentExpr, CompileError> {
        if self.check(TokenKind::Identifier) {
            let token = self.advance();
            Ok(IdentExpr {
                name: token.lexeme.clone(),
                span: token.span,
            })
        } else {
            Err(self.error_at_current(&format!("expected {context}")))
        }
    }

    fn error_at_current(&self, message: &str) -> CompileError {
        let token = self.peek();
        let found = match token.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::String => format!("\"{}\"", token.lexeme),
            _ => format!("'{}'", token.lexeme),
        };
        CompileError::parse(
            format!("{message}, found {found}"),
            token.span.offset,
            token.span.len.max(1),
        )
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    fn previous_span(&self) -> Span {
        self.tokens[self.current.saturating_sub(1)].span
    }

    fn span_from(&self, start: Span) -> Span {
        start.to(self.previous_span())
    }
}

fn token_to_binary_op(kind: TokenKind) -> BinaryOp {
    match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Subtract,
        TokenKind::Star => BinaryOp::Multiply,
        TokenKind::Slash => BinaryOp::Divide,
        TokenKind::Percent => BinaryOp::Remainder,
        TokenKind::AndAnd => BinaryOp::And,
        TokenKind::OrOr => BinaryOp::Or,
        TokenKind::EqualEqual => BinaryOp::Equal,
        TokenKind::BangEqual => BinaryOp::NotEqual,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::LessEqual => BinaryOp::LessEqual,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
        _ => unreachable!("only called with tokens that have a binary precedence"),
    }
}
