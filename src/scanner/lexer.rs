use winnow::combinator::alt;
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::stream::{LocatingSlice, Location};
use winnow::token::{any, take_until, take_while};

use crate::error::CompileError;
use crate::scanner::token::{Span, Token, TokenKind, fixed_kind};

type Input<'a> = LocatingSlice<&'a str>;

/// A token before classification: only its extent in the source is known,
/// plus the decoded contents when it is a string literal.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawToken {
    pub span: Span,
    pub value: Option<String>,
}

impl RawToken {
    fn new(span: Span) -> Self {
        Self { span, value: None }
    }

    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.offset..self.span.end()]
    }
}

fn skip_trivia(input: &mut Input<'_>, errors: &mut Vec<CompileError>) {
    loop {
        let before = input.current_token_start();
        let _ = take_while::<_, _, ContextError>(0.., |c: char| {
            c == ' ' || c == '\t' || c == '\r' || c == '\n'
        })
        .parse_next(input);

        if input.starts_with("//") {
            let _ = take_while::<_, _, ContextError>(0.., |c: char| c != '\n').parse_next(input);
        } else if input.starts_with("/*") {
            let start = input.current_token_start();
            let remaining = input.len();
            let closed: Result<(), ContextError> =
                ("/*", take_until(0.., "*/"), "*/").void().parse_next(input);
            if closed.is_err() {
                errors.push(CompileError::scan("comment not terminated", start, remaining));
                let _ = take_while::<_, _, ContextError>(0.., |_: char| true).parse_next(input);
            }
        } else if input.current_token_start() == before {
            break;
        }
    }
}

fn string_literal(input: &mut Input<'_>) -> Result<RawToken, CompileError> {
    let start = input.current_token_start();
    let _ = any::<_, ContextError>.parse_next(input);
    let mut value = String::new();
    let mut bad_escape: Option<(usize, char)> = None;
    loop {
        let offset = input.current_token_start();
        match any::<_, ContextError>.parse_next(input) {
            Ok('"') => break,
            Ok('\\') => match any::<_, ContextError>.parse_next(input) {
                Ok('n') => value.push('\n'),
                Ok('t') => value.push('\t'),
                Ok('r') => value.push('\r'),
                Ok('0') => value.push('\0'),
                Ok('\\') => value.push('\\'),
                Ok('"') => value.push('"'),
                Ok('\n') | Err(_) => {
                    return Err(CompileError::scan(
                        "literal not terminated",
                        start,
                        offset - start,
                    ));
                }
                Ok(other) => {
                    bad_escape.get_or_insert((offset, other));
                }
            },
            Ok('\n') | Err(_) => {
                return Err(CompileError::scan(
                    "literal not terminated",
                    start,
                    offset - start,
                ));
            }
            Ok(other) => value.push(other),
        }
    }
    if let Some((offset, c)) = bad_escape {
        return Err(CompileError::scan(
            format!("invalid escape sequence '\\{c}'"),
            offset,
            1 + c.len_utf8(),
        ));
    }
    let end = input.current_token_start();
    Ok(RawToken {
        span: Span::new(start, end - start),
        value: Some(value),
    })
}

fn number_literal(input: &mut Input<'_>) -> ModalResult<RawToken> {
    let start = input.current_token_start();
    take_while(1.., |c: char| c.is_ascii_digit())
        .void()
        .parse_next(input)?;

    let checkpoint = input.checkpoint();
    let fraction: Result<_, ContextError> = (
        '.',
        take_while(1.., |c: char| c.is_ascii_digit()),
    )
        .void()
        .parse_next(input);
    if fraction.is_err() {
        input.reset(&checkpoint);
    }
    let end = input.current_token_start();
    Ok(RawToken::new(Span::new(start, end - start)))
}

fn word(input: &mut Input<'_>) -> ModalResult<RawToken> {
    let start = input.current_token_start();
    any.verify(|c: &char| c.is_alphabetic() || *c == '_')
        .void()
        .parse_next(input)?;
    take_while(0.., |c: char| c.is_alphanumeric() || c == '_')
        .void()
        .parse_next(input)?;
    let end = input.current_token_start();
    Ok(RawToken::new(Span::new(start, end - start)))
}

fn single_char(input: &mut Input<'_>) -> ModalResult<RawToken> {
    let start = input.current_token_start();
    let c: char = any.parse_next(input)?;
    Ok(RawToken::new(Span::new(start, c.len_utf8())))
}

/// Split the source into raw tokens, collecting every rejected fragment.
fn scan_raw(source: &str) -> (Vec<RawToken>, Vec<CompileError>) {
    let mut input = LocatingSlice::new(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    loop {
        skip_trivia(&mut input, &mut errors);
        if input.is_empty() {
            break;
        }
        if input.starts_with('"') {
            match string_literal(&mut input) {
                Ok(token) => tokens.push(token),
                Err(e) => errors.push(e),
            }
            continue;
        }
        match alt((number_literal, word, single_char)).parse_next(&mut input) {
            Ok(token) => tokens.push(token),
            Err(_) => break,
        }
    }

    (tokens, errors)
}

fn joins(first: &str, second: &str) -> bool {
    matches!(
        (first, second),
        ("=" | "!" | "<" | ">", "=") | ("&", "&") | ("|", "|")
    )
}

/// Merge textually adjacent pairs into the two-character operators
/// `== != <= >= && ||`. Every other token passes through untouched.
pub(crate) fn merge_compound_operators(raw: Vec<RawToken>, source: &str) -> Vec<RawToken> {
    let mut merged: Vec<RawToken> = Vec::with_capacity(raw.len());
    for token in raw {
        if let Some(prev) = merged.last_mut() {
            if prev.span.end() == token.span.offset
                && prev.value.is_none()
                && joins(prev.text(source), token.text(source))
            {
                prev.span = prev.span.to(token.span);
                continue;
            }
        }
        merged.push(token);
    }
    merged
}

fn classify(raw: RawToken, source: &str) -> Result<Token, CompileError> {
    if let Some(value) = raw.value {
        return Ok(Token::new(TokenKind::String, value, raw.span));
    }
    let text = raw.text(source);
    let kind = if text.parse::<i64>().is_ok() {
        TokenKind::Number
    } else if let Some(kind) = fixed_kind(text) {
        kind
    } else if text.chars().next().is_some_and(char::is_alphabetic) {
        TokenKind::Identifier
    } else {
        return Err(CompileError::scan(
            format!("invalid token '{text}'"),
            raw.span.offset,
            raw.span.len,
        ));
    };
    Ok(Token::new(kind, text, raw.span))
}

/// Scan all tokens from source, returning either a token list or every scan error.
pub fn scan_all(source: &str) -> Result<Vec<Token>, Vec<CompileError>> {
    let (raw, mut errors) = scan_raw(source);
    let raw = merge_compound_operators(raw, source);

    let mut tokens = Vec::with_capacity(raw.len() + 1);
    for token in raw {
        match classify(token, source) {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }
    tokens.push(Token::new(TokenKind::Eof, "", Span::new(source.len(), 0)));

    if errors.is_empty() {
        Ok(tokens)
    } else {
        errors.sort_by_key(CompileError::offset);
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn scan_ok(source: &str) -> Vec<Token> {
        scan_all(source).expect("scan should succeed")
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    fn lexemes(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.lexeme.as_str()).collect()
    }

    #[test]
    fn punctuation() {
        let tokens = scan_ok("( [ { , . ) ] } ; :");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::LeftParen,
                TokenKind::LeftBracket,
                TokenKind::LeftBrace,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::RightParen,
                TokenKind::RightBracket,
                TokenKind::RightBrace,
                TokenKind::Semicolon,
                TokenKind::Colon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn compound_operators() {
        let tokens = scan_ok("== != <= >= && ||");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn separated_operators_stay_single() {
        let tokens = scan_ok("= = ! = < = > =");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Assign,
                TokenKind::Assign,
                TokenKind::Bang,
                TokenKind::Assign,
                TokenKind::Less,
                TokenKind::Assign,
                TokenKind::Greater,
                TokenKind::Assign,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn assignment_without_spaces_keeps_operator() {
        let tokens = scan_ok("x=1;");
        assert_eq!(lexemes(&tokens), vec!["x", "=", "1", ";", ""]);
    }

    #[rstest]
    #[case("===", &["==", "="])]
    #[case("!==", &["!=", "="])]
    #[case("<<=", &["<", "<="])]
    #[case("a<=b", &["a", "<=", "b"])]
    #[case("!!x", &["!", "!", "x"])]
    fn merge_cases(#[case] source: &str, #[case] expected: &[&str]) {
        let tokens = scan_ok(source);
        assert_eq!(&lexemes(&tokens)[..expected.len()], expected);
        assert_eq!(tokens.len(), expected.len() + 1);
    }

    #[rstest]
    #[case("a == b && !c")]
    #[case("x<=y||z>=w")]
    #[case("===!=")]
    #[case("\"==\" = \"=\"")]
    fn merge_is_idempotent(#[case] source: &str) {
        let (raw, errors) = scan_raw(source);
        assert!(errors.is_empty());
        let once = merge_compound_operators(raw, source);
        let twice = merge_compound_operators(once.clone(), source);
        assert_eq!(once, twice);
    }

    #[test]
    fn lone_ampersand_and_pipe_are_invalid_tokens() {
        let errors = scan_all("a & b | c").unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].to_string().contains("'&'"));
        assert!(errors[1].to_string().contains("'|'"));
    }

    #[test]
    fn keywords_and_identifiers() {
        let tokens = scan_ok("if else func return while true foo");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::If,
                TokenKind::Else,
                TokenKind::Func,
                TokenKind::Return,
                TokenKind::While,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_literal_is_decoded() {
        let tokens = scan_ok(r#""hello\n\"world\"""#);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].lexeme, "hello\n\"world\"");
        assert_eq!(tokens[0].span, Span::new(0, 18));
    }

    #[test]
    fn number_literal() {
        let tokens = scan_ok("42");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme, "42");
    }

    #[rstest]
    #[case("1.5")]
    #[case("99999999999999999999")]
    #[case("_x")]
    #[case("@")]
    fn invalid_tokens(#[case] source: &str) {
        let errors = scan_all(source).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(
            errors[0].to_string().contains("invalid token"),
            "{}",
            errors[0]
        );
    }

    #[test]
    fn errors_are_aggregated() {
        let errors = scan_all("x = @;\ny = \"abc\\q\";\nz = #;").unwrap_err();
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(messages.len(), 3, "{messages:?}");
        assert!(messages[0].contains("'@'"));
        assert!(messages[1].contains("invalid escape"));
        assert!(messages[2].contains("'#'"));
    }

    #[test]
    fn unterminated_string() {
        let errors = scan_all("x = \"abc\ny = 1;").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("literal not terminated"));
    }

    #[test]
    fn comments_are_skipped() {
        let tokens = scan_ok("x // line\n/* block\n comment */ y");
        assert_eq!(lexemes(&tokens), vec!["x", "y", ""]);
    }

    #[test]
    fn unterminated_block_comment() {
        let errors = scan_all("x /* never closed").unwrap_err();
        assert!(errors[0].to_string().contains("comment not terminated"));
    }

    #[test]
    fn spans_are_correct() {
        let tokens = scan_ok("x = 42;");
        assert_eq!(tokens[0].span, Span::new(0, 1));
        assert_eq!(tokens[1].span, Span::new(2, 1));
        assert_eq!(tokens[2].span, Span::new(4, 2));
        assert_eq!(tokens[3].span, Span::new(6, 1));
        assert_eq!(tokens[4].span, Span::new(7, 0));
    }

    #[test]
    fn merged_span_covers_both_characters() {
        let tokens = scan_ok("a >= b");
        assert_eq!(tokens[1].kind, TokenKind::GreaterEqual);
        assert_eq!(tokens[1].span, Span::new(2, 2));
    }
}
