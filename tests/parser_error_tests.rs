use tinyscript::CompileError;
use tinyscript::parser::Parser;
use tinyscript::scanner;

use rstest::rstest;

fn parse_error(source: &str) -> CompileError {
    let tokens = scanner::scan(source).expect("scan should succeed");
    Parser::new(tokens, "test").parse().unwrap_err()
}

fn scan_errors(source: &str) -> Vec<CompileError> {
    scanner::scan(source).unwrap_err()
}

#[test]
fn missing_semicolon_in_function_body() {
    let source = include_str!("../fixtures/error_missing_semicolon.tiny");
    let err = parse_error(source);
    assert!(matches!(err, CompileError::Parse { .. }));
    assert_eq!(err.to_string(), "parse error: expected ';', found 'return'");
    assert_eq!(err.offset(), source.find("return").unwrap_or_default());
}

#[rstest]
#[case("if x { print(1); }", "expected ';', found end of input")]
#[case("if x print(1);", "expected '{' before if body")]
#[case("while x print(1);", "expected '{' before while body")]
#[case("if x {} else print(1);", "expected 'if' or '{' after 'else'")]
#[case("print(\"a\" \"b\");", "found \"b\"")]
#[case("1 = x;", "expected statement")]
fn reports_first_syntax_error(#[case] source: &str, #[case] fragment: &str) {
    let message = parse_error(source).to_string();
    assert!(
        message.contains(fragment),
        "error should mention {fragment}: {message}"
    );
}

#[test]
fn only_first_syntax_error_is_reported() {
    let err = parse_error("x = 1\ny = 2\n");
    assert_eq!(err.offset(), 6);
}

#[test]
fn scan_errors_are_aggregated_in_source_order() {
    let errors = scan_errors("a = 1 & 2;\nb = @;\nc = 1.5;");
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert_eq!(
        messages,
        [
            "scan error: invalid token '&'",
            "scan error: invalid token '@'",
            "scan error: invalid token '1.5'",
        ]
    );
}

#[test]
fn scan_errors_come_before_parsing() {
    let errors = scan_errors("x = \"open\ny = (;");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("literal not terminated"));
}
