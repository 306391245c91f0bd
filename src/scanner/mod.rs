pub mod lexer;
pub mod token;

use tracing::debug;

use crate::error::CompileError;
use token::Token;

/// Scan source code into a list of classified tokens ending in `Eof`.
pub fn scan(source: &str) -> Result<Vec<Token>, Vec<CompileError>> {
    let result = lexer::scan_all(source);
    match &result {
        Ok(tokens) => debug!(tokens = tokens.len(), "scanned source"),
        Err(errors) => debug!(errors = errors.len(), "scan failed"),
    }
    result
}
