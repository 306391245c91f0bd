use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::scanner::token::Span;

/// A problem found before the program runs. Rendered through miette, so the
/// CLI can point at the offending text.
#[derive(Error, Debug, Diagnostic)]
pub enum CompileError {
    #[error("scan error: {message}")]
    #[diagnostic(code(tinyscript::scan))]
    Scan {
        message: String,
        #[label("rejected here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("parse error: {message}")]
    #[diagnostic(code(tinyscript::parse))]
    Parse {
        message: String,
        #[label("here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },
}

fn unnamed_source() -> NamedSource<String> {
    NamedSource::new("<source>", String::new())
}

impl CompileError {
    pub fn scan(message: impl Into<String>, offset: usize, len: usize) -> Self {
        Self::Scan {
            message: message.into(),
            span: (offset, len).into(),
            src: unnamed_source(),
        }
    }

    pub fn parse(message: impl Into<String>, offset: usize, len: usize) -> Self {
        Self::Parse {
            message: message.into(),
            span: (offset, len).into(),
            src: unnamed_source(),
        }
    }

    /// Byte offset of the offending text.
    pub fn offset(&self) -> usize {
        match self {
            Self::Scan { span, .. } | Self::Parse { span, .. } => span.offset(),
        }
    }

    /// Replace the placeholder source so a report can show the file.
    pub fn with_source_code(self, name: impl Into<String>, source: impl Into<String>) -> Self {
        let src = NamedSource::new(name.into(), source.into());
        match self {
            Self::Scan { message, span, .. } => Self::Scan { message, span, src },
            Self::Parse { message, span, .. } => Self::Parse { message, span, src },
        }
    }
}

/// Category of a runtime failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    UndefinedVariable,
    TypeMismatch,
    InvalidOperator,
    DivisionByZero,
    ArityMismatch,
    InvalidAssignment,
    NotCallable,
    NotIndexable,
    Output,
}

/// A failure that halts the running program.
#[derive(Error, Debug)]
#[error("Error: {message}")]
pub struct RuntimeError {
    kind: ErrorKind,
    message: String,
    span: Span,
}

impl RuntimeError {
    pub fn with_span(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// `Error: line N: message`, N being the line of the failing expression.
    pub fn display_with_line(&self, source: &str) -> String {
        format!(
            "Error: line {}: {}",
            line_of(source, self.span.offset),
            self.message
        )
    }
}

/// 1-based line holding byte `offset`. Offsets past the end count as the
/// last line.
fn line_of(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    source.as_bytes()[..end]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}
