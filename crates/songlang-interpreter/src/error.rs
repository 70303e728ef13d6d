use std::fmt;

use songlang_common::Position;

/// Runtime error taxonomy (spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NodeNotFound,
    PropertyNotFound,
    TypeMismatch,
    InvalidCondition,
    DivisionByZero,
    InvalidOperand,
    CannotPerform,
    SyntaxError,
    UnexpectedToken,
    RuntimeError,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::NodeNotFound => "NodeNotFound",
            ErrorKind::PropertyNotFound => "PropertyNotFound",
            ErrorKind::TypeMismatch => "TypeMismatch",
            ErrorKind::InvalidCondition => "InvalidCondition",
            ErrorKind::DivisionByZero => "DivisionByZero",
            ErrorKind::InvalidOperand => "InvalidOperand",
            ErrorKind::CannotPerform => "CannotPerform",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::UnexpectedToken => "UnexpectedToken",
            ErrorKind::RuntimeError => "RuntimeError",
        }
    }
}

/// A runtime failure raised while executing a statement or evaluating an
/// expression. Formatted per spec §7: `"[Error] <label>: <message>\n  at
/// line <n>[: <source line>]"`.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpreterError {
    pub kind: ErrorKind,
    pub message: String,
    pub position: Position,
    pub source_line: Option<String>,
}

impl InterpreterError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            message: message.into(),
            position,
            source_line: None,
        }
    }

    /// Attaches the offending source line, shown in the error's final
    /// `: <source line>` suffix.
    pub fn with_source_line(mut self, line: impl Into<String>) -> Self {
        self.source_line = Some(line.into());
        self
    }
}

impl fmt::Display for InterpreterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Error] {}: {}\n  at line {}",
            self.kind.label(),
            self.message,
            self.position.line
        )?;
        if let Some(source_line) = &self.source_line {
            write!(f, ": {source_line}")?;
        }
        Ok(())
    }
}

impl std::error::Error for InterpreterError {}

/// Unifies the three pipeline stage errors behind one type for hosts
/// that just want to run a program end to end (spec §6 `run`).
#[derive(Debug, Clone, thiserror::Error)]
pub enum SongError {
    #[error(transparent)]
    Tokenizer(#[from] songlang_lexer::TokenizerError),
    #[error(transparent)]
    Parser(#[from] songlang_parser::ParserError),
    #[error(transparent)]
    Interpreter(#[from] InterpreterError),
}
