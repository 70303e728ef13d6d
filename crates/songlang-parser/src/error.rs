use songlang_common::{Position, Token};

/// A parser failure, reported against the offending token (spec §4.2, §7).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[{position}] {message}")]
pub struct ParserError {
    pub message: String,
    pub position: Position,
    pub found: String,
}

impl ParserError {
    pub fn new(message: impl Into<String>, token: &Token) -> Self {
        Self {
            message: message.into(),
            position: token.position,
            found: token.lexeme.clone(),
        }
    }
}
