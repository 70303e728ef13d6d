use songlang_common::Position;

/// A tokenizer failure with location information (§4.1, §7).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[{position}] {message}")]
pub struct TokenizerError {
    pub message: String,
    pub position: Position,
}

impl TokenizerError {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = TokenizerError::new("unterminated string", Position::new(2, 9));
        assert_eq!(err.to_string(), "[2:9] unterminated string");
    }
}
