use std::fmt;

use crate::position::Position;

/// The kind of a SongLang token.
///
/// Keyword variants are matched case-insensitively by the lexer (§4.1);
/// everything else is case-sensitive source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    Number,
    String,
    Identifier,
    /// `?` by itself.
    Question,
    /// `?name` -- the captured name is carried in `Token::value`.
    QueryVar,

    // Keywords
    Is,
    Has,
    Do,
    End,
    Print,
    Can,
    Loses,
    Relation,
    Debug,
    When,
    Else,
    All,
    Each,
    Where,
    Of,
    Random,
    Chance,
    And,
    Or,
    Not,

    // Punctuation
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,

    Newline,
    Eof,
}

impl TokenKind {
    /// Look up a lowercased identifier against the keyword table (§4.1).
    ///
    /// Returns `None` if `lowered` is not a keyword -- the caller should
    /// then treat the token as `TokenKind::Identifier`.
    pub fn keyword_from_lowercase(lowered: &str) -> Option<TokenKind> {
        Some(match lowered {
            "is" => TokenKind::Is,
            "has" => TokenKind::Has,
            "do" => TokenKind::Do,
            "end" => TokenKind::End,
            "print" => TokenKind::Print,
            "can" => TokenKind::Can,
            "loses" => TokenKind::Loses,
            "relation" => TokenKind::Relation,
            "debug" => TokenKind::Debug,
            "when" => TokenKind::When,
            "else" => TokenKind::Else,
            "all" => TokenKind::All,
            "each" => TokenKind::Each,
            "where" => TokenKind::Where,
            "of" => TokenKind::Of,
            "random" => TokenKind::Random,
            "chance" => TokenKind::Chance,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            _ => return None,
        })
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The literal payload carried by `NUMBER`, `STRING`, and `QUERY_VAR` tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Number(f64),
    String(String),
}

/// A single scanned token (§3 Data model).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub value: Option<TokenValue>,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            value: None,
            position,
        }
    }

    pub fn with_value(
        kind: TokenKind,
        lexeme: impl Into<String>,
        value: TokenValue,
        position: Position,
    ) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            value: Some(value),
            position,
        }
    }

    pub fn line(&self) -> u32 {
        self.position.line
    }

    pub fn column(&self) -> u32 {
        self.position.column
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})", self.kind, self.lexeme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup_is_case_prenormalized() {
        assert_eq!(
            TokenKind::keyword_from_lowercase("print"),
            Some(TokenKind::Print)
        );
        assert_eq!(TokenKind::keyword_from_lowercase("PRINT"), None);
        assert_eq!(TokenKind::keyword_from_lowercase("goblin"), None);
    }

    #[test]
    fn token_carries_position() {
        let tok = Token::new(TokenKind::Identifier, "Player", Position::new(2, 5));
        assert_eq!(tok.line(), 2);
        assert_eq!(tok.column(), 5);
        assert_eq!(tok.lexeme, "Player");
    }
}
