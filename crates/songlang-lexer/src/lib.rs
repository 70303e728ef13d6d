//! Tokenizer for the SongLang scripting language (spec §4.1).

mod cursor;
mod error;

use cursor::Cursor;
use songlang_common::{Position, Token, TokenKind, TokenValue};

pub use error::TokenizerError;

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Scans SongLang source text into a stream of [`Token`]s.
///
/// Wraps a [`Cursor`] for byte-level iteration while tracking 1-based
/// line/column independently, since tokens record a point position
/// rather than a byte span.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    line: u32,
    column: u32,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire source into a `Vec<Token>`, including the
    /// trailing `Eof` token.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, TokenizerError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let at_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if at_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Consume one character, keeping line/column bookkeeping in sync.
    fn bump(&mut self) -> Option<char> {
        let c = self.cursor.advance();
        if let Some(c) = c {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        c
    }

    /// Skip spaces, tabs, carriage returns, and `//` line comments.
    ///
    /// Newlines are never skipped here -- they are significant tokens.
    fn skip_trivia(&mut self) {
        loop {
            let before = self.cursor.pos();
            self.cursor.eat_while(|c| c == ' ' || c == '\t' || c == '\r');
            self.column += self.cursor.pos() - before;

            if self.cursor.peek() == Some('/') && self.cursor.peek_next() == Some('/') {
                let comment_start = self.cursor.pos();
                self.cursor.eat_while(|c| c != '\n');
                let comment_end = self.cursor.pos();
                self.column += self.cursor.slice(comment_start, comment_end).chars().count() as u32;
                continue;
            }

            if self.cursor.pos() == before {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, TokenizerError> {
        self.skip_trivia();
        let start = self.position();

        let Some(c) = self.cursor.peek() else {
            return Ok(Token::new(TokenKind::Eof, "", start));
        };

        match c {
            '\n' => {
                self.bump();
                Ok(Token::new(TokenKind::Newline, "\n", start))
            }
            '{' => Ok(self.single(TokenKind::LBrace, start)),
            '}' => Ok(self.single(TokenKind::RBrace, start)),
            '(' => Ok(self.single(TokenKind::LParen, start)),
            ')' => Ok(self.single(TokenKind::RParen, start)),
            ',' => Ok(self.single(TokenKind::Comma, start)),
            '.' => Ok(self.single(TokenKind::Dot, start)),
            '+' => Ok(self.single(TokenKind::Plus, start)),
            '-' => Ok(self.single(TokenKind::Minus, start)),
            '*' => Ok(self.single(TokenKind::Star, start)),
            '/' => Ok(self.single(TokenKind::Slash, start)),
            '%' => Ok(self.single(TokenKind::Percent, start)),
            '=' => self.lex_eq(start),
            '!' => self.lex_bang(start),
            '<' => Ok(self.lex_lt_gt(start, '=', TokenKind::Lte, TokenKind::Lt)),
            '>' => Ok(self.lex_lt_gt(start, '=', TokenKind::Gte, TokenKind::Gt)),
            '?' => Ok(self.lex_question(start)),
            '"' => self.lex_string(start),
            '0'..='9' => Ok(self.lex_number(start)),
            c if is_ident_start(c) => Ok(self.lex_identifier(start)),
            other => Err(TokenizerError::new(
                format!("unexpected character '{other}'"),
                start,
            )),
        }
    }

    fn single(&mut self, kind: TokenKind, start: Position) -> Token {
        let c = self.bump().expect("caller already peeked a character");
        Token::new(kind, c.to_string(), start)
    }

    /// `=` must be followed by `=` (`==`); a bare `=` is a tokenizer error.
    fn lex_eq(&mut self, start: Position) -> Result<Token, TokenizerError> {
        self.bump();
        if self.cursor.peek() == Some('=') {
            self.bump();
            Ok(Token::new(TokenKind::Eq, "==", start))
        } else {
            Err(TokenizerError::new("unexpected character '='", start))
        }
    }

    /// `!` must be followed by `=` (`!=`); a bare `!` is a tokenizer error.
    fn lex_bang(&mut self, start: Position) -> Result<Token, TokenizerError> {
        self.bump();
        if self.cursor.peek() == Some('=') {
            self.bump();
            Ok(Token::new(TokenKind::Neq, "!=", start))
        } else {
            Err(TokenizerError::new("unexpected character '!'", start))
        }
    }

    /// `<`/`>` with optional trailing `=`.
    fn lex_lt_gt(
        &mut self,
        start: Position,
        follow: char,
        with_eq: TokenKind,
        without_eq: TokenKind,
    ) -> Token {
        let base = self.bump().unwrap();
        if self.cursor.peek() == Some(follow) {
            self.bump();
            Token::new(with_eq, format!("{base}{follow}"), start)
        } else {
            Token::new(without_eq, base.to_string(), start)
        }
    }

    /// `?` alone is `QUESTION`; `?name` is `QUERY_VAR` carrying the name.
    fn lex_question(&mut self, start: Position) -> Token {
        self.bump();
        if self.cursor.peek().is_some_and(is_ident_start) {
            let name_start = self.cursor.pos();
            self.cursor.eat_while(is_ident_continue);
            let name_end = self.cursor.pos();
            self.column += name_end - name_start;
            let name = self.cursor.slice(name_start, name_end).to_string();
            Token::with_value(
                TokenKind::QueryVar,
                format!("?{name}"),
                TokenValue::String(name),
                start,
            )
        } else {
            Token::new(TokenKind::Question, "?", start)
        }
    }

    fn lex_number(&mut self, start: Position) -> Token {
        let int_start = self.cursor.pos();
        self.cursor.eat_while(|c| c.is_ascii_digit());

        if self.cursor.peek() == Some('.') && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.advance(); // '.'
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }

        let int_end = self.cursor.pos();
        self.column += int_end - int_start;
        let lexeme = self.cursor.slice(int_start, int_end).to_string();
        let value: f64 = lexeme.parse().expect("number lexeme is always valid f64 text");
        Token::with_value(TokenKind::Number, lexeme, TokenValue::Number(value), start)
    }

    fn lex_string(&mut self, start: Position) -> Result<Token, TokenizerError> {
        self.bump(); // opening quote
        let mut content = String::new();
        loop {
            match self.cursor.peek() {
                None => {
                    return Err(TokenizerError::new("unterminated string literal", start));
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                Some(c) => {
                    content.push(c);
                    self.bump();
                }
            }
        }
        let lexeme = format!("\"{content}\"");
        Ok(Token::with_value(
            TokenKind::String,
            lexeme,
            TokenValue::String(content),
            start,
        ))
    }

    fn lex_identifier(&mut self, start: Position) -> Token {
        let id_start = self.cursor.pos();
        self.cursor.eat_while(is_ident_continue);
        let id_end = self.cursor.pos();
        self.column += id_end - id_start;
        let lexeme = self.cursor.slice(id_start, id_end).to_string();
        let lowered = lexeme.to_ascii_lowercase();
        let kind = TokenKind::keyword_from_lowercase(&lowered).unwrap_or(TokenKind::Identifier);
        Token::new(kind, lexeme, start)
    }
}

/// Convenience wrapper matching the spec's `tokenize(source)` entry point.
pub fn tokenize(source: &str) -> Result<Vec<Token>, TokenizerError> {
    Lexer::tokenize(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_source_is_just_eof() {
        let tokens = tokenize("").unwrap();
        assert_eq!(kinds(&tokens), vec![TokenKind::Eof]);
    }

    #[test]
    fn simple_relation_statement() {
        let tokens = tokenize("Player HAS HP 100").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Identifier,
                TokenKind::Has,
                TokenKind::Identifier,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[3].value, Some(TokenValue::Number(100.0)));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let tokens = tokenize("player Has hp").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Has);
        assert_eq!(tokens[1].lexeme, "Has");
    }

    #[test]
    fn newline_is_a_token() {
        let tokens = tokenize("Player PRINT\nGoblin PRINT").unwrap();
        assert!(kinds(&tokens).contains(&TokenKind::Newline));
    }

    #[test]
    fn line_comment_is_skipped() {
        let tokens = tokenize("Player PRINT // a comment\n").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Identifier,
                TokenKind::Print,
                TokenKind::Newline,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn float_literal() {
        let tokens = tokenize("3.5").unwrap();
        assert_eq!(tokens[0].value, Some(TokenValue::Number(3.5)));
    }

    #[test]
    fn dot_without_trailing_digit_is_not_consumed_by_number() {
        // `Goblin.HP` -- the `.` belongs to property access, not a float.
        let tokens = tokenize("Goblin.HP").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Identifier,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn string_literal() {
        let tokens = tokenize("\"Hero\"").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].value, Some(TokenValue::String("Hero".to_string())));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = tokenize("\"Hero").unwrap_err();
        assert!(err.to_string().contains("unterminated string"));
    }

    #[test]
    fn string_may_contain_embedded_newline() {
        let tokens = tokenize("\"line one\nline two\"").unwrap();
        assert_eq!(
            tokens[0].value,
            Some(TokenValue::String("line one\nline two".to_string()))
        );
    }

    #[test]
    fn question_and_query_var() {
        let tokens = tokenize("? ?m").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Question);
        assert_eq!(tokens[1].kind, TokenKind::QueryVar);
        assert_eq!(tokens[1].value, Some(TokenValue::String("m".to_string())));
    }

    #[test]
    fn comparison_operators() {
        let tokens = tokenize("== != < > <= >=").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Eq,
                TokenKind::Neq,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Lte,
                TokenKind::Gte,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn bare_equals_is_an_error() {
        let err = tokenize("a = b").unwrap_err();
        assert!(err.to_string().contains('='));
    }

    #[test]
    fn bare_bang_is_an_error() {
        let err = tokenize("a ! b").unwrap_err();
        assert!(err.to_string().contains('!'));
    }

    #[test]
    fn unknown_character_is_an_error() {
        let err = tokenize("Player @ Goblin").unwrap_err();
        assert!(err.to_string().contains('@'));
    }

    #[test]
    fn tracks_line_and_column_across_lines() {
        let tokens = tokenize("Player PRINT\n  Goblin PRINT").unwrap();
        let goblin = tokens
            .iter()
            .find(|t| t.lexeme == "Goblin")
            .expect("Goblin token present");
        assert_eq!(goblin.line(), 2);
        assert_eq!(goblin.column(), 3);
    }

    #[test]
    fn keyword_table_covers_all_keywords() {
        let source = "IS HAS DO END PRINT CAN LOSES RELATION DEBUG WHEN ELSE ALL EACH WHERE OF RANDOM CHANCE AND OR NOT";
        let tokens = tokenize(source).unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Is,
                TokenKind::Has,
                TokenKind::Do,
                TokenKind::End,
                TokenKind::Print,
                TokenKind::Can,
                TokenKind::Loses,
                TokenKind::Relation,
                TokenKind::Debug,
                TokenKind::When,
                TokenKind::Else,
                TokenKind::All,
                TokenKind::Each,
                TokenKind::Where,
                TokenKind::Of,
                TokenKind::Random,
                TokenKind::Chance,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::Not,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn identifiers_are_case_sensitive() {
        let tokens = tokenize("Player player PLAYER").unwrap();
        assert_eq!(tokens[0].lexeme, "Player");
        assert_eq!(tokens[1].lexeme, "player");
        assert_eq!(tokens[2].lexeme, "PLAYER");
    }
}
