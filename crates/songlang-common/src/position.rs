use std::fmt;

/// A 1-based line/column location in SongLang source text.
///
/// Unlike a byte-offset span, a `Position` is a single point: every token
/// and AST node records where it *starts*, which is all the diagnostics
/// format (`§7`) and the host tooling need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// The position of the first character of the first line.
    pub fn start() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
