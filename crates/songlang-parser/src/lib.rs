//! Parses a SongLang token stream into a list of statements (spec §4.2, §6).

pub mod ast;
pub mod error;
mod parser;

pub use ast::*;
pub use error::ParserError;
pub use parser::parse;
