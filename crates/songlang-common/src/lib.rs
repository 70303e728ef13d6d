//! Shared vocabulary for the SongLang tokenizer, parser, and interpreter.
//!
//! Kept tiny and dependency-free on purpose -- every downstream crate
//! depends on `songlang-common`, so it must never depend on them back.

pub mod position;
pub mod token;

pub use position::Position;
pub use token::{Token, TokenKind, TokenValue};
