//! Graph data model and tree-walking interpreter for SongLang (spec §3,
//! §4, §6).

pub mod error;
pub mod graph;
mod interpreter;
mod node;
mod rng;
pub mod snapshot;
mod value;

use std::cell::RefCell;
use std::rc::Rc;

pub use error::{ErrorKind, InterpreterError, SongError};
pub use graph::{Graph, NodeId};
pub use interpreter::Interpreter;
pub use node::Node;
pub use value::Value;

/// Runs a complete SongLang program end to end: tokenize, parse, execute
/// (spec §6). Returns the finished [`Interpreter`] (so callers can
/// inspect the graph or export a snapshot) along with every line the
/// program printed, in emission order.
pub fn run(
    source: &str,
    mut on_output: impl FnMut(&str) + 'static,
) -> Result<(Interpreter, Vec<String>), SongError> {
    let tokens = songlang_lexer::tokenize(source)?;
    let statements = songlang_parser::parse(tokens)?;

    let collected = Rc::new(RefCell::new(Vec::new()));
    let collected_for_callback = Rc::clone(&collected);
    let mut interpreter = Interpreter::new(move |line: &str| {
        collected_for_callback.borrow_mut().push(line.to_string());
        on_output(line);
    });
    interpreter.execute(&statements)?;

    let output = collected.borrow().clone();
    Ok((interpreter, output))
}

/// Runs a program with a seeded RNG, for deterministic tests and replays
/// (spec §5, §9).
pub fn run_with_seed(
    source: &str,
    seed: u64,
    mut on_output: impl FnMut(&str) + 'static,
) -> Result<(Interpreter, Vec<String>), SongError> {
    let tokens = songlang_lexer::tokenize(source)?;
    let statements = songlang_parser::parse(tokens)?;

    let collected = Rc::new(RefCell::new(Vec::new()));
    let collected_for_callback = Rc::clone(&collected);
    let mut interpreter = Interpreter::with_seed(seed, move |line: &str| {
        collected_for_callback.borrow_mut().push(line.to_string());
        on_output(line);
    });
    interpreter.execute(&statements)?;

    let output = collected.borrow().clone();
    Ok((interpreter, output))
}
