//! The runtime value representation (spec §3, §9): a tagged variant
//! rather than a dynamically-typed object, matching the AST's own
//! sum-type style.

use std::rc::Rc;

use indexmap::IndexSet;
use songlang_parser::{format_number, Statement};

use crate::graph::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    NodeRef(NodeId),
    /// Backs `_Abilities`.
    StringSet(IndexSet<String>),
    /// Backs `_DoBody` -- shared so repeated relation invocations never
    /// clone the stored statement list (spec §9).
    StatementList(Rc<Vec<Statement>>),
    /// Backs `_Items`, the materialized result of a query.
    NodeList(Vec<NodeId>),
    /// Backs `_Roles`.
    RoleList(Vec<String>),
}

impl Value {
    /// Truthiness (spec §4.5): `null`, `false`, `0`, and `""` are false;
    /// everything else, including any node reference, is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// A JSON-safe projection for snapshot export. Node references are
    /// filtered out upstream by `Graph::to_snapshot`, so this never needs
    /// to resolve a `NodeId` back to a name.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Number(n) => serde_json::json!(n),
            Value::String(s) => serde_json::json!(s),
            Value::Boolean(b) => serde_json::json!(b),
            Value::Null => serde_json::Value::Null,
            Value::NodeRef(_) => serde_json::Value::Null,
            Value::StringSet(set) => serde_json::json!(set.iter().collect::<Vec<_>>()),
            Value::NodeList(_) | Value::RoleList(_) | Value::StatementList(_) => {
                serde_json::Value::Null
            }
        }
    }

    /// The source-text form of a value, used by `PRINT` and string
    /// concatenation (spec §4.4, §4.5).
    pub fn display_string(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
            Value::Null => "null".to_string(),
            Value::NodeRef(_) => "<node>".to_string(),
            Value::StringSet(set) => set.iter().cloned().collect::<Vec<_>>().join(", "),
            Value::NodeList(ids) => format!("[{} nodes]", ids.len()),
            Value::RoleList(roles) => roles.join(", "),
            Value::StatementList(_) => "<do-body>".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falsy_values() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
    }

    #[test]
    fn truthy_values() {
        assert!(Value::Number(-1.0).is_truthy());
        assert!(Value::String("x".to_string()).is_truthy());
        assert!(Value::Boolean(true).is_truthy());
    }

    #[test]
    fn number_display_drops_trailing_zero() {
        assert_eq!(Value::Number(40.0).display_string(), "40");
        assert_eq!(Value::Number(3.5).display_string(), "3.5");
    }
}
