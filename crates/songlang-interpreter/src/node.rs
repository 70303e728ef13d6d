//! A single graph node: a name, an ordered no-duplicate parent list, and
//! an insertion-ordered property map (spec §3).

use indexmap::IndexMap;

use crate::graph::NodeId;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub parents: Vec<NodeId>,
    pub properties: IndexMap<String, Value>,
}

impl Node {
    pub fn new(name: String) -> Self {
        Self {
            name,
            parents: Vec::new(),
            properties: IndexMap::new(),
        }
    }

    pub fn has_own_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: Value) {
        self.properties.insert(name.into(), value);
    }

    pub fn remove_property(&mut self, name: &str) -> Option<Value> {
        self.properties.shift_remove(name)
    }

    /// Idempotent, order-preserving append (spec §4.3).
    pub fn add_parent(&mut self, parent: NodeId) {
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
    }

    pub fn remove_parent(&mut self, parent: NodeId) {
        self.parents.retain(|&p| p != parent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn remove_property_returns_prior_value() {
        let mut node = Node::new("Player".to_string());
        node.set_property("HP", Value::Number(100.0));
        assert!(node.has_own_property("HP"));
        assert_eq!(node.remove_property("HP"), Some(Value::Number(100.0)));
        assert!(!node.has_own_property("HP"));
    }

    #[test]
    fn remove_parent_drops_only_the_named_one() {
        let mut graph = Graph::new();
        let entity = graph.get_or_create_node("Entity");
        let hero = graph.get_or_create_node("Hero");
        let player = graph.get_or_create_node("Player");
        graph.node_mut(player).add_parent(entity);
        graph.node_mut(player).add_parent(hero);
        graph.node_mut(player).remove_parent(entity);
        assert_eq!(graph.node(player).parents, vec![hero]);
    }
}
