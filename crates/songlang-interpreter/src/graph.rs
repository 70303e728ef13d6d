//! The node graph: an insertion-ordered arena of [`Node`]s keyed by name
//! (spec §3, §4.3). Nodes are referenced by stable [`NodeId`] rather than
//! a shared pointer, so prototype-inheritance edges can never form an
//! ownership cycle even though the underlying language allows arbitrary
//! `IS` chains.

use rustc_hash::FxHashMap;

use crate::node::Node;
use crate::snapshot::{EdgeSnapshot, GraphSnapshot, NodeSnapshot};
use crate::value::Value;

/// A stable reference to a node in a [`Graph`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: FxHashMap<String, NodeId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing node by name, or creates a fresh one with
    /// empty parents and properties (spec §3).
    pub fn get_or_create_node(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(name.to_string()));
        self.index.insert(name.to_string(), id);
        id
    }

    pub fn get_node_id(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// All node ids in insertion order. Materialized eagerly so callers
    /// can freely intersperse graph mutation with iteration.
    pub fn all_node_ids(&self) -> Vec<NodeId> {
        (0..self.nodes.len()).map(NodeId).collect()
    }

    pub fn count(&self) -> usize {
        self.nodes.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
    }

    /// `node.is(typeName)` (spec §4.3): true if `id` names `type_name`
    /// itself, or any ancestor does, walked depth-first in parent order.
    pub fn is(&self, id: NodeId, type_name: &str) -> bool {
        if self.node(id).name == type_name {
            return true;
        }
        self.node(id)
            .parents
            .iter()
            .any(|&parent| self.is(parent, type_name))
    }

    /// Own-property-first, then depth-first parent walk, first hit wins
    /// (spec §3, §4.3).
    pub fn get_property(&self, id: NodeId, name: &str) -> Option<&Value> {
        if let Some(value) = self.node(id).properties.get(name) {
            return Some(value);
        }
        for &parent in &self.node(id).parents {
            if let Some(value) = self.get_property(parent, name) {
                return Some(value);
            }
        }
        None
    }

    /// `nodeCan` (glossary): own abilities or any ancestor's.
    pub fn can(&self, id: NodeId, ability: &str) -> bool {
        if let Some(Value::StringSet(set)) = self.node(id).properties.get("_Abilities") {
            if set.contains(ability) {
                return true;
            }
        }
        self.node(id).parents.iter().any(|&parent| self.can(parent, ability))
    }

    /// `toSnapshot` (spec §4.3): own properties that are neither
    /// underscore-prefixed nor a `NodeRef`, plus the node's abilities and
    /// its `IS` edges.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut edges = Vec::new();
        for node in &self.nodes {
            let mut properties = serde_json::Map::new();
            for (key, value) in node.properties.iter() {
                if key.starts_with('_') || matches!(value, Value::NodeRef(_)) {
                    continue;
                }
                properties.insert(key.clone(), value.to_json());
            }
            let abilities = match node.properties.get("_Abilities") {
                Some(Value::StringSet(set)) => set.iter().cloned().collect(),
                _ => Vec::new(),
            };
            nodes.push(NodeSnapshot {
                id: node.name.clone(),
                name: node.name.clone(),
                properties,
                abilities,
            });
            for &parent in &node.parents {
                edges.push(EdgeSnapshot {
                    source: node.name.clone(),
                    target: self.node(parent).name.clone(),
                    edge_type: "IS".to_string(),
                });
            }
        }
        GraphSnapshot { nodes, edges }
    }
}
