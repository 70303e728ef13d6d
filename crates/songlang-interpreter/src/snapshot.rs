//! Plain-data export of the graph for external visualization (spec §4.3,
//! §6). Consumed by hosts outside the language core, so every field is
//! `serde`-serializable and free of internal `_`-prefixed bookkeeping.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub id: String,
    pub name: String,
    pub properties: serde_json::Map<String, serde_json::Value>,
    pub abilities: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeSnapshot {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
}
