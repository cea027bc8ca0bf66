//! Graph document types.
//!
//! Nodes are kept as raw JSON in the document and parsed one at a time, so a
//! single malformed node is skipped instead of rejecting the whole graph.

use crate::error::{FinderError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A serialized workflow as produced by the graph editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nodes: Vec<Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl GraphDocument {
    pub fn new(nodes: Vec<Value>) -> Self {
        Self { nodes }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| FinderError::InvalidGraph {
            message: format!("Failed to parse graph document: {}", e),
        })
    }

    /// Whether the document describes no workflow at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Parse every node, skipping (and logging) the malformed ones.
    pub fn parsed_nodes(&self) -> Vec<GraphNode> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(position, raw)| match GraphNode::from_value(raw) {
                Ok(node) => Some(node),
                Err(e) => {
                    tracing::warn!(position, "Skipping malformed graph node: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// Activation mode of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeMode {
    #[default]
    Always,
    /// Mode 2, shown as "never" in the editor.
    Disabled,
    /// Mode 4, bypassed.
    Muted,
    Other(i64),
}

impl NodeMode {
    pub fn is_inactive(&self) -> bool {
        matches!(self, NodeMode::Disabled | NodeMode::Muted)
    }
}

impl From<i64> for NodeMode {
    fn from(value: i64) -> Self {
        match value {
            0 => NodeMode::Always,
            2 => NodeMode::Disabled,
            4 => NodeMode::Muted,
            other => NodeMode::Other(other),
        }
    }
}

/// An input slot. Slots backed by a widget literal have `widget` set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInput {
    pub name: String,
    pub linked: bool,
    pub widget: bool,
}

impl NodeInput {
    /// A slot whose value lives in the node's parameter list.
    pub fn is_literal(&self) -> bool {
        self.widget && !self.linked
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOutput {
    pub link_count: usize,
}

/// One node of the graph, normalized from its JSON form.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    /// Numeric id, when the document carried a usable one.
    pub id: Option<i64>,
    pub node_type: String,
    pub mode: NodeMode,
    /// Literal parameter values in slot order.
    pub widgets_values: Vec<Value>,
    pub inputs: Vec<NodeInput>,
    pub outputs: Vec<NodeOutput>,
}

impl GraphNode {
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| FinderError::InvalidGraph {
            message: format!("node is not an object: {}", short_json(value)),
        })?;

        let node_type = ["type", "class_type"]
            .iter()
            .filter_map(|field| obj.get(*field).and_then(Value::as_str))
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string();

        let mode = obj
            .get("mode")
            .and_then(Value::as_i64)
            .map(NodeMode::from)
            .unwrap_or_default();

        let widgets_values = match obj.get("widgets_values") {
            Some(Value::Array(values)) => values.clone(),
            _ => Vec::new(),
        };

        let inputs = array_items(obj.get("inputs"))
            .filter_map(Value::as_object)
            .map(|input| NodeInput {
                name: input
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                linked: input.get("link").is_some_and(|l| !l.is_null()),
                widget: input.get("widget").is_some_and(is_truthy),
            })
            .collect();

        let outputs = array_items(obj.get("outputs"))
            .filter_map(Value::as_object)
            .map(|output| NodeOutput {
                link_count: match output.get("links") {
                    Some(Value::Array(links)) => links.len(),
                    _ => 0,
                },
            })
            .collect();

        Ok(Self {
            id: obj.get("id").and_then(parse_node_id),
            node_type,
            mode,
            widgets_values,
            inputs,
            outputs,
        })
    }

    pub fn has_connected_output(&self) -> bool {
        self.outputs.iter().any(|o| o.link_count > 0)
    }

    pub fn has_connected_input(&self) -> bool {
        self.inputs.iter().any(|i| i.linked)
    }
}

fn array_items(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flat_map(|items| items.iter())
}

fn parse_node_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn short_json(value: &Value) -> String {
    let mut text = value.to_string();
    if text.len() > 64 {
        let cut = (0..=64).rev().find(|i| text.is_char_boundary(*i)).unwrap_or(0);
        text.truncate(cut);
        text.push_str("...");
    }
    text
}
