//! # Port Resolver
//!
//! Cross-references a node of the graph document with its API format entry to
//! build the unified port list a renderer draws: formal inputs first, then the
//! node's direct (widget) inputs, plus one port per output.
//!
//! Name resolution is a best-effort heuristic. When a port carries no name the
//! resolver guesses one from the API format entry, and the guess may be wrong
//! when several unnamed inputs share a type or key order differs from slot order.

use crate::document::{ApiFormatDocument, ApiNode, GraphDocument, LinkTuple, NodeRecord, PortSpec};
use crate::format::{format_type_name, format_value};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

const UNKNOWN_PORT_NAME: &str = "unknown";

/// Where a unified port comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    /// A formal input slot
    Input,
    /// A formal output slot
    Output,
    /// An inline configuration value with no slot
    Direct,
}

/// A port as presented to the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedPort {
    pub kind: PortKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_connected: Option<bool>,
    /// Render order within its list
    pub index: usize,
    /// Slot index in the source document, for wiring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_index: Option<usize>,
}

impl UnifiedPort {
    fn direct(index: usize, name: String, value: String) -> Self {
        Self {
            kind: PortKind::Direct,
            name,
            value: Some(value),
            port_type: None,
            is_connected: None,
            index,
            original_index: None,
        }
    }
}

/// Resolves ports for the nodes of one graph document
///
/// Built once per pass; link lookups are indexed up front.
pub struct PortResolver<'a> {
    api_format: Option<&'a ApiFormatDocument>,
    incoming: HashMap<&'a str, HashMap<usize, &'a LinkTuple>>,
    outgoing: HashMap<&'a str, HashSet<usize>>,
}

impl<'a> PortResolver<'a> {
    pub fn new(graph: &'a GraphDocument, api_format: Option<&'a ApiFormatDocument>) -> Self {
        let mut incoming: HashMap<&'a str, HashMap<usize, &'a LinkTuple>> = HashMap::new();
        let mut outgoing: HashMap<&'a str, HashSet<usize>> = HashMap::new();

        for link in &graph.links {
            // First link wins when several claim the same input slot
            incoming
                .entry(link.target.as_str())
                .or_default()
                .entry(link.target_slot)
                .or_insert(link);
            outgoing
                .entry(link.source.as_str())
                .or_default()
                .insert(link.source_slot);
        }

        Self {
            api_format,
            incoming,
            outgoing,
        }
    }

    /// The API format entry for a node, if any
    pub fn api_node(&self, node: &NodeRecord) -> Option<&'a ApiNode> {
        self.api_format?.get(&node.id)
    }

    /// The link targeting `(node_id, slot)`
    pub fn incoming_link(&self, node_id: &str, slot: usize) -> Option<&'a LinkTuple> {
        self.incoming
            .get(node_id)
            .and_then(|slots| slots.get(&slot))
            .copied()
    }

    pub fn is_input_connected(&self, node_id: &str, slot: usize) -> bool {
        self.incoming_link(node_id, slot).is_some()
    }

    pub fn is_output_connected(&self, node_id: &str, slot: usize) -> bool {
        self.outgoing
            .get(node_id)
            .is_some_and(|slots| slots.contains(&slot))
    }

    /// Best-effort name for input `index` of `node`
    ///
    /// Tries, in order: the port's own name; the API format key whose connection
    /// equals `[link.id, index]` for the link wired into this slot; the API format
    /// literal key at position `index`; the port type; `"unknown"`.
    pub fn resolve_input_name(&self, port: &PortSpec, index: usize, node: &NodeRecord) -> String {
        if let Some(name) = port.non_empty_name() {
            return name.to_string();
        }

        if let Some(api_node) = self.api_node(node) {
            let wired = self
                .incoming_link(&node.id, index)
                .and_then(|link| api_node.find_connection(&link.id, index));
            if let Some(key) = wired {
                return key.to_string();
            }

            if let Some(key) = api_node.literal_keys().nth(index) {
                return key.to_string();
            }
        }

        port.port_type
            .clone()
            .unwrap_or_else(|| UNKNOWN_PORT_NAME.to_string())
    }

    /// Inline display value for input `index` of `node`
    ///
    /// `None` without an API format entry, or when the resolved key holds a
    /// connection (drawn as a wire instead).
    pub fn resolve_input_value(&self, port: &PortSpec, index: usize, node: &NodeRecord) -> Option<String> {
        let api_node = self.api_node(node)?;
        let name = self.resolve_input_name(port, index, node);
        api_node
            .inputs
            .get(&name)?
            .inline_value()
            .map(format_value)
    }

    /// Formal inputs in slot order, followed by direct inputs
    pub fn unified_inputs(&self, node: &NodeRecord) -> Vec<UnifiedPort> {
        let mut ports = Vec::with_capacity(node.inputs.len() + node.widget_values.len());

        for (index, port) in node.inputs.iter().enumerate() {
            ports.push(UnifiedPort {
                kind: PortKind::Input,
                name: self.resolve_input_name(port, index, node),
                value: self.resolve_input_value(port, index, node),
                port_type: port.port_type.clone(),
                is_connected: Some(self.is_input_connected(&node.id, index)),
                index,
                original_index: Some(index),
            });
        }

        match self.api_node(node) {
            Some(api_node) => {
                for (key, value) in api_node.direct_inputs() {
                    ports.push(UnifiedPort::direct(ports.len(), key.to_string(), format_value(value)));
                }
            }
            None => {
                for (position, value) in node.widget_values.iter().enumerate() {
                    ports.push(UnifiedPort::direct(
                        ports.len(),
                        format!("Value {}", position + 1),
                        format_value(value),
                    ));
                }
            }
        }

        ports
    }

    /// One port per declared output, in slot order
    pub fn output_ports(&self, node: &NodeRecord) -> Vec<UnifiedPort> {
        node.outputs
            .iter()
            .enumerate()
            .map(|(index, output)| UnifiedPort {
                kind: PortKind::Output,
                name: output
                    .non_empty_name()
                    .map(str::to_owned)
                    .unwrap_or_else(|| {
                        format_type_name(output.port_type.as_deref().unwrap_or(UNKNOWN_PORT_NAME))
                    }),
                value: None,
                port_type: output.port_type.clone(),
                is_connected: Some(self.is_output_connected(&node.id, index)),
                index,
                original_index: Some(index),
            })
            .collect()
    }

    /// Title shown in the node header
    pub fn display_label(&self, node: &NodeRecord) -> String {
        let api_title = self.api_node(node).and_then(|api_node| api_node.title.as_deref());
        [api_title, node.title.as_deref()]
            .into_iter()
            .flatten()
            .find(|title| !title.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| {
                if node.node_type.is_empty() {
                    node.id.clone()
                } else {
                    node.node_type.clone()
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph(value: serde_json::Value) -> GraphDocument {
        GraphDocument::from_value(&value).unwrap()
    }

    fn api(value: serde_json::Value) -> ApiFormatDocument {
        ApiFormatDocument::from_value(&value).unwrap()
    }

    #[test]
    fn named_port_wins() {
        let doc = graph(json!({
            "nodes": [{"id": "1", "inputs": [{"name": "model", "type": "MODEL"}]}],
            "links": []
        }));
        let api_doc = api(json!({"1": {"class_type": "X", "inputs": {"other": 1}}}));
        let resolver = PortResolver::new(&doc, Some(&api_doc));
        let node = &doc.nodes[0];
        assert_eq!(resolver.resolve_input_name(&node.inputs[0], 0, node), "model");
    }

    #[test]
    fn unnamed_port_matches_connection_by_link_id() {
        let doc = graph(json!({
            "nodes": [{"id": "2", "inputs": [{"type": "IMAGE"}]}],
            "links": [[9, "1", 0, "2", 0]]
        }));
        let api_doc = api(json!({"2": {"inputs": {"seed": 1, "images": ["9", 0]}}}));
        let resolver = PortResolver::new(&doc, Some(&api_doc));
        let node = &doc.nodes[0];
        assert_eq!(resolver.resolve_input_name(&node.inputs[0], 0, node), "images");
        assert_eq!(resolver.resolve_input_value(&node.inputs[0], 0, node), None);
    }

    #[test]
    fn unnamed_port_falls_back_to_literal_key_position() {
        let doc = graph(json!({
            "nodes": [{"id": "3", "inputs": [{"type": "INT"}, {"type": "FLOAT"}, {"type": "X"}]}],
            "links": []
        }));
        let api_doc = api(json!({"3": {"inputs": {"steps": 20, "model": ["4", 0], "cfg": 7.5}}}));
        let resolver = PortResolver::new(&doc, Some(&api_doc));
        let node = &doc.nodes[0];

        assert_eq!(resolver.resolve_input_name(&node.inputs[0], 0, node), "steps");
        assert_eq!(resolver.resolve_input_value(&node.inputs[0], 0, node).as_deref(), Some("20"));
        assert_eq!(resolver.resolve_input_name(&node.inputs[1], 1, node), "cfg");
        assert_eq!(resolver.resolve_input_value(&node.inputs[1], 1, node).as_deref(), Some("7.5"));
        // Out of range among literal keys
        assert_eq!(resolver.resolve_input_name(&node.inputs[2], 2, node), "X");
    }

    #[test]
    fn unnamed_untyped_port_is_unknown() {
        let doc = graph(json!({"nodes": [{"id": "1", "inputs": [{}]}], "links": []}));
        let resolver = PortResolver::new(&doc, None);
        let node = &doc.nodes[0];
        assert_eq!(resolver.resolve_input_name(&node.inputs[0], 0, node), "unknown");
        assert_eq!(resolver.resolve_input_value(&node.inputs[0], 0, node), None);
    }

    #[test]
    fn connected_flags_follow_links() {
        let doc = graph(json!({
            "nodes": [
                {"id": "1", "outputs": [{"type": "IMAGE"}, {"type": "MASK"}]},
                {"id": "2", "inputs": [{"name": "a"}, {"name": "b"}, {"name": "c"}]}
            ],
            "links": [[0, "1", 0, "2", 0], [1, "1", 0, "2", 2]]
        }));
        let resolver = PortResolver::new(&doc, None);

        let inputs = resolver.unified_inputs(&doc.nodes[1]);
        let flags: Vec<_> = inputs.iter().map(|port| port.is_connected).collect();
        assert_eq!(flags, vec![Some(true), Some(false), Some(true)]);

        let outputs = resolver.output_ports(&doc.nodes[0]);
        assert_eq!(outputs[0].is_connected, Some(true));
        assert_eq!(outputs[1].is_connected, Some(false));
    }

    #[test]
    fn direct_inputs_come_from_api_format() {
        let doc = graph(json!({
            "nodes": [{
                "id": "5",
                "inputs": [{"name": "clip", "type": "CLIP"}],
                "widgets_values": ["ignored when api format is present"]
            }],
            "links": []
        }));
        let api_doc = api(json!({"5": {"inputs": {
            "text": "a photo of a cat", "clip": ["4", 1], "weights": [0.5, 0.5, 1.0]
        }}}));
        let resolver = PortResolver::new(&doc, Some(&api_doc));

        let ports = resolver.unified_inputs(&doc.nodes[0]);
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].kind, PortKind::Input);
        assert_eq!(ports[0].value, None);
        assert_eq!(ports[1].kind, PortKind::Direct);
        assert_eq!(ports[1].name, "text");
        assert_eq!(ports[1].value.as_deref(), Some("a photo of a cat"));
        assert_eq!(ports[1].index, 1);
        assert_eq!(ports[1].original_index, None);
    }

    #[test]
    fn node_without_api_entry_uses_widget_values() {
        let doc = graph(json!({
            "nodes": [
                {"id": "1", "widgets_values": ["from api"]},
                {"id": "2", "widgets_values": [512, "euler"]}
            ],
            "links": []
        }));
        let api_doc = api(json!({"1": {"inputs": {"text": "hello"}}}));
        let resolver = PortResolver::new(&doc, Some(&api_doc));

        let first = resolver.unified_inputs(&doc.nodes[0]);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].name, "text");

        let second = resolver.unified_inputs(&doc.nodes[1]);
        let rendered: Vec<_> = second
            .iter()
            .map(|port| (port.kind, port.name.as_str(), port.value.as_deref()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                (PortKind::Direct, "Value 1", Some("512")),
                (PortKind::Direct, "Value 2", Some("euler")),
            ]
        );
    }

    #[test]
    fn direct_inputs_fall_back_to_widget_values() {
        let doc = graph(json!({
            "nodes": [{"id": "1", "widgets_values": [42, "input/photo.png", true]}],
            "links": []
        }));
        let resolver = PortResolver::new(&doc, None);

        let ports = resolver.unified_inputs(&doc.nodes[0]);
        let rendered: Vec<_> = ports
            .iter()
            .map(|port| (port.name.as_str(), port.value.as_deref()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ("Value 1", Some("42")),
                ("Value 2", Some("photo.png")),
                ("Value 3", Some("true")),
            ]
        );
    }

    #[test]
    fn output_names_use_formatted_type_when_unnamed() {
        let doc = graph(json!({
            "nodes": [{"id": "1", "outputs": [
                {"name": "IMAGE", "type": "IMAGE"},
                {"type": "WANVIDEO_MODEL"},
                {"name": "", "type": "LATENT"},
                {}
            ]}],
            "links": []
        }));
        let resolver = PortResolver::new(&doc, None);
        let names: Vec<_> = resolver
            .output_ports(&doc.nodes[0])
            .into_iter()
            .map(|port| port.name)
            .collect();
        assert_eq!(names, vec!["IMAGE", "MODEL", "LATENT", "unknown"]);
    }

    #[test]
    fn display_label_prefers_api_title() {
        let doc = graph(json!({
            "nodes": [
                {"id": "1", "type": "KSampler", "title": "My Sampler"},
                {"id": "2", "type": "KSampler", "title": "Local"},
                {"id": "3", "type": "VAEDecode"},
                {"id": "4"}
            ],
            "links": []
        }));
        let api_doc = api(json!({"2": {"class_type": "KSampler", "_meta": {"title": "From API"}}}));
        let resolver = PortResolver::new(&doc, Some(&api_doc));

        let labels: Vec<_> = doc.nodes.iter().map(|node| resolver.display_label(node)).collect();
        assert_eq!(labels, vec!["My Sampler", "From API", "VAEDecode", "4"]);
    }
}
