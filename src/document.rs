//! # Graph Document Model
//!
//! Typed views of the two inputs the interpreter consumes:
//!
//! - [`GraphDocument`] - the serialized node graph (nodes, links, positions, widget values)
//! - [`ApiFormatDocument`] - the execution-oriented companion document, keyed by node id
//!
//! Both are parsed leniently from `serde_json::Value`. A malformed node or link is
//! skipped rather than failing the document, and the literal-vs-connection ambiguity
//! of API format input values is settled here, once, into [`InputValue`].

use crate::error::{GraphError, Result};
use crate::format::format_number;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Identifier of a node, normalized to a string
pub type NodeId = String;

/// Identifier of a link, normalized to a string
pub type LinkId = String;

/// The serialized node graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphDocument {
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<LinkTuple>,
}

impl GraphDocument {
    /// Parse a graph document from a JSON value
    ///
    /// Fails only when the value is not an object or lacks the `nodes`/`links`
    /// arrays. Individual records that cannot be read are dropped.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or(GraphError::NotAnObject)?;
        let raw_nodes = object
            .get("nodes")
            .and_then(Value::as_array)
            .ok_or(GraphError::MissingArray("nodes"))?;
        let raw_links = object
            .get("links")
            .and_then(Value::as_array)
            .ok_or(GraphError::MissingArray("links"))?;

        let nodes = raw_nodes
            .iter()
            .enumerate()
            .filter_map(|(position, raw)| match NodeRecord::deserialize(raw) {
                Ok(node) => Some(node),
                Err(e) => {
                    tracing::debug!("[WGI] Skipping malformed node at position {}: {}", position, e);
                    None
                }
            })
            .collect();

        let links = raw_links
            .iter()
            .enumerate()
            .filter_map(|(position, raw)| {
                let link = LinkTuple::from_value(raw);
                if link.is_none() {
                    tracing::debug!("[WGI] Skipping malformed link at position {}", position);
                }
                link
            })
            .collect();

        Ok(Self { nodes, links })
    }

    /// Parse a graph document from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }
}

/// One node of the graph document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawNodeRecord")]
pub struct NodeRecord {
    pub id: NodeId,
    pub node_type: String,
    pub pos: Option<[f64; 2]>,
    pub size: Option<[f64; 2]>,
    pub inputs: Vec<PortSpec>,
    pub outputs: Vec<PortSpec>,
    pub widget_values: Vec<Value>,
    pub title: Option<String>,
    pub color: Option<String>,
    pub bg_color: Option<String>,
    pub properties: Option<Map<String, Value>>,
}

/// Wire shape of a node. Both key spellings of `widgetValues` and `bgColor`
/// are read as separate fields; the camelCase key wins when both are present.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNodeRecord {
    #[serde(deserialize_with = "de_id")]
    id: NodeId,
    #[serde(rename = "type", default, deserialize_with = "de_lenient_string")]
    node_type: String,
    #[serde(default, deserialize_with = "de_opt_pair")]
    pos: Option<[f64; 2]>,
    #[serde(default, deserialize_with = "de_opt_pair")]
    size: Option<[f64; 2]>,
    #[serde(default, deserialize_with = "de_ports")]
    inputs: Vec<PortSpec>,
    #[serde(default, deserialize_with = "de_ports")]
    outputs: Vec<PortSpec>,
    #[serde(default, deserialize_with = "de_widget_values")]
    widget_values: Option<Vec<Value>>,
    #[serde(default, rename = "widgets_values", deserialize_with = "de_widget_values")]
    comfy_widget_values: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "de_opt_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    color: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    bg_color: Option<String>,
    #[serde(default, rename = "bgcolor", deserialize_with = "de_opt_string")]
    comfy_bg_color: Option<String>,
    #[serde(default, deserialize_with = "de_opt_object")]
    properties: Option<Map<String, Value>>,
}

impl From<RawNodeRecord> for NodeRecord {
    fn from(raw: RawNodeRecord) -> Self {
        Self {
            id: raw.id,
            node_type: raw.node_type,
            pos: raw.pos,
            size: raw.size,
            inputs: raw.inputs,
            outputs: raw.outputs,
            widget_values: raw
                .widget_values
                .or(raw.comfy_widget_values)
                .unwrap_or_default(),
            title: raw.title,
            color: raw.color,
            bg_color: raw.bg_color.or(raw.comfy_bg_color),
            properties: raw.properties,
        }
    }
}

/// A declared input or output slot on a node
///
/// Connection state is not stored here; it is derived from the link list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSpec {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub port_type: Option<String>,
}

impl PortSpec {
    pub fn new(name: Option<&str>, port_type: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_owned),
            port_type: port_type.map(str::to_owned),
        }
    }

    /// Read a port leniently; anything unreadable becomes an anonymous, untyped port
    /// so slot indices stay aligned with the document.
    pub fn from_value(value: &Value) -> Self {
        Self {
            name: value.get("name").and_then(Value::as_str).map(str::to_owned),
            port_type: value.get("type").and_then(Value::as_str).map(str::to_owned),
        }
    }

    /// The name, if present and non-empty
    pub fn non_empty_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

/// A directed connection `[linkId, sourceNodeId, sourceSlot, targetNodeId, targetSlot]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkTuple {
    pub id: LinkId,
    pub source: NodeId,
    pub source_slot: usize,
    pub target: NodeId,
    pub target_slot: usize,
    /// Optional trailing type tag written by newer serializers
    pub declared_type: Option<String>,
}

impl LinkTuple {
    pub fn new(
        id: impl Into<LinkId>,
        source: impl Into<NodeId>,
        source_slot: usize,
        target: impl Into<NodeId>,
        target_slot: usize,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            source_slot,
            target: target.into(),
            target_slot,
            declared_type: None,
        }
    }

    /// Read a link from either the positional tuple or the object form
    ///
    /// Returns `None` when ids are missing or slots are not non-negative integers.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) if items.len() >= 5 => Some(Self {
                id: id_from_value(&items[0])?,
                source: id_from_value(&items[1])?,
                source_slot: slot_from_value(&items[2])?,
                target: id_from_value(&items[3])?,
                target_slot: slot_from_value(&items[4])?,
                declared_type: items.get(5).and_then(Value::as_str).map(str::to_owned),
            }),
            Value::Object(map) => Some(Self {
                id: map.get("id").and_then(id_from_value)?,
                source: map.get("origin_id").and_then(id_from_value)?,
                source_slot: map.get("origin_slot").and_then(slot_from_value)?,
                target: map.get("target_id").and_then(id_from_value)?,
                target_slot: map.get("target_slot").and_then(slot_from_value)?,
                declared_type: map.get("type").and_then(Value::as_str).map(str::to_owned),
            }),
            _ => None,
        }
    }
}

/// The execution-oriented companion document, keyed by node id in document order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiFormatDocument {
    nodes: IndexMap<NodeId, ApiNode>,
}

impl ApiFormatDocument {
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or(GraphError::ApiFormatNotAnObject)?;

        let mut nodes = IndexMap::with_capacity(object.len());
        for (id, entry) in object {
            match ApiNode::from_value(entry) {
                Some(node) => {
                    nodes.insert(id.clone(), node);
                }
                None => tracing::debug!("[WGI] Skipping non-object API format entry '{}'", id),
            }
        }

        Ok(Self { nodes })
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    pub fn get(&self, id: &str) -> Option<&ApiNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// One node of the API format document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiNode {
    pub class_type: String,
    /// `_meta.title`
    pub title: Option<String>,
    pub inputs: IndexMap<String, InputValue>,
}

impl ApiNode {
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let class_type = object
            .get("class_type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let title = object
            .get("_meta")
            .and_then(|meta| meta.get("title"))
            .and_then(Value::as_str)
            .map(str::to_owned);
        let inputs = object
            .get("inputs")
            .and_then(Value::as_object)
            .map(|inputs| {
                inputs
                    .iter()
                    .map(|(key, raw)| (key.clone(), InputValue::from_value(raw)))
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            class_type,
            title,
            inputs,
        })
    }

    /// Keys of every entry that is not a connection, in document order
    pub fn literal_keys(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .filter(|(_, value)| !value.is_connection())
            .map(|(key, _)| key.as_str())
    }

    /// Entries rendered inline as direct inputs, in document order
    pub fn direct_inputs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.inputs
            .iter()
            .filter_map(|(key, value)| value.inline_value().map(|inline| (key.as_str(), inline)))
    }

    /// Key of the first connection entry equal to `[node, slot]`
    pub fn find_connection(&self, node: &str, slot: usize) -> Option<&str> {
        self.inputs
            .iter()
            .find(|(_, value)| match value {
                InputValue::Connection(connection) => {
                    connection.node == node && connection.slot == Some(slot)
                }
                InputValue::Literal(_) => false,
            })
            .map(|(key, _)| key.as_str())
    }
}

/// An API format input value with the literal/connection ambiguity resolved
///
/// Any two-element array is a connection marker `[nodeId, slot]`.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Literal(Value),
    Connection(Connection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub node: NodeId,
    /// `None` when the second element is not a non-negative integer
    pub slot: Option<usize>,
}

impl InputValue {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) if items.len() == 2 => InputValue::Connection(Connection {
                node: id_from_value(&items[0]).unwrap_or_else(|| items[0].to_string()),
                slot: slot_from_value(&items[1]),
            }),
            other => InputValue::Literal(other.clone()),
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, InputValue::Connection(_))
    }

    /// The value when it can be shown inline: a literal that is not an array
    pub fn inline_value(&self) -> Option<&Value> {
        match self {
            InputValue::Literal(value) if !value.is_array() => Some(value),
            _ => None,
        }
    }
}

pub(crate) fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        // Integral floats name the same node as their integer form
        Value::Number(n) => Some(format_number(n)),
        _ => None,
    }
}

fn slot_from_value(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|slot| usize::try_from(slot).ok())
}

fn pair_from_value(value: &Value) -> Option<[f64; 2]> {
    match value {
        Value::Array(items) if items.len() >= 2 => Some([items[0].as_f64()?, items[1].as_f64()?]),
        Value::Object(map) => Some([map.get("0")?.as_f64()?, map.get("1")?.as_f64()?]),
        _ => None,
    }
}

fn de_id<'de, D>(deserializer: D) -> std::result::Result<NodeId, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_from_value(&value).ok_or_else(|| serde::de::Error::custom("node id must be a string or number"))
}

fn de_lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_opt_string(deserializer)?.unwrap_or_default())
}

fn de_opt_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_owned))
}

fn de_opt_pair<'de, D>(deserializer: D) -> std::result::Result<Option<[f64; 2]>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(pair_from_value(&value))
}

fn de_ports<'de, D>(deserializer: D) -> std::result::Result<Vec<PortSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_array()
        .map(|ports| ports.iter().map(PortSpec::from_value).collect())
        .unwrap_or_default())
}

fn de_widget_values<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => Some(items),
        // Some custom nodes serialize their widgets as a keyed object
        Value::Object(map) => Some(map.into_iter().map(|(_, v)| v).collect()),
        _ => None,
    })
}

fn de_opt_object<'de, D>(deserializer: D) -> std::result::Result<Option<Map<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(map) => Some(map),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_comfyui_style_node() {
        let doc = GraphDocument::from_value(&json!({
            "nodes": [{
                "id": 7,
                "type": "KSampler",
                "pos": {"0": 10.5, "1": 20},
                "size": [315, 262],
                "inputs": [{"name": "model", "type": "MODEL", "link": 1}],
                "outputs": [{"name": "LATENT", "type": "LATENT", "links": [2]}],
                "widgets_values": [42, "randomize", 20],
                "bgcolor": "#353",
                "properties": {"Node name for S&R": "KSampler"}
            }],
            "links": []
        }))
        .unwrap();

        let node = &doc.nodes[0];
        assert_eq!(node.id, "7");
        assert_eq!(node.node_type, "KSampler");
        assert_eq!(node.pos, Some([10.5, 20.0]));
        assert_eq!(node.size, Some([315.0, 262.0]));
        assert_eq!(node.inputs, vec![PortSpec::new(Some("model"), Some("MODEL"))]);
        assert_eq!(node.widget_values.len(), 3);
        assert_eq!(node.bg_color.as_deref(), Some("#353"));
        assert!(node.properties.is_some());
    }

    #[test]
    fn missing_arrays_are_errors() {
        assert!(matches!(
            GraphDocument::from_value(&Value::Null),
            Err(GraphError::NotAnObject)
        ));
        assert!(matches!(
            GraphDocument::from_value(&json!({"links": []})),
            Err(GraphError::MissingArray("nodes"))
        ));
        assert!(matches!(
            GraphDocument::from_value(&json!({"nodes": []})),
            Err(GraphError::MissingArray("links"))
        ));
    }

    #[test]
    fn skips_nodes_without_usable_id() {
        let doc = GraphDocument::from_value(&json!({
            "nodes": [{"type": "NoId"}, {"id": null}, {"id": "2", "type": "Ok"}, "garbage"],
            "links": []
        }))
        .unwrap();
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(doc.nodes[0].id, "2");
    }

    #[test]
    fn malformed_ports_keep_their_slot() {
        let doc = GraphDocument::from_value(&json!({
            "nodes": [{"id": "1", "inputs": [42, {"type": "IMAGE"}]}],
            "links": []
        }))
        .unwrap();
        assert_eq!(doc.nodes[0].inputs.len(), 2);
        assert_eq!(doc.nodes[0].inputs[0], PortSpec::default());
        assert_eq!(doc.nodes[0].inputs[1].port_type.as_deref(), Some("IMAGE"));
    }

    #[test]
    fn both_key_spellings_keep_the_node() {
        let doc = GraphDocument::from_value(&json!({
            "nodes": [
                {"id": "1", "bgcolor": "#335", "bgColor": "#353", "outputs": [{"type": "IMAGE"}]},
                {"id": "2", "widgets_values": ["comfy"], "widgetValues": ["camel"]},
                {"id": "3", "widgetValues": null, "widgets_values": [7]}
            ],
            "links": [[0, "1", 0, "2", 0]]
        }))
        .unwrap();

        assert_eq!(doc.nodes.len(), 3);
        assert_eq!(doc.nodes[0].bg_color.as_deref(), Some("#353"));
        assert_eq!(doc.nodes[1].widget_values, vec![json!("camel")]);
        assert_eq!(doc.nodes[2].widget_values, vec![json!(7)]);
    }

    #[test]
    fn integral_float_ids_match_integer_ids() {
        let doc = GraphDocument::from_value(&json!({
            "nodes": [{"id": 1.0}, {"id": 2.5}],
            "links": [[0.0, 1, 0, 2.5, 0]]
        }))
        .unwrap();

        assert_eq!(doc.nodes[0].id, "1");
        assert_eq!(doc.nodes[1].id, "2.5");
        assert_eq!(doc.links[0].id, "0");
        assert_eq!(doc.links[0].source, doc.nodes[0].id);
    }

    #[test]
    fn keyed_widget_values_flatten_in_order() {
        let doc = GraphDocument::from_value(&json!({
            "nodes": [{"id": "1", "widgets_values": {"frame_rate": 8, "format": "video/h264-mp4"}}],
            "links": []
        }))
        .unwrap();
        assert_eq!(doc.nodes[0].widget_values, vec![json!(8), json!("video/h264-mp4")]);
    }

    #[test]
    fn reads_tuple_and_object_links() {
        let tuple = LinkTuple::from_value(&json!([3, 1, 0, 2, 1, "IMAGE"])).unwrap();
        assert_eq!(tuple.id, "3");
        assert_eq!(tuple.source, "1");
        assert_eq!(tuple.target_slot, 1);
        assert_eq!(tuple.declared_type.as_deref(), Some("IMAGE"));

        let object = LinkTuple::from_value(&json!({
            "id": 3, "origin_id": 1, "origin_slot": 0, "target_id": 2, "target_slot": 1, "type": "IMAGE"
        }))
        .unwrap();
        assert_eq!(object, tuple);
    }

    #[test]
    fn rejects_short_or_negative_links() {
        assert!(LinkTuple::from_value(&json!([1, 1, 0, 2])).is_none());
        assert!(LinkTuple::from_value(&json!([1, 1, -1, 2, 0])).is_none());
        assert!(LinkTuple::from_value(&json!("1->2")).is_none());
    }

    #[test]
    fn two_element_arrays_are_connections() {
        assert_eq!(
            InputValue::from_value(&json!(["4", 1])),
            InputValue::Connection(Connection {
                node: "4".to_string(),
                slot: Some(1)
            })
        );
        assert_eq!(
            InputValue::from_value(&json!([4, "x"])),
            InputValue::Connection(Connection {
                node: "4".to_string(),
                slot: None
            })
        );
        let triple = InputValue::from_value(&json!([1, 2, 3]));
        assert!(!triple.is_connection());
        assert!(triple.inline_value().is_none());
        assert_eq!(InputValue::from_value(&json!(7)).inline_value(), Some(&json!(7)));
    }

    #[test]
    fn api_node_keeps_input_order() {
        let api = ApiFormatDocument::from_value(&json!({
            "3": {
                "class_type": "KSampler",
                "_meta": {"title": "Sampler"},
                "inputs": {
                    "seed": 5, "steps": 20, "model": ["4", 0], "sigmas": [1, 2, 3], "cfg": 8.0
                }
            },
            "9": "not a node"
        }))
        .unwrap();
        assert_eq!(api.len(), 1);

        let node = api.get("3").unwrap();
        assert_eq!(node.title.as_deref(), Some("Sampler"));
        assert_eq!(
            node.literal_keys().collect::<Vec<_>>(),
            vec!["seed", "steps", "sigmas", "cfg"]
        );
        assert_eq!(
            node.direct_inputs().map(|(key, _)| key).collect::<Vec<_>>(),
            vec!["seed", "steps", "cfg"]
        );
        assert_eq!(node.find_connection("4", 0), Some("model"));
        assert_eq!(node.find_connection("4", 1), None);
    }

    #[test]
    fn api_format_must_be_object() {
        assert!(matches!(
            ApiFormatDocument::from_value(&json!([])),
            Err(GraphError::ApiFormatNotAnObject)
        ));
    }
}
