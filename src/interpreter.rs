//! # Workflow Graph Interpreter
//!
//! Main entry points for turning a workflow graph into a renderable graph.

use crate::document::{ApiFormatDocument, GraphDocument, NodeId, NodeRecord};
use crate::edges::{materialize_edges, MaterializedEdge};
use crate::error::Result;
use crate::layout::{compute_node_size, node_position, Position};
use crate::options::InterpreterOptions;
use crate::resolve::{PortResolver, UnifiedPort};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Output of one interpretation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderableGraph {
    pub nodes: Vec<ResolvedNode>,
    pub edges: Vec<MaterializedEdge>,
}

impl RenderableGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// A node with its ports resolved and its box placed on the canvas
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedNode {
    pub id: NodeId,
    pub node_type: String,
    pub display_label: String,
    pub unified_input_ports: Vec<UnifiedPort>,
    pub output_ports: Vec<UnifiedPort>,
    pub width: f64,
    pub height: f64,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
}

/// Interpret a parsed graph document with default options
///
/// This is the main entry point once both documents have been parsed. It runs
/// every phase with [`InterpreterOptions::default`].
///
/// # Arguments
///
/// * `graph` - The parsed graph document
/// * `api_format` - The parsed API format document, if one is available
///
/// # Returns
///
/// The renderable graph: one resolved node per document node, one edge per link
///
/// # Examples
///
/// ```rust
/// use wgi::{interpret_graph, GraphDocument};
///
/// let graph = GraphDocument::from_json_str(r#"{"nodes": [], "links": []}"#)?;
/// let rendered = interpret_graph(&graph, None);
/// assert!(rendered.is_empty());
/// # Ok::<(), wgi::GraphError>(())
/// ```
pub fn interpret_graph(graph: &GraphDocument, api_format: Option<&ApiFormatDocument>) -> RenderableGraph {
    interpret_graph_with_options(graph, api_format, &InterpreterOptions::default())
}

/// Interpret a parsed graph document with explicit options
///
/// Pure and deterministic: the same inputs always produce the same output, and
/// nothing is retained between calls.
///
/// # Arguments
///
/// * `graph` - The parsed graph document
/// * `api_format` - The parsed API format document, if one is available
/// * `options` - Layout constants for nodes without a stored size
///
/// # Returns
///
/// The renderable graph
///
/// # Examples
///
/// ```rust
/// use wgi::{interpret_graph_with_options, GraphDocument, InterpreterOptions};
///
/// let graph = GraphDocument::from_json_str(r#"{"nodes": [{"id": 1}], "links": []}"#)?;
/// let options = InterpreterOptions::from_json_str(r#"{"layout": {"nodeWidth": 360}}"#)?;
/// let rendered = interpret_graph_with_options(&graph, None, &options);
/// assert_eq!(rendered.nodes[0].width, 360.0);
/// # Ok::<(), wgi::GraphError>(())
/// ```
pub fn interpret_graph_with_options(
    graph: &GraphDocument,
    api_format: Option<&ApiFormatDocument>,
    options: &InterpreterOptions,
) -> RenderableGraph {
    tracing::debug!(
        "[WGI] Interpreting graph ({} nodes, {} links, api format: {})",
        graph.nodes.len(),
        graph.links.len(),
        api_format.map_or(0, ApiFormatDocument::len)
    );

    // Phase 1: index nodes by id; the first record wins on duplicate ids
    let mut nodes_by_id: HashMap<&str, &NodeRecord> = HashMap::with_capacity(graph.nodes.len());
    for node in &graph.nodes {
        nodes_by_id.entry(node.id.as_str()).or_insert(node);
    }

    // Phase 2: resolve ports and estimate layout
    let resolver = PortResolver::new(graph, api_format);
    let nodes: Vec<ResolvedNode> = graph
        .nodes
        .iter()
        .map(|node| {
            let size = compute_node_size(node, resolver.api_node(node), &options.layout);
            ResolvedNode {
                id: node.id.clone(),
                node_type: node.node_type.clone(),
                display_label: resolver.display_label(node),
                unified_input_ports: resolver.unified_inputs(node),
                output_ports: resolver.output_ports(node),
                width: size.width,
                height: size.height,
                position: node_position(node),
                color: node.color.clone(),
                bg_color: node.bg_color.clone(),
            }
        })
        .collect();

    // Phase 3: materialize edges
    let edges = materialize_edges(&graph.links, &nodes_by_id);

    tracing::debug!(
        "[WGI] Interpretation complete ({} nodes, {} edges)",
        nodes.len(),
        edges.len()
    );

    RenderableGraph { nodes, edges }
}

/// Interpret raw JSON documents with default options, never failing
///
/// A document-level error is logged and yields an empty graph.
///
/// # Arguments
///
/// * `graph` - The graph document as JSON
/// * `api_format` - The API format document as JSON; `null` counts as absent
///
/// # Returns
///
/// The renderable graph, or an empty graph when `graph` is unusable
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use wgi::interpret_value;
///
/// let rendered = interpret_value(&json!({"nodes": []}), None);
/// assert!(rendered.is_empty());
/// ```
pub fn interpret_value(graph: &Value, api_format: Option<&Value>) -> RenderableGraph {
    interpret_value_with_options(graph, api_format, &InterpreterOptions::default())
}

/// Same as [`interpret_value`] with explicit options
///
/// # Arguments
///
/// * `graph` - The graph document as JSON
/// * `api_format` - The API format document as JSON; `null` counts as absent
/// * `options` - Layout constants for nodes without a stored size
///
/// # Returns
///
/// The renderable graph, or an empty graph when `graph` is unusable
pub fn interpret_value_with_options(
    graph: &Value,
    api_format: Option<&Value>,
    options: &InterpreterOptions,
) -> RenderableGraph {
    try_interpret_value(graph, api_format, options).unwrap_or_else(|e| {
        tracing::warn!("[WGI] No graph produced: {}", e);
        RenderableGraph::default()
    })
}

/// Interpret raw JSON documents, reporting document-level errors
///
/// An unreadable API format document is logged and treated as absent; only the
/// graph document can fail the pass.
///
/// # Arguments
///
/// * `graph` - The graph document as JSON
/// * `api_format` - The API format document as JSON; `null` counts as absent
/// * `options` - Layout constants for nodes without a stored size
///
/// # Returns
///
/// * `Ok(RenderableGraph)` - The renderable graph
/// * `Err(GraphError)` - The graph document is not an object or lacks `nodes`/`links`
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use wgi::{try_interpret_value, GraphError, InterpreterOptions};
///
/// let result = try_interpret_value(&json!(null), None, &InterpreterOptions::default());
/// assert!(matches!(result, Err(GraphError::NotAnObject)));
/// ```
pub fn try_interpret_value(
    graph: &Value,
    api_format: Option<&Value>,
    options: &InterpreterOptions,
) -> Result<RenderableGraph> {
    let graph = GraphDocument::from_value(graph)?;

    let api_format = api_format
        .filter(|value| !value.is_null())
        .and_then(|value| match ApiFormatDocument::from_value(value) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!("[WGI] Ignoring API format document: {}", e);
                None
            }
        });

    Ok(interpret_graph_with_options(&graph, api_format.as_ref(), options))
}

/// Interpret JSON text with default options, never failing
///
/// # Arguments
///
/// * `graph` - The graph document as JSON text
/// * `api_format` - The API format document as JSON text; unparsable text counts as absent
///
/// # Returns
///
/// The renderable graph, or an empty graph when `graph` is unusable
///
/// # Examples
///
/// ```rust
/// use wgi::interpret_str;
///
/// let rendered = interpret_str(r#"{"nodes": [{"id": "1"}], "links": []}"#, Some("{oops"));
/// assert_eq!(rendered.nodes.len(), 1);
/// ```
pub fn interpret_str(graph: &str, api_format: Option<&str>) -> RenderableGraph {
    try_interpret_str(graph, api_format, &InterpreterOptions::default()).unwrap_or_else(|e| {
        tracing::warn!("[WGI] No graph produced: {}", e);
        RenderableGraph::default()
    })
}

/// Interpret JSON text, reporting document-level errors
///
/// # Arguments
///
/// * `graph` - The graph document as JSON text
/// * `api_format` - The API format document as JSON text; unparsable text counts as absent
/// * `options` - Layout constants for nodes without a stored size
///
/// # Returns
///
/// * `Ok(RenderableGraph)` - The renderable graph
/// * `Err(GraphError)` - The graph text is not JSON, or the document is unusable
pub fn try_interpret_str(
    graph: &str,
    api_format: Option<&str>,
    options: &InterpreterOptions,
) -> Result<RenderableGraph> {
    let graph: Value = serde_json::from_str(graph)?;

    let api_format = api_format.and_then(|text| match serde_json::from_str::<Value>(text) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("[WGI] Ignoring unparsable API format document: {}", e);
            None
        }
    });

    try_interpret_value(&graph, api_format.as_ref(), options)
}
