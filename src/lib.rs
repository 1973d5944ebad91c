//! # Workflow Graph Interpreter (WGI)
//!
//! Turns a serialized ComfyUI workflow graph into a renderable graph: nodes with
//! resolved, typed ports and estimated boxes, plus colored edges. Drawing is left
//! to whichever graph UI consumes the output.
//!
//! WGI consumes two documents:
//! - the graph document (nodes, links, positions, widget values)
//! - an optional API format document (per-node class type, input values and connections)
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use wgi::interpret_value;
//!
//! let graph = json!({
//!     "nodes": [
//!         {"id": "1", "type": "LoadImage", "inputs": [], "outputs": [{"type": "IMAGE"}]},
//!         {"id": "2", "type": "SaveImage", "inputs": [{"type": "IMAGE"}], "outputs": []}
//!     ],
//!     "links": [[0, "1", 0, "2", 0]]
//! });
//!
//! let rendered = interpret_value(&graph, None);
//! assert_eq!(rendered.nodes.len(), 2);
//! assert_eq!(rendered.edges[0].color_tag, "IMAGE");
//! ```
//!
//! ## Architecture
//!
//! Each pass runs synchronously and recomputes everything from its inputs:
//!
//! 1. **Document Parsing** - Read both documents leniently, skipping malformed records
//! 2. **Port Resolution** - Name inputs, attach inline values, flag connections
//! 3. **Layout Estimation** - Size and place each node
//! 4. **Edge Materialization** - Type and color each link by its source output

pub mod document;
pub mod edges;
pub mod error;
pub mod format;
pub mod interpreter;
pub mod layout;
pub mod options;
pub mod resolve;

// Re-export the main interpretation API
pub use interpreter::{
    interpret_graph,
    interpret_graph_with_options,
    interpret_str,
    interpret_value,
    interpret_value_with_options,
    try_interpret_str,
    try_interpret_value,
    RenderableGraph,
    ResolvedNode,
};

pub use document::{
    ApiFormatDocument, ApiNode, Connection, GraphDocument, InputValue, LinkTuple, NodeRecord,
    PortSpec,
};
pub use edges::{EdgeColor, MaterializedEdge};
pub use error::{GraphError, Result};
pub use format::{format_type_name, format_value};
pub use layout::{compute_node_size, node_position, Position, Size};
pub use options::{InterpreterOptions, LayoutOptions};
pub use resolve::{PortKind, PortResolver, UnifiedPort};
