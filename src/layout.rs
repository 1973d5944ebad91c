//! # Layout Estimation
//!
//! Node dimensions and canvas positions. A stored size is authoritative; without
//! one, the height is estimated from handle rows and direct-input rows.

use crate::document::{ApiNode, NodeRecord};
use crate::options::LayoutOptions;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Size of a node on the canvas
///
/// `api_inputs` is the node's API format entry; when absent, widget values stand
/// in for the direct-input count.
pub fn compute_node_size(node: &NodeRecord, api_inputs: Option<&ApiNode>, options: &LayoutOptions) -> Size {
    if let Some([width, height]) = node.size {
        return Size { width, height };
    }

    let io_count = node.inputs.len().max(node.outputs.len()) as f64;
    let handle_height = options.header_height + io_count * options.port_spacing;

    let direct_input_count = match api_inputs {
        Some(api_node) => api_node.direct_inputs().count(),
        None => node.widget_values.len(),
    };

    let mut height = handle_height;
    if direct_input_count > 0 {
        height += options.direct_section_padding + direct_input_count as f64 * options.direct_row_height;
    }

    Size {
        width: options.node_width,
        height: height.max(handle_height).max(options.min_height),
    }
}

/// Stored canvas position, or the origin
pub fn node_position(node: &NodeRecord) -> Position {
    node.pos
        .map(|[x, y]| Position { x, y })
        .unwrap_or_default()
}
