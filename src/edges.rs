//! # Edge Materialization
//!
//! Turns link tuples into typed, colored edge records. The data-type tag of an
//! edge is the type of the source node's output slot; links whose source cannot
//! be resolved are kept with the `"default"` tag.

use crate::document::{LinkId, LinkTuple, NodeId, NodeRecord};
use serde::Serialize;
use std::collections::HashMap;

/// Tag used when the source output type cannot be resolved
pub const DEFAULT_COLOR_TAG: &str = "default";

/// Display color families for connection data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeColor {
    WanVideo,
    Audio,
    Conditioning,
    Latent,
    Image,
    Mask,
    ClipVision,
    Clip,
    Vae,
    Control,
    Model,
    Sigmas,
    Noise,
    String,
    Int,
    Float,
    Default,
}

/// Case-insensitive substring rules, checked in order; first match wins
const COLOR_RULES: &[(&str, EdgeColor)] = &[
    ("WANVIDEO", EdgeColor::WanVideo),
    ("AUDIO", EdgeColor::Audio),
    ("CONDITIONING", EdgeColor::Conditioning),
    ("LATENT", EdgeColor::Latent),
    ("IMAGE", EdgeColor::Image),
    ("MASK", EdgeColor::Mask),
    ("CLIP_VISION", EdgeColor::ClipVision),
    ("CLIP", EdgeColor::Clip),
    ("VAE", EdgeColor::Vae),
    ("CONTROL", EdgeColor::Control),
    ("MODEL", EdgeColor::Model),
    ("SIGMAS", EdgeColor::Sigmas),
    ("NOISE", EdgeColor::Noise),
    ("STRING", EdgeColor::String),
    ("INT", EdgeColor::Int),
    ("FLOAT", EdgeColor::Float),
];

impl EdgeColor {
    pub fn from_type_tag(tag: &str) -> Self {
        let upper = tag.to_ascii_uppercase();
        COLOR_RULES
            .iter()
            .find(|(needle, _)| upper.contains(*needle))
            .map(|(_, color)| *color)
            .unwrap_or(EdgeColor::Default)
    }

    pub fn hex(self) -> &'static str {
        match self {
            EdgeColor::WanVideo => "#26a69a",
            EdgeColor::Audio => "#ea80fc",
            EdgeColor::Conditioning => "#ffa931",
            EdgeColor::Latent => "#ff9cf9",
            EdgeColor::Image => "#64b5f6",
            EdgeColor::Mask => "#81c784",
            EdgeColor::ClipVision => "#a8dadc",
            EdgeColor::Clip => "#ffd500",
            EdgeColor::Vae => "#ff6e6e",
            EdgeColor::Control => "#00d78d",
            EdgeColor::Model => "#b39ddb",
            EdgeColor::Sigmas => "#cddc39",
            EdgeColor::Noise => "#b0bec5",
            EdgeColor::String => "#77ff77",
            EdgeColor::Int => "#29b6f6",
            EdgeColor::Float => "#aed581",
            EdgeColor::Default => "#a0a0a0",
        }
    }
}

/// A connection ready for drawing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializedEdge {
    pub id: LinkId,
    pub source: NodeId,
    pub target: NodeId,
    pub source_slot: usize,
    pub target_slot: usize,
    /// Data-type tag of the source output, or `"default"`
    pub color_tag: String,
    pub color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,
}

/// One edge per link, in link order
///
/// `nodes` maps node ids to records. Links with an unknown source node or slot
/// are still materialized so the edge count always equals the link count.
pub fn materialize_edges(links: &[LinkTuple], nodes: &HashMap<&str, &NodeRecord>) -> Vec<MaterializedEdge> {
    links
        .iter()
        .map(|link| {
            let color_tag = nodes
                .get(link.source.as_str())
                .and_then(|source| source.outputs.get(link.source_slot))
                .and_then(|output| output.port_type.as_deref())
                .unwrap_or(DEFAULT_COLOR_TAG)
                .to_string();

            if !nodes.contains_key(link.source.as_str()) {
                tracing::debug!(
                    "[WGI] Link {} references missing source node '{}'",
                    link.id,
                    link.source
                );
            }

            let color = EdgeColor::from_type_tag(&color_tag).hex();
            MaterializedEdge {
                id: link.id.clone(),
                source: link.source.clone(),
                target: link.target.clone(),
                source_slot: link.source_slot,
                target_slot: link.target_slot,
                color_tag,
                color,
                declared_type: link.declared_type.clone(),
            }
        })
        .collect()
}
