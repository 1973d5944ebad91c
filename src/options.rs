//! # Interpreter Options
//!
//! Tunables for a single interpretation pass. Every field has a default, so
//! hosts can deserialize partial overrides from JSON.

use serde::{Deserialize, Serialize};

/// Options threaded through every phase of the interpreter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterpreterOptions {
    pub layout: LayoutOptions,
}

/// Pixel constants used by the layout estimator when a node carries no size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutOptions {
    /// Fixed width of every estimated node
    pub node_width: f64,
    /// Height reserved for the title bar and padding
    pub header_height: f64,
    /// Vertical spacing per input/output handle row
    pub port_spacing: f64,
    /// Gap above the direct-input section
    pub direct_section_padding: f64,
    /// Height of one direct-input row
    pub direct_row_height: f64,
    /// Floor applied to every estimated height
    pub min_height: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            node_width: 280.0,
            header_height: 80.0,
            port_spacing: 22.0,
            direct_section_padding: 10.0,
            direct_row_height: 35.0,
            min_height: 120.0,
        }
    }
}

impl InterpreterOptions {
    /// Parse options from JSON text, filling omitted fields with defaults
    pub fn from_json_str(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
