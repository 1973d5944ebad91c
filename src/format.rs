//! # Display Formatting
//!
//! Shortens literal input values and type tags for inline display on a node.

use serde_json::{Number, Value};

/// Longest string shown without truncation
pub const MAX_INLINE_CHARS: usize = 25;

/// Characters kept from a string that exceeds [`MAX_INLINE_CHARS`]
pub const TRUNCATED_KEEP_CHARS: usize = 22;

const ELLIPSIS: &str = "...";

/// Verbose type prefixes stripped from output type names, longest first
const VERBOSE_TYPE_PREFIXES: &[&str] = &["WANVIDEO_", "WANVIDEO", "WAN_"];

/// Format a literal value for inline display
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) => format_string(s),
        other => {
            let json = other.to_string();
            let mut head: String = json.chars().take(MAX_INLINE_CHARS).collect();
            head.push_str(ELLIPSIS);
            head
        }
    }
}

fn format_string(s: &str) -> String {
    // Paths collapse to their file name
    let s = if s.contains(['/', '\\']) {
        s.rsplit(['/', '\\']).next().unwrap_or(s)
    } else {
        s
    };

    if s.chars().count() <= MAX_INLINE_CHARS {
        return s.to_string();
    }

    let mut head: String = s.chars().take(TRUNCATED_KEEP_CHARS).collect();
    head.push_str(ELLIPSIS);
    head
}

/// Decimal form of a JSON number; integral floats drop the fractional part
pub(crate) fn format_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }

    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        // Integral floats print without a fractional part
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Human-readable name for an output type tag
///
/// Strips one verbose family prefix; a tag that would become empty is kept whole.
pub fn format_type_name(type_tag: &str) -> String {
    VERBOSE_TYPE_PREFIXES
        .iter()
        .find_map(|prefix| type_tag.strip_prefix(prefix))
        .filter(|stripped| !stripped.is_empty())
        .unwrap_or(type_tag)
        .to_string()
}
