//! Reference marker text.
//!
//! A marker is a string of the form `{label}` written in place of an instance
//! that was already flattened earlier in the same encode call. The label is the
//! key the instance was first reached under.
//!
//! Markers share the string space with ordinary data: a decoded string that
//! still looks like a marker is one whose label had no target.

/// Renders the marker for a label.
pub fn render(label: &str) -> String {
    format!("{{{label}}}")
}

/// Returns the label if `text` has marker form.
pub fn label(text: &str) -> Option<&str> {
    text.strip_prefix('{')?.strip_suffix('}')
}

pub fn is_marker(text: &str) -> bool {
    label(text).is_some()
}
