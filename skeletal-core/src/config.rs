use serde::{Deserialize, Serialize};

/// Default nesting limit for encode, decode and graph import/export.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Limits shared by [`Encoder`](crate::Encoder), [`Decoder`](crate::Decoder)
/// and [`Graph`](crate::Graph).
///
/// Deserializable with every field optional, so it can sit inside a host
/// application's own configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Deepest nesting level accepted. Values of a top-level object are at
    /// depth 1, their children at depth 2, and so on.
    pub max_depth: usize,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
