use std::collections::HashMap;

use crate::graph::NodeId;

/// Identity registry for one encode call.
///
/// Maps each node already flattened to the label it was first reached under.
/// Keyed by [`NodeId`], so two nodes with equal contents are still distinct.
/// The encoder creates one per call and drops it when the call returns.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    labels: HashMap<NodeId, String>,
}

impl IdentityRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        IdentityRegistry {
            labels: HashMap::new(),
        }
    }

    /// Returns the label a node was first recorded under.
    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }

    /// Records a node under a label.
    ///
    /// The first label wins: recording a node again is a no-op and returns false.
    pub fn record(&mut self, id: NodeId, label: &str) -> bool {
        if self.labels.contains_key(&id) {
            return false;
        }
        self.labels.insert(id, label.to_string());
        true
    }

    /// Returns the number of recorded nodes.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
