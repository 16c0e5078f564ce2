use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::collection::EncodedCollection;
use crate::config::Config;
use crate::flat::Flat;
use crate::graph::{Graph, GraphError, Node, NodeId, Value};
use crate::marker;
use crate::schema::KeySchema;

/// Error type for decode operations.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("corrupt entry: malformed schema {schema:?}: {source}")]
    MalformedSchema {
        schema: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("corrupt entry: schema {schema:?} names {keys} keys but holds {values} values")]
    LengthMismatch {
        schema: String,
        keys: usize,
        values: usize,
    },
    #[error("nesting exceeds depth limit of {limit}")]
    DepthExceeded { limit: usize },
}

/// Shape of a decode result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restored {
    /// The collection held exactly one entry.
    One(NodeId),
    /// Any other number of entries, in entry order. Empty for an empty collection.
    Many(Vec<NodeId>),
}

impl Restored {
    /// Returns the restored objects in entry order, whatever the shape.
    pub fn as_slice(&self) -> &[NodeId] {
        match self {
            Restored::One(id) => std::slice::from_ref(id),
            Restored::Many(ids) => ids,
        }
    }

    /// Returns the object of a single-entry result.
    pub fn single(&self) -> Option<NodeId> {
        match self {
            Restored::One(id) => Some(*id),
            Restored::Many(_) => None,
        }
    }
}

/// Reconstructed objects together with the graph that owns them.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub graph: Graph,
    pub restored: Restored,
}

impl Decoded {
    /// Returns the restored objects in entry order.
    pub fn roots(&self) -> &[NodeId] {
        self.restored.as_slice()
    }

    /// Renders the result as JSON: the object itself for a single entry,
    /// otherwise an array of the objects.
    pub fn export(&self) -> Result<serde_json::Value, GraphError> {
        match &self.restored {
            Restored::One(id) => self.graph.export(&Value::Link(*id)),
            Restored::Many(ids) => ids
                .iter()
                .map(|id| self.graph.export(&Value::Link(*id)))
                .collect::<Result<Vec<_>, _>>()
                .map(serde_json::Value::Array),
        }
    }
}

/// Rebuilds objects from an [`EncodedCollection`].
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: Config,
}

impl Decoder {
    /// Creates a decoder with the default [`Config`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Decoder { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Decodes every entry into a fresh graph.
    ///
    /// Runs in two passes. The first rebuilds each entry as a plain tree. The
    /// second walks all trees in entry order and replaces marker strings with
    /// links. A marker `{label}` links to the nearest node reached under
    /// `label` on the way from the marker up to its entry root, or failing
    /// that, to the most recent node reached under `label` anywhere. Markers
    /// with no such node stay in place as strings.
    ///
    /// The returned graph carries this decoder's [`Config`].
    pub fn decode(&self, collection: &EncodedCollection) -> Result<Decoded, DecodeError> {
        let mut graph = Graph::with_config(self.config);
        let mut roots = Vec::with_capacity(collection.len());
        for (schema, values) in collection.entries() {
            roots.push(self.rebuild_entry(&mut graph, schema, values)?);
        }

        let mut resolver = Resolver::default();
        for &root in &roots {
            resolver.resolve(&mut graph, root, None);
        }
        debug!(
            "decoded {} entries into {} nodes ({} markers resolved, {} unresolved)",
            roots.len(),
            graph.len(),
            resolver.resolved,
            resolver.unresolved,
        );

        let restored = if roots.len() == 1 {
            Restored::One(roots[0])
        } else {
            Restored::Many(roots)
        };
        Ok(Decoded { graph, restored })
    }

    fn rebuild_entry(
        &self,
        graph: &mut Graph,
        schema: &str,
        values: &[Flat],
    ) -> Result<NodeId, DecodeError> {
        let keys = KeySchema::parse(schema).map_err(|source| DecodeError::MalformedSchema {
            schema: schema.to_string(),
            source,
        })?;
        if keys.len() != values.len() {
            return Err(DecodeError::LengthMismatch {
                schema: schema.to_string(),
                keys: keys.len(),
                values: values.len(),
            });
        }

        let mut entries = IndexMap::with_capacity(keys.len());
        for (key, flat) in keys.into_keys().into_iter().zip(values) {
            let value = self.rebuild(graph, flat, 1)?;
            entries.insert(key, value);
        }
        Ok(graph.add(Node::Object(entries)))
    }

    fn rebuild(&self, graph: &mut Graph, flat: &Flat, depth: usize) -> Result<Value, DecodeError> {
        if flat.is_structured() && depth > self.config.max_depth {
            return Err(DecodeError::DepthExceeded {
                limit: self.config.max_depth,
            });
        }

        let node = match flat {
            Flat::Null => return Ok(Value::Null),
            Flat::Bool(b) => return Ok(Value::Bool(*b)),
            Flat::Number(n) => return Ok(Value::Number(n.clone())),
            Flat::String(s) => return Ok(Value::String(s.clone())),
            Flat::Array(items) => Node::Array(
                items
                    .iter()
                    .map(|item| self.rebuild(graph, item, depth + 1))
                    .collect::<Result<_, _>>()?,
            ),
            Flat::Object(entries) => Node::Object(
                entries
                    .iter()
                    .map(|(key, value)| -> Result<(String, Value), DecodeError> {
                        Ok((key.clone(), self.rebuild(graph, value, depth + 1)?))
                    })
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(Value::Link(graph.add(node)))
    }
}

/// Decodes a collection with the default configuration.
pub fn decode(collection: &EncodedCollection) -> Result<Decoded, DecodeError> {
    Decoder::new().decode(collection)
}

/// What to do with one slot during resolution.
enum Step {
    Keep,
    Link(NodeId),
    Descend(NodeId, Option<String>),
}

/// A node on the path from the entry root to the slot being resolved.
struct Frame {
    id: NodeId,
    label: Option<String>,
    /// Slot currently being resolved.
    index: usize,
}

/// Marker resolution state for one decode call.
#[derive(Default)]
struct Resolver {
    /// Fallback for markers with no target on their own path: the most
    /// recently indexed node for each label, across all entries.
    labels: HashMap<String, NodeId>,
    path: Vec<Frame>,
    resolved: usize,
    unresolved: usize,
}

impl Resolver {
    /// Indexes `id` under `label`, then resolves its slots in order.
    ///
    /// Only walks tree edges from the first pass: links written here are not
    /// followed, so cycles introduced by resolution cannot loop.
    fn resolve(&mut self, graph: &mut Graph, id: NodeId, label: Option<&str>) {
        if let Some(label) = label {
            self.labels.insert(label.to_string(), id);
        }
        self.path.push(Frame {
            id,
            label: label.map(str::to_string),
            index: 0,
        });

        let len = graph.node(id).map_or(0, Node::len);
        for index in 0..len {
            if let Some(frame) = self.path.last_mut() {
                frame.index = index;
            }
            let step = {
                let view: &Graph = graph;
                match view.node(id) {
                    Some(Node::Array(items)) => items
                        .get(index)
                        .map_or(Step::Keep, |v| self.step(view, v, label)),
                    Some(Node::Object(entries)) => entries
                        .get_index(index)
                        .map_or(Step::Keep, |(key, v)| self.step(view, v, Some(key.as_str()))),
                    None => Step::Keep,
                }
            };
            match step {
                Step::Keep => {}
                Step::Link(target) => {
                    if let Some(slot) = graph.slot_mut(id, index) {
                        *slot = Value::Link(target);
                    }
                }
                Step::Descend(child, child_label) => {
                    self.resolve(graph, child, child_label.as_deref())
                }
            }
        }

        self.path.pop();
    }

    fn step(&mut self, graph: &Graph, value: &Value, child_label: Option<&str>) -> Step {
        match value {
            Value::Link(child) => Step::Descend(*child, child_label.map(str::to_string)),
            Value::String(text) => {
                let Some(label) = marker::label(text) else {
                    return Step::Keep;
                };
                match self.lookup(graph, label) {
                    Some(target) => {
                        trace!("marker {text} resolved to node {target}");
                        self.resolved += 1;
                        Step::Link(target)
                    }
                    None => {
                        debug!("marker {text} has no target, left in place");
                        self.unresolved += 1;
                        Step::Keep
                    }
                }
            }
            _ => Step::Keep,
        }
    }

    /// Finds the node a marker inside the current node refers to.
    ///
    /// Walks from the current node up to the entry root and takes the first
    /// node reached under `label`: an object property named `label`, or for an
    /// array carrying `label`, its latest structured element. Only slots the
    /// encoder had already passed count, which includes the branch leading to
    /// the marker. Falls back to the cross-entry index.
    fn lookup(&self, graph: &Graph, label: &str) -> Option<NodeId> {
        let current = self.path.len().checked_sub(1);
        for (depth, frame) in self.path.iter().enumerate().rev() {
            let end = if Some(depth) == current {
                frame.index
            } else {
                frame.index + 1
            };
            let found = match graph.node(frame.id) {
                Some(Node::Object(entries)) => entries
                    .get_full(label)
                    .filter(|(index, _, _)| *index < end)
                    .and_then(|(_, _, value)| value.as_link()),
                Some(Node::Array(items)) if frame.label.as_deref() == Some(label) => {
                    items[..end.min(items.len())].iter().rev().find_map(Value::as_link)
                }
                _ => None,
            };
            if found.is_some() {
                return found;
            }
        }
        self.labels.get(label).copied()
    }
}
