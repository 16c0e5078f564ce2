use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::collection::EncodedCollection;
use crate::config::Config;
use crate::flat::Flat;
use crate::graph::{Graph, Node, NodeId, Value};
use crate::marker;
use crate::registry::IdentityRegistry;
use crate::schema::KeySchema;

/// Error type for encode operations.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
    #[error("nesting exceeds depth limit of {limit}")]
    DepthExceeded { limit: usize },
}

/// Flattens objects of a [`Graph`] into an [`EncodedCollection`].
///
/// The encoder holds only configuration. Each call gets its own
/// [`IdentityRegistry`], so calls never observe each other's state.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    config: Config,
}

impl Encoder {
    /// Creates an encoder with the default [`Config`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Encoder { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Encodes the given values, one entry per value, in order.
    ///
    /// Every value flattened in this call shares one registry: an instance that
    /// appears again, inside the same object or a later one, is written as a
    /// reference marker. The top-level objects themselves are never recorded.
    ///
    /// An object contributes its keys in insertion order and an array its
    /// indices; a primitive contributes an empty entry. Two inputs with the same
    /// key set end up in one entry holding the later input's values.
    pub fn encode(
        &self,
        graph: &Graph,
        objects: &[Value],
    ) -> Result<EncodedCollection, EncodeError> {
        let mut collection = EncodedCollection::new();
        if objects.is_empty() {
            return Ok(collection);
        }

        let mut flattener = Flattener {
            graph,
            registry: IdentityRegistry::new(),
            max_depth: self.config.max_depth,
            markers: 0,
        };
        for object in objects {
            let (schema, values) = flattener.entry(object)?;
            let schema = schema.to_string();
            if collection.insert(schema.as_str(), values).is_some() {
                warn!("schema {schema} repeated, earlier values replaced");
            }
        }

        debug!(
            "encoded {} objects into {} entries ({} nodes, {} markers)",
            objects.len(),
            collection.len(),
            flattener.registry.len(),
            flattener.markers,
        );
        Ok(collection)
    }
}

/// Encodes values with the default configuration.
pub fn encode(graph: &Graph, objects: &[Value]) -> Result<EncodedCollection, EncodeError> {
    Encoder::new().encode(graph, objects)
}

/// Per-call flattening state.
struct Flattener<'g> {
    graph: &'g Graph,
    registry: IdentityRegistry,
    max_depth: usize,
    markers: usize,
}

impl<'g> Flattener<'g> {
    fn node(&self, id: NodeId) -> Result<&'g Node, EncodeError> {
        self.graph.node(id).ok_or(EncodeError::UnknownNode(id))
    }

    fn entry(&mut self, object: &Value) -> Result<(KeySchema, Vec<Flat>), EncodeError> {
        let Value::Link(id) = object else {
            return Ok((KeySchema::default(), Vec::new()));
        };

        match self.node(*id)? {
            Node::Object(entries) => {
                let schema = KeySchema::from_keys(entries.keys().map(String::as_str));
                let values = entries
                    .iter()
                    .map(|(key, value)| self.value(value, key, 1))
                    .collect::<Result<_, _>>()?;
                Ok((schema, values))
            }
            Node::Array(items) => {
                let keys: Vec<String> = (0..items.len()).map(|i| i.to_string()).collect();
                let values = keys
                    .iter()
                    .zip(items)
                    .map(|(key, value)| self.value(value, key, 1))
                    .collect::<Result<_, _>>()?;
                Ok((KeySchema::from_keys(keys), values))
            }
        }
    }

    fn value(&mut self, value: &Value, label: &str, depth: usize) -> Result<Flat, EncodeError> {
        match value {
            Value::Null => Ok(Flat::Null),
            Value::Bool(b) => Ok(Flat::Bool(*b)),
            Value::Number(n) => Ok(Flat::Number(n.clone())),
            Value::String(s) => Ok(Flat::String(s.clone())),
            Value::Link(id) => self.flatten(*id, label, depth),
        }
    }

    fn flatten(&mut self, id: NodeId, label: &str, depth: usize) -> Result<Flat, EncodeError> {
        if let Some(first) = self.registry.label(id) {
            let text = marker::render(first);
            trace!("node {id} under {label:?} seen before, writing {text}");
            self.markers += 1;
            return Ok(Flat::String(text));
        }
        if depth > self.max_depth {
            return Err(EncodeError::DepthExceeded {
                limit: self.max_depth,
            });
        }

        let node = self.node(id)?;
        self.registry.record(id, label);

        match node {
            // Elements carry the array's own label.
            Node::Array(items) => items
                .iter()
                .map(|item| self.value(item, label, depth + 1))
                .collect::<Result<Vec<_>, _>>()
                .map(Flat::Array),
            Node::Object(entries) => entries
                .iter()
                .map(|(key, value)| -> Result<(String, Flat), EncodeError> {
                    Ok((key.clone(), self.value(value, key, depth + 1)?))
                })
                .collect::<Result<IndexMap<_, _>, _>>()
                .map(Flat::Object),
        }
    }
}
