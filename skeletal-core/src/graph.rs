use std::fmt;

use indexmap::IndexMap;
use serde_json::{Number, Value as Json};

use crate::config::Config;

/// Error type for graph construction and export.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
    #[error("node {0} is not an object")]
    NotAnObject(NodeId),
    #[error("node {0} is not an array")]
    NotAnArray(NodeId),
    #[error("cycle through node {0}")]
    Cycle(NodeId),
    #[error("nesting deeper than {limit} levels")]
    DepthExceeded { limit: usize },
}

/// Handle of a structured node inside a [`Graph`].
///
/// Identity is the handle: two slots holding the same `NodeId` refer to the
/// same instance, regardless of what the nodes contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the arena index of this node.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A slot value in the graph: a primitive or a link to a structured node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Link to an array or object node.
    Link(NodeId),
}

impl Value {
    /// Returns true if this value links to a structured node.
    pub fn is_structured(&self) -> bool {
        matches!(self, Value::Link(_))
    }

    /// Returns the linked node, if any.
    pub fn as_link(&self) -> Option<NodeId> {
        match self {
            Value::Link(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Number(v.into())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v.into())
    }
}

/// Non-finite floats have no number representation and become `Null`.
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Number::from_f64(v).map_or(Value::Null, Value::Number)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Value::Link(id)
    }
}

/// A structured node: an ordered sequence or an insertion-ordered keyed object.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Node {
    /// Returns the number of elements or entries.
    pub fn len(&self) -> usize {
        match self {
            Node::Array(items) => items.len(),
            Node::Object(entries) => entries.len(),
        }
    }

    /// Returns true if the node has no elements or entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Node::Array(_))
    }
}

/// Arena owning every structured node of an object graph.
///
/// Nodes never own each other; they hold [`NodeId`] links into the arena, so
/// shared sub-objects and cycles need no special ownership. Nodes are never
/// removed, which keeps every handed-out `NodeId` valid for the graph's
/// lifetime.
///
/// [`Graph::import`] and [`Graph::export`] stop at the configured nesting
/// depth instead of recursing without bound.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    max_depth: usize,
}

impl Default for Graph {
    fn default() -> Self {
        Graph::new()
    }
}

impl Graph {
    /// Creates a new empty graph with the default depth limit.
    pub fn new() -> Self {
        Graph::with_config(Config::default())
    }

    /// Creates a new empty graph that imports and exports up to
    /// `config.max_depth` levels of nesting.
    pub fn with_config(config: Config) -> Self {
        Graph {
            nodes: Vec::new(),
            max_depth: config.max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Adds a node and returns its handle.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Adds an object node with the given entries, in order.
    pub fn object<K: Into<String>>(
        &mut self,
        entries: impl IntoIterator<Item = (K, Value)>,
    ) -> NodeId {
        let entries = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.add(Node::Object(entries))
    }

    /// Adds an array node with the given elements.
    pub fn array(&mut self, items: impl IntoIterator<Item = Value>) -> NodeId {
        self.add(Node::Array(items.into_iter().collect()))
    }

    /// Returns the node behind a handle.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub(crate) fn slot_mut(&mut self, id: NodeId, index: usize) -> Option<&mut Value> {
        match self.nodes.get_mut(id.0)? {
            Node::Array(items) => items.get_mut(index),
            Node::Object(entries) => entries.get_index_mut(index).map(|(_, v)| v),
        }
    }

    /// Looks up a property. Array elements are addressed by their decimal index.
    pub fn get(&self, id: NodeId, key: &str) -> Option<&Value> {
        match self.node(id)? {
            Node::Object(entries) => entries.get(key),
            Node::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        }
    }

    /// Sets a property on an object node, returning the previous value.
    ///
    /// An existing key keeps its position; a new key is appended.
    pub fn insert(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: Value,
    ) -> Result<Option<Value>, GraphError> {
        match self.nodes.get_mut(id.0) {
            Some(Node::Object(entries)) => Ok(entries.insert(key.into(), value)),
            Some(Node::Array(_)) => Err(GraphError::NotAnObject(id)),
            None => Err(GraphError::UnknownNode(id)),
        }
    }

    /// Appends an element to an array node.
    pub fn push(&mut self, id: NodeId, value: Value) -> Result<(), GraphError> {
        match self.nodes.get_mut(id.0) {
            Some(Node::Array(items)) => {
                items.push(value);
                Ok(())
            }
            Some(Node::Object(_)) => Err(GraphError::NotAnArray(id)),
            None => Err(GraphError::UnknownNode(id)),
        }
    }

    /// Returns true if the handle belongs to this graph.
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Builds nodes for a JSON value and returns the value to place in a slot.
    ///
    /// The result is a tree: every JSON array and object becomes its own node.
    /// Nesting past the depth limit fails with [`GraphError::DepthExceeded`].
    pub fn import(&mut self, json: &Json) -> Result<Value, GraphError> {
        self.import_value(json, 0)
    }

    fn import_value(&mut self, json: &Json, depth: usize) -> Result<Value, GraphError> {
        let node = match json {
            Json::Null => return Ok(Value::Null),
            Json::Bool(b) => return Ok(Value::Bool(*b)),
            Json::Number(n) => return Ok(Value::Number(n.clone())),
            Json::String(s) => return Ok(Value::String(s.clone())),
            _ if depth > self.max_depth => {
                return Err(GraphError::DepthExceeded {
                    limit: self.max_depth,
                });
            }
            Json::Array(items) => Node::Array(
                items
                    .iter()
                    .map(|item| self.import_value(item, depth + 1))
                    .collect::<Result<_, _>>()?,
            ),
            Json::Object(map) => Node::Object(
                map.iter()
                    .map(|(k, v)| -> Result<(String, Value), GraphError> {
                        Ok((k.clone(), self.import_value(v, depth + 1)?))
                    })
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(Value::Link(self.add(node)))
    }

    /// Renders a value as JSON.
    ///
    /// Shared nodes are written out once per occurrence. A link back to a node
    /// that is still being rendered fails with [`GraphError::Cycle`], and
    /// nesting past the depth limit with [`GraphError::DepthExceeded`].
    pub fn export(&self, value: &Value) -> Result<Json, GraphError> {
        let mut path = Vec::new();
        self.export_value(value, &mut path)
    }

    fn export_value(&self, value: &Value, path: &mut Vec<NodeId>) -> Result<Json, GraphError> {
        let id = match value {
            Value::Null => return Ok(Json::Null),
            Value::Bool(b) => return Ok(Json::Bool(*b)),
            Value::Number(n) => return Ok(Json::Number(n.clone())),
            Value::String(s) => return Ok(Json::String(s.clone())),
            Value::Link(id) => *id,
        };
        if path.contains(&id) {
            return Err(GraphError::Cycle(id));
        }
        // The path holds every enclosing node, so its length is this node's depth.
        if path.len() > self.max_depth {
            return Err(GraphError::DepthExceeded {
                limit: self.max_depth,
            });
        }
        let node = self.node(id).ok_or(GraphError::UnknownNode(id))?;

        path.push(id);
        let json = match node {
            Node::Array(items) => Json::Array(
                items
                    .iter()
                    .map(|item| self.export_value(item, path))
                    .collect::<Result<_, _>>()?,
            ),
            Node::Object(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| -> Result<(String, Json), GraphError> {
                        Ok((k.clone(), self.export_value(v, path)?))
                    })
                    .collect::<Result<_, _>>()?,
            ),
        };
        path.pop();
        Ok(json)
    }
}
