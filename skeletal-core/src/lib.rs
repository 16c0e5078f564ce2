//! Skeletal stores key-value objects as key schemas plus parallel value arrays.
//!
//! Core concepts:
//! - **Graph**: An arena of array and object nodes; a `NodeId` is a node's identity
//! - **KeySchema**: The ordered key list of one object, written as `{"a":0,"b":1}`
//! - **EncodedCollection**: Schema text → value array, one entry per input object
//! - **Marker**: The string `{label}` standing in for an instance already written
//! - **IdentityRegistry**: Per-encode table of nodes already written and their labels
//!
//! # Example
//!
//! ```
//! use skeletal_core::{decode, encode, Graph, Value};
//!
//! let mut graph = Graph::new();
//! let shared = graph.object([("v", Value::from(1))]);
//! let root = graph.object([("x", Value::Link(shared)), ("y", Value::Link(shared))]);
//!
//! let collection = encode(&graph, &[Value::Link(root)]).unwrap();
//! assert_eq!(collection.to_json().unwrap(), r#"{"{\"x\":0,\"y\":1}":[{"v":1},"{x}"]}"#);
//!
//! // The marker comes back as a link to the same node.
//! let decoded = decode(&collection).unwrap();
//! let root = decoded.restored.single().unwrap();
//! assert_eq!(decoded.graph.get(root, "x"), decoded.graph.get(root, "y"));
//! ```
//!
//! # Markers
//!
//! A marker records only the key an instance was first reached under. The
//! decoder looks for that key starting where the marker sits: on the node
//! holding it, then on each enclosing node up to the entry root. Only when
//! none of them has it does the marker link to the most recent node reached
//! under that key elsewhere, which is not always the one the encoder saw.
//! Strings that happen to have marker form are indistinguishable from markers.

mod collection;
mod config;
mod decode;
mod encode;
mod flat;
mod graph;
pub mod marker;
mod registry;
mod schema;

pub use collection::{iterate, EncodedCollection, FormatError, Values};
pub use config::{Config, DEFAULT_MAX_DEPTH};
pub use decode::{decode, DecodeError, Decoded, Decoder, Restored};
pub use encode::{encode, EncodeError, Encoder};
pub use flat::Flat;
pub use graph::{Graph, GraphError, Node, NodeId, Value};
pub use registry::IdentityRegistry;
pub use schema::KeySchema;
