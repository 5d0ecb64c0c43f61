//! `chihaya-load` reconstructs lazy matrices from [chihaya](https://github.com/ArtifactDB/chihaya)
//! delayed-array descriptions.
//!
//! A description is a tree of groups. Interior groups record a delayed operation
//! (subset, combine, transpose, ...) and leaves hold array payloads. Decoding
//! walks the tree depth first and asks a [`MatrixEngine`] to build each result,
//! so the engine decides what a matrix handle actually is.
//!
//! ## Examples
//!
//! ```rs
//! use std::rc::Rc;
//! use chihaya_load::{Decoder, dense::DenseEngine, node::{Data, Group, Value}};
//!
//! let leaf = Group::new()
//!     .with_attribute("delayed_type", "array")
//!     .with_attribute("delayed_array", "dense array")
//!     .with_dataset("data", Value::matrix(2, 2, Data::Float(vec![1.0, 2.0, 3.0, 4.0])))
//!     .with_dataset("native", true);
//! let root = Group::new()
//!     .with_attribute("delayed_type", "operation")
//!     .with_attribute("delayed_operation", "transpose")
//!     .with_dataset("permutation", vec![1_i64, 0])
//!     .with_group("seed", leaf);
//!
//! let decoder = Decoder::new(Rc::new(DenseEngine::new()));
//! let matrix = decoder.decode(&root.as_node()).unwrap();
//! assert_eq!(matrix.shape(), (2, 2));
//!
//! // Overrides take precedence over the built-in loaders.
//! let mut decoder = decoder;
//! decoder.register_override(chihaya_load::Kind::Operation, "transpose", |decoder, node| {
//!     decoder.decode(node.group("seed").unwrap().as_ref())
//! });
//! ```
mod decoder;
pub mod dense;
pub mod engine;
mod error;
mod leaf;
mod matrix;
pub mod node;
mod ops;
mod read;
pub mod registry;

pub use decoder::{
    ARRAY_ATTRIBUTE, ArrayType, Decoder, OPERATION_ATTRIBUTE, Operation, Options, TYPE_ATTRIBUTE,
    decode_from_path,
};
pub use engine::MatrixEngine;
pub use error::{Error, ErrorKind};
pub use matrix::Matrix;
pub use node::{Data, Group, Node, Value};
pub use registry::{Handler, Kind, Registry};
