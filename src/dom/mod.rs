//! DOM Module - Arena-based mutable XML Document
//!
//! Implements the document representation using:
//! - Arena allocation for nodes
//! - NodeId (u32) indices for cache-friendly traversal
//! - String interning for element/attribute names
//! - Namespace resolution stack
//! - Serialization back to markup

pub mod document;
pub mod namespace;
pub mod node;
pub mod serialize;
pub mod strings;

pub use document::{Document, DOCUMENT_NODE};
pub use node::{NodeId, NodeKind, XmlNode};
pub use serialize::{EmptyTags, SerializeOptions};
pub use strings::StringPool;
