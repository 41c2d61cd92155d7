//! XPath 1.0 Engine
//!
//! XPath 1.0 over the arena DOM:
//! - All 13 axes (the namespace axis is always empty)
//! - The core function library except id()
//! - Compiled expression caching

pub mod axes;
pub mod compiler;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod value;

pub use eval::{evaluate, select_nodes};
pub use value::XPathValue;
