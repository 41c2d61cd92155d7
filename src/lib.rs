//! RustyTemplate - markup templates over a strict XML tree
//!
//! A template is parsed once and then edited in place:
//! - Selectors: compact shorthand (`li.item`, `#nav@href`) compiled to XPath
//! - Normalizer: loose author markup in, idiomatic markup out
//! - Mutations: set text, markup, attributes and classes; remove nodes
//! - Repeaters: clone and commit copies of an element to render lists
//!
//! ```
//! use rustytemplate::Template;
//!
//! let mut t = Template::parse("<ul><li class=\"item\">x</li></ul>")?;
//! let mut items = t.repeat(".item")?;
//! for name in ["A", "B"] {
//!     items.set_value(".", name, false)?.next();
//! }
//! assert_eq!(t.render(), "<ul><li class=\"item\">A</li><li class=\"item\">B</li></ul>");
//! # Ok::<(), rustytemplate::TemplateError>(())
//! ```
//!
//! The tree underneath is an arena DOM with an XPath 1.0 engine, built on a
//! strict well-formedness-checking XML reader.

pub mod config;
pub mod core;
pub mod dom;
pub mod error;
pub mod normalize;
pub mod reader;
pub mod selector;
pub mod template;
pub mod xpath;

#[cfg(feature = "nif")]
mod nif;
#[cfg(feature = "nif")]
mod resource;
#[cfg(feature = "nif")]
mod term;

pub use config::{Mode, TemplateOptions, VoidStyle};
pub use error::{Result, TemplateError};
pub use template::{Condition, Repeat, Repeater, Target, Template, TemplateNode};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;
