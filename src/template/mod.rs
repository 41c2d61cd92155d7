//! Templates
//!
//! A [`Template`] owns the parsed document and the options it was built
//! with. Loose sources go through [`normalize::ingest`] before parsing and
//! through [`normalize::emit`] when rendered; strict sources are parsed and
//! serialized as they are.

pub mod node;
pub mod repeat;

pub use node::{Condition, Target, TemplateNode};
pub use repeat::{Repeat, Repeater};

use crate::config::{Mode, TemplateOptions, VoidStyle};
use crate::dom::{Document, EmptyTags, NodeId, SerializeOptions, DOCUMENT_NODE};
use crate::error::{Result, TemplateError};
use crate::normalize;
use std::borrow::Cow;
use std::fmt;

/// What every query of a template runs with
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// Configured bindings first, then those declared on the root element
    pub namespaces: Vec<(String, String)>,
    pub mode: Mode,
}

#[derive(Debug, Clone)]
pub struct Template {
    doc: Document,
    context: QueryContext,
    void_style: VoidStyle,
}

impl Template {
    /// Parse with default options, detecting the mode from the source
    pub fn parse(source: &str) -> Result<Self> {
        Self::with_options(source, TemplateOptions::default())
    }

    pub fn with_options(source: &str, options: TemplateOptions) -> Result<Self> {
        let mode = options.mode.unwrap_or_else(|| Mode::detect(source));
        let markup = match mode {
            Mode::Loose => Cow::Owned(normalize::ingest(source)),
            Mode::Strict => Cow::Borrowed(source),
        };
        let doc = Document::parse(&markup).map_err(TemplateError::malformed_source)?;

        let mut namespaces = options.namespaces;
        if let Some(root) = doc.root_element() {
            namespaces.extend(doc.in_scope_namespaces(root));
        }
        tracing::debug!(?mode, nodes = doc.node_count(), "parsed template");

        Ok(Template {
            doc,
            context: QueryContext { namespaces, mode },
            void_style: options.void_style,
        })
    }

    pub fn mode(&self) -> Mode {
        self.context.mode
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The root element, or the document node once the root was removed
    pub fn root(&self) -> NodeId {
        self.doc.root_element().unwrap_or(DOCUMENT_NODE)
    }

    /// Mutation scope over the whole document. Selectors match below the
    /// document node, so the root element is included.
    pub fn node(&mut self) -> TemplateNode<'_> {
        self.node_at(DOCUMENT_NODE)
    }

    /// Mutation scope at any node of this template
    pub fn node_at(&mut self, node: NodeId) -> TemplateNode<'_> {
        TemplateNode {
            doc: &mut self.doc,
            context: &self.context,
            node,
        }
    }

    pub fn query(&self, selector: &str) -> Result<Vec<NodeId>> {
        node::query(&self.doc, &self.context, DOCUMENT_NODE, selector)
    }

    pub fn set<I, K, V>(&mut self, mapping: I, as_html: bool) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.node().set(mapping, as_html)?;
        Ok(self)
    }

    pub fn set_value(&mut self, selector: &str, value: &str, as_html: bool) -> Result<&mut Self> {
        self.node().set_value(selector, value, as_html)?;
        Ok(self)
    }

    pub fn add_class(&mut self, selector: &str, class: &str) -> Result<&mut Self> {
        self.node().add_class(selector, class)?;
        Ok(self)
    }

    pub fn remove(&mut self, selector: &str) -> Result<&mut Self> {
        self.node().remove(selector)?;
        Ok(self)
    }

    pub fn remove_where<I, K, C>(&mut self, mapping: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, C)>,
        K: AsRef<str>,
        C: Into<Condition>,
    {
        self.node().remove_where(mapping)?;
        Ok(self)
    }

    pub fn repeat(&mut self, selector: &str) -> Result<Repeat<'_>> {
        self.node().repeat(selector)
    }

    /// Continue repeaters released with [`Repeat::into_repeaters`]
    pub fn resume(&mut self, repeaters: Vec<Repeater>) -> Repeat<'_> {
        Repeat::new(&mut self.doc, &self.context, repeaters)
    }

    fn serialize_options(&self) -> SerializeOptions {
        match self.context.mode {
            Mode::Strict => SerializeOptions {
                empty_tags: EmptyTags::SelfClose,
                xml_declaration: true,
            },
            Mode::Loose => SerializeOptions {
                empty_tags: EmptyTags::Expanded,
                xml_declaration: false,
            },
        }
    }

    fn finish(&self, serialized: String) -> String {
        match self.context.mode {
            Mode::Strict => serialized,
            Mode::Loose => normalize::emit(&serialized, self.void_style),
        }
    }

    /// Serialize the document in the template's mode
    pub fn render(&self) -> String {
        self.finish(self.doc.serialize(self.serialize_options()))
    }

    /// Serialize one node in the template's mode
    pub fn render_node(&self, node: NodeId) -> String {
        self.finish(self.doc.serialize_node(node, self.serialize_options()))
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_detection() {
        let t = Template::parse("<?xml version=\"1.0\"?>\n<root><a/></root>").unwrap();
        assert_eq!(t.mode(), Mode::Strict);
        assert_eq!(t.render(), "<?xml version=\"1.0\"?>\n<root><a/></root>");

        let t = Template::parse("<div><br></div>").unwrap();
        assert_eq!(t.mode(), Mode::Loose);
        assert_eq!(t.render(), "<div><br /></div>");
    }

    #[test]
    fn test_loose_mode_strips_declaration() {
        let options = TemplateOptions::new().with_mode(Mode::Loose);
        let t = Template::with_options("<?xml version=\"1.0\"?><p></p>", options).unwrap();
        assert_eq!(t.render(), "<p></p>");
    }

    #[test]
    fn test_malformed_sources() {
        for source in ["", "<a><b></a>", "<a/><b/>", "text only", "<a x=\"1\" x=\"2\"/>"] {
            let err = Template::parse(source).unwrap_err();
            assert!(
                matches!(err, TemplateError::MalformedSource { .. }),
                "{source:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_doctype_round_trip() {
        let source = "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"></head><body></body></html>";
        let t = Template::parse(source).unwrap();
        assert_eq!(
            t.render(),
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\" /></head><body></body></html>"
        );
    }

    #[test]
    fn test_options_namespaces() {
        let source = "<?xml version=\"1.0\"?><svg xmlns=\"http://www.w3.org/2000/svg\"><rect/></svg>";
        let options = TemplateOptions::new().with_namespace("s", "http://www.w3.org/2000/svg");
        let t = Template::with_options(source, options).unwrap();
        assert_eq!(t.query("s:rect").unwrap().len(), 1);
    }

    #[test]
    fn test_selectors_reach_root_element() {
        let mut t = Template::parse("<ul class=\"list\"><li>a</li></ul>").unwrap();
        assert_eq!(t.query(".list").unwrap(), vec![t.root()]);
        t.add_class("ul", "nav").unwrap();
        assert_eq!(t.render(), "<ul class=\"list nav\"><li>a</li></ul>");
    }

    #[test]
    fn test_render_node_and_display() {
        let mut t = Template::parse("<ul><li>a</li></ul>").unwrap();
        let li = t.query("li").unwrap()[0];
        assert_eq!(t.render_node(li), "<li>a</li>");
        t.set_value("li", "b", false).unwrap();
        assert_eq!(t.to_string(), "<ul><li>b</li></ul>");
    }
}
