//! XML Serialization
//!
//! Writes a document or a single node back to markup. Text escapes `&`, `<`
//! and `>`; attribute values (always double-quoted) escape `&`, `<` and `"`.

use super::document::{Document, DOCUMENT_NODE};
use super::node::{NodeId, NodeKind};
use memchr::{memchr3, memmem};
use std::borrow::Cow;

/// How childless elements are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyTags {
    /// `<x/>`
    #[default]
    SelfClose,
    /// `<x></x>`
    Expanded,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SerializeOptions {
    pub empty_tags: EmptyTags,
    /// Write the stored `<?xml ...?>` declaration when serializing the document
    pub xml_declaration: bool,
}

impl Document {
    /// Serialize the whole document: declaration (if requested and present),
    /// DOCTYPE, then the top-level nodes. Whitespace between them is what the
    /// source had.
    pub fn serialize(&self, options: SerializeOptions) -> String {
        let mut out = String::new();
        if options.xml_declaration {
            if let Some(decl) = self.xml_declaration() {
                out.push_str(decl);
                out.push_str(self.declaration_space());
            }
        }
        if let Some(doctype) = self.doctype() {
            out.push_str(doctype);
            out.push_str(self.doctype_space());
        }
        for child in self.children(DOCUMENT_NODE) {
            self.write_node(&mut out, child, options);
        }
        out
    }

    /// Serialize a single node and its subtree. Attribute nodes serialize as
    /// `name="value"`.
    pub fn serialize_node(&self, id: NodeId, options: SerializeOptions) -> String {
        if id == DOCUMENT_NODE {
            return self.serialize(options);
        }
        let mut out = String::new();
        self.write_node(&mut out, id, options);
        out
    }

    fn write_node(&self, out: &mut String, id: NodeId, options: SerializeOptions) {
        let Some(node) = self.node(id) else {
            return;
        };
        match node.kind {
            NodeKind::Element => {
                let name = self.name(id);
                out.push('<');
                out.push_str(name);
                for &attr in &node.attrs {
                    out.push(' ');
                    self.write_attribute(out, attr);
                }
                if node.first_child.is_none() && options.empty_tags == EmptyTags::SelfClose {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for child in self.children(id) {
                    self.write_node(out, child, options);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            NodeKind::Attribute => self.write_attribute(out, id),
            NodeKind::Text => out.push_str(&escape_text(&node.value)),
            NodeKind::CData => write_cdata(out, &node.value),
            NodeKind::Comment => {
                out.push_str("<!--");
                out.push_str(&node.value);
                out.push_str("-->");
            }
            NodeKind::ProcessingInstruction => {
                out.push_str("<?");
                out.push_str(self.name(id));
                if !node.value.is_empty() {
                    out.push(' ');
                    out.push_str(&node.value);
                }
                out.push_str("?>");
            }
            NodeKind::Document | NodeKind::Fragment => {
                for child in self.children(id) {
                    self.write_node(out, child, options);
                }
            }
        }
    }

    fn write_attribute(&self, out: &mut String, attr: NodeId) {
        out.push_str(self.name(attr));
        out.push_str("=\"");
        out.push_str(&escape_attribute(self.value(attr)));
        out.push('"');
    }
}

/// CDATA content containing `]]>` is split across two sections
fn write_cdata(out: &mut String, content: &str) {
    out.push_str("<![CDATA[");
    let mut rest = content;
    while let Some(i) = memmem::find(rest.as_bytes(), b"]]>") {
        out.push_str(&rest[..i + 2]);
        out.push_str("]]><![CDATA[");
        rest = &rest[i + 2..];
    }
    out.push_str(rest);
    out.push_str("]]>");
}

/// Escape character data
pub fn escape_text(text: &str) -> Cow<'_, str> {
    if memchr3(b'&', b'<', b'>', text.as_bytes()).is_none() {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Escape a double-quoted attribute value
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    if memchr3(b'&', b'<', b'"', value.as_bytes()).is_none() {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
