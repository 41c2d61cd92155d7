//! XML Document - mutable arena-based DOM
//!
//! - Arena allocation for nodes, addressed by NodeId
//! - String interning for names, prefixes and namespace URIs
//! - Namespace URIs resolved while building
//! - Structural mutation (append, insert, detach, clone, adopt)
//!
//! Nodes are never freed. Detached nodes and unused clones stay in the arena,
//! unreachable from the document node.

use super::namespace::{ns, NamespaceResolver};
use super::node::{NodeId, NodeKind, XmlNode};
use super::strings::StringPool;
use crate::core::attributes::split_name;
use crate::core::scanner::is_whitespace;
use crate::core::tokenizer::ParseError;
use crate::reader::events::{StartElement, XmlEvent};
use crate::reader::slice::SliceReader;
use std::collections::HashMap;

/// The document node is always the first arena slot
pub const DOCUMENT_NODE: NodeId = 0;

/// An XML document stored in arena format
#[derive(Debug, Clone)]
pub struct Document {
    /// Arena of nodes
    nodes: Vec<XmlNode>,
    /// Interned strings
    pub strings: StringPool,
    /// Raw `<?xml ...?>` declaration, if present
    xml_declaration: Option<String>,
    /// Raw `<!DOCTYPE ...>` declaration, if present
    doctype: Option<String>,
    /// Whitespace written after the declaration and after the DOCTYPE
    prolog_space: [String; 2],
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the document node
    pub fn new() -> Self {
        Document {
            nodes: vec![XmlNode::new(NodeKind::Document)],
            strings: StringPool::new(),
            xml_declaration: None,
            doctype: None,
            prolog_space: Default::default(),
        }
    }

    /// Parse a complete, well-formed document with exactly one root element
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut doc = Document::new();
        let resolver = NamespaceResolver::new(&mut doc.strings);
        TreeBuilder::new(&mut doc, resolver, false).build(input)?;
        Ok(doc)
    }

    /// Parse a fragment: any number of top-level nodes, text included.
    ///
    /// `bindings` are the (prefix, uri) namespace bindings in scope where the
    /// fragment will be inserted. The parsed nodes are the children of the
    /// returned document's document node.
    pub fn parse_fragment(input: &str, bindings: &[(String, String)]) -> Result<Self, ParseError> {
        let mut doc = Document::new();
        let resolver = NamespaceResolver::with_bindings(&mut doc.strings, bindings);
        TreeBuilder::new(&mut doc, resolver, true).build(input)?;
        Ok(doc)
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> Option<&mut XmlNode> {
        self.nodes.get_mut(id as usize)
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(|n| n.kind)
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// First element child of the document node
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(DOCUMENT_NODE)
            .find(|&id| self.kind(id) == Some(NodeKind::Element))
    }

    pub fn xml_declaration(&self) -> Option<&str> {
        self.xml_declaration.as_deref()
    }

    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    /// Source whitespace following the declaration
    pub fn declaration_space(&self) -> &str {
        &self.prolog_space[0]
    }

    /// Source whitespace following the DOCTYPE
    pub fn doctype_space(&self) -> &str {
        &self.prolog_space[1]
    }

    /// Iterate over the children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        ChildIter {
            doc: self,
            next: self.node(id).and_then(|n| n.first_child),
        }
    }

    /// Attribute nodes of an element, in source order
    pub fn attributes(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |n| n.attrs.as_slice())
    }

    /// Qualified name of an element, attribute or PI target; "" otherwise
    pub fn name(&self, id: NodeId) -> &str {
        self.node(id).map_or("", |n| self.strings.get(n.name_id))
    }

    pub fn local_name(&self, id: NodeId) -> &str {
        self.node(id).map_or("", |n| self.strings.get(n.local_id))
    }

    pub fn prefix(&self, id: NodeId) -> Option<&str> {
        self.node(id)
            .filter(|n| n.prefix_id != 0)
            .map(|n| self.strings.get(n.prefix_id))
    }

    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        self.node(id)
            .filter(|n| n.namespace_id != 0)
            .map(|n| self.strings.get(n.namespace_id))
    }

    /// Own value: text content, attribute value, comment text or PI data
    pub fn value(&self, id: NodeId) -> &str {
        self.node(id).map_or("", |n| n.value.as_str())
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) {
        if let Some(node) = self.node_mut(id) {
            node.value.clear();
            node.value.push_str(value);
        }
    }

    /// XPath string-value: concatenated descendant text for documents,
    /// elements and fragments, the own value for everything else
    pub fn string_value(&self, id: NodeId) -> String {
        match self.kind(id) {
            // whitespace around the root element is layout, not content
            Some(NodeKind::Document) => self
                .root_element()
                .map(|root| self.string_value(root))
                .unwrap_or_default(),
            Some(NodeKind::Element | NodeKind::Fragment) => {
                let mut out = String::new();
                for d in self.descendants(id) {
                    if let Some(node) = self.node(d).filter(|n| n.is_text()) {
                        out.push_str(&node.value);
                    }
                }
                out
            }
            Some(_) => self.value(id).to_string(),
            None => String::new(),
        }
    }

    /// Topmost ancestor: the document node for attached nodes, the root of
    /// the detached subtree otherwise
    pub fn top_ancestor(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.top_ancestor(id) == DOCUMENT_NODE
    }

    /// Descendants in document order, excluding the node itself and
    /// attribute nodes
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).collect();
        stack.reverse();
        while let Some(current) = stack.pop() {
            out.push(current);
            let start = stack.len();
            stack.extend(self.children(current));
            stack[start..].reverse();
        }
        out
    }

    /// Document order index of every node reachable from `top`, attribute
    /// nodes ordered directly after their element
    pub fn document_order(&self, top: NodeId) -> HashMap<NodeId, usize> {
        let mut order = HashMap::new();
        let mut stack = vec![top];
        while let Some(current) = stack.pop() {
            order.insert(current, order.len());
            for &attr in self.attributes(current) {
                order.insert(attr, order.len());
            }
            let start = stack.len();
            stack.extend(self.children(current));
            stack[start..].reverse();
        }
        order
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// Attribute node of `element` with the given qualified name
    pub fn attribute(&self, element: NodeId, name: &str) -> Option<NodeId> {
        let name_id = self.strings.lookup(name)?;
        self.attributes(element)
            .iter()
            .copied()
            .find(|&a| self.node(a).is_some_and(|n| n.name_id == name_id))
    }

    pub fn attribute_value(&self, element: NodeId, name: &str) -> Option<&str> {
        self.attribute(element, name).map(|a| self.value(a))
    }

    /// Set an attribute value, creating the attribute if needed. Returns the
    /// attribute node.
    pub fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) -> NodeId {
        if let Some(attr) = self.attribute(element, name) {
            self.set_value(attr, value);
            return attr;
        }

        let attr = self.alloc_named(NodeKind::Attribute, name);
        let namespace = if name == "xmlns" || name.starts_with("xmlns:") {
            ns::XMLNS.to_string()
        } else {
            match split_name(name).0 {
                Some(prefix) => self
                    .in_scope_namespaces(element)
                    .into_iter()
                    .find(|(p, _)| p == prefix)
                    .map(|(_, uri)| uri)
                    .unwrap_or_default(),
                None => String::new(),
            }
        };
        let namespace_id = self.strings.intern(&namespace);
        if let Some(node) = self.node_mut(attr) {
            node.namespace_id = namespace_id;
            node.value.push_str(value);
        }
        self.push_attribute(element, attr);
        attr
    }

    /// Remove an attribute by name; returns whether it existed
    pub fn remove_attribute(&mut self, element: NodeId, name: &str) -> bool {
        match self.attribute(element, name) {
            Some(attr) => {
                self.detach(attr);
                true
            }
            None => false,
        }
    }

    fn push_attribute(&mut self, element: NodeId, attr: NodeId) {
        if let Some(node) = self.node_mut(attr) {
            node.parent = Some(element);
        }
        if let Some(node) = self.node_mut(element) {
            node.attrs.push(attr);
        }
    }

    /// Namespace bindings visible at a node as (prefix, uri), nearest
    /// declaration first. The default namespace has an empty prefix.
    pub fn in_scope_namespaces(&self, id: NodeId) -> Vec<(String, String)> {
        let mut seen: Vec<(String, String)> = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            for &attr in self.attributes(node_id) {
                let name = self.name(attr);
                let prefix = if name == "xmlns" {
                    ""
                } else if let Some(p) = name.strip_prefix("xmlns:") {
                    p
                } else {
                    continue;
                };
                if !seen.iter().any(|(p, _)| p == prefix) {
                    seen.push((prefix.to_string(), self.value(attr).to_string()));
                }
            }
            current = self.parent(node_id);
        }
        // An empty default declaration undeclares the default namespace
        seen.retain(|(_, uri)| !uri.is_empty());
        seen
    }

    // ------------------------------------------------------------------
    // Construction and mutation
    // ------------------------------------------------------------------

    fn alloc(&mut self, node: XmlNode) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }

    fn alloc_named(&mut self, kind: NodeKind, name: &str) -> NodeId {
        let (prefix, local) = split_name(name);
        let mut node = XmlNode::new(kind);
        node.name_id = self.strings.intern(name);
        node.prefix_id = prefix.map_or(0, |p| self.strings.intern(p));
        node.local_id = self.strings.intern(local);
        self.alloc(node)
    }

    /// Create a detached element with no namespace
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.alloc_named(NodeKind::Element, name)
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(XmlNode::with_value(NodeKind::Text, text))
    }

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.can_insert(parent, child) {
            return;
        }
        self.detach(child);

        let last = self.node(parent).and_then(|n| n.last_child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
            node.prev_sibling = last;
            node.next_sibling = None;
        }
        match last {
            Some(last) => {
                if let Some(node) = self.node_mut(last) {
                    node.next_sibling = Some(child);
                }
            }
            None => {
                if let Some(node) = self.node_mut(parent) {
                    node.first_child = Some(child);
                }
            }
        }
        if let Some(node) = self.node_mut(parent) {
            node.last_child = Some(child);
        }
    }

    /// Insert `child` into `parent` immediately before `reference`. Falls
    /// back to append when `reference` is not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        if child == reference {
            return;
        }
        if self.parent(reference) != Some(parent) {
            self.append_child(parent, child);
            return;
        }
        if !self.can_insert(parent, child) {
            return;
        }
        self.detach(child);

        let prev = self.node(reference).and_then(|n| n.prev_sibling);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = Some(reference);
        }
        if let Some(node) = self.node_mut(reference) {
            node.prev_sibling = Some(child);
        }
        match prev {
            Some(prev) => {
                if let Some(node) = self.node_mut(prev) {
                    node.next_sibling = Some(child);
                }
            }
            None => {
                if let Some(node) = self.node_mut(parent) {
                    node.first_child = Some(child);
                }
            }
        }
    }

    /// A node may be inserted if it is a non-document, non-attribute node
    /// and not an ancestor-or-self of the new parent
    fn can_insert(&self, parent: NodeId, child: NodeId) -> bool {
        let insertable = matches!(
            self.kind(child),
            Some(
                NodeKind::Element
                    | NodeKind::Text
                    | NodeKind::CData
                    | NodeKind::Comment
                    | NodeKind::ProcessingInstruction
            )
        );
        if !insertable || self.node(parent).is_none() {
            return false;
        }
        let mut current = Some(parent);
        while let Some(id) = current {
            if id == child {
                return false;
            }
            current = self.parent(id);
        }
        true
    }

    /// Unlink a node from its parent (or an attribute from its element)
    pub fn detach(&mut self, id: NodeId) {
        let Some((parent, is_attribute, prev, next)) = self
            .node(id)
            .and_then(|n| Some((n.parent?, n.is_attribute(), n.prev_sibling, n.next_sibling)))
        else {
            return;
        };

        if is_attribute {
            if let Some(owner) = self.node_mut(parent) {
                owner.attrs.retain(|&a| a != id);
            }
            if let Some(node) = self.node_mut(id) {
                node.parent = None;
            }
            return;
        }

        match prev {
            Some(prev) => {
                if let Some(node) = self.node_mut(prev) {
                    node.next_sibling = next;
                }
            }
            None => {
                if let Some(node) = self.node_mut(parent) {
                    node.first_child = next;
                }
            }
        }
        match next {
            Some(next) => {
                if let Some(node) = self.node_mut(next) {
                    node.prev_sibling = prev;
                }
            }
            None => {
                if let Some(node) = self.node_mut(parent) {
                    node.last_child = prev;
                }
            }
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
            node.prev_sibling = None;
            node.next_sibling = None;
        }
    }

    /// Detach every child of a node; attributes are kept
    pub fn clear_children(&mut self, id: NodeId) {
        while let Some(child) = self.node(id).and_then(|n| n.first_child) {
            self.detach(child);
        }
    }

    /// Copy a subtree (attributes included) within this document. The copy
    /// is detached.
    pub fn deep_clone(&mut self, id: NodeId) -> Option<NodeId> {
        let copy = self.node(id)?.unlinked();
        let attrs = self.attributes(id).to_vec();
        let children: Vec<NodeId> = self.children(id).collect();

        let new_id = self.alloc(copy);
        for attr in attrs {
            if let Some(a) = self.deep_clone(attr) {
                self.push_attribute(new_id, a);
            }
        }
        for child in children {
            if let Some(c) = self.deep_clone(child) {
                self.append_child(new_id, c);
            }
        }
        Some(new_id)
    }

    /// Copy a subtree from another document into this one. The copy is
    /// detached.
    pub fn adopt(&mut self, source: &Document, id: NodeId) -> Option<NodeId> {
        let src = source.node(id)?;
        let mut copy = src.unlinked();
        copy.name_id = self.strings.intern(source.strings.get(src.name_id));
        copy.prefix_id = self.strings.intern(source.strings.get(src.prefix_id));
        copy.local_id = self.strings.intern(source.strings.get(src.local_id));
        copy.namespace_id = self.strings.intern(source.strings.get(src.namespace_id));

        let new_id = self.alloc(copy);
        for &attr in &src.attrs {
            if let Some(a) = self.adopt(source, attr) {
                self.push_attribute(new_id, a);
            }
        }
        for child in source.children(id) {
            if let Some(c) = self.adopt(source, child) {
                self.append_child(new_id, c);
            }
        }
        Some(new_id)
    }
}

/// Iterator over the children of a node
pub struct ChildIter<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Builds a document from reader events, enforcing tag balance, the single
/// root rule (documents only) and namespace binding
struct TreeBuilder<'d> {
    doc: &'d mut Document,
    resolver: NamespaceResolver,
    fragment: bool,
}

impl<'d> TreeBuilder<'d> {
    fn new(doc: &'d mut Document, resolver: NamespaceResolver, fragment: bool) -> Self {
        TreeBuilder {
            doc,
            resolver,
            fragment,
        }
    }

    fn build(mut self, input: &str) -> Result<(), ParseError> {
        let mut reader = SliceReader::new(input);
        // Open elements with the position of their start tag
        let mut open: Vec<(NodeId, usize)> = Vec::new();
        let mut root_seen = false;

        while let Some(event) = reader.next_event()? {
            let pos = reader.last_position();
            let parent = open.last().map_or(DOCUMENT_NODE, |&(id, _)| id);
            let at_top = open.is_empty() && !self.fragment;

            match event {
                XmlEvent::StartElement(start) | XmlEvent::EmptyElement(start)
                    if at_top && root_seen =>
                {
                    return Err(ParseError::new(
                        format!("Multiple root elements: unexpected <{}>", start.name),
                        pos,
                    ));
                }
                XmlEvent::StartElement(start) => {
                    root_seen = true;
                    let id = self.element(parent, &start, pos)?;
                    open.push((id, pos));
                }
                XmlEvent::EmptyElement(start) => {
                    root_seen = true;
                    self.element(parent, &start, pos)?;
                    self.resolver.pop_scope();
                }
                XmlEvent::EndElement(end) => {
                    let Some((id, _)) = open.pop() else {
                        return Err(ParseError::new(
                            format!("Unexpected end tag </{}>", end.name),
                            pos,
                        ));
                    };
                    if self.doc.name(id) != end.name {
                        return Err(ParseError::new(
                            format!(
                                "Mismatched end tag: expected </{}>, found </{}>",
                                self.doc.name(id),
                                end.name
                            ),
                            pos,
                        ));
                    }
                    self.resolver.pop_scope();
                }
                XmlEvent::Text(text) => {
                    if at_top {
                        if !text.bytes().all(is_whitespace) {
                            return Err(ParseError::new("Text content outside root element", pos));
                        }
                        self.top_level_space(&text);
                        continue;
                    }
                    let id = self.doc.create_text(&text);
                    self.doc.append_child(parent, id);
                }
                XmlEvent::CData(content) => {
                    if at_top {
                        return Err(ParseError::new("CDATA section outside root element", pos));
                    }
                    let id = self.doc.alloc(XmlNode::with_value(NodeKind::CData, content));
                    self.doc.append_child(parent, id);
                }
                XmlEvent::Comment(content) => {
                    let id = self.doc.alloc(XmlNode::with_value(NodeKind::Comment, content));
                    self.doc.append_child(parent, id);
                }
                XmlEvent::ProcessingInstruction { target, data } => {
                    let id = self.doc.alloc_named(NodeKind::ProcessingInstruction, target);
                    self.doc.set_value(id, data);
                    self.doc.append_child(parent, id);
                }
                XmlEvent::XmlDeclaration(raw) => {
                    if self.fragment {
                        return Err(ParseError::new("XML declaration not allowed in a fragment", pos));
                    }
                    self.doc.xml_declaration = Some(raw.to_string());
                }
                XmlEvent::DocType(raw) => {
                    if self.fragment || root_seen || self.doc.doctype.is_some() {
                        return Err(ParseError::new("DOCTYPE declaration not allowed here", pos));
                    }
                    self.doc.doctype = Some(raw.to_string());
                }
            }
        }

        if let Some(&(id, pos)) = open.last() {
            return Err(ParseError::new(
                format!("Unclosed element <{}>", self.doc.name(id)),
                pos,
            ));
        }
        if !self.fragment && !root_seen {
            return Err(ParseError::new("No root element", input.len()));
        }
        Ok(())
    }

    /// Keep whitespace between top-level nodes so the document serializes
    /// back with the same layout
    fn top_level_space(&mut self, text: &str) {
        let in_prolog = self.doc.children(DOCUMENT_NODE).next().is_none();
        let slot = match (&self.doc.xml_declaration, &self.doc.doctype) {
            (_, Some(_)) if in_prolog => Some(1),
            (Some(_), None) if in_prolog => Some(0),
            _ => None,
        };
        match slot {
            Some(i) => self.doc.prolog_space[i].push_str(text),
            None => {
                let id = self.doc.create_text(text);
                self.doc.append_child(DOCUMENT_NODE, id);
            }
        }
    }

    /// Create an element with its attributes under `parent`. Opens a
    /// namespace scope the caller must close.
    fn element(
        &mut self,
        parent: NodeId,
        start: &StartElement<'_>,
        pos: usize,
    ) -> Result<NodeId, ParseError> {
        self.resolver.push_scope();
        for (prefix, uri) in start.namespace_declarations() {
            if !prefix.is_empty() && uri.is_empty() {
                return Err(ParseError::new(
                    format!("Empty namespace URI for prefix '{}'", prefix),
                    pos,
                ));
            }
            let prefix_id = self.doc.strings.intern(prefix);
            let uri_id = self.doc.strings.intern(uri);
            self.resolver.declare(prefix_id, uri_id);
        }

        let id = self.doc.alloc_named(NodeKind::Element, start.name);
        let namespace_id = self.resolve(start.prefix, true, pos)?;
        if let Some(node) = self.doc.node_mut(id) {
            node.namespace_id = namespace_id;
        }

        let xmlns_id = self.doc.strings.intern(ns::XMLNS);
        for attr in &start.attributes {
            let namespace_id = if attr.is_namespace_declaration() {
                xmlns_id
            } else {
                self.resolve(attr.prefix(), false, pos)?
            };
            let attr_id = self.doc.alloc_named(NodeKind::Attribute, attr.name);
            if let Some(node) = self.doc.node_mut(attr_id) {
                node.namespace_id = namespace_id;
                node.value = attr.value.to_string();
            }
            self.doc.push_attribute(id, attr_id);
        }

        self.doc.append_child(parent, id);
        Ok(id)
    }

    /// Resolve a prefix to a URI id. Unprefixed elements take the default
    /// namespace; unprefixed attributes have none.
    fn resolve(&mut self, prefix: Option<&str>, use_default: bool, pos: usize) -> Result<u32, ParseError> {
        match prefix {
            Some(prefix) => {
                let prefix_id = self.doc.strings.intern(prefix);
                self.resolver.resolve(prefix_id).ok_or_else(|| {
                    ParseError::new(format!("Unbound namespace prefix: {}", prefix), pos)
                })
            }
            None if use_default => Ok(self.resolver.resolve_default()),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element_names(doc: &Document, parent: NodeId) -> Vec<String> {
        doc.children(parent)
            .filter(|&c| doc.kind(c) == Some(NodeKind::Element))
            .map(|c| doc.name(c).to_string())
            .collect()
    }

    #[test]
    fn test_parse_simple() {
        let doc = Document::parse(r#"<root><a id="1">x</a><b/></root>"#).unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.name(root), "root");
        assert_eq!(element_names(&doc, root), vec!["a", "b"]);
        let a = doc.children(root).next().unwrap();
        assert_eq!(doc.attribute_value(a, "id"), Some("1"));
        assert_eq!(doc.string_value(root), "x");
    }

    #[test]
    fn test_parse_errors() {
        let cases = [
            ("<a><b></a>", 6),
            ("<a></a><b/>", 7),
            ("<a>", 0),
            ("text<a/>", 0),
            ("", 0),
            ("<a></b>", 3),
            ("<p:a/>", 0),
        ];
        for (input, position) in cases {
            let err = Document::parse(input).unwrap_err();
            assert_eq!(err.position, position, "{input}: {}", err.message);
        }
    }

    #[test]
    fn test_declaration_and_doctype_kept() {
        let doc = Document::parse("<?xml version=\"1.0\"?>\n<!DOCTYPE html>\n<html/>\n").unwrap();
        assert_eq!(doc.xml_declaration(), Some("<?xml version=\"1.0\"?>"));
        assert_eq!(doc.doctype(), Some("<!DOCTYPE html>"));
        assert_eq!(doc.declaration_space(), "\n");
        assert_eq!(doc.doctype_space(), "\n");
        // the root element and the trailing newline
        assert_eq!(doc.children(DOCUMENT_NODE).count(), 2);

        let doc = Document::parse("<!DOCTYPE html><html/>").unwrap();
        assert_eq!(doc.doctype_space(), "");
        assert_eq!(doc.children(DOCUMENT_NODE).count(), 1);
    }

    #[test]
    fn test_namespaces_resolved() {
        let doc = Document::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:x="urn:x"><x:rect x:w="1"/></svg>"#,
        )
        .unwrap();
        let svg = doc.root_element().unwrap();
        assert_eq!(doc.namespace_uri(svg), Some("http://www.w3.org/2000/svg"));
        let rect = doc.children(svg).next().unwrap();
        assert_eq!(doc.namespace_uri(rect), Some("urn:x"));
        assert_eq!(doc.local_name(rect), "rect");
        let w = doc.attributes(rect)[0];
        assert_eq!(doc.namespace_uri(w), Some("urn:x"));
        let scope = doc.in_scope_namespaces(rect);
        assert!(scope.contains(&("x".to_string(), "urn:x".to_string())));
        assert!(scope.contains(&(String::new(), "http://www.w3.org/2000/svg".to_string())));
    }

    #[test]
    fn test_fragment() {
        let bindings = vec![("x".to_string(), "urn:x".to_string())];
        let frag = Document::parse_fragment("hi <x:b>there</x:b><!--c-->", &bindings).unwrap();
        assert_eq!(frag.children(DOCUMENT_NODE).count(), 3);
        assert!(Document::parse_fragment("<x:b/>", &[]).is_err());
        assert!(Document::parse_fragment("<b>", &[]).is_err());
    }

    #[test]
    fn test_insert_and_detach() {
        let mut doc = Document::parse("<ul><li>a</li><li>c</li></ul>").unwrap();
        let ul = doc.root_element().unwrap();
        let items: Vec<_> = doc.children(ul).collect();

        let b = doc.create_element("li");
        let text = doc.create_text("b");
        doc.append_child(b, text);
        doc.insert_before(ul, b, items[1]);
        let values: Vec<_> = doc.children(ul).map(|c| doc.string_value(c)).collect();
        assert_eq!(values, vec!["a", "b", "c"]);

        doc.detach(items[0]);
        let values: Vec<_> = doc.children(ul).map(|c| doc.string_value(c)).collect();
        assert_eq!(values, vec!["b", "c"]);
        assert!(!doc.is_attached(items[0]));

        doc.clear_children(ul);
        assert_eq!(doc.children(ul).count(), 0);
    }

    #[test]
    fn test_cannot_append_ancestor() {
        let mut doc = Document::parse("<a><b/></a>").unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.children(a).next().unwrap();
        doc.append_child(b, a);
        assert_eq!(doc.parent(b), Some(a));
        assert_eq!(doc.parent(a), Some(DOCUMENT_NODE));
    }

    #[test]
    fn test_deep_clone_is_detached_copy() {
        let mut doc = Document::parse(r#"<ul><li class="item">x</li></ul>"#).unwrap();
        let ul = doc.root_element().unwrap();
        let li = doc.children(ul).next().unwrap();
        let copy = doc.deep_clone(li).unwrap();
        assert!(doc.parent(copy).is_none());
        assert_eq!(doc.attribute_value(copy, "class"), Some("item"));
        doc.set_attribute(copy, "class", "other");
        assert_eq!(doc.attribute_value(li, "class"), Some("item"));
        assert_eq!(doc.string_value(copy), "x");
    }

    #[test]
    fn test_adopt_from_other_document() {
        let mut doc = Document::parse("<div/>").unwrap();
        let frag = Document::parse_fragment(r#"<b title="t">hi</b>"#, &[]).unwrap();
        let div = doc.root_element().unwrap();
        let src = frag.children(DOCUMENT_NODE).next().unwrap();
        let adopted = doc.adopt(&frag, src).unwrap();
        doc.append_child(div, adopted);
        assert_eq!(doc.name(adopted), "b");
        assert_eq!(doc.attribute_value(adopted, "title"), Some("t"));
        assert_eq!(doc.string_value(div), "hi");
    }

    #[test]
    fn test_attribute_set_and_remove() {
        let mut doc = Document::parse("<a/>").unwrap();
        let a = doc.root_element().unwrap();
        doc.set_attribute(a, "href", "#");
        doc.set_attribute(a, "href", "/x");
        assert_eq!(doc.attributes(a).len(), 1);
        assert_eq!(doc.attribute_value(a, "href"), Some("/x"));
        assert!(doc.remove_attribute(a, "href"));
        assert!(!doc.remove_attribute(a, "href"));
        assert!(doc.attributes(a).is_empty());
    }

    #[test]
    fn test_document_order() {
        let doc = Document::parse(r#"<a x="1"><b/><c/></a>"#).unwrap();
        let a = doc.root_element().unwrap();
        let order = doc.document_order(DOCUMENT_NODE);
        let x = doc.attributes(a)[0];
        let kids: Vec<_> = doc.children(a).collect();
        assert!(order[&a] < order[&x]);
        assert!(order[&x] < order[&kids[0]]);
        assert!(order[&kids[0]] < order[&kids[1]]);
    }
}
