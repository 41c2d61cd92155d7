//! XML Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references. Attribute
//! nodes live in the same arena as everything else so queries can return
//! them; their parent is the owning element but they never appear in its
//! child list.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Attribute node, owned by an element
    Attribute,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
    /// Detached container for parsed fragment nodes
    Fragment,
}

/// An XML node in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (owning element for attributes, None when detached)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Index into string pool for the qualified name (elements, attributes)
    /// or PI target, or 0
    pub name_id: u32,
    /// Index into string pool for namespace prefix, or 0
    pub prefix_id: u32,
    /// Index into string pool for the local name, or 0
    pub local_id: u32,
    /// Index into string pool for namespace URI, or 0
    pub namespace_id: u32,
    /// Text, CDATA and comment content, attribute value or PI data
    pub value: String,
    /// Attribute nodes in source order (elements only)
    pub attrs: Vec<NodeId>,
}

impl XmlNode {
    /// Create an unlinked node of the given kind
    pub fn new(kind: NodeKind) -> Self {
        XmlNode {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id: 0,
            prefix_id: 0,
            local_id: 0,
            namespace_id: 0,
            value: String::new(),
            attrs: Vec::new(),
        }
    }

    /// Create a character-data node (text, CDATA, comment)
    pub fn with_value(kind: NodeKind, value: impl Into<String>) -> Self {
        let mut node = XmlNode::new(kind);
        node.value = value.into();
        node
    }

    /// Copy of this node's own data with all tree links cleared
    pub fn unlinked(&self) -> Self {
        XmlNode {
            kind: self.kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id: self.name_id,
            prefix_id: self.prefix_id,
            local_id: self.local_id,
            namespace_id: self.namespace_id,
            value: self.value.clone(),
            attrs: Vec::new(),
        }
    }

    #[inline]
    pub fn is_attribute(&self) -> bool {
        self.kind == NodeKind::Attribute
    }

    /// Text or CDATA
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text | NodeKind::CData)
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }
}
