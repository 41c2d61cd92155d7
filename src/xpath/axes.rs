//! XPath Axes Implementation
//!
//! XPath 1.0 axes over the arena DOM. Every axis returns its nodes in axis
//! order: document order for forward axes, reverse document order for
//! reverse axes. The namespace axis is always empty.

use super::parser::{Axis, NodeTest};
use crate::dom::{Document, NodeId, NodeKind};

/// Navigate along an axis from a context node
pub fn navigate(doc: &Document, context: NodeId, axis: Axis) -> Vec<NodeId> {
    match axis {
        Axis::Child => doc.children(context).collect(),
        Axis::Descendant => doc.descendants(context),
        Axis::DescendantOrSelf => {
            let mut result = vec![context];
            result.extend(doc.descendants(context));
            result
        }
        Axis::Parent => doc.parent(context).into_iter().collect(),
        Axis::Ancestor => ancestors(doc, context),
        Axis::AncestorOrSelf => {
            let mut result = vec![context];
            result.extend(ancestors(doc, context));
            result
        }
        Axis::FollowingSibling => siblings(doc, context, |n| n.next_sibling),
        Axis::PrecedingSibling => siblings(doc, context, |n| n.prev_sibling),
        Axis::Following => following(doc, context),
        Axis::Preceding => preceding(doc, context),
        Axis::Self_ => vec![context],
        Axis::Attribute => doc.attributes(context).to_vec(),
        Axis::Namespace => Vec::new(),
    }
}

fn ancestors(doc: &Document, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut current = context;
    while let Some(parent) = doc.parent(current) {
        result.push(parent);
        current = parent;
    }
    result
}

fn siblings(
    doc: &Document,
    context: NodeId,
    step: impl Fn(&crate::dom::XmlNode) -> Option<NodeId>,
) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut sibling = doc.node(context).and_then(&step);
    while let Some(id) = sibling {
        result.push(id);
        sibling = doc.node(id).and_then(&step);
    }
    result
}

/// Nodes after the context in document order, excluding descendants.
/// For an attribute the owning element's content follows it.
fn following(doc: &Document, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut current = context;
    if doc.kind(context) == Some(NodeKind::Attribute) {
        if let Some(owner) = doc.parent(context) {
            result.extend(doc.descendants(owner));
            current = owner;
        }
    }

    loop {
        for sibling in siblings(doc, current, |n| n.next_sibling) {
            result.push(sibling);
            result.extend(doc.descendants(sibling));
        }
        match doc.parent(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    result
}

/// Nodes before the context in reverse document order, excluding ancestors
fn preceding(doc: &Document, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut current = context;
    if doc.kind(context) == Some(NodeKind::Attribute) {
        if let Some(owner) = doc.parent(context) {
            current = owner;
        }
    }

    loop {
        for sibling in siblings(doc, current, |n| n.prev_sibling) {
            let mut subtree = vec![sibling];
            subtree.extend(doc.descendants(sibling));
            result.extend(subtree.into_iter().rev());
        }
        match doc.parent(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    result
}

/// Test a node against a node test. `uri` is the namespace URI bound to the
/// test's prefix for `QName` and `NamespaceWildcard` tests.
pub fn matches_node_test(
    doc: &Document,
    node: NodeId,
    axis: Axis,
    test: &NodeTest,
    uri: Option<&str>,
) -> bool {
    let Some(kind) = doc.kind(node) else {
        return false;
    };
    let principal = if axis == Axis::Attribute {
        NodeKind::Attribute
    } else {
        NodeKind::Element
    };

    match test {
        NodeTest::Node => true,
        NodeTest::Text => matches!(kind, NodeKind::Text | NodeKind::CData),
        NodeTest::Comment => kind == NodeKind::Comment,
        NodeTest::ProcessingInstruction(target) => {
            kind == NodeKind::ProcessingInstruction
                && target.as_deref().is_none_or(|t| doc.name(node) == t)
        }
        NodeTest::Any => kind == principal,
        // Unprefixed names match nodes without a prefix, whatever their
        // default namespace
        NodeTest::Name(name) => {
            kind == principal && doc.prefix(node).is_none() && doc.local_name(node) == name
        }
        NodeTest::QName(_, local) => {
            kind == principal
                && doc.local_name(node) == local
                && doc.namespace_uri(node) == uri
        }
        NodeTest::NamespaceWildcard(_) => kind == principal && doc.namespace_uri(node) == uri,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DOCUMENT_NODE;

    fn names(doc: &Document, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|&id| doc.name(id).to_string()).collect()
    }

    fn sample() -> Document {
        Document::parse("<r><a><a1/><a2/></a><b x=\"1\"><b1/></b><c/></r>").unwrap()
    }

    fn find(doc: &Document, name: &str) -> NodeId {
        doc.descendants(DOCUMENT_NODE)
            .into_iter()
            .find(|&id| doc.name(id) == name)
            .unwrap()
    }

    #[test]
    fn test_child_and_descendant() {
        let doc = sample();
        let r = doc.root_element().unwrap();
        assert_eq!(names(&doc, &navigate(&doc, r, Axis::Child)), vec!["a", "b", "c"]);
        assert_eq!(
            names(&doc, &navigate(&doc, r, Axis::Descendant)),
            vec!["a", "a1", "a2", "b", "b1", "c"]
        );
    }

    #[test]
    fn test_reverse_axes_order() {
        let doc = sample();
        let b1 = find(&doc, "b1");
        assert_eq!(names(&doc, &navigate(&doc, b1, Axis::Ancestor)), vec!["b", "r", ""]);
        assert_eq!(
            names(&doc, &navigate(&doc, b1, Axis::Preceding)),
            vec!["a2", "a1", "a"]
        );
        let c = find(&doc, "c");
        assert_eq!(names(&doc, &navigate(&doc, c, Axis::PrecedingSibling)), vec!["b", "a"]);
    }

    #[test]
    fn test_following() {
        let doc = sample();
        let a1 = find(&doc, "a1");
        assert_eq!(
            names(&doc, &navigate(&doc, a1, Axis::Following)),
            vec!["a2", "b", "b1", "c"]
        );
    }

    #[test]
    fn test_attribute_axis_and_tests() {
        let doc = sample();
        let b = find(&doc, "b");
        let attrs = navigate(&doc, b, Axis::Attribute);
        assert_eq!(attrs.len(), 1);
        let any = NodeTest::Any;
        assert!(matches_node_test(&doc, attrs[0], Axis::Attribute, &any, None));
        assert!(!matches_node_test(&doc, attrs[0], Axis::Child, &any, None));
        assert!(navigate(&doc, b, Axis::Namespace).is_empty());
    }
}
