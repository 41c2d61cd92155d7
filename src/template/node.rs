//! Mutation engine
//!
//! A [`TemplateNode`] pairs a node with the template's query context. Every
//! operation compiles its selector, queries relative to the node and edits
//! the matches in place. Nothing is transactional: when one selector in a
//! batch fails, the earlier ones stay applied.

use super::repeat::{Repeat, Repeater};
use super::QueryContext;
use crate::config::Mode;
use crate::dom::{Document, NodeId, NodeKind, DOCUMENT_NODE};
use crate::error::{Result, TemplateError};
use crate::{normalize, selector, xpath};

/// What a matched node is, for dispatching edits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Element(NodeId),
    Attribute {
        node: NodeId,
        owner: NodeId,
        is_class: bool,
    },
    /// Text, CDATA, comment or processing instruction
    CharacterData(NodeId),
}

impl Target {
    /// `None` for the document node, which is never edited
    pub fn classify(doc: &Document, node: NodeId) -> Option<Self> {
        match doc.kind(node)? {
            NodeKind::Element => Some(Target::Element(node)),
            NodeKind::Attribute => Some(Target::Attribute {
                node,
                owner: doc.parent(node)?,
                is_class: doc.name(node) == "class",
            }),
            NodeKind::Text | NodeKind::CData | NodeKind::Comment | NodeKind::ProcessingInstruction => {
                Some(Target::CharacterData(node))
            }
            NodeKind::Document | NodeKind::Fragment => None,
        }
    }
}

/// Condition for [`TemplateNode::remove_where`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Bool(bool),
    /// Remove only this token when the match is a `class` attribute
    Class(String),
}

impl Condition {
    pub fn is_truthy(&self) -> bool {
        match self {
            Condition::Bool(b) => *b,
            Condition::Class(name) => !name.is_empty(),
        }
    }
}

impl From<bool> for Condition {
    fn from(b: bool) -> Self {
        Condition::Bool(b)
    }
}

impl From<&str> for Condition {
    fn from(name: &str) -> Self {
        Condition::Class(name.to_string())
    }
}

impl From<String> for Condition {
    fn from(name: String) -> Self {
        Condition::Class(name)
    }
}

/// A node of a template together with its query context
pub struct TemplateNode<'t> {
    pub(crate) doc: &'t mut Document,
    pub(crate) context: &'t QueryContext,
    pub(crate) node: NodeId,
}

impl<'t> TemplateNode<'t> {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn document(&self) -> &Document {
        self.doc
    }

    /// Matching nodes in document order
    pub fn query(&self, selector: &str) -> Result<Vec<NodeId>> {
        query(self.doc, self.context, self.node, selector)
    }

    /// `set_value` for every pair, in order
    pub fn set<I, K, V>(&mut self, mapping: I, as_html: bool) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (selector, value) in mapping {
            self.set_value(selector.as_ref(), value.as_ref(), as_html)?;
        }
        Ok(self)
    }

    /// Assign `value` to every match. `class` attributes get the value
    /// appended as tokens; other attributes are overwritten; elements get
    /// their content replaced by text, or by parsed markup with `as_html`.
    pub fn set_value(&mut self, selector: &str, value: &str, as_html: bool) -> Result<&mut Self> {
        for node in self.query(selector)? {
            match Target::classify(self.doc, node) {
                Some(Target::Attribute { node, is_class: true, .. }) => {
                    let merged = append_tokens(self.doc.value(node), value);
                    self.doc.set_value(node, &merged);
                }
                Some(Target::Attribute { node, is_class: false, .. }) => {
                    self.doc.set_value(node, value);
                }
                Some(Target::Element(element)) if as_html => {
                    self.replace_with_markup(element, value)?;
                }
                Some(Target::Element(element)) => {
                    self.doc.clear_children(element);
                    if !value.is_empty() {
                        let text = self.doc.create_text(value);
                        self.doc.append_child(element, text);
                    }
                }
                Some(Target::CharacterData(node)) => self.doc.set_value(node, value),
                None => {}
            }
        }
        Ok(self)
    }

    fn replace_with_markup(&mut self, element: NodeId, markup: &str) -> Result<()> {
        if markup.is_empty() {
            self.doc.clear_children(element);
            return Ok(());
        }
        let markup = match self.context.mode {
            Mode::Loose => normalize::ingest(markup),
            Mode::Strict => markup.to_string(),
        };
        let bindings = self.doc.in_scope_namespaces(element);
        let fragment =
            Document::parse_fragment(&markup, &bindings).map_err(TemplateError::invalid_fragment)?;

        self.doc.clear_children(element);
        for child in fragment.children(DOCUMENT_NODE) {
            if let Some(copy) = self.doc.adopt(&fragment, child) {
                self.doc.append_child(element, copy);
            }
        }
        Ok(())
    }

    /// Add `class` to every matched element, creating the attribute when
    /// missing. Adding a class twice has no further effect.
    pub fn add_class(&mut self, selector: &str, class: &str) -> Result<&mut Self> {
        for node in self.query(selector)? {
            let attribute = match Target::classify(self.doc, node) {
                Some(Target::Element(element)) => match self.doc.attribute(element, "class") {
                    Some(attribute) => attribute,
                    None => {
                        let tokens = append_tokens("", class);
                        self.doc.set_attribute(element, "class", &tokens);
                        continue;
                    }
                },
                Some(Target::Attribute { node, is_class: true, .. }) => node,
                _ => continue,
            };
            let merged = append_tokens(self.doc.value(attribute), class);
            self.doc.set_value(attribute, &merged);
        }
        Ok(self)
    }

    /// Remove every match
    pub fn remove(&mut self, selector: &str) -> Result<&mut Self> {
        self.remove_where([(selector, true)])
    }

    /// Remove matches for each selector whose condition is truthy. A class
    /// name condition on a `class` attribute match removes just that token,
    /// and the attribute once it is empty. Falsy conditions are skipped
    /// without running the query.
    pub fn remove_where<I, K, C>(&mut self, mapping: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, C)>,
        K: AsRef<str>,
        C: Into<Condition>,
    {
        for (selector, condition) in mapping {
            let condition = condition.into();
            if !condition.is_truthy() {
                continue;
            }
            for node in self.query(selector.as_ref())? {
                match (Target::classify(self.doc, node), &condition) {
                    (Some(Target::Attribute { node, owner, is_class: true }), Condition::Class(name)) => {
                        let remaining = remove_token(self.doc.value(node), name);
                        if remaining.is_empty() {
                            self.doc.remove_attribute(owner, "class");
                        } else {
                            self.doc.set_value(node, &remaining);
                        }
                    }
                    (Some(_), _) => self.doc.detach(node),
                    (None, _) => {}
                }
            }
        }
        Ok(self)
    }

    /// One repeater per matched element, in document order
    pub fn repeat(self, selector: &str) -> Result<Repeat<'t>> {
        let matches = self.query(selector)?;
        let mut repeaters = Vec::with_capacity(matches.len());
        for node in matches {
            if !matches!(Target::classify(self.doc, node), Some(Target::Element(_))) {
                tracing::debug!(selector, node, "repeat skips non-element match");
                continue;
            }
            if let Some(repeater) = Repeater::new(self.doc, node) {
                repeaters.push(repeater);
            }
        }
        Ok(Repeat::new(self.doc, self.context, repeaters))
    }
}

/// Compile `selector` and run it relative to `node`
pub(crate) fn query(
    doc: &Document,
    context: &QueryContext,
    node: NodeId,
    selector: &str,
) -> Result<Vec<NodeId>> {
    let query = selector::compile(selector);
    xpath::select_nodes(doc, node, &query, &context.namespaces)
        .map_err(|message| TemplateError::invalid_selector(selector, query, message))
}

/// Append the whitespace-separated tokens of `added` that `existing` lacks
pub fn append_tokens(existing: &str, added: &str) -> String {
    let mut tokens: Vec<&str> = existing.split_whitespace().collect();
    for token in added.split_whitespace() {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens.join(" ")
}

fn remove_token(existing: &str, removed: &str) -> String {
    existing
        .split_whitespace()
        .filter(|token| *token != removed)
        .collect::<Vec<_>>()
        .join(" ")
}
