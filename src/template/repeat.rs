//! Repeaters
//!
//! A repeater renders copies of one element in place. The matched element
//! itself is the first live copy; `next()` commits the live copy after the
//! last committed one and primes a fresh clone of the pristine snapshot
//! taken at construction. Uncommitted clones stay detached and never render.

use super::node::{self, Condition, TemplateNode};
use super::QueryContext;
use crate::dom::{Document, NodeId};
use crate::error::Result;

/// Repeat state of one matched element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repeater {
    /// Copy being filled in, detached except before the first commit
    live: NodeId,
    /// Snapshot of the matched element, never edited
    template: NodeId,
    /// Most recently committed copy
    anchor: NodeId,
}

impl Repeater {
    /// `None` when the node cannot be cloned
    pub(crate) fn new(doc: &mut Document, matched: NodeId) -> Option<Self> {
        let template = doc.deep_clone(matched)?;
        Some(Repeater {
            live: matched,
            template,
            anchor: matched,
        })
    }

    pub fn live(&self) -> NodeId {
        self.live
    }

    pub fn template(&self) -> NodeId {
        self.template
    }

    pub fn anchor(&self) -> NodeId {
        self.anchor
    }

    /// Commit the live copy after the anchor and prime a new one
    pub(crate) fn advance(&mut self, doc: &mut Document) {
        match doc.parent(self.anchor) {
            Some(parent) if self.live != self.anchor => {
                match doc.node(self.anchor).and_then(|n| n.next_sibling) {
                    Some(next) => doc.insert_before(parent, self.live, next),
                    None => doc.append_child(parent, self.live),
                }
                self.anchor = self.live;
            }
            Some(_) => {}
            None => {
                tracing::debug!(anchor = self.anchor, "anchor detached, dropping live copy");
            }
        }
        if let Some(copy) = doc.deep_clone(self.template) {
            self.live = copy;
        }
    }
}

/// Fans every operation out to the repeaters of one `repeat()` call, in
/// document order of their matched elements
pub struct Repeat<'t> {
    doc: &'t mut Document,
    context: &'t QueryContext,
    repeaters: Vec<Repeater>,
}

impl<'t> Repeat<'t> {
    pub(crate) fn new(
        doc: &'t mut Document,
        context: &'t QueryContext,
        repeaters: Vec<Repeater>,
    ) -> Self {
        Repeat {
            doc,
            context,
            repeaters,
        }
    }

    pub fn len(&self) -> usize {
        self.repeaters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repeaters.is_empty()
    }

    pub fn repeaters(&self) -> &[Repeater] {
        &self.repeaters
    }

    /// Release the template, keeping the repeat state for
    /// [`Template::resume`](super::Template::resume)
    pub fn into_repeaters(self) -> Vec<Repeater> {
        self.repeaters
    }

    /// Matches under each live copy, one list per repeater
    pub fn query(&self, selector: &str) -> Result<Vec<Vec<NodeId>>> {
        self.repeaters
            .iter()
            .map(|repeater| node::query(self.doc, self.context, repeater.live, selector))
            .collect()
    }

    /// Repeat elements inside the live copies. The nested handle commits
    /// into the current copies; call it again after `next()` to fill the
    /// fresh ones.
    pub fn repeat(&mut self, selector: &str) -> Result<Repeat<'_>> {
        let mut nested = Vec::new();
        for repeater in &self.repeaters {
            let scope = TemplateNode {
                doc: &mut *self.doc,
                context: self.context,
                node: repeater.live,
            };
            nested.extend(scope.repeat(selector)?.into_repeaters());
        }
        Ok(Repeat::new(&mut *self.doc, self.context, nested))
    }

    fn each(&mut self, mut op: impl FnMut(&mut TemplateNode<'_>) -> Result<()>) -> Result<&mut Self> {
        for repeater in &self.repeaters {
            let mut node = TemplateNode {
                doc: &mut *self.doc,
                context: self.context,
                node: repeater.live,
            };
            op(&mut node)?;
        }
        Ok(self)
    }

    pub fn set<I, K, V>(&mut self, mapping: I, as_html: bool) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mapping: Vec<(K, V)> = mapping.into_iter().collect();
        self.each(|node| {
            for (selector, value) in &mapping {
                node.set_value(selector.as_ref(), value.as_ref(), as_html)?;
            }
            Ok(())
        })
    }

    pub fn set_value(&mut self, selector: &str, value: &str, as_html: bool) -> Result<&mut Self> {
        self.each(|node| node.set_value(selector, value, as_html).map(drop))
    }

    pub fn add_class(&mut self, selector: &str, class: &str) -> Result<&mut Self> {
        self.each(|node| node.add_class(selector, class).map(drop))
    }

    pub fn remove(&mut self, selector: &str) -> Result<&mut Self> {
        self.each(|node| node.remove(selector).map(drop))
    }

    pub fn remove_where<I, K, C>(&mut self, mapping: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, C)>,
        K: AsRef<str>,
        C: Into<Condition>,
    {
        let mapping: Vec<(K, Condition)> = mapping
            .into_iter()
            .map(|(selector, condition)| (selector, condition.into()))
            .collect();
        self.each(|node| {
            node.remove_where(mapping.iter().map(|(s, c)| (s.as_ref(), c.clone())))
                .map(drop)
        })
    }

    /// Commit every live copy and prime the next ones
    pub fn next(&mut self) -> &mut Self {
        for repeater in &mut self.repeaters {
            repeater.advance(self.doc);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::Template;

    #[test]
    fn test_repeat_end_to_end() {
        let mut t = Template::parse("<ul><li class=\"item\">x</li></ul>").unwrap();
        let mut items = t.repeat(".item").unwrap();
        for value in ["A", "B", "C"] {
            items.set_value(".", value, false).unwrap().next();
        }
        assert_eq!(
            t.render(),
            "<ul><li class=\"item\">A</li><li class=\"item\">B</li><li class=\"item\">C</li></ul>"
        );
    }

    #[test]
    fn test_repeat_keeps_trailing_siblings() {
        let mut t = Template::parse("<ul><li>head</li><li class=\"row\"/><li>tail</li></ul>")
            .unwrap();
        let mut rows = t.repeat("li.row").unwrap();
        for value in ["1", "2"] {
            rows.set_value(".", value, false).unwrap().next();
        }
        assert_eq!(
            t.render(),
            "<ul><li>head</li><li class=\"row\">1</li><li class=\"row\">2</li><li>tail</li></ul>"
        );
    }

    #[test]
    fn test_template_snapshot_is_untouched() {
        let mut t = Template::parse("<ul><li><a href=\"#\">x</a></li></ul>").unwrap();
        let mut rows = t.repeat("li").unwrap();
        rows.set_value("a@href", "/one", false).unwrap();
        rows.add_class(".", "first").unwrap().next();
        rows.set_value("a", "two", false).unwrap().next();
        assert_eq!(
            t.render(),
            "<ul><li class=\"first\"><a href=\"/one\">x</a></li><li><a href=\"#\">two</a></li></ul>"
        );
    }

    #[test]
    fn test_repeat_fans_out_to_every_match() {
        let mut t = Template::parse(
            "<div><ul class=\"nav\"><li>x</li></ul><ul class=\"nav\"><li>x</li></ul></div>",
        )
        .unwrap();
        let mut items = t.repeat(".nav/li").unwrap();
        assert_eq!(items.len(), 2);
        for value in ["a", "b"] {
            items.set_value(".", value, false).unwrap().next();
        }
        assert_eq!(
            t.render(),
            "<div><ul class=\"nav\"><li>a</li><li>b</li></ul><ul class=\"nav\"><li>a</li><li>b</li></ul></div>"
        );
    }

    #[test]
    fn test_no_commit_leaves_matched_node_in_place() {
        let mut t = Template::parse("<ul><li>x</li></ul>").unwrap();
        t.repeat("li").unwrap().set_value(".", "only", false).unwrap();
        assert_eq!(t.render(), "<ul><li>only</li></ul>");
    }

    #[test]
    fn test_repeat_skips_non_elements() {
        let mut t = Template::parse("<p title=\"t\">x</p>").unwrap();
        let rows = t.repeat("p@title").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_detached_anchor_drops_copy() {
        let mut t = Template::parse("<ul><li>x</li><li>y</li></ul>").unwrap();
        let mut rows = t.repeat("li[1]").unwrap();
        rows.remove(".").unwrap().next();
        rows.set_value(".", "z", false).unwrap().next();
        assert_eq!(t.render(), "<ul><li>y</li></ul>");
    }

    #[test]
    fn test_scoped_selectors_skip_the_live_copy() {
        let mut t = Template::parse("<ul><li><ul><li>sub</li></ul></li></ul>").unwrap();
        let mut rows = t.repeat("ul/li").unwrap();
        assert_eq!(rows.len(), 2);
        rows.set_value("li", "X", false).unwrap().next();
        assert_eq!(t.render(), "<ul><li><ul><li>X</li></ul></li></ul>");
    }

    #[test]
    fn test_query_per_live_copy() {
        let mut t = Template::parse(
            "<div><p class=\"a\"><b>1</b><b>2</b></p><p class=\"a\"><b>3</b></p></div>",
        )
        .unwrap();
        let rows = t.repeat("p.a").unwrap();
        let counts: Vec<usize> = rows.query("b").unwrap().iter().map(Vec::len).collect();
        assert_eq!(counts, vec![2, 1]);
        assert!(rows.query("b[").is_err());
    }

    #[test]
    fn test_nested_repeat() {
        let mut t = Template::parse(
            "<table><tr class=\"row\"><th></th><td class=\"cell\"></td></tr></table>",
        )
        .unwrap();
        let mut rows = t.repeat(".row").unwrap();
        for (name, cells) in [("a", vec!["1", "2"]), ("b", vec!["3"])] {
            rows.set_value("th", name, false).unwrap();
            let mut row_cells = rows.repeat(".cell").unwrap();
            for cell in cells {
                row_cells.set_value(".", cell, false).unwrap().next();
            }
            rows.next();
        }
        assert_eq!(
            t.render(),
            "<table>\
             <tr class=\"row\"><th>a</th><td class=\"cell\">1</td><td class=\"cell\">2</td></tr>\
             <tr class=\"row\"><th>b</th><td class=\"cell\">3</td></tr>\
             </table>"
        );
    }

    #[test]
    fn test_repeat_root_element() {
        let mut t = Template::parse("<li>x</li>").unwrap();
        let mut items = t.repeat("li").unwrap();
        for value in ["A", "B"] {
            items.set_value(".", value, false).unwrap().next();
        }
        assert_eq!(t.render(), "<li>A</li><li>B</li>");
    }

    #[test]
    fn test_resume() {
        let mut t = Template::parse("<ul><li>x</li></ul>").unwrap();
        let mut rows = t.repeat("li").unwrap();
        rows.set_value(".", "1", false).unwrap().next();
        let parked = rows.into_repeaters();

        t.add_class("ul", "list").unwrap();
        let mut rows = t.resume(parked);
        rows.set_value(".", "2", false).unwrap().next();
        assert_eq!(t.render(), "<ul class=\"list\"><li>1</li><li>2</li></ul>");
    }
}
