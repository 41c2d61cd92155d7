//! Selector shorthand compiler
//!
//! Compiles the compact selector syntax into XPath:
//!
//! ```text
//! [element[[index]]] [("#"|".") name] ["@" attr ["=" quoted-value]] ["/" rest]
//! ```
//!
//! | Shorthand        | XPath                                                          |
//! |------------------|----------------------------------------------------------------|
//! | `li`             | `descendant::li`                                               |
//! | `li[2]`          | `descendant::li[2]`                                            |
//! | `#main`          | `descendant::*[@id='main']`                                    |
//! | `.item`          | `descendant::*[contains(concat(' ', normalize-space(@class), ' '), ' item ')]` |
//! | `a@href`         | `descendant::a/@href`                                          |
//! | `a@rel="next"`   | `descendant::a[@rel="next"]`                                   |
//! | `ul/li`          | `descendant::ul/li`                                            |
//!
//! Alternatives are separated by `", "` and joined with `|`. Anything that is
//! not shorthand (`.`, `./@title`, `text()`, `//ul/li[last()]`) is returned
//! unchanged, so raw XPath can be passed straight through.

use crate::core::scanner::{is_name_char, is_name_start_char, Scanner};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{LazyLock, Mutex};

/// Compiled selectors kept per process
const CACHE_CAPACITY: usize = 512;

/// Prefix making top-level queries relative to the context node. The
/// context node itself never matches.
const RELATIVE_PREFIX: &str = "descendant::";

static SELECTORS: LazyLock<SelectorCache> = LazyLock::new(|| SelectorCache::new(CACHE_CAPACITY));

/// Compile a selector through the process-wide cache
pub fn compile(selector: &str) -> String {
    SELECTORS.compile(selector)
}

/// Read-through cache of compiled selectors
pub struct SelectorCache {
    entries: Mutex<LruCache<String, String>>,
    parses: AtomicUsize,
}

impl SelectorCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        SelectorCache {
            entries: Mutex::new(LruCache::new(capacity)),
            parses: AtomicUsize::new(0),
        }
    }

    pub fn compile(&self, selector: &str) -> String {
        if let Some(hit) = self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(selector)
        {
            return hit.clone();
        }

        tracing::trace!(selector, "compiling selector");
        self.parses.fetch_add(1, Ordering::Relaxed);
        let query = compile_uncached(selector);
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .put(selector.to_string(), query.clone());
        query
    }

    /// Number of selectors compiled from scratch
    pub fn parse_count(&self) -> usize {
        self.parses.load(Ordering::Relaxed)
    }
}

/// Compile without caching
pub fn compile_uncached(selector: &str) -> String {
    selector
        .split(", ")
        .map(|alternative| compile_alternative(alternative, true))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn compile_alternative(selector: &str, top_level: bool) -> String {
    match Shorthand::parse(selector) {
        Some(shorthand) => shorthand.to_xpath(top_level),
        None => {
            tracing::debug!(selector, "not shorthand, using as xpath");
            selector.to_string()
        }
    }
}

#[derive(Debug, Default, PartialEq)]
struct Shorthand<'a> {
    element: Option<&'a str>,
    index: Option<&'a str>,
    id: Option<&'a str>,
    class: Option<&'a str>,
    attribute: Option<&'a str>,
    /// Attribute value including its quotes
    value: Option<&'a str>,
    rest: Option<&'a str>,
}

impl<'a> Shorthand<'a> {
    /// Parse one alternative. Returns `None` unless the whole input matches
    /// and at least one of element, id, class or attribute is present.
    fn parse(input: &'a str) -> Option<Self> {
        let mut s = Scanner::new(input.as_bytes());
        let mut shorthand = Shorthand::default();

        if s.peek() == Some(b'*') {
            s.advance(1);
            shorthand.element = Some("*");
        } else {
            shorthand.element = take_name(&mut s, |b| is_name_char(b) && b != b'.');
        }
        if shorthand.element.is_some() && s.peek() == Some(b'[') {
            s.advance(1);
            shorthand.index = Some(take(&mut s, |b| b.is_ascii_digit())?);
            expect(&mut s, b']')?;
        }

        match s.peek() {
            Some(b'#') => {
                s.advance(1);
                shorthand.id = Some(take(&mut s, |b| is_name_char(b) && b != b'.')?);
            }
            Some(b'.') => {
                s.advance(1);
                shorthand.class = Some(take(&mut s, |b| is_name_char(b) && b != b'.')?);
            }
            _ => {}
        }

        if s.peek() == Some(b'@') {
            s.advance(1);
            shorthand.attribute = Some(take_name(&mut s, is_name_char)?);
            if s.peek() == Some(b'=') {
                s.advance(1);
                let quote = s.peek().filter(|&q| q == b'"' || q == b'\'')?;
                let start = s.position();
                s.advance(1);
                take(&mut s, |b| b != quote);
                expect(&mut s, quote)?;
                shorthand.value = Some(&input[start..s.position()]);
            }
        }

        let has_head = shorthand.element.is_some()
            || shorthand.id.is_some()
            || shorthand.class.is_some()
            || shorthand.attribute.is_some();
        if !has_head {
            return None;
        }

        if s.peek() == Some(b'/') {
            s.advance(1);
            let rest = &input[s.position()..];
            if rest.is_empty() {
                return None;
            }
            shorthand.rest = Some(rest);
        } else if !s.is_eof() {
            return None;
        }
        Some(shorthand)
    }

    fn to_xpath(&self, top_level: bool) -> String {
        let mut out = String::new();
        if top_level {
            out.push_str(RELATIVE_PREFIX);
        }
        out.push_str(self.element.unwrap_or("*"));
        if let Some(index) = self.index {
            out.push('[');
            out.push_str(index);
            out.push(']');
        }
        if let Some(id) = self.id {
            out.push_str("[@id='");
            out.push_str(id);
            out.push_str("']");
        }
        if let Some(class) = self.class {
            out.push_str("[contains(concat(' ', normalize-space(@class), ' '), ' ");
            out.push_str(class);
            out.push_str(" ')]");
        }
        if let Some(attribute) = self.attribute {
            match self.value {
                Some(value) => {
                    out.push_str("[@");
                    out.push_str(attribute);
                    out.push('=');
                    out.push_str(value);
                    out.push(']');
                }
                None => {
                    out.push_str("/@");
                    out.push_str(attribute);
                }
            }
        }
        if let Some(rest) = self.rest {
            out.push('/');
            out.push_str(&compile_alternative(rest, false));
        }
        out
    }
}

/// Read a name starting with a name-start byte
fn take_name<'a>(s: &mut Scanner<'a>, continues: impl Fn(u8) -> bool) -> Option<&'a str> {
    if !s.peek().is_some_and(is_name_start_char) {
        return None;
    }
    take(s, continues)
}

/// Read a non-empty run of matching bytes
fn take<'a>(s: &mut Scanner<'a>, matches: impl Fn(u8) -> bool) -> Option<&'a str> {
    let start = s.position();
    while s.peek().is_some_and(&matches) {
        s.advance(1);
    }
    if s.position() == start {
        return None;
    }
    std::str::from_utf8(s.slice(start, s.position())).ok()
}

fn expect(s: &mut Scanner<'_>, byte: u8) -> Option<()> {
    if s.peek() == Some(byte) {
        s.advance(1);
        Some(())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_and_index() {
        assert_eq!(compile_uncached("li"), "descendant::li");
        assert_eq!(compile_uncached("li[2]"), "descendant::li[2]");
        assert_eq!(compile_uncached("*"), "descendant::*");
        assert_eq!(compile_uncached("svg:rect"), "descendant::svg:rect");
    }

    #[test]
    fn test_id_and_class() {
        assert_eq!(compile_uncached("#main"), "descendant::*[@id='main']");
        assert_eq!(
            compile_uncached("li.item"),
            "descendant::li[contains(concat(' ', normalize-space(@class), ' '), ' item ')]"
        );
    }

    #[test]
    fn test_attributes() {
        assert_eq!(compile_uncached("a@href"), "descendant::a/@href");
        assert_eq!(compile_uncached("@title"), "descendant::*/@title");
        assert_eq!(
            compile_uncached("a@rel=\"next\""),
            "descendant::a[@rel=\"next\"]"
        );
        assert_eq!(
            compile_uncached("#nav@data-x='a b'"),
            "descendant::*[@id='nav'][@data-x='a b']"
        );
    }

    #[test]
    fn test_nested_rest_is_not_prefixed() {
        assert_eq!(compile_uncached("ul/li"), "descendant::ul/li");
        assert_eq!(
            compile_uncached("#menu/li.active@class"),
            "descendant::*[@id='menu']/li[contains(concat(' ', normalize-space(@class), ' '), ' active ')]/@class"
        );
        assert_eq!(
            compile_uncached("ul/li[last()]"),
            "descendant::ul/li[last()]"
        );
    }

    #[test]
    fn test_alternatives() {
        assert_eq!(
            compile_uncached("h1, #title"),
            "descendant::h1 | descendant::*[@id='title']"
        );
    }

    #[test]
    fn test_raw_xpath_passes_through() {
        for raw in [".", "..", "./@title", "text()", "//ul/li[last()]", "", "a b", "li[x]", "ul/"] {
            assert_eq!(compile_uncached(raw), raw);
        }
    }

    #[test]
    fn test_cache_counts_parses() {
        let cache = SelectorCache::new(8);
        let first = cache.compile(".item");
        assert_eq!(cache.parse_count(), 1);
        let second = cache.compile(".item");
        assert_eq!(first, second);
        assert_eq!(cache.parse_count(), 1);
        cache.compile("#other");
        assert_eq!(cache.parse_count(), 2);
    }
}
