//! Namespace Resolution
//!
//! Stack-based namespace resolver used while building a document. Prefix id
//! 0 stands for the default namespace; a binding to URI id 0 undeclares it.

use super::strings::StringPool;

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

/// Namespace binding (prefix -> URI)
#[derive(Debug, Clone)]
struct NsBinding {
    prefix_id: u32,
    uri_id: u32,
    depth: u16,
}

/// Stack-based namespace resolver
#[derive(Debug)]
pub struct NamespaceResolver {
    bindings: Vec<NsBinding>,
    depth: u16,
    xml_prefix_id: u32,
    xmlns_prefix_id: u32,
}

impl NamespaceResolver {
    /// Create a resolver with the `xml` and `xmlns` prefixes pre-bound
    pub fn new(strings: &mut StringPool) -> Self {
        let xml_prefix_id = strings.intern("xml");
        let xmlns_prefix_id = strings.intern("xmlns");
        let xml_uri_id = strings.intern(ns::XML);
        let xmlns_uri_id = strings.intern(ns::XMLNS);

        NamespaceResolver {
            bindings: vec![
                NsBinding {
                    prefix_id: xml_prefix_id,
                    uri_id: xml_uri_id,
                    depth: 0,
                },
                NsBinding {
                    prefix_id: xmlns_prefix_id,
                    uri_id: xmlns_uri_id,
                    depth: 0,
                },
            ],
            depth: 0,
            xml_prefix_id,
            xmlns_prefix_id,
        }
    }

    /// Create a resolver seeded with outer bindings, e.g. the in-scope
    /// namespaces of the element a fragment will be inserted into. An empty
    /// prefix seeds the default namespace.
    pub fn with_bindings(strings: &mut StringPool, bindings: &[(String, String)]) -> Self {
        let mut resolver = Self::new(strings);
        for (prefix, uri) in bindings {
            let prefix_id = strings.intern(prefix);
            let uri_id = strings.intern(uri);
            resolver.declare(prefix_id, uri_id);
        }
        resolver
    }

    /// Enter a new element scope
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave an element scope, removing any bindings declared in it
    pub fn pop_scope(&mut self) {
        while let Some(binding) = self.bindings.last() {
            if binding.depth < self.depth {
                break;
            }
            self.bindings.pop();
        }
        self.depth = self.depth.saturating_sub(1);
    }

    /// Declare a namespace binding for the current scope. Redeclaring `xml`
    /// or `xmlns` is ignored.
    pub fn declare(&mut self, prefix_id: u32, uri_id: u32) {
        if self.is_reserved(prefix_id) {
            return;
        }
        self.bindings.push(NsBinding {
            prefix_id,
            uri_id,
            depth: self.depth,
        });
    }

    /// Whether a prefix is one of the pre-bound reserved prefixes
    pub fn is_reserved(&self, prefix_id: u32) -> bool {
        prefix_id == self.xml_prefix_id || prefix_id == self.xmlns_prefix_id
    }

    /// Resolve a prefix to a namespace URI id (most recent binding wins)
    pub fn resolve(&self, prefix_id: u32) -> Option<u32> {
        self.bindings
            .iter()
            .rev()
            .find(|b| b.prefix_id == prefix_id)
            .map(|b| b.uri_id)
    }

    /// Resolve the default namespace, 0 when none is in scope
    pub fn resolve_default(&self) -> u32 {
        self.resolve(0).unwrap_or(0)
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_namespaces() {
        let mut strings = StringPool::new();
        let resolver = NamespaceResolver::new(&mut strings);
        let xml_id = strings.intern("xml");
        assert_eq!(resolver.resolve(xml_id), strings.lookup(ns::XML));
        assert_eq!(resolver.resolve_default(), 0);
    }

    #[test]
    fn test_scope_pop() {
        let mut strings = StringPool::new();
        let mut resolver = NamespaceResolver::new(&mut strings);
        let prefix = strings.intern("foo");
        let uri = strings.intern("http://example.com/foo");

        resolver.push_scope();
        resolver.declare(prefix, uri);
        assert_eq!(resolver.resolve(prefix), Some(uri));

        resolver.pop_scope();
        assert_eq!(resolver.resolve(prefix), None);
    }

    #[test]
    fn test_shadow_binding() {
        let mut strings = StringPool::new();
        let mut resolver = NamespaceResolver::new(&mut strings);
        let prefix = strings.intern("ns");
        let uri1 = strings.intern("http://example.com/ns1");
        let uri2 = strings.intern("http://example.com/ns2");

        resolver.push_scope();
        resolver.declare(prefix, uri1);
        resolver.push_scope();
        resolver.declare(prefix, uri2);
        assert_eq!(resolver.resolve(prefix), Some(uri2));

        resolver.pop_scope();
        assert_eq!(resolver.resolve(prefix), Some(uri1));
    }

    #[test]
    fn test_seeded_bindings() {
        let mut strings = StringPool::new();
        let bindings = vec![
            ("svg".to_string(), "http://www.w3.org/2000/svg".to_string()),
            (String::new(), "urn:default".to_string()),
        ];
        let resolver = NamespaceResolver::with_bindings(&mut strings, &bindings);
        let svg = strings.intern("svg");
        assert_eq!(resolver.resolve(svg), strings.lookup("http://www.w3.org/2000/svg"));
        assert_eq!(Some(resolver.resolve_default()), strings.lookup("urn:default"));
    }
}
