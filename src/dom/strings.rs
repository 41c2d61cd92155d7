//! String Interning Pool
//!
//! Deduplicated storage for element names, attribute names, prefixes and
//! namespace URIs. Ids are stable for the life of the pool; id 0 is the empty
//! string.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct StringPool {
    /// Strings indexed by id
    entries: Vec<Box<str>>,
    /// Content -> id
    index: HashMap<Box<str>, u32>,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    pub fn new() -> Self {
        let mut pool = StringPool {
            entries: Vec::with_capacity(64),
            index: HashMap::with_capacity(64),
        };
        // Entry 0 is reserved for "no string"
        pool.entries.push("".into());
        pool
    }

    /// Intern a string, returning its id
    pub fn intern(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }
        if let Some(&id) = self.index.get(s) {
            return id;
        }
        let id = self.entries.len() as u32;
        self.entries.push(s.into());
        self.index.insert(s.into(), id);
        id
    }

    /// Id of an already interned string
    pub fn lookup(&self, s: &str) -> Option<u32> {
        if s.is_empty() {
            return Some(0);
        }
        self.index.get(s).copied()
    }

    /// Resolve an id; unknown ids resolve to the empty string
    #[inline]
    pub fn get(&self, id: u32) -> &str {
        self.entries.get(id as usize).map_or("", |s| s)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedup() {
        let mut pool = StringPool::new();
        let a = pool.intern("div");
        let b = pool.intern("div");
        let c = pool.intern("span");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(pool.get(c), "span");
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_empty_is_zero() {
        let mut pool = StringPool::new();
        assert_eq!(pool.intern(""), 0);
        assert_eq!(pool.get(0), "");
        assert_eq!(pool.lookup("missing"), None);
        assert!(pool.is_empty());
    }
}
