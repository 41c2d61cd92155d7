//! SIMD-accelerated markup scanning using memchr
//!
//! Shared by the XML tokenizer and the markup normalizer. Positions are byte
//! offsets into the input; every delimiter searched for is ASCII, so offsets
//! returned here always sit on UTF-8 character boundaries.

use memchr::{memchr, memmem};

/// Cursor over a byte slice with memchr-backed delimiter search
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        &self.input[start..end]
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Skip whitespace characters (space, tab, newline, carriage return)
    #[inline]
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if !is_whitespace(b) {
                break;
            }
            self.pos += 1;
        }
    }

    /// Find next '<' (tag start)
    #[inline]
    pub fn find_tag_start(&self) -> Option<usize> {
        memchr(b'<', self.remaining()).map(|i| self.pos + i)
    }

    /// Find the '>' closing the tag at the current position, skipping quoted
    /// attribute values
    pub fn find_tag_end_quoted(&self) -> Option<usize> {
        let mut pos = self.pos;
        while pos < self.input.len() {
            match self.input[pos] {
                quote @ (b'"' | b'\'') => {
                    let close = memchr(quote, &self.input[pos + 1..])?;
                    pos += close + 2;
                }
                b'>' => return Some(pos),
                _ => pos += 1,
            }
        }
        None
    }

    /// Find next occurrence of a byte sequence
    #[inline]
    pub fn find_seq(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(self.remaining(), needle).map(|i| self.pos + i)
    }

    #[inline]
    pub fn starts_with(&self, needle: &[u8]) -> bool {
        self.remaining().starts_with(needle)
    }

    /// Case-insensitive ASCII prefix test
    #[inline]
    pub fn starts_with_ignore_case(&self, needle: &[u8]) -> bool {
        let rest = self.remaining();
        rest.len() >= needle.len() && rest[..needle.len()].eq_ignore_ascii_case(needle)
    }

    /// Read an XML name (letters, digits, '_', '-', '.', ':' and any non-ASCII)
    pub fn read_name(&mut self) -> Option<&'a [u8]> {
        let start = self.pos;
        if !self.peek().is_some_and(is_name_start_char) {
            return None;
        }
        self.pos += 1;
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        Some(&self.input[start..self.pos])
    }
}

#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Valid XML name start byte: ASCII letters, underscore, colon, and any
/// non-ASCII (UTF-8 lead or continuation) byte
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

#[inline]
pub fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_tag_start() {
        let scanner = Scanner::new(b"hello <world>");
        assert_eq!(scanner.find_tag_start(), Some(6));
    }

    #[test]
    fn test_find_tag_end_quoted() {
        let scanner = Scanner::new(b"<a attr=\">test\" b='>'>content");
        assert_eq!(scanner.find_tag_end_quoted(), Some(21));
    }

    #[test]
    fn test_unterminated_quote() {
        let scanner = Scanner::new(b"<a attr=\">test");
        assert_eq!(scanner.find_tag_end_quoted(), None);
    }

    #[test]
    fn test_read_name() {
        let mut scanner = Scanner::new(b"svg:rect-1>");
        assert_eq!(scanner.read_name(), Some(b"svg:rect-1" as &[u8]));
        assert_eq!(scanner.position(), 10);
    }

    #[test]
    fn test_case_insensitive_prefix() {
        let scanner = Scanner::new(b"</SCRIPT>");
        assert!(scanner.starts_with_ignore_case(b"</script"));
    }
}
