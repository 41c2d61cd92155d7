//! XML Attribute Parsing
//!
//! Parses the attribute list of a start tag. Values must be quoted; entity
//! and character references inside values are decoded.

use super::entities::decode_text;
use super::scanner::{is_name_char, is_name_start_char, is_whitespace};
use super::tokenizer::ParseError;
use memchr::memchr;
use std::borrow::Cow;

/// A parsed XML attribute
#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    /// Attribute name (may include namespace prefix)
    pub name: &'a str,
    /// Attribute value (references decoded)
    pub value: Cow<'a, str>,
}

impl<'a> Attribute<'a> {
    /// Namespace prefix (before colon), if any
    pub fn prefix(&self) -> Option<&'a str> {
        split_name(self.name).0
    }

    /// Local name (after colon)
    pub fn local_name(&self) -> &'a str {
        split_name(self.name).1
    }

    /// Whether this attribute declares a namespace (`xmlns` or `xmlns:p`)
    pub fn is_namespace_declaration(&self) -> bool {
        self.name == "xmlns" || self.name.starts_with("xmlns:")
    }
}

/// Split a qualified name into prefix and local name at the colon
pub fn split_name(name: &str) -> (Option<&str>, &str) {
    match memchr(b':', name.as_bytes()) {
        Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
        None => (None, name),
    }
}

/// Parse attributes from raw tag content (between the element name and the
/// closing `>` or `/>`). `offset` is the byte position of `input` in the
/// source, used for error positions.
pub fn parse_attributes(input: &str, offset: usize) -> Result<Vec<Attribute<'_>>, ParseError> {
    let bytes = input.as_bytes();
    let mut attrs: Vec<Attribute<'_>> = Vec::new();
    let mut pos = 0;

    loop {
        let before_ws = pos;
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }
        if pos == before_ws && !attrs.is_empty() {
            return Err(ParseError::new("Attributes must be separated by whitespace", offset + pos));
        }

        let name_start = pos;
        if !is_name_start_char(bytes[pos]) {
            return Err(ParseError::new(
                "Attribute name must start with letter, underscore, or colon",
                offset + pos,
            ));
        }
        while pos < bytes.len() && is_name_char(bytes[pos]) {
            pos += 1;
        }
        let name = &input[name_start..pos];

        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }
        if bytes.get(pos) != Some(&b'=') {
            return Err(ParseError::new(
                format!("Attribute value required for '{}'", name),
                offset + name_start,
            ));
        }
        pos += 1;
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }

        let quote = match bytes.get(pos) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => {
                return Err(ParseError::new(
                    format!("Attribute value for '{}' must be quoted", name),
                    offset + pos,
                ))
            }
        };
        let value_start = pos + 1;
        let value_end = memchr(quote, &bytes[value_start..])
            .map(|n| value_start + n)
            .ok_or_else(|| ParseError::new("Unterminated attribute value", offset + pos))?;
        let raw = &input[value_start..value_end];

        if memchr(b'<', raw.as_bytes()).is_some() {
            return Err(ParseError::new(
                "'<' not allowed in attribute value",
                offset + value_start,
            ));
        }
        let value = decode_text(raw).map_err(|msg| ParseError::new(msg, offset + value_start))?;

        if attrs.iter().any(|a| a.name == name) {
            return Err(ParseError::new(
                format!("Duplicate attribute: {}", name),
                offset + name_start,
            ));
        }
        attrs.push(Attribute { name, value });
        pos = value_end + 1;
    }

    Ok(attrs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let attrs = parse_attributes(r#" id="main" class='a b'"#, 0).unwrap();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].name, "id");
        assert_eq!(attrs[0].value, "main");
        assert_eq!(attrs[1].value, "a b");
    }

    #[test]
    fn test_decodes_references() {
        let attrs = parse_attributes(r#" href="?a=1&amp;b=&quot;2&quot;""#, 0).unwrap();
        assert_eq!(attrs[0].value, "?a=1&b=\"2\"");
    }

    #[test]
    fn test_namespaced() {
        let attrs = parse_attributes(r##" xlink:href="#x" xmlns:xlink="urn:x""##, 0).unwrap();
        assert_eq!(attrs[0].prefix(), Some("xlink"));
        assert_eq!(attrs[0].local_name(), "href");
        assert!(attrs[1].is_namespace_declaration());
    }

    #[test]
    fn test_rejects_bare_attribute() {
        let err = parse_attributes(" disabled", 10).unwrap_err();
        assert_eq!(err.position, 11);
    }

    #[test]
    fn test_rejects_unquoted_and_duplicates() {
        assert!(parse_attributes(" a=b", 0).is_err());
        assert!(parse_attributes(r#" a="1" a="2""#, 0).is_err());
        assert!(parse_attributes(r#" a="1"b="2""#, 0).is_err());
    }
}
