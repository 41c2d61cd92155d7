//! Zero-Copy Slice Parser
//!
//! Turns tokens into events over a string slice. Names, comments and CDATA
//! borrow from the input; text and attribute values are only copied when
//! they contain references.

use super::events::{EndElement, StartElement, XmlEvent};
use crate::core::attributes::parse_attributes;
use crate::core::entities::decode_text;
use crate::core::tokenizer::{ParseError, Token, TokenKind, Tokenizer};
use memchr::memchr;

/// Zero-copy XML reader from a string slice
pub struct SliceReader<'a> {
    tokenizer: Tokenizer<'a>,
    last_position: usize,
}

impl<'a> SliceReader<'a> {
    pub fn new(input: &'a str) -> Self {
        SliceReader {
            tokenizer: Tokenizer::new(input),
            last_position: 0,
        }
    }

    /// Byte offset where the most recently returned event started
    pub fn last_position(&self) -> usize {
        self.last_position
    }

    /// Get the next XML event, `Ok(None)` at end of input
    pub fn next_event(&mut self) -> Result<Option<XmlEvent<'a>>, ParseError> {
        let Some(token) = self.tokenizer.next_token()? else {
            return Ok(None);
        };
        self.last_position = token.span.0;

        let event = match token.kind {
            TokenKind::StartTag => XmlEvent::StartElement(self.start_element(&token)?),
            TokenKind::EmptyTag => XmlEvent::EmptyElement(self.start_element(&token)?),
            TokenKind::EndTag => XmlEvent::EndElement(EndElement {
                name: token.name.unwrap_or_default(),
            }),
            TokenKind::Text => {
                let raw = token.content.unwrap_or_default();
                if let Some(i) = raw.find("]]>") {
                    return Err(ParseError::new("']]>' not allowed in text", token.span.0 + i));
                }
                let text = decode_text(raw).map_err(|msg| {
                    let amp = memchr(b'&', raw.as_bytes()).unwrap_or(0);
                    ParseError::new(msg, token.span.0 + amp)
                })?;
                XmlEvent::Text(text)
            }
            TokenKind::CData => XmlEvent::CData(token.content.unwrap_or_default()),
            TokenKind::Comment => XmlEvent::Comment(token.content.unwrap_or_default()),
            TokenKind::ProcessingInstruction => XmlEvent::ProcessingInstruction {
                target: token.name.unwrap_or_default(),
                data: token.content.unwrap_or_default(),
            },
            TokenKind::XmlDeclaration => {
                let data = token.content.unwrap_or_default();
                // Pseudo-attributes share the attribute syntax
                let attrs = parse_attributes(data, token.content_start)?;
                if !attrs.iter().any(|a| a.name == "version") {
                    return Err(ParseError::new("XML declaration missing version", token.span.0));
                }
                XmlEvent::XmlDeclaration(self.raw(&token))
            }
            TokenKind::DocType => XmlEvent::DocType(token.content.unwrap_or_default()),
        };
        Ok(Some(event))
    }

    fn start_element(&self, token: &Token<'a>) -> Result<StartElement<'a>, ParseError> {
        let attrs = parse_attributes(token.content.unwrap_or_default(), token.content_start)?;
        Ok(StartElement::new(token.name.unwrap_or_default(), attrs))
    }

    fn raw(&self, token: &Token<'a>) -> &'a str {
        self.tokenizer.slice(token.span.0, token.span.1)
    }
}

impl<'a> Iterator for SliceReader<'a> {
    type Item = Result<XmlEvent<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(input: &str) -> Vec<XmlEvent<'_>> {
        SliceReader::new(input).collect::<Result<_, _>>().unwrap()
    }

    #[test]
    fn test_simple_element() {
        let events = events("<root>hello</root>");
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], XmlEvent::StartElement(e) if e.name == "root"));
        assert!(matches!(&events[1], XmlEvent::Text(t) if t == "hello"));
        assert!(matches!(&events[2], XmlEvent::EndElement(e) if e.name == "root"));
    }

    #[test]
    fn test_empty_element() {
        let events = events(r#"<div id="main" class="container"/>"#);
        assert_eq!(events.len(), 1);
        match &events[0] {
            XmlEvent::EmptyElement(e) => {
                assert_eq!(e.get_attribute_value("id"), Some("main"));
                assert_eq!(e.get_attribute_value("class"), Some("container"));
            }
            other => panic!("Expected EmptyElement, got {other:?}"),
        }
    }

    #[test]
    fn test_text_references_decoded() {
        let events = events("<p>a &lt; b &amp;&#33;</p>");
        assert!(matches!(&events[1], XmlEvent::Text(t) if t == "a < b &!"));
    }

    #[test]
    fn test_cdata_and_declaration() {
        let events = events("<?xml version=\"1.0\"?><script><![CDATA[a < b]]></script>");
        assert!(matches!(&events[0], XmlEvent::XmlDeclaration(d) if *d == "<?xml version=\"1.0\"?>"));
        assert!(matches!(&events[2], XmlEvent::CData("a < b")));
    }

    #[test]
    fn test_undefined_entity_position() {
        let err = SliceReader::new("<p>x &nbsp;</p>")
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err();
        assert_eq!(err.position, 5);
    }

    #[test]
    fn test_attribute_error_surfaces() {
        let err = SliceReader::new("<input disabled/>")
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err();
        assert_eq!(err.position, 7);
    }
}
