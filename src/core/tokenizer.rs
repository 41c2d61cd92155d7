//! XML Tokenizer - pull parser for XML token extraction
//!
//! Extracts tokens from well-formed XML:
//! - Element start/end tags
//! - Text content (raw, references decoded by the reader)
//! - CDATA sections
//! - Comments
//! - Processing instructions and the XML declaration
//! - DOCTYPE declarations (kept raw)
//!
//! Lexical errors carry the byte position where they were detected.
//! Structural checks (tag balance, single root) belong to the tree builder.

use super::scanner::{is_whitespace, Scanner};
use std::fmt;

/// Type of XML token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Element start tag: <element>
    StartTag,
    /// Element end tag: </element>
    EndTag,
    /// Empty element: <element/>
    EmptyTag,
    /// Text content
    Text,
    /// CDATA section: <![CDATA[...]]>
    CData,
    /// Comment: <!--...-->
    Comment,
    /// Processing instruction: <?target ...?>
    ProcessingInstruction,
    /// XML declaration: <?xml ...?>
    XmlDeclaration,
    /// DOCTYPE declaration
    DocType,
}

/// A lexed XML token, borrowing from the input
#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw span in input (start, end)
    pub span: (usize, usize),
    /// For tags: the element name. For PIs: the target.
    pub name: Option<&'a str>,
    /// Tag attribute text, text/CDATA/comment body, PI data, or raw DOCTYPE
    pub content: Option<&'a str>,
    /// Byte offset of `content` in the input
    pub content_start: usize,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, span: (usize, usize)) -> Self {
        Token {
            kind,
            span,
            name: None,
            content: None,
            content_start: span.0,
        }
    }

    fn with_name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    fn with_content(mut self, content: &'a str, start: usize) -> Self {
        self.content = Some(content);
        self.content_start = start;
        self
    }
}

/// Well-formedness error with the byte position where it was detected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        ParseError {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.message, self.position)
    }
}

impl std::error::Error for ParseError {}

/// Pull tokenizer over a complete XML string
pub struct Tokenizer<'a> {
    input: &'a str,
    scanner: Scanner<'a>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Tokenizer {
            input,
            scanner: Scanner::new(input.as_bytes()),
        }
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    /// Input text between two byte offsets
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    /// Next token, `Ok(None)` at end of input
    pub fn next_token(&mut self) -> Result<Option<Token<'a>>, ParseError> {
        if self.scanner.is_eof() {
            return Ok(None);
        }

        let start = self.scanner.position();
        if self.scanner.peek() != Some(b'<') {
            let end = self.scanner.find_tag_start().unwrap_or(self.input.len());
            self.scanner.set_position(end);
            let text = &self.input[start..end];
            return Ok(Some(
                Token::new(TokenKind::Text, (start, end)).with_content(text, start),
            ));
        }

        if self.scanner.starts_with(b"<!--") {
            self.delimited(start, 4, b"-->", TokenKind::Comment, "Unterminated comment")
        } else if self.scanner.starts_with(b"<![CDATA[") {
            self.delimited(start, 9, b"]]>", TokenKind::CData, "Unterminated CDATA section")
        } else if self.scanner.starts_with_ignore_case(b"<!DOCTYPE") {
            self.doctype(start)
        } else if self.scanner.starts_with(b"<?") {
            self.processing_instruction(start)
        } else if self.scanner.starts_with(b"</") {
            self.end_tag(start)
        } else {
            self.start_tag(start)
        }
    }

    /// Token whose body runs from after an opening marker up to `close`
    fn delimited(
        &mut self,
        start: usize,
        open_len: usize,
        close: &[u8],
        kind: TokenKind,
        unterminated: &str,
    ) -> Result<Option<Token<'a>>, ParseError> {
        self.scanner.advance(open_len);
        let body_start = self.scanner.position();
        let body_end = self
            .scanner
            .find_seq(close)
            .ok_or_else(|| ParseError::new(unterminated, start))?;
        let end = body_end + close.len();
        self.scanner.set_position(end);

        if kind == TokenKind::Comment && self.input[body_start..body_end].contains("--") {
            return Err(ParseError::new("'--' not allowed inside comment", body_start));
        }

        Ok(Some(
            Token::new(kind, (start, end))
                .with_content(&self.input[body_start..body_end], body_start),
        ))
    }

    fn doctype(&mut self, start: usize) -> Result<Option<Token<'a>>, ParseError> {
        let bytes = self.input.as_bytes();
        let mut pos = start + 9;
        let mut in_subset = false;
        let mut quote: Option<u8> = None;

        while pos < bytes.len() {
            let b = bytes[pos];
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None => match b {
                    b'"' | b'\'' => quote = Some(b),
                    b'[' => in_subset = true,
                    b']' => in_subset = false,
                    b'>' if !in_subset => {
                        let end = pos + 1;
                        self.scanner.set_position(end);
                        return Ok(Some(
                            Token::new(TokenKind::DocType, (start, end))
                                .with_content(&self.input[start..end], start),
                        ));
                    }
                    _ => {}
                },
            }
            pos += 1;
        }

        Err(ParseError::new("Unterminated DOCTYPE declaration", start))
    }

    fn processing_instruction(&mut self, start: usize) -> Result<Option<Token<'a>>, ParseError> {
        self.scanner.advance(2);
        let target = self
            .read_name()
            .ok_or_else(|| ParseError::new("Processing instruction target expected", start + 2))?;
        let data_start = self.scanner.position();
        let data_end = self
            .scanner
            .find_seq(b"?>")
            .ok_or_else(|| ParseError::new("Unterminated processing instruction", start))?;
        let end = data_end + 2;
        self.scanner.set_position(end);

        let raw = &self.input[data_start..data_end];
        if !raw.is_empty() && !raw.as_bytes().first().copied().is_some_and(is_whitespace) {
            return Err(ParseError::new(
                "Whitespace required after processing instruction target",
                data_start,
            ));
        }
        let data = raw.trim_start();
        let data_offset = data_end - data.len();

        let kind = if target == "xml" {
            if start != 0 {
                return Err(ParseError::new(
                    "XML declaration allowed only at the start of the document",
                    start,
                ));
            }
            TokenKind::XmlDeclaration
        } else if target.eq_ignore_ascii_case("xml") {
            return Err(ParseError::new("Reserved processing instruction target", start + 2));
        } else {
            TokenKind::ProcessingInstruction
        };

        Ok(Some(
            Token::new(kind, (start, end))
                .with_name(target)
                .with_content(data, data_offset),
        ))
    }

    fn end_tag(&mut self, start: usize) -> Result<Option<Token<'a>>, ParseError> {
        self.scanner.advance(2);
        let name = self
            .read_name()
            .ok_or_else(|| ParseError::new("Element name expected in end tag", start + 2))?;
        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'>') {
            return Err(ParseError::new(
                format!("Expected '>' to close end tag </{}", name),
                self.scanner.position(),
            ));
        }
        self.scanner.advance(1);
        Ok(Some(
            Token::new(TokenKind::EndTag, (start, self.scanner.position())).with_name(name),
        ))
    }

    fn start_tag(&mut self, start: usize) -> Result<Option<Token<'a>>, ParseError> {
        self.scanner.advance(1);
        let name = self.read_name().ok_or_else(|| {
            ParseError::new("Element name must start with letter, underscore, or colon", start + 1)
        })?;
        let attrs_start = self.scanner.position();
        let close = self
            .scanner
            .find_tag_end_quoted()
            .ok_or_else(|| ParseError::new(format!("Unterminated start tag <{}", name), start))?;

        let self_closing = close > attrs_start && self.input.as_bytes()[close - 1] == b'/';
        let attrs_end = if self_closing { close - 1 } else { close };
        let end = close + 1;
        self.scanner.set_position(end);

        let kind = if self_closing {
            TokenKind::EmptyTag
        } else {
            TokenKind::StartTag
        };
        Ok(Some(
            Token::new(kind, (start, end))
                .with_name(name)
                .with_content(&self.input[attrs_start..attrs_end], attrs_start),
        ))
    }

    fn read_name(&mut self) -> Option<&'a str> {
        let start = self.scanner.position();
        self.scanner.read_name()?;
        Some(&self.input[start..self.scanner.position()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut tokenizer = Tokenizer::new(input);
        let mut out = Vec::new();
        while let Some(token) = tokenizer.next_token().unwrap() {
            out.push(token.kind);
        }
        out
    }

    #[test]
    fn test_simple_element() {
        assert_eq!(
            kinds("<root>hi</root>"),
            vec![TokenKind::StartTag, TokenKind::Text, TokenKind::EndTag]
        );
    }

    #[test]
    fn test_empty_tag_with_attributes() {
        let mut tokenizer = Tokenizer::new(r#"<img src="a/b.png" alt='>'/>"#);
        let token = tokenizer.next_token().unwrap().unwrap();
        assert_eq!(token.kind, TokenKind::EmptyTag);
        assert_eq!(token.name, Some("img"));
        assert_eq!(token.content, Some(r#" src="a/b.png" alt='>'"#));
        assert_eq!(token.content_start, 4);
    }

    #[test]
    fn test_misc_constructs() {
        assert_eq!(
            kinds("<?xml version=\"1.0\"?><!DOCTYPE a [<!ENTITY x \"y\">]><!--c--><a><![CDATA[<x>]]><?pi d?></a>"),
            vec![
                TokenKind::XmlDeclaration,
                TokenKind::DocType,
                TokenKind::Comment,
                TokenKind::StartTag,
                TokenKind::CData,
                TokenKind::ProcessingInstruction,
                TokenKind::EndTag,
            ]
        );
    }

    #[test]
    fn test_unterminated_constructs() {
        for input in ["<!-- x", "<a><![CDATA[x", "<?pi x", "<a b=\"c\"", "<!DOCTYPE a"] {
            let mut tokenizer = Tokenizer::new(input);
            let mut result = Ok(None);
            for _ in 0..3 {
                result = tokenizer.next_token();
                if result.is_err() {
                    break;
                }
            }
            assert!(result.is_err(), "expected error for {input}");
        }
    }

    #[test]
    fn test_error_position() {
        let mut tokenizer = Tokenizer::new("<a>< b/>");
        tokenizer.next_token().unwrap();
        let err = tokenizer.next_token().unwrap_err();
        assert_eq!(err.position, 4);
    }

    #[test]
    fn test_misplaced_xml_declaration() {
        let mut tokenizer = Tokenizer::new("<a/><?xml version=\"1.0\"?>");
        tokenizer.next_token().unwrap();
        assert!(tokenizer.next_token().is_err());
    }
}
