//! Markup segmentation
//!
//! Splits loose markup into text, tags and opaque sections without building
//! a tree. Script and style bodies come out as a single `RawText` segment.
//! Nothing is validated: unterminated constructs become `Verbatim` so the
//! strict parser can report them.

use crate::core::scanner::{is_name_start_char, is_whitespace, Scanner};
use memchr::memmem;

/// Elements whose bodies are never scanned for markup
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'a> {
    Text(&'a str),
    StartTag(Tag<'a>),
    EndTag { name: &'a str, raw: &'a str },
    /// Body of a script or style element
    RawText(&'a str),
    /// Comments, CDATA sections, processing instructions, DOCTYPE and
    /// anything unterminated
    Verbatim(&'a str),
}

/// An opening tag
#[derive(Debug, Clone, PartialEq)]
pub struct Tag<'a> {
    pub name: &'a str,
    pub attributes: Vec<Attr<'a>>,
    pub self_closing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attr<'a> {
    pub name: &'a str,
    /// The value as written: quoted, unquoted, or absent for a bare attribute
    pub value: Option<&'a str>,
}

impl Tag<'_> {
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Write `<name attrs` without the closing `>` or `/>`
    pub fn write_open(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.name);
        for attr in &self.attributes {
            out.push(' ');
            out.push_str(attr.name);
            if let Some(value) = attr.value {
                out.push('=');
                out.push_str(value);
            }
        }
    }
}

pub struct Segments<'a> {
    input: &'a str,
    scanner: Scanner<'a>,
    /// Set after the opening tag of a raw text element
    raw_text: Option<&'a str>,
}

impl<'a> Segments<'a> {
    pub fn new(input: &'a str) -> Self {
        Segments {
            input,
            scanner: Scanner::new(input.as_bytes()),
            raw_text: None,
        }
    }

    /// Length of a closing tag for `name` at the current position, allowing
    /// leading whitespace
    pub fn closing_tag_len(&self, name: &str) -> Option<usize> {
        let rest = &self.input[self.scanner.position()..];
        let trimmed = rest.trim_start_matches([' ', '\t', '\n', '\r']);
        let after = trimmed.strip_prefix("</")?;
        let matches = after
            .as_bytes()
            .get(..name.len())
            .is_some_and(|n| n.eq_ignore_ascii_case(name.as_bytes()));
        if !matches {
            return None;
        }
        let tail = after[name.len()..].trim_start_matches([' ', '\t', '\n', '\r']);
        tail.starts_with('>').then(|| rest.len() - tail.len() + 1)
    }

    fn take_until(&mut self, end: usize) -> &'a str {
        let start = self.scanner.position();
        self.scanner.set_position(end);
        &self.input[start..self.scanner.position()]
    }

    /// Consume through `terminator`, or to the end of input
    fn verbatim_through(&mut self, terminator: &[u8]) -> Segment<'a> {
        let end = match self.scanner.find_seq(terminator) {
            Some(i) => i + terminator.len(),
            None => self.input.len(),
        };
        Segment::Verbatim(self.take_until(end))
    }

    fn raw_text_body(&mut self, element: &str) -> Option<Segment<'a>> {
        let start = self.scanner.position();
        let bytes = self.input.as_bytes();
        let mut search = start;
        let end = loop {
            match memmem::find(&bytes[search..], b"</") {
                Some(i) => {
                    let candidate = search + i;
                    let name = &bytes[candidate + 2..];
                    if name.len() >= element.len()
                        && name[..element.len()].eq_ignore_ascii_case(element.as_bytes())
                    {
                        break candidate;
                    }
                    search = candidate + 2;
                }
                None => break bytes.len(),
            }
        };
        if end == start {
            return None;
        }
        Some(Segment::RawText(self.take_until(end)))
    }

    fn end_tag(&mut self) -> Segment<'a> {
        let Some(close) = self.scanner.find_tag_end_quoted() else {
            return Segment::Verbatim(self.take_until(self.input.len()));
        };
        let raw = self.take_until(close + 1);
        let name = raw[2..raw.len() - 1].trim_end_matches(|c: char| c.is_ascii_whitespace());
        Segment::EndTag { name, raw }
    }

    fn start_tag(&mut self) -> Segment<'a> {
        let start = self.scanner.position();
        self.scanner.advance(1);
        let name = self.read_while(|b| !is_whitespace(b) && b != b'>' && b != b'/');

        let mut attributes = Vec::new();
        loop {
            self.scanner.skip_whitespace();
            match self.scanner.peek() {
                None => {
                    self.scanner.set_position(start);
                    return Segment::Verbatim(self.take_until(self.input.len()));
                }
                Some(b'>') => {
                    self.scanner.advance(1);
                    return self.opened(Tag { name, attributes, self_closing: false });
                }
                Some(b'/') if self.scanner.peek_at(1) == Some(b'>') => {
                    self.scanner.advance(2);
                    return Segment::StartTag(Tag { name, attributes, self_closing: true });
                }
                Some(b'/') => self.scanner.advance(1),
                Some(_) => {
                    let attr_name =
                        self.read_while(|b| !is_whitespace(b) && !matches!(b, b'=' | b'>' | b'/'));
                    let attr_name = if attr_name.is_empty() {
                        // A stray '=' or quote; keep it as a bare token
                        self.read_while(|b| !is_whitespace(b) && b != b'>')
                    } else {
                        attr_name
                    };
                    let value = self.attribute_value();
                    attributes.push(Attr { name: attr_name, value });
                }
            }
        }
    }

    fn attribute_value(&mut self) -> Option<&'a str> {
        let before = self.scanner.position();
        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'=') {
            self.scanner.set_position(before);
            return None;
        }
        self.scanner.advance(1);
        self.scanner.skip_whitespace();
        match self.scanner.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                let start = self.scanner.position();
                self.scanner.advance(1);
                let end = match memchr::memchr(quote, self.scanner.remaining()) {
                    Some(i) => self.scanner.position() + i + 1,
                    None => self.input.len(),
                };
                self.scanner.set_position(end);
                Some(&self.input[start..end])
            }
            _ => Some(self.read_while(|b| !is_whitespace(b) && b != b'>')),
        }
    }

    fn opened(&mut self, tag: Tag<'a>) -> Segment<'a> {
        if tag.self_closing {
            return Segment::StartTag(tag);
        }
        if let Some(&raw) = RAW_TEXT_ELEMENTS.iter().find(|e| tag.is_named(e)) {
            self.raw_text = Some(raw);
        }
        Segment::StartTag(tag)
    }

    fn read_while(&mut self, matches: impl Fn(u8) -> bool) -> &'a str {
        let start = self.scanner.position();
        while self.scanner.peek().is_some_and(&matches) {
            self.scanner.advance(1);
        }
        &self.input[start..self.scanner.position()]
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        if let Some(element) = self.raw_text.take() {
            if let Some(body) = self.raw_text_body(element) {
                return Some(body);
            }
        }
        if self.scanner.is_eof() {
            return None;
        }

        let s = &self.scanner;
        if s.peek() != Some(b'<') {
            let end = s.find_tag_start().unwrap_or(self.input.len());
            return Some(Segment::Text(self.take_until(end)));
        }

        let segment = if s.starts_with(b"<!--") {
            self.verbatim_through(b"-->")
        } else if s.starts_with(b"<![CDATA[") {
            self.verbatim_through(b"]]>")
        } else if s.starts_with(b"<?") {
            self.verbatim_through(b"?>")
        } else if s.starts_with(b"<!") {
            match s.find_tag_end_quoted() {
                Some(close) => Segment::Verbatim(self.take_until(close + 1)),
                None => Segment::Verbatim(self.take_until(self.input.len())),
            }
        } else if s.starts_with(b"</") {
            self.end_tag()
        } else if s.peek_at(1).is_some_and(is_name_start_char) {
            self.start_tag()
        } else {
            // A lone '<' in loose text
            let start = s.position();
            Segment::Text(self.take_until(start + 1))
        };
        Some(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag<'a>(name: &'a str, attributes: Vec<Attr<'a>>, self_closing: bool) -> Segment<'a> {
        Segment::StartTag(Tag { name, attributes, self_closing })
    }

    #[test]
    fn test_segments() {
        let segments: Vec<_> = Segments::new("<p class=\"a\">x<br/><!-- <b> --></p>").collect();
        assert_eq!(
            segments,
            vec![
                tag("p", vec![Attr { name: "class", value: Some("\"a\"") }], false),
                Segment::Text("x"),
                tag("br", vec![], true),
                Segment::Verbatim("<!-- <b> -->"),
                Segment::EndTag { name: "p", raw: "</p>" },
            ]
        );
    }

    #[test]
    fn test_bare_and_unquoted_attributes() {
        let segments: Vec<_> = Segments::new("<input disabled value=x checked>").collect();
        assert_eq!(
            segments,
            vec![tag(
                "input",
                vec![
                    Attr { name: "disabled", value: None },
                    Attr { name: "value", value: Some("x") },
                    Attr { name: "checked", value: None },
                ],
                false
            )]
        );
    }

    #[test]
    fn test_script_body_is_raw() {
        let segments: Vec<_> =
            Segments::new("<script>if (a < b && c) {}</script><style></style>").collect();
        assert_eq!(segments[1], Segment::RawText("if (a < b && c) {}"));
        assert_eq!(segments[2], Segment::EndTag { name: "script", raw: "</script>" });
        assert_eq!(segments[4], Segment::EndTag { name: "style", raw: "</style>" });

        let segments: Vec<_> = Segments::new("<script src=\"a.js\"/><p>x</p>").collect();
        assert_eq!(segments[1], tag("p", vec![], false));
    }

    #[test]
    fn test_unterminated_input_is_verbatim() {
        let segments: Vec<_> = Segments::new("a <b c=\"d").collect();
        assert_eq!(segments, vec![Segment::Text("a "), Segment::Verbatim("<b c=\"d")]);

        let segments: Vec<_> = Segments::new("1 < 2").collect();
        assert_eq!(
            segments,
            vec![Segment::Text("1 "), Segment::Text("<"), Segment::Text(" 2")]
        );
    }
}
