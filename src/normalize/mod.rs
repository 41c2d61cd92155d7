//! Markup normalizer
//!
//! Bridges author markup and the strict tree in both directions.
//!
//! `ingest` runs before parsing loose markup:
//! 1. named character references from the entity table become literal text
//! 2. void elements are self-closed unless an explicit closing tag follows
//! 3. bare boolean attributes are expanded to `attr="attr"`
//! 4. non-empty script and style bodies are wrapped in CDATA
//!
//! `emit` runs on the strict serialization of loose templates and undoes the
//! above: void elements follow the configured [`VoidStyle`] and lose their
//! closing tags, `attr="attr"` collapses back to `attr`, and the CDATA
//! wrapper around script and style bodies is stripped. Comments, CDATA
//! sections and script/style bodies are never rewritten as markup.

mod segments;

use crate::config::VoidStyle;
use crate::core::entities::decode_html_entities;
use segments::{Segment, Segments, Tag};

const VOID_ELEMENTS: [&str; 17] = [
    "area", "base", "basefont", "br", "col", "embed", "hr", "img", "input", "keygen", "link",
    "menuitem", "meta", "param", "source", "track", "wbr",
];

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";
/// How `]]>` is written inside a CDATA section
const CDATA_SPLIT: &str = "]]]]><![CDATA[>";

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Make author markup parseable by the strict reader
pub fn ingest(markup: &str) -> String {
    let decoded = decode_html_entities(markup);
    let mut out = String::with_capacity(decoded.len() + 32);
    let mut segments = Segments::new(&decoded);

    while let Some(segment) = segments.next() {
        match segment {
            Segment::Text(text) | Segment::Verbatim(text) => out.push_str(text),
            Segment::EndTag { raw, .. } => out.push_str(raw),
            Segment::RawText(body) => wrap_raw_body(&mut out, body),
            Segment::StartTag(tag) => {
                write_expanded(&mut out, &tag);
                let self_close = tag.self_closing
                    || (is_void_element(tag.name) && segments.closing_tag_len(tag.name).is_none());
                out.push_str(if self_close { "/>" } else { ">" });
            }
        }
    }
    out
}

/// Write the opening tag with every attribute value quoted, bare attributes
/// expanded to `attr="attr"`
fn write_expanded(out: &mut String, tag: &Tag<'_>) {
    out.push('<');
    out.push_str(tag.name);
    for attr in &tag.attributes {
        out.push(' ');
        out.push_str(attr.name);
        match attr.value {
            Some(value) if is_quoted(value) => {
                out.push('=');
                out.push_str(value);
            }
            value => {
                out.push_str("=\"");
                out.push_str(&value.unwrap_or(attr.name).replace('"', "&quot;"));
                out.push('"');
            }
        }
    }
}

fn is_quoted(value: &str) -> bool {
    value.len() >= 2
        && (value.starts_with('"') && value.ends_with('"')
            || value.starts_with('\'') && value.ends_with('\''))
}

fn wrap_raw_body(out: &mut String, body: &str) {
    let trimmed = body.trim();
    let single_section = trimmed.starts_with(CDATA_OPEN)
        && trimmed.ends_with(CDATA_CLOSE)
        && trimmed.matches(CDATA_CLOSE).count() == 1;
    if single_section {
        out.push_str(body);
        return;
    }
    out.push_str(CDATA_OPEN);
    out.push_str(&body.replace(CDATA_CLOSE, CDATA_SPLIT));
    out.push_str(CDATA_CLOSE);
}

/// Turn a strict serialization back into author markup
pub fn emit(serialized: &str, void_style: VoidStyle) -> String {
    let mut out = String::with_capacity(serialized.len());
    for segment in Segments::new(serialized) {
        match segment {
            Segment::Text(text) | Segment::Verbatim(text) => out.push_str(text),
            // Void elements never close; content given to one stays after it
            Segment::EndTag { name, .. } if is_void_element(name) => {}
            Segment::EndTag { raw, .. } => out.push_str(raw),
            Segment::RawText(body) => out.push_str(&unwrap_raw_body(body)),
            Segment::StartTag(mut tag) => {
                for attr in &mut tag.attributes {
                    if attr.value.is_some_and(|v| is_quoted(v) && &v[1..v.len() - 1] == attr.name) {
                        attr.value = None;
                    }
                }
                tag.write_open(&mut out);

                if is_void_element(tag.name) {
                    out.push_str(match void_style {
                        VoidStyle::SelfClosing => " />",
                        VoidStyle::Html => ">",
                    });
                } else {
                    out.push_str(if tag.self_closing { "/>" } else { ">" });
                }
            }
        }
    }
    out
}

/// Strip the CDATA wrapper added by `ingest`, joining split sections
fn unwrap_raw_body(body: &str) -> String {
    match body
        .strip_prefix(CDATA_OPEN)
        .and_then(|b| b.strip_suffix(CDATA_CLOSE))
    {
        Some(inner) => inner.replace(CDATA_SPLIT, CDATA_CLOSE),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, EmptyTags, SerializeOptions};

    fn round_trip(markup: &str, void_style: VoidStyle) -> String {
        let doc = Document::parse(&ingest(markup)).unwrap();
        let options = SerializeOptions {
            empty_tags: EmptyTags::Expanded,
            xml_declaration: false,
        };
        emit(&doc.serialize(options), void_style)
    }

    #[test]
    fn test_ingest_void_elements() {
        assert_eq!(ingest("<p>a<br>b</p>"), "<p>a<br/>b</p>");
        assert_eq!(ingest("<p><BR></p>"), "<p><BR/></p>");
        assert_eq!(ingest("<p><br/></p>"), "<p><br/></p>");
        assert_eq!(ingest("<p><br></br></p>"), "<p><br></br></p>");
        assert_eq!(ingest("<p><br> </br></p>"), "<p><br> </br></p>");
    }

    #[test]
    fn test_ingest_boolean_attributes() {
        assert_eq!(
            ingest("<input type=\"checkbox\" checked disabled>"),
            "<input type=\"checkbox\" checked=\"checked\" disabled=\"disabled\"/>"
        );
        assert_eq!(ingest("<a href=x>y</a>"), "<a href=\"x\">y</a>");
    }

    #[test]
    fn test_ingest_leaves_comments_and_cdata() {
        let markup = "<div><!-- <br> --><![CDATA[<br>]]></div>";
        assert_eq!(ingest(markup), markup);
    }

    #[test]
    fn test_ingest_entities() {
        assert_eq!(ingest("<p>&copy; &amp; &lt; &#169;</p>"), "<p>\u{a9} &amp; &lt; &#169;</p>");
    }

    #[test]
    fn test_ingest_script() {
        assert_eq!(
            ingest("<script>if (a < b) {}</script>"),
            "<script><![CDATA[if (a < b) {}]]></script>"
        );
        assert_eq!(ingest("<script src=\"x.js\"></script>"), "<script src=\"x.js\"></script>");
        assert_eq!(
            ingest("<script>a = \"]]>\";</script>"),
            "<script><![CDATA[a = \"]]]]><![CDATA[>\";]]></script>"
        );
        let wrapped = "<script><![CDATA[x < 1]]></script>";
        assert_eq!(ingest(wrapped), wrapped);
    }

    #[test]
    fn test_ingest_style() {
        assert_eq!(
            ingest("<style>ul > li { content: \"&\"; }</style>"),
            "<style><![CDATA[ul > li { content: \"&\"; }]]></style>"
        );
        assert_eq!(ingest("<style></style>"), "<style></style>");
    }

    #[test]
    fn test_emit_void_styles() {
        assert_eq!(emit("<p><br></br></p>", VoidStyle::SelfClosing), "<p><br /></p>");
        assert_eq!(emit("<p><br/></p>", VoidStyle::SelfClosing), "<p><br /></p>");
        assert_eq!(emit("<p><br></br></p>", VoidStyle::Html), "<p><br></p>");
    }

    #[test]
    fn test_emit_drops_closing_tag_of_filled_void_element() {
        assert_eq!(emit("<p><br>x</br></p>", VoidStyle::SelfClosing), "<p><br />x</p>");
        assert_eq!(
            emit("<p><img src=\"a\"><b>x</b></img></p>", VoidStyle::Html),
            "<p><img src=\"a\"><b>x</b></p>"
        );
    }

    #[test]
    fn test_emit_collapses_boolean_attributes_only_in_tags() {
        assert_eq!(
            emit("<input disabled=\"disabled\"></input>", VoidStyle::Html),
            "<input disabled>"
        );
        assert_eq!(
            emit("<p title=\"x\">disabled=\"disabled\"</p>", VoidStyle::Html),
            "<p title=\"x\">disabled=\"disabled\"</p>"
        );
    }

    #[test]
    fn test_round_trips() {
        assert_eq!(round_trip("<br>", VoidStyle::SelfClosing), "<br />");
        assert_eq!(round_trip("<input disabled>", VoidStyle::Html), "<input disabled>");
        assert_eq!(
            round_trip("<div><script>if (a < b && c) {}</script></div>", VoidStyle::Html),
            "<div><script>if (a < b && c) {}</script></div>"
        );
        assert_eq!(
            round_trip("<head><style>a > b, c & d { x: 1 }</style></head>", VoidStyle::Html),
            "<head><style>a > b, c & d { x: 1 }</style></head>"
        );
        assert_eq!(
            round_trip("<p>caf&eacute; <img src=\"a.png\" alt=\"\" /></p>", VoidStyle::SelfClosing),
            "<p>caf\u{e9} <img src=\"a.png\" alt=\"\" /></p>"
        );
    }
}
