//! XML Event Types
//!
//! Event types for pull-parser style XML processing.

use crate::core::attributes::{split_name, Attribute};
use std::borrow::Cow;

/// XML parsing event
#[derive(Debug, Clone)]
pub enum XmlEvent<'a> {
    /// Start of an element: <name attrs...>
    StartElement(StartElement<'a>),
    /// End of an element: </name>
    EndElement(EndElement<'a>),
    /// Empty element: <name attrs.../>
    EmptyElement(StartElement<'a>),
    /// Text content between tags, references decoded
    Text(Cow<'a, str>),
    /// CDATA section content
    CData(&'a str),
    /// Comment content
    Comment(&'a str),
    /// Processing instruction: <?target data?>
    ProcessingInstruction { target: &'a str, data: &'a str },
    /// XML declaration, raw text from `<?xml` to `?>`
    XmlDeclaration(&'a str),
    /// DOCTYPE declaration, raw text
    DocType(&'a str),
}

/// Start element event data
#[derive(Debug, Clone)]
pub struct StartElement<'a> {
    /// Full element name (may include prefix)
    pub name: &'a str,
    /// Local name (after colon)
    pub local_name: &'a str,
    /// Namespace prefix (before colon), if any
    pub prefix: Option<&'a str>,
    /// Element attributes in source order
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> StartElement<'a> {
    pub fn new(name: &'a str, attributes: Vec<Attribute<'a>>) -> Self {
        let (prefix, local_name) = split_name(name);
        StartElement {
            name,
            local_name,
            prefix,
            attributes,
        }
    }

    /// Get an attribute value by name
    pub fn get_attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_ref())
    }

    /// Namespace declarations on this element as (prefix, uri) pairs. The
    /// default namespace has an empty prefix.
    pub fn namespace_declarations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().filter_map(|a| {
            if a.name == "xmlns" {
                Some(("", a.value.as_ref()))
            } else {
                a.name.strip_prefix("xmlns:").map(|p| (p, a.value.as_ref()))
            }
        })
    }
}

/// End element event data
#[derive(Debug, Clone)]
pub struct EndElement<'a> {
    /// Full element name
    pub name: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_element_split() {
        let e = StartElement::new("svg:rect", Vec::new());
        assert_eq!(e.prefix, Some("svg"));
        assert_eq!(e.local_name, "rect");
    }

    #[test]
    fn test_namespace_declarations() {
        let attrs = crate::core::attributes::parse_attributes(
            r#" xmlns="urn:a" xmlns:b="urn:b" id="x""#,
            0,
        )
        .unwrap();
        let e = StartElement::new("root", attrs);
        let decls: Vec<_> = e.namespace_declarations().collect();
        assert_eq!(decls, vec![("", "urn:a"), ("b", "urn:b")]);
        assert_eq!(e.get_attribute_value("id"), Some("x"));
    }
}
