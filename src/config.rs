//! Template options

/// Markup convention of the source and of rendered output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Author-facing markup: void elements, bare boolean attributes, inline
    /// script bodies
    Loose,
    /// Well-formed XML, serialized as is
    Strict,
}

impl Mode {
    /// Sources starting with an XML declaration are strict; anything else
    /// is loose. Leading whitespace and a byte order mark are ignored.
    pub fn detect(source: &str) -> Self {
        let start = source.trim_start_matches(['\u{feff}', ' ', '\t', '\r', '\n']);
        if start.starts_with("<?xml") {
            Mode::Strict
        } else {
            Mode::Loose
        }
    }
}

/// How void elements are written in loose output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoidStyle {
    /// `<br />`
    #[default]
    SelfClosing,
    /// `<br>`
    Html,
}

#[derive(Debug, Clone, Default)]
pub struct TemplateOptions {
    /// `None` detects the mode from the source
    pub mode: Option<Mode>,
    pub void_style: VoidStyle,
    /// Prefix bindings for selectors, in addition to those declared in the
    /// document
    pub namespaces: Vec<(String, String)>,
}

impl TemplateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_void_style(mut self, void_style: VoidStyle) -> Self {
        self.void_style = void_style;
        self
    }

    /// Bind a prefix; a later binding of the same prefix replaces it
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.namespaces.retain(|(p, _)| *p != prefix);
        self.namespaces.push((prefix, uri.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_mode() {
        assert_eq!(Mode::detect("<?xml version=\"1.0\"?><a/>"), Mode::Strict);
        assert_eq!(Mode::detect("\u{feff}\n <?xml version=\"1.0\"?><a/>"), Mode::Strict);
        assert_eq!(Mode::detect("<html><br></html>"), Mode::Loose);
        assert_eq!(Mode::detect(""), Mode::Loose);
    }

    #[test]
    fn test_builders() {
        let options = TemplateOptions::new()
            .with_mode(Mode::Strict)
            .with_void_style(VoidStyle::Html)
            .with_namespace("svg", "urn:old")
            .with_namespace("svg", "http://www.w3.org/2000/svg");
        assert_eq!(options.mode, Some(Mode::Strict));
        assert_eq!(options.void_style, VoidStyle::Html);
        assert_eq!(
            options.namespaces,
            vec![("svg".to_string(), "http://www.w3.org/2000/svg".to_string())]
        );
    }
}
