//! Template errors
//!
//! Every failure is returned synchronously from the call that caused it.
//! Batch operations are not transactional: mutations applied before an
//! error stay applied.

use crate::core::tokenizer::ParseError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TemplateError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The source could not be parsed into a single-rooted tree
    #[error("Malformed source at byte {position}: {message}")]
    MalformedSource { message: String, position: usize },

    /// The compiled query could not be executed
    #[error("Invalid selector {selector:?} (compiled to {query:?}): {message}")]
    InvalidSelector {
        selector: String,
        query: String,
        message: String,
    },

    /// Markup passed with `as_html` did not parse as a fragment
    #[error("Invalid fragment at byte {position}: {message}")]
    InvalidFragment { message: String, position: usize },
}

impl TemplateError {
    pub fn malformed_source(err: ParseError) -> Self {
        Self::MalformedSource {
            message: err.message,
            position: err.position,
        }
    }

    pub fn invalid_selector(
        selector: impl Into<String>,
        query: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            query: query.into(),
            message: message.into(),
        }
    }

    pub fn invalid_fragment(err: ParseError) -> Self {
        Self::InvalidFragment {
            message: err.message,
            position: err.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = TemplateError::malformed_source(ParseError::new("Unclosed element <a>", 3));
        assert_eq!(err.to_string(), "Malformed source at byte 3: Unclosed element <a>");

        let err = TemplateError::invalid_selector("a[", "descendant::a[", "Unexpected end");
        assert!(err.to_string().contains("\"a[\""));
    }
}
