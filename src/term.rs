//! Elixir Term Conversion Utilities
//!
//! Converts template results and options between Rust and Elixir terms.

use crate::config::{Mode, TemplateOptions, VoidStyle};
use crate::error::TemplateError;
use rustler::{Atom, Encoder, Env, NifMap, Term};

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    ok,
    error,
    auto,
    loose,
    strict,
    self_closing,
    html,
    malformed_source,
    invalid_selector,
    invalid_fragment,
}

/// Options map passed to `template_new/2`:
/// `%{mode: :auto | :loose | :strict, void_style: :self_closing | :html,
/// namespaces: [{prefix, uri}]}`
#[derive(NifMap)]
pub struct TemplateOpts {
    pub mode: Atom,
    pub void_style: Atom,
    pub namespaces: Vec<(String, String)>,
}

impl TemplateOpts {
    /// `None` when an atom is not one of the accepted values
    pub fn to_options(&self) -> Option<TemplateOptions> {
        let mode = if self.mode == auto() {
            None
        } else if self.mode == loose() {
            Some(Mode::Loose)
        } else if self.mode == strict() {
            Some(Mode::Strict)
        } else {
            return None;
        };
        let void_style = if self.void_style == self_closing() {
            VoidStyle::SelfClosing
        } else if self.void_style == html() {
            VoidStyle::Html
        } else {
            return None;
        };

        let options = TemplateOptions {
            mode,
            void_style,
            ..TemplateOptions::default()
        };
        Some(
            self.namespaces
                .iter()
                .fold(options, |o, (prefix, uri)| o.with_namespace(prefix, uri)),
        )
    }
}

/// `{:error, {kind, message}}`
pub fn error_to_term<'a>(env: Env<'a>, err: &TemplateError) -> Term<'a> {
    let kind = match err {
        TemplateError::MalformedSource { .. } => malformed_source(),
        TemplateError::InvalidSelector { .. } => invalid_selector(),
        TemplateError::InvalidFragment { .. } => invalid_fragment(),
    };
    (error(), (kind, err.to_string())).encode(env)
}

/// `:ok` or `{:error, {kind, message}}`
pub fn unit_to_term<'a, T>(env: Env<'a>, result: Result<T, TemplateError>) -> Term<'a> {
    match result {
        Ok(_) => ok().encode(env),
        Err(e) => error_to_term(env, &e),
    }
}

/// `{:ok, value}` or `{:error, {kind, message}}`
pub fn value_to_term<'a, T: Encoder>(env: Env<'a>, result: Result<T, TemplateError>) -> Term<'a> {
    match result {
        Ok(value) => (ok(), value).encode(env),
        Err(e) => error_to_term(env, &e),
    }
}
