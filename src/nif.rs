//! NIF entry points for `Elixir.RustyTemplate.Native`
//!
//! Templates live in a `ResourceArc`; every call locks the template for its
//! duration. Repeaters are parked between calls and resumed against their
//! template on each operation.

use crate::resource::{RepeaterRef, RepeaterResource, TemplateRef, TemplateResource};
use crate::template::{Condition, Template};
use crate::term::{self, error_to_term, unit_to_term, value_to_term, TemplateOpts};
use rustler::{Encoder, Env, NifResult, ResourceArc, Term};

// ============================================================================
// Templates
// ============================================================================

/// Parse a template: `{:ok, ref}` or `{:error, {kind, message}}`
#[rustler::nif(schedule = "DirtyCpu")]
fn template_new<'a>(env: Env<'a>, source: &str, opts: TemplateOpts) -> NifResult<Term<'a>> {
    let options = opts.to_options().ok_or(rustler::Error::BadArg)?;
    let result = Template::with_options(source, options)
        .map(|template| ResourceArc::new(TemplateResource::new(template)));
    Ok(value_to_term(env, result))
}

#[rustler::nif(schedule = "DirtyCpu")]
fn template_render(template: TemplateRef) -> String {
    template.lock().render()
}

/// Number of nodes a selector matches
#[rustler::nif]
fn template_count<'a>(env: Env<'a>, template: TemplateRef, selector: &str) -> Term<'a> {
    let result = template.lock().query(selector).map(|nodes| nodes.len());
    value_to_term(env, result)
}

#[rustler::nif]
fn template_set_value<'a>(
    env: Env<'a>,
    template: TemplateRef,
    selector: &str,
    value: &str,
    as_html: bool,
) -> Term<'a> {
    unit_to_term(env, template.lock().set_value(selector, value, as_html).map(drop))
}

#[rustler::nif]
fn template_set<'a>(
    env: Env<'a>,
    template: TemplateRef,
    pairs: Vec<(String, String)>,
    as_html: bool,
) -> Term<'a> {
    unit_to_term(env, template.lock().set(pairs, as_html).map(drop))
}

#[rustler::nif]
fn template_add_class<'a>(env: Env<'a>, template: TemplateRef, selector: &str, class: &str) -> Term<'a> {
    unit_to_term(env, template.lock().add_class(selector, class).map(drop))
}

#[rustler::nif]
fn template_remove<'a>(env: Env<'a>, template: TemplateRef, selector: &str) -> Term<'a> {
    unit_to_term(env, template.lock().remove(selector).map(drop))
}

/// Remove one class token from matched `class` attributes
#[rustler::nif]
fn template_remove_class<'a>(
    env: Env<'a>,
    template: TemplateRef,
    selector: &str,
    class: &str,
) -> Term<'a> {
    let condition = Condition::Class(class.to_string());
    unit_to_term(env, template.lock().remove_where([(selector, condition)]).map(drop))
}

// ============================================================================
// Repeaters
// ============================================================================

/// Start repeating the matches of a selector: `{:ok, repeater}`
#[rustler::nif]
fn template_repeat<'a>(env: Env<'a>, template: TemplateRef, selector: &str) -> Term<'a> {
    let repeaters = template
        .lock()
        .repeat(selector)
        .map(|repeat| repeat.into_repeaters());
    match repeaters {
        Ok(repeaters) => {
            let resource = RepeaterResource::new(template.clone(), repeaters);
            (term::ok(), ResourceArc::new(resource)).encode(env)
        }
        Err(e) => error_to_term(env, &e),
    }
}

#[rustler::nif]
fn repeater_set_value<'a>(
    env: Env<'a>,
    repeater: RepeaterRef,
    selector: &str,
    value: &str,
    as_html: bool,
) -> Term<'a> {
    let result = repeater.with_repeat(|r| r.set_value(selector, value, as_html).map(drop));
    unit_to_term(env, result)
}

#[rustler::nif]
fn repeater_add_class<'a>(env: Env<'a>, repeater: RepeaterRef, selector: &str, class: &str) -> Term<'a> {
    let result = repeater.with_repeat(|r| r.add_class(selector, class).map(drop));
    unit_to_term(env, result)
}

#[rustler::nif]
fn repeater_remove<'a>(env: Env<'a>, repeater: RepeaterRef, selector: &str) -> Term<'a> {
    let result = repeater.with_repeat(|r| r.remove(selector).map(drop));
    unit_to_term(env, result)
}

/// Commit the live copies and prime the next ones
#[rustler::nif]
fn repeater_next(repeater: RepeaterRef) -> rustler::Atom {
    repeater.with_repeat(|r| {
        r.next();
    });
    term::ok()
}

// ============================================================================
// NIF Initialization
// ============================================================================

rustler::init!("Elixir.RustyTemplate.Native");
