//! ResourceArc Wrappers
//!
//! Templates and parked repeater state held by the BEAM between calls.

use crate::template::{Repeat, Repeater, Template};
use rustler::ResourceArc;
use std::sync::{Mutex, MutexGuard};

/// A template shared with the BEAM
pub struct TemplateResource {
    pub inner: Mutex<Template>,
}

impl TemplateResource {
    pub fn new(template: Template) -> Self {
        TemplateResource {
            inner: Mutex::new(template),
        }
    }

    /// Lock the template. A poisoned lock still yields the template: every
    /// mutation leaves the tree consistent.
    pub fn lock(&self) -> MutexGuard<'_, Template> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[rustler::resource_impl]
impl rustler::Resource for TemplateResource {}

pub type TemplateRef = ResourceArc<TemplateResource>;

/// Repeat state of one `repeat` call, bound to its template
pub struct RepeaterResource {
    pub template: TemplateRef,
    pub repeaters: Mutex<Vec<Repeater>>,
}

impl RepeaterResource {
    pub fn new(template: TemplateRef, repeaters: Vec<Repeater>) -> Self {
        RepeaterResource {
            template,
            repeaters: Mutex::new(repeaters),
        }
    }

    /// Run `op` on the resumed repeat. The template is locked before the
    /// repeaters, and the state is parked again even when `op` fails.
    pub fn with_repeat<R>(&self, op: impl FnOnce(&mut Repeat<'_>) -> R) -> R {
        let mut template = self.template.lock();
        let mut repeaters = self.repeaters.lock().unwrap_or_else(|e| e.into_inner());
        let mut repeat = template.resume(std::mem::take(&mut *repeaters));
        let result = op(&mut repeat);
        *repeaters = repeat.into_repeaters();
        result
    }
}

#[rustler::resource_impl]
impl rustler::Resource for RepeaterResource {}

pub type RepeaterRef = ResourceArc<RepeaterResource>;
