//! Rendering collaborator.
//!
//! The widget never touches markup directly: it asks a [`Page`] to turn a
//! template into an element, style it, wire a click listener and fade it out.
//! [`memory::MemoryPage`] is a headless implementation.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

pub mod memory;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ElementId(u64);

impl ElementId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Click dispatched to an element; bubbles to its ancestors unless stopped.
#[derive(Debug, Default)]
pub struct ClickEvent {
    propagation_stopped: bool,
}

impl ClickEvent {
    pub const fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    #[must_use]
    pub const fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

pub type ClickListener = Arc<dyn Fn(&mut ClickEvent) + Send + Sync>;

pub trait Page: Send + Sync {
    /// Attached element carrying `id`, if any.
    fn find_by_id(&self, id: &str) -> Option<ElementId>;

    /// Parse `template` into a new, detached element.
    fn instantiate(&self, template: &str) -> ElementId;

    fn set_id(&self, element: ElementId, id: &str);

    fn set_content(&self, element: ElementId, content: &str);

    fn apply_style(&self, element: ElementId, style: &[(&str, &str)]);

    fn add_class(&self, element: ElementId, class: &str);

    fn on_click(&self, element: ElementId, listener: ClickListener);

    fn append_to_body(&self, element: ElementId);

    fn append_child(&self, parent: ElementId, child: ElementId);

    fn child_count(&self, element: ElementId) -> usize;

    fn contains(&self, parent: ElementId, child: ElementId) -> bool;

    /// Fade the element out, then detach it. Detaching an element that is
    /// already gone is a no-op.
    fn fade_out_and_detach(&self, element: ElementId, fade: Duration);
}
