use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{trace, warn};

use crate::container::ContainerManager;
use crate::context::Context;
use crate::page::{ClickListener, ElementId};
use crate::style::palette;
use crate::types::{Severity, TempPolicy};

/// Class carried by every message element.
pub const MESSAGE_CLASS: &str = "__notify_msg";

/// Builds, shows and removes on-page messages.
#[derive(Clone)]
pub struct Messages {
    ctx: Arc<Context>,
    container: ContainerManager,
}

impl Messages {
    #[must_use]
    pub const fn new(ctx: Arc<Context>, container: ContainerManager) -> Self {
        Self { ctx, container }
    }

    #[must_use]
    pub const fn container(&self) -> &ContainerManager {
        &self.container
    }

    /// Build a detached, styled message element and wire its dismissal.
    pub fn build(&self, severity: Severity, body: &str, temp: TempPolicy) -> ElementId {
        let page = &self.ctx.page;
        let layout = self.ctx.settings.snapshot().message_layout;
        let element = page.instantiate(&layout);
        page.set_content(element, body);
        page.add_class(element, MESSAGE_CLASS);
        page.add_class(element, severity.as_str());

        let colours = palette(severity);
        let border = colours.border();
        page.apply_style(
            element,
            &[
                ("color", colours.foreground),
                ("background-color", colours.background),
                ("border", border.as_str()),
            ],
        );

        if temp.is_clickable() {
            page.apply_style(element, &[("cursor", "pointer")]);
            let messages = self.clone();
            let listener: ClickListener = Arc::new(move |event| {
                event.stop_propagation();
                messages.remove_msg(element);
            });
            page.on_click(element, listener);
        }

        if let Some(delay) = temp.auto_dismiss() {
            match Handle::try_current() {
                Ok(handle) => {
                    let messages = self.clone();
                    handle.spawn(async move {
                        tokio::time::sleep(delay).await;
                        messages.remove_msg(element);
                    });
                }
                Err(_) => warn!(%element, "no async runtime, auto-dismiss disabled"),
            }
        }

        element
    }

    /// Build a message and append it to the container.
    pub fn show(&self, severity: Severity, body: &str, temp: TempPolicy) -> MessageHandle {
        let element = self.build(severity, body, temp);
        let container = self.container.container();
        self.ctx.page.append_child(container, element);
        trace!(%element, severity = %severity, ?temp, "message shown");
        MessageHandle {
            element,
            messages: self.clone(),
        }
    }

    /// Fade out and detach, without looking at the container.
    pub fn remove(&self, element: ElementId) {
        self.ctx
            .page
            .fade_out_and_detach(element, self.ctx.settings.fade());
    }

    /// Remove a message, collapsing the whole container when it is the last
    /// one. The count is taken before the fade starts.
    pub fn remove_msg(&self, element: ElementId) {
        let page = &self.ctx.page;
        match self.container.current() {
            Some(container) if page.contains(container, element) => {
                if page.child_count(container) < 2 {
                    self.remove(container);
                } else {
                    self.remove(element);
                }
            }
            _ => self.remove(element),
        }
    }

    /// Remove the container and every message in it.
    pub fn clear(&self) {
        if let Some(container) = self.container.current() {
            self.remove(container);
        }
    }
}

/// Returned by the on-page severity calls; removes exactly its message.
#[derive(Clone)]
pub struct MessageHandle {
    element: ElementId,
    messages: Messages,
}

impl MessageHandle {
    #[must_use]
    pub const fn element(&self) -> ElementId {
        self.element
    }

    pub fn remove(&self) {
        self.messages.remove_msg(self.element);
    }
}

impl fmt::Debug for MessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageHandle")
            .field("element", &self.element)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{MESSAGE_CLASS, Messages};
    use crate::config::{Settings, SetupOptions};
    use crate::container::{CONTAINER_ID, ContainerManager};
    use crate::page::Page;
    use crate::context::Context;
    use crate::page::memory::MemoryPage;
    use crate::types::{Severity, TempPolicy};
    use std::sync::Arc;
    use std::time::Duration;

    fn messages() -> (MemoryPage, Messages) {
        let page = MemoryPage::new();
        let mut settings = Settings::default();
        settings.merge(&SetupOptions::new().fade(Duration::ZERO));
        let ctx = Context::new(Arc::new(page.clone()), settings);
        let container = ContainerManager::new(Arc::clone(&ctx));
        (page, Messages::new(ctx, container))
    }

    #[test]
    fn build_applies_severity_style_and_classes() {
        let (page, messages) = messages();
        let el = messages.build(Severity::Warning, "Careful", TempPolicy::Persistent);
        assert_eq!(page.content(el).as_deref(), Some("Careful"));
        assert!(page.has_class(el, MESSAGE_CLASS));
        assert!(page.has_class(el, "warning"));
        assert_eq!(page.style(el, "color").as_deref(), Some("#8A6D3B"));
        assert_eq!(
            page.style(el, "background-color").as_deref(),
            Some("#FCF8E3")
        );
        assert_eq!(
            page.style(el, "border").as_deref(),
            Some("1px solid #8A6D3B")
        );
        assert!(!page.is_attached(el));
    }

    #[test]
    fn persistent_message_has_no_click_handler() {
        let (page, messages) = messages();
        let handle = messages.show(Severity::Info, "Sticky", TempPolicy::Persistent);
        let el = handle.element();
        assert_eq!(page.listener_count(el), 0);
        assert_eq!(page.style(el, "cursor"), None);

        page.click(el);
        assert!(page.is_attached(el));
        assert_eq!(page.body_clicks(), 1);

        handle.remove();
        assert!(!page.is_attached(el));
    }

    #[test]
    fn click_dismisses_and_stops_propagation() {
        let (page, messages) = messages();
        let keep = messages.show(Severity::Info, "Keep", TempPolicy::DismissOnClick);
        let gone = messages.show(Severity::Error, "Gone", TempPolicy::DismissOnClick);
        assert_eq!(page.style(gone.element(), "cursor").as_deref(), Some("pointer"));

        page.click(gone.element());
        assert_eq!(page.body_clicks(), 0);
        assert!(!page.is_attached(gone.element()));
        assert!(page.is_attached(keep.element()));
        assert_eq!(page.count_by_id(CONTAINER_ID), 1);
    }

    #[test]
    fn removing_last_message_collapses_container() {
        let (page, messages) = messages();
        let first = messages.show(Severity::Success, "One", TempPolicy::Persistent);
        let second = messages.show(Severity::Success, "Two", TempPolicy::Persistent);
        let container = messages.container().container();
        assert_eq!(page.child_count(container), 2);

        first.remove();
        assert!(page.is_attached(container));
        assert_eq!(page.children(container), vec![second.element()]);

        second.remove();
        assert!(!page.is_attached(container));
        assert_eq!(page.count_by_id(CONTAINER_ID), 0);
    }

    #[test]
    fn double_remove_is_a_noop() {
        let (page, messages) = messages();
        let first = messages.show(Severity::Info, "One", TempPolicy::Persistent);
        let second = messages.show(Severity::Info, "Two", TempPolicy::Persistent);
        first.remove();
        first.remove();
        assert!(page.is_attached(second.element()));
        assert_eq!(page.count_by_id(CONTAINER_ID), 1);
    }

    #[test]
    fn stale_handle_does_not_touch_new_container() {
        let (page, messages) = messages();
        let stale = messages.show(Severity::Info, "Old", TempPolicy::Persistent);
        messages.clear();
        let fresh = messages.show(Severity::Info, "New", TempPolicy::Persistent);
        stale.remove();
        assert!(page.is_attached(fresh.element()));
        assert_eq!(page.count_by_id(CONTAINER_ID), 1);
    }

    #[test]
    fn removed_messages_are_freed() {
        let (page, messages) = messages();
        let keep = messages.show(Severity::Info, "Keep", TempPolicy::Persistent);
        for round in 0..50 {
            let body = format!("#{round}");
            messages
                .show(Severity::Info, &body, TempPolicy::Persistent)
                .remove();
        }
        // The container and the message still shown.
        assert_eq!(page.node_count(), 2);

        keep.remove();
        assert_eq!(page.node_count(), 0);
        messages.show(Severity::Info, "Again", TempPolicy::Persistent);
        messages.clear();
        assert_eq!(page.node_count(), 0);
    }

    #[test]
    fn clear_without_container_is_harmless() {
        let (page, messages) = messages();
        messages.clear();
        assert!(page.body_children().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn auto_dismiss_races_with_click() {
        let (page, messages) = messages();
        let other = messages.show(Severity::Info, "Other", TempPolicy::Persistent);
        let timed = messages.show(
            Severity::Warning,
            "Timed",
            TempPolicy::AutoDismiss(Duration::from_secs(5)),
        );

        page.click(timed.element());
        assert!(!page.is_attached(timed.element()));

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(page.is_attached(other.element()));
        assert_eq!(page.count_by_id(CONTAINER_ID), 1);
    }
}
