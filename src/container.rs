use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::context::Context;
use crate::page::ElementId;

/// Reserved id of the on-page container.
pub const CONTAINER_ID: &str = "__notifycontainer";

/// Owns the single fixed-position container messages are appended to.
#[derive(Clone)]
pub struct ContainerManager {
    ctx: Arc<Context>,
    create: Arc<Mutex<()>>,
}

impl ContainerManager {
    #[must_use]
    pub fn new(ctx: Arc<Context>) -> Self {
        Self {
            ctx,
            create: Arc::new(Mutex::new(())),
        }
    }

    /// The attached container, created from the container template on first
    /// use. Repeated calls return the same element.
    pub fn container(&self) -> ElementId {
        let _guard = self.create.lock();
        if let Some(existing) = self.current() {
            return existing;
        }

        let settings = self.ctx.settings.snapshot();
        let page = &self.ctx.page;
        let container = page.instantiate(&settings.container_layout);
        page.set_id(container, CONTAINER_ID);

        let z_index = settings.z_index.to_string();
        page.apply_style(
            container,
            &[
                ("z-index", z_index.as_str()),
                ("position", "fixed"),
                (settings.position.ver.as_str(), "0"),
                (settings.position.hor.as_str(), "0"),
            ],
        );
        page.append_to_body(container);
        trace!(%container, "notification container created");
        container
    }

    /// The attached container, without creating one.
    #[must_use]
    pub fn current(&self) -> Option<ElementId> {
        self.ctx.page.find_by_id(CONTAINER_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::{CONTAINER_ID, ContainerManager};
    use crate::config::{Settings, SetupOptions};
    use crate::context::Context;
    use crate::page::memory::MemoryPage;
    use crate::types::{HorizontalAnchor, VerticalAnchor};
    use std::sync::Arc;

    fn manager(settings: Settings) -> (MemoryPage, ContainerManager) {
        let page = MemoryPage::new();
        let ctx = Context::new(Arc::new(page.clone()), settings);
        (page, ContainerManager::new(ctx))
    }

    #[test]
    fn container_is_created_once() {
        let (page, manager) = manager(Settings::default());
        assert_eq!(manager.current(), None);
        let first = manager.container();
        let second = manager.container();
        assert_eq!(first, second);
        assert_eq!(page.count_by_id(CONTAINER_ID), 1);
        assert_eq!(page.body_children(), vec![first]);
    }

    #[test]
    fn container_is_positioned_from_settings() {
        let mut settings = Settings::default();
        settings.merge(
            &SetupOptions::new()
                .vertical(VerticalAnchor::Top)
                .horizontal(HorizontalAnchor::Left)
                .z_index(99),
        );
        let (page, manager) = manager(settings.clone());
        let container = manager.container();
        assert_eq!(page.style(container, "position").as_deref(), Some("fixed"));
        assert_eq!(page.style(container, "top").as_deref(), Some("0"));
        assert_eq!(page.style(container, "left").as_deref(), Some("0"));
        assert_eq!(page.style(container, "bottom"), None);
        assert_eq!(page.style(container, "z-index").as_deref(), Some("99"));
        assert_eq!(page.template(container), Some(settings.container_layout));
    }

    #[test]
    fn concurrent_callers_share_one_container() {
        let (page, manager) = manager(Settings::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                std::thread::spawn(move || manager.container())
            })
            .collect();
        let ids: Vec<_> = handles
            .into_iter()
            .filter_map(|handle| handle.join().ok())
            .collect();
        assert_eq!(ids.len(), 8);
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(page.count_by_id(CONTAINER_ID), 1);
    }
}
