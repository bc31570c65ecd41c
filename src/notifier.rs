//! Public entry point of the widget.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::{Settings, SetupOptions};
use crate::container::ContainerManager;
use crate::context::Context;
use crate::message::{MessageHandle, Messages};
use crate::page::Page;
use crate::platform::NotificationPlatform;
use crate::system::{PermissionHooks, SystemNotifier};
use crate::telemetry::verbose;
use crate::types::{Severity, TempPolicy};

/// On-page notifications, with a [`SystemNotifier`] for native ones.
#[derive(Clone)]
pub struct Notifier {
    ctx: Arc<Context>,
    messages: Messages,
    system: SystemNotifier,
}

pub struct NotifierBuilder {
    page: Arc<dyn Page>,
    platform: Arc<dyn NotificationPlatform>,
    options: SetupOptions,
    hooks: PermissionHooks,
}

impl NotifierBuilder {
    #[must_use]
    pub fn new(page: Arc<dyn Page>, platform: Arc<dyn NotificationPlatform>) -> Self {
        Self {
            page,
            platform,
            options: SetupOptions::default(),
            hooks: PermissionHooks::default(),
        }
    }

    #[must_use]
    pub fn options(mut self, options: SetupOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn hooks(mut self, hooks: PermissionHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Build the notifier. A delivery worker path among the options starts
    /// its registration right away.
    #[must_use]
    pub fn build(self) -> Notifier {
        let mut settings = Settings::default();
        settings.merge(&self.options);
        let ctx = Context::new(self.page, settings);
        let messages = Messages::new(Arc::clone(&ctx), ContainerManager::new(Arc::clone(&ctx)));
        let system = SystemNotifier::new(
            Arc::clone(&ctx),
            messages.clone(),
            self.platform,
            self.hooks,
        );
        let notifier = Notifier {
            ctx,
            messages,
            system,
        };
        notifier.register_configured_worker(&self.options);
        notifier
    }
}

impl Notifier {
    #[must_use]
    pub fn builder(
        page: Arc<dyn Page>,
        platform: Arc<dyn NotificationPlatform>,
    ) -> NotifierBuilder {
        NotifierBuilder::new(page, platform)
    }

    pub fn info(&self, msg: &str, temp: impl Into<TempPolicy>) -> MessageHandle {
        self.show(Severity::Info, msg, temp)
    }

    pub fn success(&self, msg: &str, temp: impl Into<TempPolicy>) -> MessageHandle {
        self.show(Severity::Success, msg, temp)
    }

    pub fn warning(&self, msg: &str, temp: impl Into<TempPolicy>) -> MessageHandle {
        self.show(Severity::Warning, msg, temp)
    }

    pub fn error(&self, msg: &str, temp: impl Into<TempPolicy>) -> MessageHandle {
        self.show(Severity::Error, msg, temp)
    }

    /// Append one message to the container, creating it if needed.
    pub fn show(
        &self,
        severity: Severity,
        msg: &str,
        temp: impl Into<TempPolicy>,
    ) -> MessageHandle {
        self.messages.show(severity, msg, temp.into())
    }

    /// Remove the container and every message in it.
    pub fn clear(&self) {
        self.messages.clear();
    }

    /// Merge `options` into the current settings.
    ///
    /// Returns the registration task when the options name a delivery worker
    /// and one could be started.
    pub fn setup(&self, options: &SetupOptions) -> Option<JoinHandle<()>> {
        let settings = self.ctx.settings.apply(options);
        verbose!(
            self.ctx.settings,
            app_title = %settings.app_title,
            z_index = settings.z_index,
            "notifier settings updated"
        );
        self.register_configured_worker(options)
    }

    #[must_use]
    pub fn settings(&self) -> Settings {
        self.ctx.settings.snapshot()
    }

    #[must_use]
    pub const fn system(&self) -> &SystemNotifier {
        &self.system
    }

    fn register_configured_worker(&self, options: &SetupOptions) -> Option<JoinHandle<()>> {
        let path = options
            .service_worker_path
            .as_deref()
            .filter(|path| !path.is_empty())?;
        self.system.register_worker(path)
    }
}
