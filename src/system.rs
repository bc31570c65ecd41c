//! Native notification delivery with on-page fallback.
//!
//! Every alert re-reads the platform permission and walks the same decision
//! tree: unsupported or denied platforms fall back to an on-page message, an
//! undecided permission is requested once before delivering, and a granted
//! permission delivers natively, through the delivery worker when one is
//! registered.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::config::Settings;
use crate::context::Context;
use crate::message::{MessageHandle, Messages};
use crate::platform::{NativeOptions, NotificationPlatform, SharedHandle, WorkerRegistration};
use crate::telemetry::verbose;
use crate::types::{Permission, Severity, TempPolicy};

pub type Hook = Arc<dyn Fn() + Send + Sync>;

/// Callbacks run when a permission request resolves.
#[derive(Clone, Default)]
pub struct PermissionHooks {
    on_granted: Option<Hook>,
    on_denied: Option<Hook>,
}

impl PermissionHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_granted(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_granted = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn on_denied(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_denied = Some(Arc::new(hook));
        self
    }

    /// Hooks of `self`, completed by `fallback` where missing.
    fn or(&self, fallback: &Self) -> Self {
        Self {
            on_granted: self.on_granted.clone().or_else(|| fallback.on_granted.clone()),
            on_denied: self.on_denied.clone().or_else(|| fallback.on_denied.clone()),
        }
    }
}

impl fmt::Debug for PermissionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionHooks")
            .field("on_granted", &self.on_granted.is_some())
            .field("on_denied", &self.on_denied.is_some())
            .finish()
    }
}

/// One system notification request.
#[derive(Clone, Debug)]
pub struct Alert {
    pub severity: Severity,
    pub body: String,
    pub temp: TempPolicy,
    pub title: Option<String>,
    pub icon: Option<String>,
}

impl Alert {
    #[must_use]
    pub fn new(severity: Severity, body: impl Into<String>) -> Self {
        Self {
            severity,
            body: body.into(),
            temp: TempPolicy::default(),
            title: None,
            icon: None,
        }
    }

    #[must_use]
    pub fn temp(mut self, temp: impl Into<TempPolicy>) -> Self {
        self.temp = temp.into();
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    fn effective_title(&self, settings: &Settings) -> String {
        match self.title.as_deref().filter(|t| !t.is_empty()) {
            Some(title) => title.to_string(),
            None if settings.app_title.trim().is_empty() => self.severity.to_string(),
            None => format!("{}: {}", settings.app_title.trim(), self.severity),
        }
    }

    fn native_options(&self, settings: &Settings) -> NativeOptions {
        let icon = self
            .icon
            .as_deref()
            .filter(|i| !i.is_empty())
            .or_else(|| settings.app_icon.as_deref().filter(|i| !i.is_empty()))
            .map(str::to_string);
        NativeOptions {
            body: self.body.clone(),
            icon,
            require_interaction: self.temp.requires_interaction(),
        }
    }
}

/// How an alert ended up being shown.
#[derive(Debug)]
pub enum Delivery {
    Native,
    OnPage(MessageHandle),
}

impl Delivery {
    #[must_use]
    pub const fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }
}

/// Decision engine for system notifications.
#[derive(Clone)]
pub struct SystemNotifier {
    inner: Arc<Inner>,
}

struct Inner {
    ctx: Arc<Context>,
    messages: Messages,
    platform: Arc<dyn NotificationPlatform>,
    has_delivery_worker: AtomicBool,
    worker: Mutex<Option<Arc<dyn WorkerRegistration>>>,
    pool: Mutex<Vec<SharedHandle>>,
    hooks: RwLock<PermissionHooks>,
    request_gate: tokio::sync::Mutex<()>,
}

impl SystemNotifier {
    #[must_use]
    pub fn new(
        ctx: Arc<Context>,
        messages: Messages,
        platform: Arc<dyn NotificationPlatform>,
        hooks: PermissionHooks,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                ctx,
                messages,
                platform,
                has_delivery_worker: AtomicBool::new(false),
                worker: Mutex::new(None),
                pool: Mutex::new(Vec::new()),
                hooks: RwLock::new(hooks),
                request_gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn info(&self, msg: impl Into<String>, temp: impl Into<TempPolicy>) {
        self.send(Alert::new(Severity::Info, msg).temp(temp));
    }

    pub fn success(&self, msg: impl Into<String>, temp: impl Into<TempPolicy>) {
        self.send(Alert::new(Severity::Success, msg).temp(temp));
    }

    pub fn warning(&self, msg: impl Into<String>, temp: impl Into<TempPolicy>) {
        self.send(Alert::new(Severity::Warning, msg).temp(temp));
    }

    pub fn error(&self, msg: impl Into<String>, temp: impl Into<TempPolicy>) {
        self.send(Alert::new(Severity::Error, msg).temp(temp));
    }

    /// Fire-and-forget [`SystemNotifier::dispatch`].
    ///
    /// Without a runtime the decision is taken synchronously: granted alerts
    /// are shown directly, and an undecided permission cannot be requested.
    pub fn send(&self, alert: Alert) {
        match Handle::try_current() {
            Ok(handle) => {
                let this = self.clone();
                handle.spawn(async move {
                    this.dispatch(alert).await;
                });
            }
            Err(_) => {
                self.dispatch_now(&alert);
            }
        }
    }

    fn dispatch_now(&self, alert: &Alert) -> Delivery {
        let inner = &self.inner;
        let platform = &inner.platform;

        if !platform.is_supported() {
            let delivery = self.on_page(alert);
            verbose!(inner.ctx.settings, "System Notification not supported.");
            return delivery;
        }

        match platform.permission() {
            Permission::Granted => {
                let settings = inner.ctx.settings.snapshot();
                let title = alert.effective_title(&settings);
                let options = alert.native_options(&settings);
                self.show_direct(alert, &title, &options)
            }
            Permission::Default if platform.can_request_permission() => {
                warn!(severity = %alert.severity, "no async runtime, permission request skipped");
                self.on_page(alert)
            }
            _ => {
                let delivery = self.on_page(alert);
                verbose!(inner.ctx.settings, "System Notification not allowed.");
                delivery
            }
        }
    }

    /// Deliver one alert, natively when the platform allows it, on the page
    /// otherwise.
    pub async fn dispatch(&self, alert: Alert) -> Delivery {
        let inner = &self.inner;
        let platform = &inner.platform;

        if !platform.is_supported() {
            let delivery = self.on_page(&alert);
            verbose!(inner.ctx.settings, "System Notification not supported.");
            return delivery;
        }

        match platform.permission() {
            Permission::Granted => self.notify_system(&alert).await,
            Permission::Default if platform.can_request_permission() => {
                match self.request_once().await {
                    Permission::Granted => self.notify_system(&alert).await,
                    _ => self.on_page(&alert),
                }
            }
            _ => {
                let delivery = self.on_page(&alert);
                verbose!(inner.ctx.settings, "System Notification not allowed.");
                delivery
            }
        }
    }

    /// Close every pooled native notification, or clear the page when
    /// notifications are not granted.
    pub fn clear(&self) {
        let inner = &self.inner;
        if inner.platform.is_supported() && inner.platform.permission() == Permission::Granted {
            let pool = inner.pool.lock().clone();
            for handle in &pool {
                handle.close();
            }
            verbose!(inner.ctx.settings, closed = pool.len(), "system notifications cleared");
        } else {
            inner.messages.clear();
        }
    }

    /// Ask for permission when it has not been decided yet.
    ///
    /// `overrides` take precedence over the registered hooks for this request
    /// only. Resolves to the outcome when a request was actually issued.
    pub async fn request_permission(&self, overrides: PermissionHooks) -> Option<Permission> {
        let inner = &self.inner;
        let platform = &inner.platform;
        if !platform.is_supported() || !platform.can_request_permission() {
            verbose!(inner.ctx.settings, "System Notification not supported.");
            return None;
        }

        let _gate = inner.request_gate.lock().await;
        let current = platform.permission();
        if current != Permission::Default {
            verbose!(
                inner.ctx.settings,
                "Permission already requested: {}",
                current.as_str().to_ascii_uppercase()
            );
            return None;
        }

        let permission = platform.request_permission().await;
        let hooks = overrides.or(&inner.hooks.read());
        self.permission_resolved(permission, &hooks);
        Some(permission)
    }

    pub fn on_permission_granted(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.inner.hooks.write().on_granted = Some(Arc::new(hook));
    }

    pub fn on_permission_denied(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.inner.hooks.write().on_denied = Some(Arc::new(hook));
    }

    /// Register the delivery worker at `path` in the background.
    ///
    /// Returns `None` when nothing was started: the platform has no worker
    /// support or no runtime is available.
    pub fn register_worker(&self, path: &str) -> Option<JoinHandle<()>> {
        let inner = &self.inner;
        if !inner.platform.supports_workers() {
            verbose!(inner.ctx.settings, "serviceWorker not supported.");
            return None;
        }
        let Ok(handle) = Handle::try_current() else {
            warn!(path, "no async runtime, delivery worker not registered");
            return None;
        };

        let this = self.clone();
        let path = path.to_string();
        Some(handle.spawn(async move {
            let inner = &this.inner;
            match inner.platform.register_worker(&path).await {
                Ok(registration) => {
                    let scope = registration.scope().to_string();
                    *inner.worker.lock() = Some(registration);
                    inner.has_delivery_worker.store(true, Ordering::SeqCst);
                    verbose!(
                        inner.ctx.settings,
                        scope = %scope,
                        "serviceWorker registration successful having scope: {scope}"
                    );
                }
                Err(err) => {
                    inner.has_delivery_worker.store(false, Ordering::SeqCst);
                    *inner.worker.lock() = None;
                    verbose!(
                        inner.ctx.settings,
                        error = %err,
                        "serviceWorker registration warning: {err}"
                    );
                }
            }
        }))
    }

    #[must_use]
    pub fn has_delivery_worker(&self) -> bool {
        self.inner.has_delivery_worker.load(Ordering::SeqCst)
    }

    /// Number of native handles ever delivered; the pool is never compacted.
    #[must_use]
    pub fn pool_len(&self) -> usize {
        self.inner.pool.lock().len()
    }

    /// Issue a single platform request, even when several alerts wait on it.
    async fn request_once(&self) -> Permission {
        let inner = &self.inner;
        let _gate = inner.request_gate.lock().await;
        let current = inner.platform.permission();
        if current != Permission::Default {
            return current;
        }
        let permission = inner.platform.request_permission().await;
        let hooks = inner.hooks.read().clone();
        self.permission_resolved(permission, &hooks);
        permission
    }

    fn permission_resolved(&self, permission: Permission, hooks: &PermissionHooks) {
        let settings = &self.inner.ctx.settings;
        match permission {
            Permission::Granted => {
                verbose!(settings, "Permission Granted !");
                if let Some(hook) = &hooks.on_granted {
                    hook();
                }
            }
            Permission::Denied => {
                verbose!(settings, "Permission Denied !");
                if let Some(hook) = &hooks.on_denied {
                    hook();
                }
            }
            Permission::Default => {}
        }
    }

    async fn notify_system(&self, alert: &Alert) -> Delivery {
        let inner = &self.inner;
        let settings = inner.ctx.settings.snapshot();
        let title = alert.effective_title(&settings);
        let options = alert.native_options(&settings);

        let worker = if inner.has_delivery_worker.load(Ordering::SeqCst) {
            inner.worker.lock().clone()
        } else {
            None
        };

        if let Some(worker) = worker {
            if let Err(err) = worker.show_notification(&title, &options).await {
                verbose!(
                    inner.ctx.settings,
                    error = %err,
                    "delivery worker failed to show notification"
                );
                return self.on_page(alert);
            }
            match worker.notifications().await {
                Ok(mut shown) => {
                    if let Some(handle) = shown.pop() {
                        self.track(handle, alert.temp);
                    }
                }
                Err(err) => {
                    verbose!(
                        inner.ctx.settings,
                        error = %err,
                        "delivery worker failed to list notifications"
                    );
                }
            }
            return Delivery::Native;
        }

        self.show_direct(alert, &title, &options)
    }

    fn show_direct(&self, alert: &Alert, title: &str, options: &NativeOptions) -> Delivery {
        match self.inner.platform.show(title, options) {
            Ok(handle) => {
                self.track(handle, alert.temp);
                Delivery::Native
            }
            Err(err) => {
                verbose!(self.inner.ctx.settings, error = %err, "native notification failed");
                self.on_page(alert)
            }
        }
    }

    /// Pool the handle and schedule its auto-close.
    fn track(&self, handle: SharedHandle, temp: TempPolicy) {
        if let Some(delay) = temp.auto_dismiss() {
            match Handle::try_current() {
                Ok(runtime) => {
                    let handle = Arc::clone(&handle);
                    runtime.spawn(async move {
                        tokio::time::sleep(delay).await;
                        handle.close();
                    });
                }
                Err(_) => warn!("no async runtime, native auto-close disabled"),
            }
        }
        self.inner.pool.lock().push(handle);
    }

    fn on_page(&self, alert: &Alert) -> Delivery {
        Delivery::OnPage(
            self.inner
                .messages
                .show(alert.severity, &alert.body, alert.temp),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Alert, PermissionHooks, SystemNotifier};
    use crate::config::{Settings, SetupOptions};
    use crate::container::{CONTAINER_ID, ContainerManager};
    use crate::context::Context;
    use crate::message::Messages;
    use crate::page::memory::MemoryPage;
    use crate::platform::memory::MemoryPlatform;
    use crate::types::{Permission, Severity, TempPolicy};
    use std::sync::Arc;
    use std::time::Duration;

    fn system(platform: MemoryPlatform) -> (MemoryPage, Arc<MemoryPlatform>, SystemNotifier) {
        let page = MemoryPage::new();
        let platform = Arc::new(platform);
        let mut settings = Settings::default();
        settings.merge(&SetupOptions::new().app_title("Shop").fade(Duration::ZERO));
        let ctx = Context::new(Arc::new(page.clone()), settings);
        let messages = Messages::new(Arc::clone(&ctx), ContainerManager::new(Arc::clone(&ctx)));
        let system = SystemNotifier::new(ctx, messages, platform.clone(), PermissionHooks::new());
        (page, platform, system)
    }

    #[test]
    fn granted_alert_is_native_without_runtime() {
        let (page, platform, system) =
            system(MemoryPlatform::new().with_permission(Permission::Granted));
        system.error("Failed", false);

        let shown = platform.notifications();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "Shop: Error");
        assert!(shown[0].options.require_interaction);
        assert_eq!(system.pool_len(), 1);
        assert_eq!(page.count_by_id(CONTAINER_ID), 0);
    }

    #[test]
    fn undecided_permission_without_runtime_stays_on_page() {
        let (page, platform, system) = system(MemoryPlatform::new());
        system.info("Hello", true);
        assert_eq!(platform.permission_requests(), 0);
        assert!(platform.notifications().is_empty());
        assert_eq!(page.count_by_id(CONTAINER_ID), 1);
    }

    #[test]
    fn denied_and_unsupported_without_runtime_stay_on_page() {
        for platform in [
            MemoryPlatform::new().with_permission(Permission::Denied),
            MemoryPlatform::unsupported(),
        ] {
            let (page, platform, system) = system(platform);
            system.warning("Careful", false);
            assert!(platform.notifications().is_empty());
            assert_eq!(page.count_by_id(CONTAINER_ID), 1);
        }
    }

    #[test]
    fn clear_after_revocation_clears_the_page() {
        let (page, platform, system) =
            system(MemoryPlatform::new().with_permission(Permission::Granted));
        system.success("Native", false);
        platform.set_permission(Permission::Denied);
        system.success("On page", false);
        assert_eq!(page.count_by_id(CONTAINER_ID), 1);

        system.clear();
        assert_eq!(page.count_by_id(CONTAINER_ID), 0);
        assert!(!platform.notifications()[0].is_closed());
    }

    #[test]
    fn title_defaults_to_app_title_and_severity() {
        let mut settings = Settings::default();
        settings.merge(&SetupOptions::new().app_title("Shop"));
        let alert = Alert::new(Severity::Warning, "Low stock");
        assert_eq!(alert.effective_title(&settings), "Shop: Warning");
        assert_eq!(
            alert.clone().title("Custom").effective_title(&settings),
            "Custom"
        );
    }

    #[test]
    fn title_without_app_title_is_the_severity() {
        let alert = Alert::new(Severity::Error, "Boom");
        assert_eq!(alert.effective_title(&Settings::default()), "Error");
    }

    #[test]
    fn icon_falls_back_to_settings() {
        let mut settings = Settings::default();
        settings.merge(&SetupOptions::new().app_icon("/app.png"));
        let alert = Alert::new(Severity::Info, "Hi");
        assert_eq!(
            alert.native_options(&settings).icon.as_deref(),
            Some("/app.png")
        );
        assert_eq!(
            alert
                .icon("/own.png")
                .native_options(&settings)
                .icon
                .as_deref(),
            Some("/own.png")
        );
    }

    #[test]
    fn persistent_alert_requires_interaction() {
        let settings = Settings::default();
        let persistent = Alert::new(Severity::Error, "Failed").temp(false);
        assert!(persistent.native_options(&settings).require_interaction);
        let timed = Alert::new(Severity::Info, "Saved").temp(TempPolicy::from(3_u64));
        assert!(!timed.native_options(&settings).require_interaction);
    }
}
