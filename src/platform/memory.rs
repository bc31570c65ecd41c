use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;

use crate::error::PlatformError;
use crate::types::Permission;

use super::{NativeHandle, NativeOptions, NotificationPlatform, SharedHandle, WorkerRegistration};

/// How the platform answers delivery-worker registrations.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum WorkerSupport {
    #[default]
    Unsupported,
    Succeeds,
    Fails,
}

/// Scriptable in-process platform that records every notification it shows.
pub struct MemoryPlatform {
    state: Mutex<State>,
    shown: Arc<Mutex<Vec<Arc<MemoryNotification>>>>,
    requests: AtomicUsize,
    request_delay: Duration,
}

struct State {
    supported: bool,
    permission: Permission,
    can_request: bool,
    answer: Permission,
    workers: WorkerSupport,
    worker_listing: bool,
    fail_show: bool,
}

impl Default for MemoryPlatform {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                supported: true,
                permission: Permission::Default,
                can_request: true,
                answer: Permission::Granted,
                workers: WorkerSupport::Unsupported,
                worker_listing: true,
                fail_show: false,
            }),
            shown: Arc::new(Mutex::new(Vec::new())),
            requests: AtomicUsize::new(0),
            request_delay: Duration::ZERO,
        }
    }
}

impl MemoryPlatform {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform without any native notification support.
    #[must_use]
    pub fn unsupported() -> Self {
        let platform = Self::default();
        platform.state.lock().supported = false;
        platform
    }

    #[must_use]
    pub fn with_permission(self, permission: Permission) -> Self {
        self.state.lock().permission = permission;
        self
    }

    /// Outcome of the next permission prompts.
    #[must_use]
    pub fn answering(self, answer: Permission) -> Self {
        self.state.lock().answer = answer;
        self
    }

    #[must_use]
    pub fn without_permission_requests(self) -> Self {
        self.state.lock().can_request = false;
        self
    }

    #[must_use]
    pub fn with_workers(self, workers: WorkerSupport) -> Self {
        self.state.lock().workers = workers;
        self
    }

    /// Workers show notifications but never list them back.
    #[must_use]
    pub fn without_worker_listing(self) -> Self {
        self.state.lock().worker_listing = false;
        self
    }

    #[must_use]
    pub fn failing_show(self) -> Self {
        self.state.lock().fail_show = true;
        self
    }

    #[must_use]
    pub const fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn set_permission(&self, permission: Permission) {
        self.state.lock().permission = permission;
    }

    /// Every notification shown so far, directly or through a worker.
    #[must_use]
    pub fn notifications(&self) -> Vec<Arc<MemoryNotification>> {
        self.shown.lock().clone()
    }

    #[must_use]
    pub fn permission_requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn record(
        &self,
        title: &str,
        options: &NativeOptions,
        via_worker: bool,
    ) -> Arc<MemoryNotification> {
        record(&self.shown, title, options, via_worker)
    }
}

fn record(
    shown: &Mutex<Vec<Arc<MemoryNotification>>>,
    title: &str,
    options: &NativeOptions,
    via_worker: bool,
) -> Arc<MemoryNotification> {
    let notification = Arc::new(MemoryNotification {
        title: title.to_string(),
        options: options.clone(),
        via_worker,
        close_calls: AtomicUsize::new(0),
    });
    shown.lock().push(Arc::clone(&notification));
    trace!(title, via_worker, "memory notification shown");
    notification
}

#[async_trait]
impl NotificationPlatform for MemoryPlatform {
    fn is_supported(&self) -> bool {
        self.state.lock().supported
    }

    fn permission(&self) -> Permission {
        self.state.lock().permission
    }

    fn can_request_permission(&self) -> bool {
        self.state.lock().can_request
    }

    async fn request_permission(&self) -> Permission {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
        let mut state = self.state.lock();
        if state.permission == Permission::Default {
            state.permission = state.answer;
        }
        state.permission
    }

    fn show(&self, title: &str, options: &NativeOptions) -> Result<SharedHandle, PlatformError> {
        if self.state.lock().fail_show {
            return Err(PlatformError::Backend("memory platform set to fail".to_string()));
        }
        let notification: SharedHandle = self.record(title, options, false);
        Ok(notification)
    }

    fn supports_workers(&self) -> bool {
        self.state.lock().workers != WorkerSupport::Unsupported
    }

    async fn register_worker(
        &self,
        path: &str,
    ) -> Result<Arc<dyn WorkerRegistration>, PlatformError> {
        let (workers, listing) = {
            let state = self.state.lock();
            (state.workers, state.worker_listing)
        };
        match workers {
            WorkerSupport::Unsupported => Err(PlatformError::Unsupported("delivery workers")),
            WorkerSupport::Fails => Err(PlatformError::WorkerRegistration(format!(
                "cannot load {path}"
            ))),
            WorkerSupport::Succeeds => {
                let scope = path
                    .rsplit_once('/')
                    .map_or_else(|| "/".to_string(), |(dir, _)| format!("{dir}/"));
                let worker: Arc<dyn WorkerRegistration> = Arc::new(MemoryWorker {
                    scope,
                    shown: Arc::clone(&self.shown),
                    own: Mutex::new(Vec::new()),
                    listing,
                });
                Ok(worker)
            }
        }
    }
}

/// A notification recorded by [`MemoryPlatform`].
#[derive(Debug)]
pub struct MemoryNotification {
    pub title: String,
    pub options: NativeOptions,
    pub via_worker: bool,
    close_calls: AtomicUsize,
}

impl MemoryNotification {
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.close_calls() > 0
    }

    #[must_use]
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

impl NativeHandle for MemoryNotification {
    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}

struct MemoryWorker {
    scope: String,
    shown: Arc<Mutex<Vec<Arc<MemoryNotification>>>>,
    own: Mutex<Vec<Arc<MemoryNotification>>>,
    listing: bool,
}

#[async_trait]
impl WorkerRegistration for MemoryWorker {
    fn scope(&self) -> &str {
        &self.scope
    }

    async fn show_notification(
        &self,
        title: &str,
        options: &NativeOptions,
    ) -> Result<(), PlatformError> {
        let notification = record(&self.shown, title, options, true);
        self.own.lock().push(notification);
        Ok(())
    }

    async fn notifications(&self) -> Result<Vec<SharedHandle>, PlatformError> {
        if !self.listing {
            return Ok(Vec::new());
        }
        Ok(self
            .own
            .lock()
            .iter()
            .filter(|n| !n.is_closed())
            .map(|n| Arc::clone(n) as SharedHandle)
            .collect())
    }
}
