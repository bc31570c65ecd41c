use std::fmt;

use async_trait::async_trait;
use notify_rust::{Notification, NotificationHandle, Timeout};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::PlatformError;
use crate::types::Permission;

use super::{NativeHandle, NativeOptions, NotificationPlatform, SharedHandle};

/// Freedesktop notifications through the session bus.
#[derive(Clone, Debug)]
pub struct DesktopPlatform {
    app_name: String,
}

impl DesktopPlatform {
    #[must_use]
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Default for DesktopPlatform {
    fn default() -> Self {
        Self::new("notice")
    }
}

#[async_trait]
impl NotificationPlatform for DesktopPlatform {
    fn is_supported(&self) -> bool {
        true
    }

    // The desktop has no permission model.
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn can_request_permission(&self) -> bool {
        false
    }

    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    fn show(&self, title: &str, options: &NativeOptions) -> Result<SharedHandle, PlatformError> {
        let mut notification = Notification::new();
        notification
            .appname(&self.app_name)
            .summary(title)
            .body(&options.body);
        if let Some(icon) = &options.icon {
            notification.icon(icon);
        }
        if options.require_interaction {
            notification.timeout(Timeout::Never);
        }

        let handle = notification
            .show()
            .map_err(|err| PlatformError::Backend(err.to_string()))?;
        let id = handle.id();
        debug!(id, title, "desktop notification shown");
        Ok(std::sync::Arc::new(DesktopHandle {
            id,
            handle: Mutex::new(Some(handle)),
        }))
    }
}

struct DesktopHandle {
    id: u32,
    handle: Mutex<Option<NotificationHandle>>,
}

impl NativeHandle for DesktopHandle {
    fn close(&self) {
        match self.handle.lock().take() {
            Some(handle) => handle.close(),
            None => debug!(id = self.id, "desktop notification already closed"),
        }
    }
}

impl fmt::Debug for DesktopHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesktopHandle")
            .field("id", &self.id)
            .field("open", &self.handle.lock().is_some())
            .finish()
    }
}
