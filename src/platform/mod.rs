//! Native notification capability of the host.
//!
//! A [`NotificationPlatform`] answers permission questions, shows native
//! notifications directly and, when it supports them, registers delivery
//! workers that show and enumerate notifications on the page's behalf.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::PlatformError;
use crate::types::Permission;

#[cfg(all(feature = "desktop", target_os = "linux"))]
pub mod desktop;
pub mod memory;

/// Options handed to the platform with every native notification.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeOptions {
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Keep the notification on screen until the user dismisses it.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub require_interaction: bool,
}

/// A live native notification. Closing an already-closed handle is a no-op.
pub trait NativeHandle: Send + Sync + fmt::Debug {
    fn close(&self);
}

pub type SharedHandle = Arc<dyn NativeHandle>;

#[async_trait]
pub trait NotificationPlatform: Send + Sync {
    /// Whether native notifications exist at all on this platform.
    fn is_supported(&self) -> bool;

    /// Current permission, queried fresh on every call.
    fn permission(&self) -> Permission;

    fn can_request_permission(&self) -> bool;

    async fn request_permission(&self) -> Permission;

    fn show(&self, title: &str, options: &NativeOptions)
    -> Result<SharedHandle, PlatformError>;

    fn supports_workers(&self) -> bool {
        false
    }

    async fn register_worker(
        &self,
        path: &str,
    ) -> Result<Arc<dyn WorkerRegistration>, PlatformError> {
        let _ = path;
        Err(PlatformError::Unsupported("delivery workers"))
    }
}

/// An active background delivery worker.
#[async_trait]
pub trait WorkerRegistration: Send + Sync {
    fn scope(&self) -> &str;

    async fn show_notification(
        &self,
        title: &str,
        options: &NativeOptions,
    ) -> Result<(), PlatformError>;

    /// Notifications currently shown through this worker, oldest first.
    async fn notifications(&self) -> Result<Vec<SharedHandle>, PlatformError>;
}
