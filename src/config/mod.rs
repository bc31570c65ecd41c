use std::path::Path;
use std::time::Duration;

use parking_lot::RwLock;

use crate::Result;
use crate::error::Error as NoticeError;
use crate::types::{HorizontalAnchor, VerticalAnchor};

mod defaults;
mod env;
mod raw;
mod serde;

pub(crate) use self::serde::HumantimeDuration;
pub use raw::{PositionOptions, SetupOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub app_title: String,
    pub app_icon: Option<String>,
    pub position: Position,
    pub z_index: i32,
    pub container_layout: String,
    pub message_layout: String,
    pub service_worker_path: Option<String>,
    pub verbose: bool,
    pub fade: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub ver: VerticalAnchor,
    pub hor: HorizontalAnchor,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_title: String::new(),
            app_icon: None,
            position: Position::default(),
            z_index: defaults::default_z_index(),
            container_layout: defaults::default_container_layout(),
            message_layout: defaults::default_message_layout(),
            service_worker_path: None,
            verbose: false,
            fade: defaults::default_fade(),
        }
    }
}

impl Settings {
    /// Sparse merge: only the options that are present (and non-empty for
    /// strings) overwrite the current values.
    pub fn merge(&mut self, options: &SetupOptions) {
        if let Some(title) = non_empty(options.app_title.as_ref()) {
            self.app_title = title.to_string();
        }
        if let Some(icon) = non_empty(options.app_icon.as_ref()) {
            self.app_icon = Some(icon.to_string());
        }
        if let Some(layout) = non_empty(options.container_layout.as_ref()) {
            self.container_layout = layout.to_string();
        }
        if let Some(layout) = non_empty(options.message_layout.as_ref()) {
            self.message_layout = layout.to_string();
        }
        if let Some(position) = options.position {
            if let Some(ver) = position.ver {
                self.position.ver = ver;
            }
            if let Some(hor) = position.hor {
                self.position.hor = hor;
            }
        }
        if let Some(z_index) = options.z_index {
            self.z_index = z_index;
        }
        if let Some(path) = non_empty(options.service_worker_path.as_ref()) {
            self.service_worker_path = Some(path.to_string());
        }
        if let Some(verbose) = options.verbose_mode {
            self.verbose = verbose;
        }
        if let Some(fade) = options.fade {
            self.fade = fade;
        }
    }
}

impl SetupOptions {
    /// Load options from a TOML file (optional) and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration file cannot be parsed or when
    /// an environment override holds an invalid value.
    pub fn from_env_and_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut options = raw::load(path).map_err(NoticeError::from)?;
        options.apply_env_overrides().map_err(NoticeError::from)?;
        Ok(options)
    }
}

/// Process-wide settings, mutated only through [`SettingsStore::apply`].
#[derive(Debug, Default)]
pub struct SettingsStore {
    inner: RwLock<Settings>,
}

impl SettingsStore {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Settings {
        self.inner.read().clone()
    }

    pub fn apply(&self, options: &SetupOptions) -> Settings {
        let mut settings = self.inner.write();
        settings.merge(options);
        settings.clone()
    }

    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.inner.read().verbose
    }

    #[must_use]
    pub fn fade(&self) -> Duration {
        self.inner.read().fade
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{Settings, SettingsStore, SetupOptions};
    use crate::types::{HorizontalAnchor, VerticalAnchor};
    use std::time::Duration;

    #[test]
    fn defaults_match_widget_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.z_index, 2048);
        assert_eq!(settings.position.ver, VerticalAnchor::Bottom);
        assert_eq!(settings.position.hor, HorizontalAnchor::Right);
        assert_eq!(settings.fade, Duration::from_millis(200));
        assert!(!settings.verbose);
        assert!(settings.app_icon.is_none());
    }

    #[test]
    fn setup_twice_applies_the_union() {
        let store = SettingsStore::default();
        store.apply(&SetupOptions::new().app_title("Shop").z_index(10));
        let settings = store.apply(
            &SetupOptions::new()
                .app_icon("/icon.png")
                .vertical(VerticalAnchor::Top),
        );
        assert_eq!(settings.app_title, "Shop");
        assert_eq!(settings.z_index, 10);
        assert_eq!(settings.app_icon.as_deref(), Some("/icon.png"));
        assert_eq!(settings.position.ver, VerticalAnchor::Top);
        assert_eq!(settings.position.hor, HorizontalAnchor::Right);
    }

    #[test]
    fn empty_strings_do_not_overwrite() {
        let store = SettingsStore::default();
        store.apply(&SetupOptions::new().app_title("Shop"));
        let settings = store.apply(&SetupOptions::new().app_title(""));
        assert_eq!(settings.app_title, "Shop");
    }

    #[test]
    fn verbose_mode_applies_whenever_present() {
        let store = SettingsStore::default();
        store.apply(&SetupOptions::new().verbose_mode(true));
        assert!(store.is_verbose());
        store.apply(&SetupOptions::new().app_title("x"));
        assert!(store.is_verbose());
        store.apply(&SetupOptions::new().verbose_mode(false));
        assert!(!store.is_verbose());
    }
}
