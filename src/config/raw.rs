use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::error::ConfigError;
use crate::types::{HorizontalAnchor, VerticalAnchor};

use super::HumantimeDuration;
use super::env::{env_bool, env_duration, env_parse, env_string};

pub(super) fn load(path: impl AsRef<Path>) -> std::result::Result<SetupOptions, ConfigError> {
    let mut builder = ::config::Config::builder();
    let path = path.as_ref();
    builder = builder.add_source(::config::File::from(path).required(false));
    builder = builder.add_source(
        ::config::Environment::with_prefix("NOTICE")
            .separator("__")
            .try_parsing(true),
    );

    builder
        .build()
        .map_err(|err| ConfigError::Other(err.to_string()))?
        .try_deserialize()
        .map_err(|err| ConfigError::Parse(err.to_string()))
}

/// Sparse set of settings overrides passed to `setup`.
///
/// Every field is optional; absent fields (and empty strings) leave the
/// current setting untouched. Unknown keys are ignored when deserializing.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SetupOptions {
    pub app_title: Option<String>,
    pub app_icon: Option<String>,
    pub container_layout: Option<String>,
    pub message_layout: Option<String>,
    pub position: Option<PositionOptions>,
    /// Accepts `2048` as well as `"2048"`.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub z_index: Option<i32>,
    pub service_worker_path: Option<String>,
    pub verbose_mode: Option<bool>,
    #[serde_as(as = "Option<HumantimeDuration>")]
    pub fade: Option<Duration>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PositionOptions {
    pub ver: Option<VerticalAnchor>,
    pub hor: Option<HorizontalAnchor>,
}

impl SetupOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn app_title(mut self, title: impl Into<String>) -> Self {
        self.app_title = Some(title.into());
        self
    }

    #[must_use]
    pub fn app_icon(mut self, icon: impl Into<String>) -> Self {
        self.app_icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn container_layout(mut self, layout: impl Into<String>) -> Self {
        self.container_layout = Some(layout.into());
        self
    }

    #[must_use]
    pub fn message_layout(mut self, layout: impl Into<String>) -> Self {
        self.message_layout = Some(layout.into());
        self
    }

    #[must_use]
    pub fn vertical(mut self, ver: VerticalAnchor) -> Self {
        self.position.get_or_insert_with(PositionOptions::default).ver = Some(ver);
        self
    }

    #[must_use]
    pub fn horizontal(mut self, hor: HorizontalAnchor) -> Self {
        self.position.get_or_insert_with(PositionOptions::default).hor = Some(hor);
        self
    }

    #[must_use]
    pub const fn z_index(mut self, z_index: i32) -> Self {
        self.z_index = Some(z_index);
        self
    }

    #[must_use]
    pub fn service_worker_path(mut self, path: impl Into<String>) -> Self {
        self.service_worker_path = Some(path.into());
        self
    }

    #[must_use]
    pub const fn verbose_mode(mut self, verbose: bool) -> Self {
        self.verbose_mode = Some(verbose);
        self
    }

    #[must_use]
    pub const fn fade(mut self, fade: Duration) -> Self {
        self.fade = Some(fade);
        self
    }

    pub(super) fn apply_env_overrides(&mut self) -> std::result::Result<(), ConfigError> {
        if let Some(title) = env_string("NOTICE_APP_TITLE")? {
            self.app_title = Some(title);
        }
        if let Some(icon) = env_string("NOTICE_APP_ICON")? {
            self.app_icon = Some(icon);
        }
        if let Some(z_index) = env_parse::<i32>("NOTICE_Z_INDEX")? {
            self.z_index = Some(z_index);
        }
        if let Some(path) = env_string("NOTICE_SERVICE_WORKER")? {
            self.service_worker_path = Some(path);
        }
        if let Some(verbose) = env_bool("NOTICE_VERBOSE")? {
            self.verbose_mode = Some(verbose);
        }
        if let Some(fade) = env_duration("NOTICE_FADE")? {
            self.fade = Some(fade);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{SetupOptions, load};
    use crate::types::{HorizontalAnchor, VerticalAnchor};
    use std::time::Duration;

    #[test]
    fn deserializes_sparse_json() {
        let options: SetupOptions = match serde_json::from_str(
            r#"{"app_title":"Shop","position":{"ver":"top"},"z_index":"99","unknown":1}"#,
        ) {
            Ok(options) => options,
            Err(err) => panic!("failed to parse options: {err}"),
        };
        assert_eq!(options.app_title.as_deref(), Some("Shop"));
        assert_eq!(options.z_index, Some(99));
        let position = options.position.unwrap_or_default();
        assert_eq!(position.ver, Some(VerticalAnchor::Top));
        assert_eq!(position.hor, None);
        assert_eq!(options.verbose_mode, None);
    }

    #[test]
    fn z_index_accepts_numbers() {
        let options: SetupOptions = match serde_json::from_str(r#"{"z_index":10}"#) {
            Ok(options) => options,
            Err(err) => panic!("failed to parse options: {err}"),
        };
        assert_eq!(options.z_index, Some(10));
    }

    #[test]
    fn builder_sets_nested_position() {
        let options = SetupOptions::new()
            .horizontal(HorizontalAnchor::Left)
            .vertical(VerticalAnchor::Top)
            .fade(Duration::ZERO);
        let position = options.position.unwrap_or_default();
        assert_eq!(position.hor, Some(HorizontalAnchor::Left));
        assert_eq!(position.ver, Some(VerticalAnchor::Top));
        assert_eq!(options.fade, Some(Duration::ZERO));
    }

    #[test]
    fn load_reads_toml_file() {
        let path = std::env::temp_dir().join(format!("notice-load-{}.toml", std::process::id()));
        let written = std::fs::write(
            &path,
            "app_title = \"Backoffice\"\nfade = \"1s\"\n\n[position]\nhor = \"left\"\n",
        );
        if let Err(err) = written {
            panic!("failed to write fixture: {err}");
        }
        let loaded = load(&path);
        let _ = std::fs::remove_file(&path);
        let options = match loaded {
            Ok(options) => options,
            Err(err) => panic!("failed to load options: {err}"),
        };
        assert_eq!(options.app_title.as_deref(), Some("Backoffice"));
        assert_eq!(options.fade, Some(Duration::from_secs(1)));
        assert_eq!(
            options.position.and_then(|p| p.hor),
            Some(HorizontalAnchor::Left)
        );
    }

    #[test]
    fn load_tolerates_missing_file() {
        let path = std::env::temp_dir().join("notice-definitely-missing.toml");
        assert!(load(&path).is_ok());
    }
}
