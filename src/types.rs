use std::fmt::{self, Display};
use std::str::FromStr;
use std::time::Duration;

use humantime::parse_duration;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub const ALL: [Self; 4] = [Self::Info, Self::Success, Self::Warning, Self::Error];

    /// Clé utilisée pour la classe CSS du message.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "Info",
            Self::Success => "Success",
            Self::Warning => "Warning",
            Self::Error => "Error",
        })
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" | "information" => Ok(Self::Info),
            "success" | "ok" => Ok(Self::Success),
            "warn" | "warning" => Ok(Self::Warning),
            "error" | "err" => Ok(Self::Error),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// Dismissal behaviour of a message, resolved once when the message is built.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TempPolicy {
    /// No click handler and no timer; only the returned handle removes it.
    Persistent,
    /// Removed when clicked.
    #[default]
    DismissOnClick,
    /// Removed when clicked or once the delay elapses, whichever comes first.
    AutoDismiss(Duration),
}

impl TempPolicy {
    #[must_use]
    pub const fn is_clickable(self) -> bool {
        !matches!(self, Self::Persistent)
    }

    #[must_use]
    pub const fn auto_dismiss(self) -> Option<Duration> {
        match self {
            Self::AutoDismiss(delay) => Some(delay),
            _ => None,
        }
    }

    /// Native notifications built from a persistent message must stay on
    /// screen until the user acts on them.
    #[must_use]
    pub const fn requires_interaction(self) -> bool {
        matches!(self, Self::Persistent)
    }
}

impl From<bool> for TempPolicy {
    fn from(temp: bool) -> Self {
        if temp {
            Self::DismissOnClick
        } else {
            Self::Persistent
        }
    }
}

impl From<u64> for TempPolicy {
    fn from(seconds: u64) -> Self {
        match seconds {
            0 => Self::Persistent,
            1 => Self::DismissOnClick,
            n => Self::AutoDismiss(Duration::from_secs(n)),
        }
    }
}

impl From<u32> for TempPolicy {
    fn from(seconds: u32) -> Self {
        Self::from(u64::from(seconds))
    }
}

impl From<i32> for TempPolicy {
    fn from(seconds: i32) -> Self {
        Self::from(i64::from(seconds))
    }
}

/// Negative values are truthy: clickable, but never timed.
impl From<i64> for TempPolicy {
    fn from(seconds: i64) -> Self {
        u64::try_from(seconds).map_or(Self::DismissOnClick, Self::from)
    }
}

/// Whole seconds only. Any non-zero delay shorter than two seconds is just
/// clickable.
impl From<Duration> for TempPolicy {
    fn from(delay: Duration) -> Self {
        match delay.as_secs() {
            _ if delay.is_zero() => Self::Persistent,
            0 | 1 => Self::DismissOnClick,
            seconds => Self::AutoDismiss(Duration::from_secs(seconds)),
        }
    }
}

impl FromStr for TempPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        match value.as_str() {
            "true" | "click" => return Ok(Self::DismissOnClick),
            "false" | "persistent" | "" => return Ok(Self::Persistent),
            _ => {}
        }
        if let Ok(seconds) = value.parse::<i64>() {
            return Ok(Self::from(seconds));
        }
        parse_duration(&value)
            .map(Self::from)
            .map_err(|err| format!("invalid temp policy {s:?}: {err}"))
    }
}

/// Notification permission as reported by the platform.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    #[default]
    Default,
    Granted,
    Denied,
}

impl Permission {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Granted => "granted",
            Self::Denied => "denied",
        }
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" | "prompt" => Ok(Self::Default),
            "granted" | "allow" => Ok(Self::Granted),
            "denied" | "deny" => Ok(Self::Denied),
            other => Err(format!("unknown permission: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAnchor {
    Top,
    #[default]
    Bottom,
}

impl VerticalAnchor {
    /// CSS property pinned to `0`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAnchor {
    Left,
    #[default]
    Right,
}

impl HorizontalAnchor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}
