use std::time::Duration;

use humantime::parse_duration;

use crate::error::ConfigError;

pub(super) fn env_string(key: &'static str) -> std::result::Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(ConfigError::Other(format!("{key}: {err}"))),
    }
}

pub(super) fn env_parse<T>(key: &'static str) -> std::result::Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = env_string(key)? else {
        return Ok(None);
    };
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<T>()
        .map(Some)
        .map_err(|err| ConfigError::InvalidField {
            field: key,
            message: err.to_string(),
        })
}

/// Accepte 1/true/yes/y et 0/false/no/n, insensible à la casse.
pub(super) fn env_bool(key: &'static str) -> std::result::Result<Option<bool>, ConfigError> {
    let Some(value) = env_string(key)? else {
        return Ok(None);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "1" | "true" | "yes" | "y" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "n" | "off" => Ok(Some(false)),
        other => Err(ConfigError::InvalidField {
            field: key,
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}

pub(super) fn env_duration(
    key: &'static str,
) -> std::result::Result<Option<Duration>, ConfigError> {
    let Some(value) = env_string(key)? else {
        return Ok(None);
    };
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_duration(value.trim())
        .map(Some)
        .map_err(|err| ConfigError::InvalidField {
            field: key,
            message: err.to_string(),
        })
}
