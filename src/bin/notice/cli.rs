use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use humantime::parse_duration;
use notice::{Permission, Severity, TempPolicy};

#[allow(clippy::struct_excessive_bools)]
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Show a notification through the notice widget",
    long_about = None
)]
pub struct Cli {
    /// Message body.
    pub message: String,

    /// Optional TOML configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Severity: info, success, warning or error.
    #[arg(long, default_value = "info")]
    pub severity: Severity,

    /// Dismissal: "true" (click), "false" (persistent), seconds or a duration like "3s".
    #[arg(long, default_value = "true")]
    pub temp: TempPolicy,

    /// Send as a system notification instead of an on-page message.
    #[arg(long, action = ArgAction::SetTrue)]
    pub system: bool,

    /// Initial permission of the in-memory platform.
    #[arg(long, default_value = "default")]
    pub permission: Permission,

    /// Answer given by the in-memory platform to a permission prompt.
    #[arg(long, default_value = "granted")]
    pub answer: Permission,

    /// Title override for system notifications.
    #[arg(long)]
    pub title: Option<String>,

    /// Icon override for system notifications.
    #[arg(long)]
    pub icon: Option<String>,

    /// How long to keep running so timers can fire (e.g. "5s").
    #[arg(long, value_parser = parse_duration)]
    pub linger: Option<Duration>,

    /// Print the page as JSON before exiting.
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump: bool,

    /// JSON log layer (`--features json-logs`).
    #[arg(long, action = ArgAction::SetTrue)]
    pub json_logs: bool,

    /// Explicit log filter (e.g. "notice=debug").
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,

    /// Use desktop notifications (`--features desktop`, Linux only).
    #[cfg(all(feature = "desktop", target_os = "linux"))]
    #[arg(long, action = ArgAction::SetTrue)]
    pub desktop: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
