#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod container;
pub mod context;
pub mod error;
pub mod message;
pub mod notifier;
pub mod page;
pub mod platform;
pub mod style;
pub mod system;
pub mod telemetry;
pub mod types;

pub use notifier::{Notifier, NotifierBuilder};
pub use types::{Permission, Severity, TempPolicy};

pub type Result<T> = std::result::Result<T, error::Error>;
