//! Clawgate Telemetry - Logging setup for the security gate.
//!
//! The engine crates only emit `tracing` events; this crate installs the
//! subscriber that renders them.
//!
//! # Example
//!
//! ```rust,no_run
//! use clawgate_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), clawgate_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Json)
//!     .with_directive("clawgate_flow=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!("gate ready");
//! # Ok(())
//! # }
//! ```
//!
//! With the `config` feature, [`LogConfig::from_section`] converts a loaded
//! `[logging]` section.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

#[cfg(feature = "config")]
mod bridge;
mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
