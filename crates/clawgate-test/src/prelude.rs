//! Prelude module - commonly used fixtures for convenient import.
//!
//! Use `use clawgate_test::prelude::*;` in test modules.

pub use crate::{TEST_SESSION, at, init_test_logging, recipients, test_op};

pub use crate::{browser_op, config_op, delete_op, exec_op, network_op, read_op, write_op};
