//! Shared helpers for the integration suites.

#![allow(dead_code)]

use std::path::Path;

use clawgate_access::{AccessContext, Role};
use clawgate_config::{Config, ResolvedConfig};
use clawgate_test::TEST_SESSION;

/// Write `body` as `{dir}/config.toml`.
pub fn write_config(dir: &Path, body: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join("config.toml"), body).unwrap();
}

/// Load config with `home` as the `.clawgate` home and `ws` as workspace.
pub fn load(home: &Path, ws: &Path) -> ResolvedConfig {
    Config::load_with_home(Some(ws), home).unwrap()
}

/// A context in the fixture session with the given role.
pub fn ctx(role: Role) -> AccessContext {
    AccessContext::new(role)
        .with_session(TEST_SESSION)
        .with_account("acct-1")
}
