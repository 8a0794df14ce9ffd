//! Config file discovery and layered loading.
//!
//! `Config::load()` runs:
//! 1. Parse the embedded `defaults.toml`
//! 2. Merge `~/.clawgate/config.toml` (user)
//! 3. Merge `{workspace}/.clawgate/config.toml` (workspace)
//! 4. Apply `CLAWGATE_LOG_LEVEL` when no file set `logging.level`
//! 5. Deserialize, default `access.workspace_dir` to the workspace root, and
//!    validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
pub const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Directory name under the home and workspace roots.
pub const CONFIG_DIR: &str = ".clawgate";

/// Environment variable consulted for the log level.
pub const LOG_LEVEL_ENV: &str = "CLAWGATE_LOG_LEVEL";

/// A loaded configuration plus where it came from.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// The merged, validated configuration.
    pub config: Config,
    /// Files merged on top of the defaults, in load order.
    pub loaded_files: Vec<String>,
    /// Whether the log level came from the environment.
    pub log_level_from_env: bool,
}

/// Load the configuration with layered file precedence.
///
/// `workspace_root` enables the workspace layer. `home_override` replaces the
/// `~/.clawgate` directory itself (its `config.toml` is the user layer).
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is unreadable, oversized or
/// malformed, or if the merged configuration fails validation.
pub fn load(
    workspace_root: Option<&Path>,
    home_override: Option<&Path>,
) -> ConfigResult<ResolvedConfig> {
    let env: HashMap<String, String> = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .map(|v| (LOG_LEVEL_ENV.to_owned(), v))
        .into_iter()
        .collect();
    load_with_env(workspace_root, home_override, &env)
}

/// [`load`] with an explicit environment map.
///
/// # Errors
///
/// Same as [`load`].
pub fn load_with_env(
    workspace_root: Option<&Path>,
    home_override: Option<&Path>,
    env: &HashMap<String, String>,
) -> ConfigResult<ResolvedConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;
    let mut loaded_files = Vec::new();
    let mut level_set_by_file = false;

    let user_path = match home_override {
        Some(dir) => dir.join("config.toml"),
        None => home_directory()?.join(CONFIG_DIR).join("config.toml"),
    };
    let mut layers = vec![("user", user_path)];
    if let Some(ws) = workspace_root {
        layers.push(("workspace", ws.join(CONFIG_DIR).join("config.toml")));
    }

    for (layer, path) in layers {
        let Some(overlay) = try_load_file(&path)? else {
            continue;
        };
        level_set_by_file |= sets_log_level(&overlay);
        deep_merge(&mut merged, &overlay);
        info!(layer, path = %path.display(), "loaded config layer");
        loaded_files.push(path.display().to_string());
    }

    let mut log_level_from_env = false;
    if !level_set_by_file
        && let Some(level) = env.get(LOG_LEVEL_ENV).filter(|v| !v.trim().is_empty())
        && let Some(logging) = merged.get_mut("logging").and_then(toml::Value::as_table_mut)
    {
        logging.insert("level".to_owned(), toml::Value::String(level.trim().to_owned()));
        log_level_from_env = true;
        debug!(var = LOG_LEVEL_ENV, "applied log level from environment");
    }

    let mut config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;
    if config.access.workspace_dir.is_none()
        && let Some(ws) = workspace_root
    {
        config.access.workspace_dir = Some(ws.display().to_string());
    }
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        loaded_files,
        log_level_from_env,
    })
}

/// Load a config from one file, without layering.
///
/// Keys missing from the file take their built-in defaults.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file is missing, unreadable, oversized,
/// malformed or invalid.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let value = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
        path: path.display().to_string(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    })?;
    let config: Config = value
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })?;
    validate::validate(&config)?;
    Ok(config)
}

/// Recursively merge `overlay` into `base`.
///
/// Tables merge key by key; scalars and arrays from the overlay replace the
/// base value.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                match base_table.get_mut(key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => {
                        base_table.insert(key.clone(), overlay_val.clone());
                    },
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

fn sets_log_level(overlay: &toml::Value) -> bool {
    overlay
        .get("logging")
        .and_then(|l| l.get("level"))
        .is_some()
}

/// Read and parse a file, returning `None` if it does not exist.
///
/// Reads once and checks the size afterwards, so there is no gap between a
/// stat and the read.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
    if size > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::FileTooLarge {
            path: path.display().to_string(),
            size,
            limit: MAX_CONFIG_FILE_SIZE,
        });
    }

    toml::from_str(&content)
        .map(Some)
        .map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })
}

/// Determine the user's home directory.
fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("config.toml"), body).unwrap();
    }

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_defaults_deserialize_to_default_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_with_empty_home() {
        let home = TempDir::new().unwrap();
        let resolved = load_with_env(None, Some(home.path()), &no_env()).unwrap();
        assert_eq!(resolved.config, Config::default());
        assert!(resolved.loaded_files.is_empty());
    }

    #[test]
    fn test_user_then_workspace_precedence() {
        let home = TempDir::new().unwrap();
        let ws = TempDir::new().unwrap();
        write_config(
            home.path(),
            r#"
            [access]
            admin_account_ids = ["owner"]

            [risk]
            allowed_hosts = ["docs.rs"]
            message_recipient_limit = 20
            "#,
        );
        write_config(
            &ws.path().join(CONFIG_DIR),
            r#"
            [risk]
            message_recipient_limit = 5
            "#,
        );

        let resolved = load_with_env(Some(ws.path()), Some(home.path()), &no_env()).unwrap();
        let c = resolved.config;
        assert_eq!(c.access.admin_account_ids, ["owner"]);
        assert_eq!(c.risk.allowed_hosts, ["docs.rs"], "tables merge key by key");
        assert_eq!(c.risk.message_recipient_limit, 5);
        assert_eq!(c.flow.history_limit, 1000);
        assert_eq!(resolved.loaded_files.len(), 2);
    }

    #[test]
    fn test_workspace_root_fills_workspace_dir() {
        let home = TempDir::new().unwrap();
        let ws = TempDir::new().unwrap();

        let resolved = load_with_env(Some(ws.path()), Some(home.path()), &no_env()).unwrap();
        assert_eq!(
            resolved.config.access.workspace_dir,
            Some(ws.path().display().to_string())
        );

        let resolved = load_with_env(None, Some(home.path()), &no_env()).unwrap();
        assert_eq!(resolved.config.access.workspace_dir, None);
    }

    #[test]
    fn test_configured_workspace_dir_wins() {
        let home = TempDir::new().unwrap();
        let ws = TempDir::new().unwrap();
        write_config(home.path(), "[access]\nworkspace_dir = \"/srv/agent\"\n");

        let resolved = load_with_env(Some(ws.path()), Some(home.path()), &no_env()).unwrap();
        assert_eq!(resolved.config.access.workspace_dir.as_deref(), Some("/srv/agent"));
    }

    #[test]
    fn test_env_log_level_is_a_fallback() {
        let home = TempDir::new().unwrap();
        let env: HashMap<String, String> =
            [(LOG_LEVEL_ENV.to_owned(), "debug".to_owned())].into();

        let resolved = load_with_env(None, Some(home.path()), &env).unwrap();
        assert_eq!(resolved.config.logging.level, "debug");
        assert!(resolved.log_level_from_env);

        write_config(home.path(), "[logging]\nlevel = \"warn\"\n");
        let resolved = load_with_env(None, Some(home.path()), &env).unwrap();
        assert_eq!(resolved.config.logging.level, "warn");
        assert!(!resolved.log_level_from_env);
    }

    #[test]
    fn test_invalid_env_level_fails_validation() {
        let home = TempDir::new().unwrap();
        let env: HashMap<String, String> =
            [(LOG_LEVEL_ENV.to_owned(), "shouty".to_owned())].into();
        let err = load_with_env(None, Some(home.path()), &env).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let home = TempDir::new().unwrap();
        write_config(home.path(), "[risk\nallowed_hosts = ");
        let err = load_with_env(None, Some(home.path()), &no_env()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let home = TempDir::new().unwrap();
        write_config(home.path(), "[flow]\nhistory_limit = \"lots\"\n");
        let err = load_with_env(None, Some(home.path()), &no_env()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { ref path, .. } if path == "<merged config>"));
    }

    #[test]
    fn test_oversized_file_rejected() {
        let home = TempDir::new().unwrap();
        let padding = "#".repeat(usize::try_from(MAX_CONFIG_FILE_SIZE).unwrap() + 1);
        write_config(home.path(), &padding);
        let err = load_with_env(None, Some(home.path()), &no_env()).unwrap_err();
        assert!(matches!(err, ConfigError::FileTooLarge { .. }));
    }

    #[test]
    fn test_load_file_single_layer() {
        let dir = TempDir::new().unwrap();
        write_config(dir.path(), "[approvals]\nmax_age_secs = 120\n");
        let config = load_file(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.approvals.max_age_secs, 120);
        assert_eq!(config.approvals.sweep_interval_secs, 60);
    }

    #[test]
    fn test_load_file_missing() {
        let result = load_file(Path::new("/nonexistent/clawgate/config.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_deep_merge_replaces_arrays() {
        let mut base: toml::Value = toml::from_str("a = [1, 2]\n[t]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("a = [3]\n[t]\ny = 9\n").unwrap();
        deep_merge(&mut base, &overlay);
        assert_eq!(base["a"].as_array().unwrap().len(), 1);
        assert_eq!(base["t"]["x"].as_integer(), Some(1));
        assert_eq!(base["t"]["y"].as_integer(), Some(9));
    }
}
