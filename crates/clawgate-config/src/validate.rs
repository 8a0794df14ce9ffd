//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Accepted log levels.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Accepted log formats.
pub const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Validate a fully merged configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_risk(config)?;
    validate_approvals(config)?;
    validate_flow(config)?;
    validate_logging(config)?;
    Ok(())
}

fn non_zero(field: &str, value: u64) -> ConfigResult<()> {
    if value == 0 {
        return Err(ConfigError::invalid(field, "must be greater than zero"));
    }
    Ok(())
}

fn validate_risk(config: &Config) -> ConfigResult<()> {
    let r = &config.risk;
    non_zero(
        "risk.message_recipient_limit",
        u64::try_from(r.message_recipient_limit).unwrap_or(u64::MAX),
    )?;

    for host in &r.allowed_hosts {
        let bare = host.strip_prefix("*.").unwrap_or(host);
        if bare.is_empty() || bare.contains(['*', '/', ' ']) {
            return Err(ConfigError::invalid(
                "risk.allowed_hosts",
                format!("'{host}' is not a host or '*.domain' pattern"),
            ));
        }
    }
    Ok(())
}

fn validate_approvals(config: &Config) -> ConfigResult<()> {
    non_zero("approvals.max_age_secs", config.approvals.max_age_secs)?;
    non_zero(
        "approvals.sweep_interval_secs",
        config.approvals.sweep_interval_secs,
    )
}

fn validate_flow(config: &Config) -> ConfigResult<()> {
    non_zero(
        "flow.history_limit",
        u64::try_from(config.flow.history_limit).unwrap_or(u64::MAX),
    )?;
    non_zero("flow.history_window_secs", config.flow.history_window_secs)
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;
    if !LOG_LEVELS.contains(&l.level.to_ascii_lowercase().as_str()) {
        return Err(ConfigError::invalid(
            "logging.level",
            format!(
                "unsupported log level '{}'; expected one of: {}",
                l.level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }
    if !LOG_FORMATS.contains(&l.format.as_str()) {
        return Err(ConfigError::invalid(
            "logging.format",
            format!(
                "unsupported log format '{}'; expected one of: {}",
                l.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }
    Ok(())
}
