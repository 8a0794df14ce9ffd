//! Conversion from the `[logging]` config section.

use clawgate_config::LoggingSection;

use crate::error::TelemetryResult;
use crate::logging::{LogConfig, LogFormat};

impl LogConfig {
    /// Build a log config from a validated `[logging]` section.
    ///
    /// Output goes to stderr; the section has no target setting.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::ConfigError`] if the format is unknown.
    ///
    /// [`TelemetryError::ConfigError`]: crate::TelemetryError::ConfigError
    pub fn from_section(section: &LoggingSection) -> TelemetryResult<Self> {
        let format: LogFormat = section.format.parse()?;
        Ok(section.directives.iter().fold(
            Self::new(section.level.to_ascii_lowercase()).with_format(format),
            |config, directive| config.with_directive(directive.clone()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TelemetryError;

    #[test]
    fn test_from_default_section() {
        let config = LogConfig::from_section(&LoggingSection::default()).unwrap();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.directives.is_empty());
    }

    #[test]
    fn test_from_section_carries_directives() {
        let section = LoggingSection {
            level: "WARN".to_owned(),
            format: "json".to_owned(),
            directives: vec!["clawgate_flow=debug".to_owned()],
        };
        let config = LogConfig::from_section(&section).unwrap();
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.directives, ["clawgate_flow=debug"]);
        assert!(config.build_filter().is_ok());
    }

    #[test]
    fn test_unknown_format() {
        let section = LoggingSection {
            format: "xml".to_owned(),
            ..LoggingSection::default()
        };
        assert!(matches!(
            LogConfig::from_section(&section),
            Err(TelemetryError::ConfigError(_))
        ));
    }
}
