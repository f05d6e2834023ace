/// Deadline sweep configuration
///
/// Settings are read from `SWEEP_*` environment variables layered over
/// defaults:
///
/// | Variable | Default |
/// |----------|---------|
/// | `SWEEP_ENABLED` | `true` |
/// | `SWEEP_INTERVAL_SECS` | `3600` |
/// | `SWEEP_STARTUP_DELAY_SECS` | `5` |
/// | `SWEEP_RETENTION_DAYS` | `30` |

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SweepConfig {
    /// Whether the API process should spawn the sweep
    pub enabled: bool,

    /// Seconds between runs
    pub interval_secs: u64,

    /// Seconds to wait after startup before the first run
    pub startup_delay_secs: u64,

    /// Read notifications older than this many days are deleted
    pub retention_days: i64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 3600,
            startup_delay_secs: 5,
            retention_days: 30,
        }
    }
}

impl SweepConfig {
    /// Loads settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix("SWEEP").try_parsing(true))
    }

    fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config: Self = Config::builder()
            .set_default("enabled", defaults.enabled)?
            .set_default("interval_secs", defaults.interval_secs)?
            .set_default("startup_delay_secs", defaults.startup_delay_secs)?
            .set_default("retention_days", defaults.retention_days)?
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::Message(
                "SWEEP_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        if self.retention_days < 1 {
            return Err(ConfigError::Message(
                "SWEEP_RETENTION_DAYS must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.retention_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<SweepConfig, ConfigError> {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SweepConfig::from_environment(
            Environment::with_prefix("SWEEP")
                .try_parsing(true)
                .source(Some(source)),
        )
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, SweepConfig::default());
        assert_eq!(config.interval(), Duration::from_secs(3600));
        assert_eq!(config.startup_delay(), Duration::from_secs(5));
        assert_eq!(config.retention(), chrono::Duration::days(30));
    }

    #[test]
    fn test_environment_overrides() {
        let config = load(&[
            ("SWEEP_INTERVAL_SECS", "60"),
            ("SWEEP_RETENTION_DAYS", "7"),
            ("SWEEP_ENABLED", "false"),
        ])
        .unwrap();

        assert_eq!(config.interval_secs, 60);
        assert_eq!(config.retention_days, 7);
        assert!(!config.enabled);
        assert_eq!(config.startup_delay_secs, 5);
    }

    #[test]
    fn test_rejects_zero_interval() {
        assert!(load(&[("SWEEP_INTERVAL_SECS", "0")]).is_err());
        assert!(load(&[("SWEEP_RETENTION_DAYS", "0")]).is_err());
    }
}
