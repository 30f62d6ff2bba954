use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),

    #[error("Invalid {name}: {value}. Must be between 0 and 100")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("lenient_threshold ({lenient}) must not exceed strict_threshold ({strict})")]
    InvertedThresholds { lenient: f64, strict: f64 },

    #[error("Invalid {0}: must be greater than 0")]
    ZeroTimeout(&'static str),

    #[error("Command '{0}' cannot be empty")]
    EmptyCommand(&'static str),

    #[error("Command '{name}' must contain the {placeholder} placeholder")]
    MissingPlaceholder {
        name: &'static str,
        placeholder: &'static str,
    },

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .taskgate/config.yaml (project config)
    /// 3. .taskgate/local.yaml (project local overrides, optional)
    /// 4. Environment variables (TASKGATE_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment()
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring environment overrides
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("TASKGATE_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".taskgate/config.yaml"))
            .merge(Yaml::file(".taskgate/local.yaml"))
            .merge(Env::prefixed("TASKGATE_").split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let engine = &config.engine;
        let orchestrator = &config.orchestrator;

        if orchestrator.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(orchestrator.max_retries));
        }

        for (name, value) in [
            ("strict_threshold", engine.strict_threshold),
            ("lenient_threshold", engine.lenient_threshold),
            ("verification_threshold", orchestrator.verification_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }

        if engine.lenient_threshold > engine.strict_threshold {
            return Err(ConfigError::InvertedThresholds {
                lenient: engine.lenient_threshold,
                strict: engine.strict_threshold,
            });
        }

        for (name, value) in [
            ("command_timeout_ms", engine.command_timeout_ms),
            ("lint_timeout_ms", engine.lint_timeout_ms),
            ("behavior_timeout_ms", engine.behavior_timeout_ms),
            ("endpoint_timeout_ms", engine.endpoint_timeout_ms),
            ("check_timeout_ms", engine.check_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroTimeout(name));
            }
        }

        let commands = &config.commands;
        for (name, argv) in [
            ("build", &commands.build),
            ("lint", &commands.lint),
            ("lint_fix", &commands.lint_fix),
            ("test_runner", &commands.test_runner),
            ("search", &commands.search),
        ] {
            if argv.first().is_none_or(|program| program.trim().is_empty()) {
                return Err(ConfigError::EmptyCommand(name));
            }
        }

        for (name, argv, placeholder) in [
            ("test_runner", &commands.test_runner, "{dir}"),
            ("search", &commands.search, "{query}"),
        ] {
            if !argv.iter().any(|arg| arg.contains(placeholder)) {
                return Err(ConfigError::MissingPlaceholder { name, placeholder });
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(
                config.logging.rotation.clone(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Severity;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.engine.strict_mode);
        assert!((config.engine.pass_threshold() - 80.0).abs() < f64::EPSILON);
        assert_eq!(config.orchestrator.max_retries, 3);
        assert_eq!(config.orchestrator.retry_backoff_ms, 1000);
        assert_eq!(config.orchestrator.auto_fix_min_severity, Severity::Critical);
        assert_eq!(config.reports.directory, "./verification-reports");
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
engine:
  strict_mode: false
  lenient_threshold: 55
orchestrator:
  max_retries: 5
  auto_fix_min_severity: high
commands:
  build: [cargo, build]
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert!(!config.engine.strict_mode);
        assert!((config.engine.pass_threshold() - 55.0).abs() < f64::EPSILON);
        assert_eq!(config.orchestrator.max_retries, 5);
        assert_eq!(config.orchestrator.auto_fix_min_severity, Severity::High);
        assert_eq!(config.commands.build, vec!["cargo", "build"]);
        assert_eq!(config.commands.lint, vec!["npm", "run", "lint"]);
        assert_eq!(config.logging.format, "json");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_zero_max_retries() {
        let mut config = Config::default();
        config.orchestrator.max_retries = 0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxRetries(0))
        ));
    }

    #[test]
    fn test_validate_threshold_out_of_range() {
        let mut config = Config::default();
        config.orchestrator.verification_threshold = 120.0;

        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidThreshold { name, .. }) => {
                assert_eq!(name, "verification_threshold");
            }
            other => panic!("Expected InvalidThreshold, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_inverted_thresholds() {
        let mut config = Config::default();
        config.engine.lenient_threshold = 90.0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvertedThresholds { .. })
        ));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.engine.lint_timeout_ms = 0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::ZeroTimeout("lint_timeout_ms"))
        ));
    }

    #[test]
    fn test_validate_empty_command() {
        let mut config = Config::default();
        config.commands.build = vec![];

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyCommand("build"))
        ));
    }

    #[test]
    fn test_validate_missing_placeholder() {
        let mut config = Config::default();
        config.commands.search = vec!["rg".to_string(), "-l".to_string()];

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::MissingPlaceholder {
                name: "search",
                placeholder: "{query}"
            })
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn test_env_override() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "orchestrator:\n  max_retries: 2").expect("write");
        file.flush().expect("flush");

        temp_env::with_vars(
            [
                ("TASKGATE_ORCHESTRATOR__MAX_RETRIES", Some("7")),
                ("TASKGATE_LOGGING__LEVEL", Some("debug")),
            ],
            || {
                let config = ConfigLoader::load_from_file(file.path()).expect("config loads");
                assert_eq!(config.orchestrator.max_retries, 7, "env should win");
                assert_eq!(config.logging.level, "debug");
            },
        );
    }

    #[test]
    fn test_invalid_file_value_is_rejected() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "engine:\n  strict_threshold: 150").expect("write");
        file.flush().expect("flush");

        assert!(ConfigLoader::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_hierarchical_merging() {
        let mut base_file = NamedTempFile::new().expect("temp file");
        writeln!(
            base_file,
            "orchestrator:\n  max_retries: 5\nlogging:\n  level: info\n  format: json"
        )
        .expect("write");
        base_file.flush().expect("flush");

        let mut override_file = NamedTempFile::new().expect("temp file");
        writeln!(
            override_file,
            "orchestrator:\n  max_retries: 2\nlogging:\n  level: debug"
        )
        .expect("write");
        override_file.flush().expect("flush");

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .expect("config extracts");

        assert_eq!(config.orchestrator.max_retries, 2, "Override should win");
        assert_eq!(
            config.logging.level, "debug",
            "Override should win for nested fields"
        );
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
        assert!(
            config.orchestrator.block_on_failure,
            "Defaults should persist"
        );
    }
}
