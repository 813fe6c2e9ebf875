use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use std::collections::HashSet;
use thiserror::Error;

use crate::domain::models::config::WardenConfig;
use crate::domain::models::service::AuthMechanism;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid max_concurrent: {0}. Must be at least 1")]
    InvalidMaxConcurrent(usize),

    #[error(
        "Invalid backoff configuration: retry_initial_backoff_ms ({0}) must be less than retry_max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Pipeline stages cannot be empty")]
    EmptyStages,

    #[error(
        "Invalid scoring floors: healthy_floor ({0}) must be greater than degraded_floor ({1})"
    )]
    InvalidScoringFloors(u8, u8),

    #[error("Invalid healthy_floor: {0}. Must be at most 100")]
    HealthyFloorOutOfRange(u8),

    #[error("Service id cannot be empty")]
    EmptyServiceId,

    #[error("Duplicate service id: {0}")]
    DuplicateService(String),

    #[error(
        "Invalid renewal window for '{service}': renewal_interval_days ({renewal_interval_days}) must be at least 1 and less than max_age_days ({max_age_days})"
    )]
    InvalidRenewalWindow {
        service: String,
        renewal_interval_days: i64,
        max_age_days: i64,
    },

    #[error(
        "Service '{0}' uses silent_exchange but has neither a token_endpoint nor a helper_command"
    )]
    MissingTransport(String),

    #[error("Service '{0}' uses programmatic_login but has no helper_command")]
    MissingHelper(String),

    #[error("Invalid webhook_url: {0}. Must be an absolute http(s) URL")]
    InvalidWebhookUrl(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .warden/config.yaml (project config, created by init)
    /// 3. .warden/local.yaml (project local overrides, optional)
    /// 4. Environment variables (WARDEN_* prefix, highest priority)
    ///
    /// Note: Configuration is always project-local (pwd/.warden/)
    /// so one machine can watch several pipelines independently.
    pub fn load() -> Result<WardenConfig> {
        let config: WardenConfig = Figment::new()
            // 1. Start with programmatic defaults
            .merge(Serialized::defaults(WardenConfig::default()))
            // 2. Merge project config (primary config, created by init)
            .merge(Yaml::file(".warden/config.yaml"))
            // 3. Merge project local overrides (optional, for dev/test overrides)
            .merge(Yaml::file(".warden/local.yaml"))
            // 4. Merge environment variables (highest priority)
            .merge(Env::prefixed("WARDEN_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<WardenConfig> {
        let config: WardenConfig = Figment::new()
            .merge(Serialized::defaults(WardenConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &WardenConfig) -> Result<(), ConfigError> {
        // Validate database config
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        // Validate logging config
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        // Validate orchestrator config
        if config.orchestrator.max_concurrent == 0 {
            return Err(ConfigError::InvalidMaxConcurrent(
                config.orchestrator.max_concurrent,
            ));
        }

        if config.orchestrator.retry_initial_backoff_ms >= config.orchestrator.retry_max_backoff_ms
        {
            return Err(ConfigError::InvalidBackoff(
                config.orchestrator.retry_initial_backoff_ms,
                config.orchestrator.retry_max_backoff_ms,
            ));
        }

        // Validate pipeline config
        if config.pipeline.stages.is_empty() {
            return Err(ConfigError::EmptyStages);
        }

        // Validate scoring config
        if config.scoring.healthy_floor > 100 {
            return Err(ConfigError::HealthyFloorOutOfRange(
                config.scoring.healthy_floor,
            ));
        }

        if config.scoring.healthy_floor <= config.scoring.degraded_floor {
            return Err(ConfigError::InvalidScoringFloors(
                config.scoring.healthy_floor,
                config.scoring.degraded_floor,
            ));
        }

        // Validate notification config
        if let Some(url) = &config.notifications.webhook_url {
            let well_formed =
                reqwest::Url::parse(url).is_ok_and(|u| matches!(u.scheme(), "http" | "https"));
            if !well_formed {
                return Err(ConfigError::InvalidWebhookUrl(url.clone()));
            }
        }

        // Validate service definitions
        let mut seen = HashSet::new();
        for service in &config.services {
            if service.id.is_empty() {
                return Err(ConfigError::EmptyServiceId);
            }
            if !seen.insert(service.id.clone()) {
                return Err(ConfigError::DuplicateService(service.id.clone()));
            }
            if service.renewal_interval_days < 1
                || service.renewal_interval_days >= service.max_age_days
            {
                return Err(ConfigError::InvalidRenewalWindow {
                    service: service.id.clone(),
                    renewal_interval_days: service.renewal_interval_days,
                    max_age_days: service.max_age_days,
                });
            }
            match service.mechanism {
                AuthMechanism::SilentExchange => {
                    if service.token_endpoint.is_none() && service.helper_command.is_empty() {
                        return Err(ConfigError::MissingTransport(service.id.clone()));
                    }
                }
                AuthMechanism::ProgrammaticLogin => {
                    if service.helper_command.is_empty() {
                        return Err(ConfigError::MissingHelper(service.id.clone()));
                    }
                }
                // Interactive services may have no helper at all; they
                // surface as blocked-on-human instead of spawning one.
                AuthMechanism::InteractiveBrowser => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::WardenConfig;
    use crate::domain::models::service::ServiceDefinition;

    fn service(id: &str) -> ServiceDefinition {
        ServiceDefinition {
            id: id.to_string(),
            mechanism: AuthMechanism::SilentExchange,
            max_age_days: 30,
            renewal_interval_days: 7,
            interactive: false,
            priority: Default::default(),
            stale_after_days: 7,
            helper_command: vec![],
            extractor_command: vec![],
            file_hints: vec![],
            token_endpoint: Some("https://auth.example.com/token".to_string()),
        }
    }

    #[test]
    fn test_default_config() {
        let config = WardenConfig::default();
        assert_eq!(config.database.path, ".warden/warden.db");
        assert_eq!(config.orchestrator.max_concurrent, 1);
        assert_eq!(config.orchestrator.retry_bound, 2);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
database:
  path: /custom/warden.db
  max_connections: 3
orchestrator:
  max_concurrent: 2
  retry_bound: 1
pipeline:
  root: /data/pipeline
  stages: [landing, curated]
services:
  - id: spotify
    mechanism: silent_exchange
    max_age_days: 30
    renewal_interval_days: 7
    token_endpoint: https://accounts.example.com/api/token
  - id: tiktok
    mechanism: interactive_browser
    interactive: true
    max_age_days: 14
    renewal_interval_days: 3
";

        let config: WardenConfig = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.database.path, "/custom/warden.db");
        assert_eq!(config.database.max_connections, 3);
        assert_eq!(config.orchestrator.max_concurrent, 2);
        assert_eq!(config.orchestrator.retry_bound, 1);
        assert_eq!(config.pipeline.stages, vec!["landing", "curated"]);
        assert_eq!(config.services.len(), 2);
        assert_eq!(config.services[1].id, "tiktok");
        assert!(config.services[1].interactive);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_empty_database_path() {
        let mut config = WardenConfig::default();
        config.database.path = String::new();

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::EmptyDatabasePath));
    }

    #[test]
    fn test_validate_zero_max_connections() {
        let mut config = WardenConfig::default();
        config.database.max_connections = 0;

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidMaxConnections(0)
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = WardenConfig::default();
        config.logging.level = "verbose".to_string();

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        match result.unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "verbose"),
            _ => panic!("Expected InvalidLogLevel error"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = WardenConfig::default();
        config.logging.format = "xml".to_string();

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidLogFormat(_)
        ));
    }

    #[test]
    fn test_validate_zero_max_concurrent() {
        let mut config = WardenConfig::default();
        config.orchestrator.max_concurrent = 0;

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidMaxConcurrent(0)
        ));
    }

    #[test]
    fn test_validate_invalid_backoff() {
        let mut config = WardenConfig::default();
        config.orchestrator.retry_initial_backoff_ms = 30000;
        config.orchestrator.retry_max_backoff_ms = 10000;

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidBackoff(30000, 10000)
        ));
    }

    #[test]
    fn test_validate_empty_stages() {
        let mut config = WardenConfig::default();
        config.pipeline.stages = vec![];

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::EmptyStages));
    }

    #[test]
    fn test_validate_inverted_scoring_floors() {
        let mut config = WardenConfig::default();
        config.scoring.healthy_floor = 40;
        config.scoring.degraded_floor = 80;

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidScoringFloors(40, 80)
        ));
    }

    #[test]
    fn test_validate_duplicate_service_ids() {
        let config = WardenConfig {
            services: vec![service("spotify"), service("spotify")],
            ..WardenConfig::default()
        };

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        match result.unwrap_err() {
            ConfigError::DuplicateService(id) => assert_eq!(id, "spotify"),
            _ => panic!("Expected DuplicateService error"),
        }
    }

    #[test]
    fn test_validate_renewal_window_wider_than_max_age() {
        let mut config = WardenConfig::default();
        let mut bad = service("distrokid");
        bad.renewal_interval_days = 30;
        bad.max_age_days = 30;
        config.services = vec![bad];

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidRenewalWindow { .. }
        ));
    }

    #[test]
    fn test_validate_silent_exchange_needs_transport() {
        let mut config = WardenConfig::default();
        let mut bad = service("spotify");
        bad.token_endpoint = None;
        config.services = vec![bad];

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::MissingTransport(_)));
    }

    #[test]
    fn test_validate_programmatic_login_needs_helper() {
        let mut config = WardenConfig::default();
        let mut bad = service("linktree");
        bad.mechanism = AuthMechanism::ProgrammaticLogin;
        bad.token_endpoint = None;
        config.services = vec![bad];

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::MissingHelper(_)));
    }

    #[test]
    fn test_validate_webhook_url_must_be_http() {
        let mut config = WardenConfig::default();
        config.notifications.webhook_url = Some("not a url".to_string());

        let result = ConfigLoader::validate(&config);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidWebhookUrl(_)
        ));

        config.notifications.webhook_url = Some("https://example.com/hook".to_string());
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        // Create base config
        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "logging:\n  level: info\n  format: json\norchestrator:\n  max_concurrent: 1"
        )
        .unwrap();
        base_file.flush().unwrap();

        // Create override config
        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "orchestrator:\n  max_concurrent: 4\nlogging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: WardenConfig = Figment::new()
            .merge(Serialized::defaults(WardenConfig::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.orchestrator.max_concurrent, 4, "Override should win");
        assert_eq!(
            config.logging.level, "debug",
            "Override should win for nested fields"
        );
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
    }

    #[test]
    fn test_env_override() {
        temp_env::with_vars(
            [
                ("WARDEN_ORCHESTRATOR__MAX_CONCURRENT", Some("4")),
                ("WARDEN_LOGGING__LEVEL", Some("debug")),
            ],
            || {
                let config: WardenConfig = Figment::new()
                    .merge(Serialized::defaults(WardenConfig::default()))
                    .merge(Env::prefixed("WARDEN_").split("__"))
                    .extract()
                    .unwrap();

                assert_eq!(config.orchestrator.max_concurrent, 4);
                assert_eq!(config.logging.level, "debug");
            },
        );
    }
}
