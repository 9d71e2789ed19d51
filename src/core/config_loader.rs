//! Configuration file loader for platform-publisher
//!
//! This module provides configuration loading, validation, and merging capabilities.

use super::config::*;
use crate::core::error::PublishError;
use regex::Regex;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".publisher-config.yaml";

/// Environment variable pattern (${VAR_NAME})
const ENV_VAR_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)\}";

/// Configuration load options
#[derive(Debug, Clone, Default)]
pub struct ConfigLoadOptions {
    /// Project path to load config from
    pub project_path: PathBuf,

    /// Global config file; `$HOME/.publisher-config.yaml` when unset
    pub global_path: Option<PathBuf>,

    /// CLI arguments (highest priority)
    pub cli_args: Option<PublisherConfig>,

    /// Environment variables
    pub env: HashMap<String, String>,
}

impl ConfigLoadOptions {
    /// Options for `project_path` using the process environment
    pub fn from_env(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            global_path: None,
            cli_args: None,
            env: env::vars().collect(),
        }
    }
}

/// Configuration validation result
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationResult {
    pub valid: bool,
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationWarning>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Field path (e.g., "batch.maxConcurrency")
    pub field: String,
    pub message: String,
}

/// Configuration validation warning
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. CLI arguments
    /// 2. Environment variables
    /// 3. Project config (./.publisher-config.yaml)
    /// 4. Global config (~/.publisher-config.yaml)
    /// 5. Default values
    pub async fn load(options: ConfigLoadOptions) -> Result<PublisherConfig, PublishError> {
        let mut configs: Vec<PublisherConfig> = Vec::new();

        // 5. Default values (lowest priority)
        configs.push(PublisherConfig::default());

        // 4. Global config
        let global_path = match options.global_path {
            Some(path) => Some(path),
            None => options
                .env
                .get("HOME")
                .map(|home| PathBuf::from(home).join(CONFIG_FILENAME)),
        };
        if let Some(path) = global_path {
            if let Some(global_config) = Self::load_config_file(&path, Vec::new()).await? {
                configs.push(global_config);
            }
        }

        // 3. Project config
        let project_config_path = options.project_path.join(CONFIG_FILENAME);
        if let Some(project_config) = Self::load_config_file(&project_config_path, Vec::new()).await? {
            configs.push(project_config);
        }

        let mut merged_config = Self::merge_configs(configs);

        // 2. Environment variables, field by field over the file layers
        Self::apply_env_overrides(&mut merged_config, &options.env);

        // 1. CLI arguments (highest priority)
        if let Some(cli_config) = options.cli_args {
            Self::merge_into(&mut merged_config, cli_config);
        }

        let expanded_config = Self::expand_env_vars(merged_config, &options.env);

        let validation = Self::validate(&expanded_config);
        for warning in &validation.warnings {
            tracing::warn!(field = %warning.field, "{}", warning.message);
        }
        if !validation.valid {
            return Err(PublishError::Config(Self::format_validation_result(
                &validation,
            )));
        }

        Ok(expanded_config)
    }

    /// Load configuration from YAML file
    ///
    /// `chain` holds the files already on the current `extends` path.
    fn load_config_file(
        file_path: &Path,
        mut chain: Vec<PathBuf>,
    ) -> std::pin::Pin<
        Box<
            dyn std::future::Future<Output = Result<Option<PublisherConfig>, PublishError>>
                + Send
                + '_,
        >,
    > {
        Box::pin(async move {
            if fs::metadata(file_path).await.is_err() {
                return Ok(None);
            }

            let canonical = fs::canonicalize(file_path)
                .await
                .unwrap_or_else(|_| file_path.to_path_buf());
            if chain.contains(&canonical) {
                return Err(PublishError::Config(format!(
                    "Circular extends: {} is already being loaded",
                    file_path.display()
                )));
            }
            chain.push(canonical);

            let content = fs::read_to_string(file_path).await.map_err(|e| {
                PublishError::Config(format!("Failed to read config file: {}", e))
            })?;

            let config: PublisherConfig = serde_yaml::from_str(&content).map_err(|e| {
                PublishError::Config(format!(
                    "Failed to parse YAML config {}: {}",
                    file_path.display(),
                    e
                ))
            })?;

            tracing::debug!(path = %file_path.display(), "loaded configuration file");

            // Handle extends if present
            if let Some(extends_path) = &config.extends {
                let base_path = file_path
                    .parent()
                    .ok_or_else(|| PublishError::Config("Invalid config file path".to_string()))?
                    .join(extends_path);

                if let Some(base_config) = Self::load_config_file(&base_path, chain).await? {
                    return Ok(Some(Self::merge_configs(vec![base_config, config])));
                }
            }

            Ok(Some(config))
        })
    }

    /// Apply `PUBLISHER_*` environment variables onto `config`
    ///
    /// Only the named fields change; the rest of each section keeps the
    /// value from the configuration files.
    fn apply_env_overrides(config: &mut PublisherConfig, env: &HashMap<String, String>) {
        let kind = env
            .get("PUBLISHER_DRIVER")
            .and_then(|k| Self::parse_driver_kind(k));
        let url = env.get("PUBLISHER_WEBDRIVER_URL");
        if kind.is_some() || url.is_some() {
            let mut driver = config.driver();
            if let Some(kind) = kind {
                driver.kind = kind;
            }
            if let Some(url) = url {
                driver.webdriver_url = url.clone();
            }
            config.driver = Some(driver);
        }

        if let Some(dir) = env.get("PUBLISHER_SESSION_DIR") {
            let mut sessions = config.sessions();
            sessions.directory = dir.clone();
            config.sessions = Some(sessions);
        }

        if let Some(concurrency) = env
            .get("PUBLISHER_MAX_CONCURRENCY")
            .and_then(|v| v.parse::<usize>().ok())
        {
            let mut batch = config.batch();
            batch.max_concurrency = concurrency;
            config.batch = Some(batch);
        }

        if let Some(enabled) = env.get("PUBLISHER_SIMULATION") {
            config.simulation = Some(SimulationConfig {
                enabled: enabled == "true" || enabled == "1",
            });
        }
    }

    fn parse_driver_kind(value: &str) -> Option<DriverKind> {
        match value {
            "webdriver" => Some(DriverKind::Webdriver),
            "memory" => Some(DriverKind::Memory),
            _ => None,
        }
    }

    /// Merge multiple configurations with priority
    pub fn merge_configs(configs: Vec<PublisherConfig>) -> PublisherConfig {
        let mut result = PublisherConfig::default();

        for config in configs {
            Self::merge_into(&mut result, config);
        }

        result
    }

    /// Merge source config into target, section by section
    fn merge_into(target: &mut PublisherConfig, source: PublisherConfig) {
        if !source.version.is_empty() {
            target.version = source.version;
        }

        if source.extends.is_some() {
            target.extends = source.extends;
        }

        if source.server.is_some() {
            target.server = source.server;
        }
        if source.driver.is_some() {
            target.driver = source.driver;
        }
        if source.sessions.is_some() {
            target.sessions = source.sessions;
        }
        if source.batch.is_some() {
            target.batch = source.batch;
        }
        if source.retry.is_some() {
            target.retry = source.retry;
        }
        if source.timeouts.is_some() {
            target.timeouts = source.timeouts;
        }
        if source.simulation.is_some() {
            target.simulation = source.simulation;
        }

        // Platforms merge per key
        if let Some(source_platforms) = source.platforms {
            target
                .platforms
                .get_or_insert_with(HashMap::new)
                .extend(source_platforms);
        }
    }

    /// Expand `${VAR}` references in the driver URL and session directory
    fn expand_env_vars(mut config: PublisherConfig, env: &HashMap<String, String>) -> PublisherConfig {
        if let Some(driver) = &mut config.driver {
            driver.webdriver_url = Self::expand_string(&driver.webdriver_url, env);
        }
        if let Some(sessions) = &mut config.sessions {
            sessions.directory = Self::expand_string(&sessions.directory, env);
        }
        config
    }

    /// Expand environment variables in a single string
    fn expand_string(input: &str, env: &HashMap<String, String>) -> String {
        let Ok(env_var_regex) = Regex::new(ENV_VAR_PATTERN) else {
            return input.to_string();
        };

        let mut result = input.to_string();
        for cap in env_var_regex.captures_iter(input) {
            let var_name = &cap[1];

            if let Some(value) = env.get(var_name) {
                result = result.replace(&format!("${{{}}}", var_name), value);
            } else {
                tracing::warn!(variable = var_name, "environment variable not found");
            }
        }

        result
    }

    /// Validate configuration
    pub fn validate(config: &PublisherConfig) -> ConfigValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if config.version.is_empty() {
            errors.push(ConfigValidationError {
                field: "version".to_string(),
                message: "Version is required".to_string(),
            });
        } else if config.version != "1.0" {
            warnings.push(ConfigValidationWarning {
                field: "version".to_string(),
                message: format!("Unknown version: {}", config.version),
                suggestion: Some("Currently supported version is \"1.0\" only".to_string()),
            });
        }

        let batch = config.batch();
        if batch.max_concurrency == 0 {
            errors.push(ConfigValidationError {
                field: "batch.maxConcurrency".to_string(),
                message: "maxConcurrency must be at least 1".to_string(),
            });
        } else if batch.max_concurrency > 8 {
            warnings.push(ConfigValidationWarning {
                field: "batch.maxConcurrency".to_string(),
                message: format!("{} concurrent browser sessions", batch.max_concurrency),
                suggestion: Some("Values between 3 and 5 keep memory usage manageable".to_string()),
            });
        }

        let retry = config.retry();
        if retry.max_attempts == 0 || retry.max_attempts > 10 {
            errors.push(ConfigValidationError {
                field: "retry.maxAttempts".to_string(),
                message: "maxAttempts must be between 1 and 10".to_string(),
            });
        }

        let timeouts = config.timeouts();
        if timeouts.poll_attempts == 0 {
            errors.push(ConfigValidationError {
                field: "timeouts.pollAttempts".to_string(),
                message: "pollAttempts must be at least 1".to_string(),
            });
        }
        if timeouts.candidate_ms > timeouts.locate_ms {
            warnings.push(ConfigValidationWarning {
                field: "timeouts.candidateMs".to_string(),
                message: "candidateMs exceeds locateMs".to_string(),
                suggestion: Some("Later selector candidates will never be tried".to_string()),
            });
        }

        let driver = config.driver();
        if driver.kind == DriverKind::Webdriver && driver.webdriver_url.contains("${") {
            errors.push(ConfigValidationError {
                field: "driver.webdriverUrl".to_string(),
                message: format!("Unresolved variable in {}", driver.webdriver_url),
            });
        }

        ConfigValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Format validation result as human-readable string
    pub fn format_validation_result(result: &ConfigValidationResult) -> String {
        let mut lines = Vec::new();

        if result.valid {
            lines.push("Configuration validation succeeded".to_string());
        } else {
            lines.push("Configuration has errors".to_string());
        }

        for error in &result.errors {
            lines.push(format!("  - [{}] {}", error.field, error.message));
        }

        for warning in &result.warnings {
            lines.push(format!("  - [{}] (warning) {}", warning.field, warning.message));
            if let Some(suggestion) = &warning.suggestion {
                lines.push(format!("    Suggestion: {}", suggestion));
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn isolated_options(project: &Path) -> ConfigLoadOptions {
        ConfigLoadOptions {
            project_path: project.to_path_buf(),
            global_path: Some(project.join("no-global.yaml")),
            cli_args: None,
            env: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_load_defaults_without_files() {
        let temp_dir = TempDir::new().unwrap();

        let config = ConfigLoader::load(isolated_options(temp_dir.path()))
            .await
            .unwrap();

        assert_eq!(config.batch().max_concurrency, 3);
        assert_eq!(config.driver().kind, DriverKind::Webdriver);
    }

    #[tokio::test]
    async fn test_project_config_overrides_global() {
        let temp_dir = TempDir::new().unwrap();
        let global = temp_dir.path().join("global.yaml");
        std::fs::write(
            &global,
            "version: \"1.0\"\nbatch:\n  maxConcurrency: 2\nsimulation:\n  enabled: true\n",
        )
        .unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            "version: \"1.0\"\nbatch:\n  maxConcurrency: 4\n",
        )
        .unwrap();

        let mut options = isolated_options(temp_dir.path());
        options.global_path = Some(global);
        let config = ConfigLoader::load(options).await.unwrap();

        assert_eq!(config.batch().max_concurrency, 4);
        assert!(config.simulation_enabled());
    }

    #[tokio::test]
    async fn test_extends_base_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("base.yaml"),
            "version: \"1.0\"\nretry:\n  maxAttempts: 5\n",
        )
        .unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            "version: \"1.0\"\nextends: base.yaml\nbatch:\n  maxConcurrency: 2\n",
        )
        .unwrap();

        let config = ConfigLoader::load(isolated_options(temp_dir.path()))
            .await
            .unwrap();

        assert_eq!(config.retry().max_attempts, 5);
        assert_eq!(config.batch().max_concurrency, 2);
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(CONFIG_FILENAME), "batch: [unclosed").unwrap();

        let err = ConfigLoader::load(isolated_options(temp_dir.path()))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "ConfigError");
    }

    #[tokio::test]
    async fn test_env_overrides_and_expansion() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            "version: \"1.0\"\nsessions:\n  directory: \"${STATE_ROOT}/sessions\"\n",
        )
        .unwrap();

        let mut options = isolated_options(temp_dir.path());
        options.env.insert("STATE_ROOT".to_string(), "/var/lib/publisher".to_string());
        options
            .env
            .insert("PUBLISHER_MAX_CONCURRENCY".to_string(), "5".to_string());

        let config = ConfigLoader::load(options).await.unwrap();

        assert_eq!(config.sessions().directory, "/var/lib/publisher/sessions");
        assert_eq!(config.batch().max_concurrency, 5);
    }

    #[test]
    fn test_env_overrides_driver_fields() {
        let mut env = HashMap::new();
        env.insert("PUBLISHER_DRIVER".to_string(), "memory".to_string());
        env.insert("PUBLISHER_SIMULATION".to_string(), "true".to_string());

        let mut config = PublisherConfig::default();
        config.driver = Some(DriverConfig {
            browser: "firefox".to_string(),
            headless: true,
            ..Default::default()
        });
        ConfigLoader::apply_env_overrides(&mut config, &env);

        let driver = config.driver();
        assert_eq!(driver.kind, DriverKind::Memory);
        assert_eq!(driver.browser, "firefox");
        assert!(driver.headless);
        assert!(config.simulation_enabled());

        let mut untouched = PublisherConfig::default();
        ConfigLoader::apply_env_overrides(&mut untouched, &HashMap::new());
        assert_eq!(untouched, PublisherConfig::default());
    }

    #[tokio::test]
    async fn test_env_keeps_sibling_fields_from_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            "version: \"1.0\"\nbatch:\n  maxConcurrency: 4\n  deadlineSecs: 30\ndriver:\n  browser: firefox\n",
        )
        .unwrap();

        let mut options = isolated_options(temp_dir.path());
        options
            .env
            .insert("PUBLISHER_MAX_CONCURRENCY".to_string(), "5".to_string());
        options.env.insert(
            "PUBLISHER_WEBDRIVER_URL".to_string(),
            "http://grid:4444".to_string(),
        );

        let config = ConfigLoader::load(options).await.unwrap();

        let batch = config.batch();
        assert_eq!(batch.max_concurrency, 5);
        assert_eq!(batch.deadline_secs, 30);
        let driver = config.driver();
        assert_eq!(driver.webdriver_url, "http://grid:4444");
        assert_eq!(driver.browser, "firefox");
    }

    #[tokio::test]
    async fn test_circular_extends_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("base.yaml"),
            format!("version: \"1.0\"\nextends: {}\n", CONFIG_FILENAME),
        )
        .unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            "version: \"1.0\"\nextends: base.yaml\n",
        )
        .unwrap();

        let err = ConfigLoader::load(isolated_options(temp_dir.path()))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "ConfigError");
        assert!(err.to_string().contains("Circular extends"));
    }

    #[tokio::test]
    async fn test_self_extends_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            format!("version: \"1.0\"\nextends: {}\n", CONFIG_FILENAME),
        )
        .unwrap();

        let err = ConfigLoader::load(isolated_options(temp_dir.path()))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "ConfigError");
    }

    #[test]
    fn test_merge_platforms_per_key() {
        let mut first = PublisherConfig::default();
        first.platforms = Some(HashMap::from([(
            "weibo".to_string(),
            PlatformConfig {
                enabled: false,
                editor_url: None,
            },
        )]));
        let mut second = PublisherConfig::default();
        second.platforms = Some(HashMap::from([(
            "csdn".to_string(),
            PlatformConfig {
                enabled: true,
                editor_url: Some("https://editor.csdn.net/md/".to_string()),
            },
        )]));

        let merged = ConfigLoader::merge_configs(vec![first, second]);

        assert!(!merged.platform("weibo").enabled);
        assert!(merged.platform("csdn").editor_url.is_some());
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let mut config = PublisherConfig::default();
        config.batch = Some(BatchConfig {
            max_concurrency: 0,
            ..Default::default()
        });

        let result = ConfigLoader::validate(&config);

        assert!(!result.valid);
        assert_eq!(result.errors[0].field, "batch.maxConcurrency");
    }

    #[test]
    fn test_validate_unknown_version_warning() {
        let mut config = PublisherConfig::default();
        config.version = "2.0".to_string();

        let result = ConfigLoader::validate(&config);

        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].field, "version");
    }

    #[test]
    fn test_format_validation_result() {
        let result = ConfigValidationResult {
            valid: false,
            errors: vec![ConfigValidationError {
                field: "retry.maxAttempts".to_string(),
                message: "maxAttempts must be between 1 and 10".to_string(),
            }],
            warnings: vec![],
        };

        let formatted = ConfigLoader::format_validation_result(&result);

        assert!(formatted.contains("Configuration has errors"));
        assert!(formatted.contains("[retry.maxAttempts]"));
    }
}
