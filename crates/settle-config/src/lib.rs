//! Configuration management for settle.
//!
//! Parses `settle.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Example
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [templates]
//! dir = "templates"
//! pattern = "*.html"
//! local_mode = true
//!
//! [live_reload]
//! debounce_ms = 50
//! retry_ms = 250
//! watch_patterns = ["*.html"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override template directory.
    pub templates_dir: Option<PathBuf>,
    /// Override local (watch) mode.
    pub local_mode: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "settle.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Template configuration (paths are relative strings from TOML).
    templates: TemplatesConfigRaw,
    /// Live reload configuration.
    pub live_reload: LiveReloadConfig,

    /// Resolved template configuration (set after loading).
    #[serde(skip)]
    pub templates_resolved: TemplatesConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

/// Raw template configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TemplatesConfigRaw {
    dir: Option<String>,
    pattern: Option<String>,
    local_mode: Option<bool>,
}

/// Resolved template configuration with absolute paths.
#[derive(Debug)]
pub struct TemplatesConfig {
    /// Directory holding the template files in local mode.
    pub dir: PathBuf,
    /// Glob matched against paths relative to `dir`; `**/*.html` reaches
    /// subdirectories, `*.html` does not.
    pub pattern: String,
    /// Serve templates from `dir` and watch it, instead of the embedded set.
    pub local_mode: bool,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("templates"),
            pattern: DEFAULT_TEMPLATE_PATTERN.to_owned(),
            local_mode: false,
        }
    }
}

const DEFAULT_TEMPLATE_PATTERN: &str = "*.html";

/// Live reload configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// Quiet window in milliseconds before a burst of changes settles.
    pub debounce_ms: u64,
    /// Reconnect hint sent to clients, in milliseconds.
    pub retry_ms: u64,
    /// Watch subdirectories of the template directory too.
    ///
    /// Nested files still need a `**/` watch pattern and template pattern.
    pub recursive: bool,
    /// Glob patterns (relative to the template directory) that trigger a reload.
    ///
    /// An empty list watches every file.
    pub watch_patterns: Vec<String>,
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 50,
            retry_ms: 250,
            recursive: false,
            watch_patterns: vec![DEFAULT_TEMPLATE_PATTERN.to_owned()],
        }
    }
}

impl LiveReloadConfig {
    /// Quiet window as a [`Duration`].
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Client retry hint as a [`Duration`].
    #[must_use]
    pub fn retry(&self) -> Duration {
        Duration::from_millis(self.retry_ms)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a string field to be a valid glob pattern.
fn require_glob(value: &str, field: &str) -> Result<(), ConfigError> {
    glob::Pattern::new(value).map_err(|e| {
        ConfigError::Validation(format!("{field} is not a valid glob pattern: {e}"))
    })?;
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `settle.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the final configuration does not validate.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(dir) = &settings.templates_dir {
            self.templates_resolved.dir.clone_from(dir);
        }
        if let Some(local_mode) = settings.local_mode {
            self.templates_resolved.local_mode = local_mode;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            templates: TemplatesConfigRaw::default(),
            live_reload: LiveReloadConfig::default(),
            templates_resolved: TemplatesConfig {
                dir: base.join("templates"),
                ..TemplatesConfig::default()
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_templates()?;
        self.validate_live_reload()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // Port 0 is technically valid (OS assigns a random port), but it's
        // unlikely to be intentional in a config file
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_templates(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.templates_resolved.pattern, "templates.pattern")?;
        require_glob(&self.templates_resolved.pattern, "templates.pattern")
    }

    fn validate_live_reload(&self) -> Result<(), ConfigError> {
        if self.live_reload.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "live_reload.debounce_ms must be greater than 0".to_owned(),
            ));
        }
        if self.live_reload.retry_ms == 0 {
            return Err(ConfigError::Validation(
                "live_reload.retry_ms must be greater than 0".to_owned(),
            ));
        }
        for pattern in &self.live_reload.watch_patterns {
            require_glob(pattern, "live_reload.watch_patterns")?;
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.templates_resolved = TemplatesConfig {
            dir: config_dir.join(self.templates.dir.as_deref().unwrap_or("templates")),
            pattern: self
                .templates
                .pattern
                .clone()
                .unwrap_or_else(|| DEFAULT_TEMPLATE_PATTERN.to_owned()),
            local_mode: self.templates.local_mode.unwrap_or(false),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.templates_resolved.dir,
            PathBuf::from("/test/templates")
        );
        assert_eq!(config.templates_resolved.pattern, "*.html");
        assert!(!config.templates_resolved.local_mode);
        assert_eq!(config.live_reload.debounce(), Duration::from_millis(50));
        assert_eq!(config.live_reload.retry(), Duration::from_millis(250));
        assert!(!config.live_reload.recursive);
        assert_eq!(config.live_reload.watch_patterns, vec!["*.html".to_owned()]);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.live_reload.debounce_ms, 50);
    }

    #[test]
    fn test_parse_server_config() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_parse_live_reload_config() {
        let toml = r#"
[live_reload]
debounce_ms = 120
retry_ms = 1000
recursive = true
watch_patterns = ["**/*.html", "**/*.jinja"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.live_reload.debounce(), Duration::from_millis(120));
        assert_eq!(config.live_reload.retry(), Duration::from_secs(1));
        assert!(config.live_reload.recursive);
        assert_eq!(
            config.live_reload.watch_patterns,
            vec!["**/*.html".to_owned(), "**/*.jinja".to_owned()]
        );
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[templates]
dir = "ui/templates"
pattern = "*.jinja"
local_mode = true
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.templates_resolved.dir,
            PathBuf::from("/project/ui/templates")
        );
        assert_eq!(config.templates_resolved.pattern, "*.jinja");
        assert!(config.templates_resolved.local_mode);
    }

    #[test]
    fn test_resolve_paths_defaults() {
        let mut config: Config = toml::from_str("").unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.templates_resolved.dir,
            PathBuf::from("/project/templates")
        );
        assert_eq!(config.templates_resolved.pattern, "*.html");
        assert!(!config.templates_resolved.local_mode);
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settle.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9100\n\n[templates]\nlocal_mode = true\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.server.port, 9100);
        assert!(config.templates_resolved.local_mode);
        assert_eq!(config.templates_resolved.dir, dir.path().join("templates"));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/settle.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settle.toml");
        std::fs::write(&path, "[live_reload]\ndebounce_ms = 0\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("debounce_ms"));
    }

    #[test]
    fn test_apply_cli_settings_host() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            host: Some("0.0.0.0".to_owned()),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_templates() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            templates_dir: Some(PathBuf::from("/custom/templates")),
            local_mode: Some(true),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(
            config.templates_resolved.dir,
            PathBuf::from("/custom/templates")
        );
        assert!(config.templates_resolved.local_mode);
        assert_eq!(config.templates_resolved.pattern, "*.html"); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let config_before = Config::default_with_base(Path::new("/test"));
        let mut config = Config::default_with_base(Path::new("/test"));

        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(config.server.host, config_before.server.host);
        assert_eq!(config.server.port, config_before.server.port);
        assert_eq!(
            config.templates_resolved.dir,
            config_before.templates_resolved.dir
        );
        assert_eq!(
            config.templates_resolved.local_mode,
            config_before.templates_resolved.local_mode
        );
    }

    // Validation tests

    /// Assert that validation fails with expected substrings in the error message.
    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let result = config.validate();
        assert!(result.is_err(), "Expected validation to fail");
        let err = result.unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        let config = Config::default_with_base(Path::new("/test"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_server_host_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.host = String::new();
        assert_validation_error(&config, &["server.host", "empty"]);
    }

    #[test]
    fn test_validate_server_port_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.port = 0;
        assert_validation_error(&config, &["server.port"]);
    }

    #[test]
    fn test_validate_retry_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.live_reload.retry_ms = 0;
        assert_validation_error(&config, &["retry_ms", "greater than 0"]);
    }

    #[test]
    fn test_validate_invalid_watch_pattern() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.live_reload.watch_patterns = vec!["[*.html".to_owned()];
        assert_validation_error(&config, &["watch_patterns", "glob"]);
    }

    #[test]
    fn test_validate_empty_template_pattern() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.templates_resolved.pattern = String::new();
        assert_validation_error(&config, &["templates.pattern", "empty"]);
    }

    #[test]
    fn test_validate_empty_watch_patterns_allowed() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.live_reload.watch_patterns = Vec::new();
        assert!(config.validate().is_ok());
    }
}
