//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Embedded defaults (lowest priority)
    Defaults = 0,
    /// Project-level config ($CWD/taskboard/)
    Project = 1,
    /// User-level config (~/.taskboard/)
    User = 2,
    /// Environment variables (highest priority)
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Paths for each configuration tier.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Project-level config directory
    pub project_dir: Option<PathBuf>,
    /// User-level config directory
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration paths from the working and home directories.
    pub fn discover() -> Self {
        Self {
            project_dir: Some(PathBuf::from("taskboard")),
            user_dir: dirs::home_dir().map(|h| h.join(".taskboard")),
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }
}

/// Read one tier's `config.yaml`. Missing files are skipped silently,
/// unreadable ones with a warning.
fn read_tier(dir: Option<&Path>, tier: ConfigTier) -> Option<(PathBuf, Value)> {
    let config_file = dir?.join("config.yaml");
    if !config_file.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(&config_file) {
        Ok(content) => content,
        Err(e) => {
            warn!("Skipping {} config {}: {}", tier, config_file.display(), e);
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => {
            debug!("Loaded {} config from {}", tier, config_file.display());
            Some((config_file, value))
        }
        Err(e) => {
            warn!("Skipping {} config {}: {}", tier, config_file.display(), e);
            None
        }
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Paths for each tier
    pub paths: ConfigPaths,
    /// Loaded configuration
    config: Config,
    /// Highest-priority config file that was used (if any)
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration from all tiers with proper merging.
    pub fn load() -> Result<Self> {
        Self::load_with_paths(ConfigPaths::discover())
    }

    /// Load configuration with explicit paths.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        // Explicit config path replaces tier merging
        if let Ok(explicit_path) = std::env::var("TASKBOARD_CONFIG_PATH") {
            return Self::load_explicit(paths, PathBuf::from(explicit_path));
        }

        let mut configs: Vec<Value> = Vec::new();
        let mut config_path = None;

        // Tier 1: Defaults (embedded)
        configs.push(serde_json::to_value(Config::default())?);

        // Tier 2: Project config, Tier 3: User config
        for (dir, tier) in [
            (paths.project_dir.as_deref(), ConfigTier::Project),
            (paths.user_dir.as_deref(), ConfigTier::User),
        ] {
            if let Some((file, value)) = read_tier(dir, tier) {
                configs.push(value);
                config_path = Some(file);
            }
        }

        let merged = deep_merge_all(configs);
        let mut config: Config =
            serde_json::from_value(merged).context("Invalid configuration")?;

        // Tier 4: Environment variable overrides
        Self::apply_env_overrides(&mut config);

        Ok(Self {
            paths,
            config,
            config_path,
        })
    }

    /// Load a single named file, still honoring environment overrides.
    pub fn load_explicit(paths: ConfigPaths, path: PathBuf) -> Result<Self> {
        let mut config = Config::load(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?;
        Self::apply_env_overrides(&mut config);
        Ok(Self {
            paths,
            config,
            config_path: Some(path),
        })
    }

    /// Apply environment variable overrides to config.
    fn apply_env_overrides(config: &mut Config) {
        if let Ok(db_path) = std::env::var("TASKBOARD_DB_PATH") {
            config.server.db_path = PathBuf::from(db_path);
        }

        if let Ok(host) = std::env::var("TASKBOARD_HOST") {
            config.server.host = host;
        }

        if let Ok(port) = std::env::var("TASKBOARD_PORT") {
            match port.parse() {
                Ok(port) => config.server.port = port,
                Err(_) => warn!("Ignoring invalid TASKBOARD_PORT '{}'", port),
            }
        }

        if let Ok(url) = std::env::var("TASKBOARD_SERVER_URL") {
            config.client.server_url = url;
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Get the config file path that was used.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PORT;
    use tempfile::TempDir;

    #[test]
    fn test_config_paths_discover() {
        let paths = ConfigPaths::discover();
        assert_eq!(paths.project_dir, Some(PathBuf::from("taskboard")));
    }

    #[test]
    fn test_load_defaults_only() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(
            Some(temp.path().join("project")),
            Some(temp.path().join("user")),
        );

        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        let config = loader.config();

        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.client.request_timeout_ms, 30_000);
        assert!(loader.config_path().is_none());
    }

    #[test]
    fn test_project_config_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("taskboard");
        std::fs::create_dir_all(&project_dir).unwrap();

        let config_content = r#"
server:
  host: 0.0.0.0
"#;
        std::fs::write(project_dir.join("config.yaml"), config_content).unwrap();

        let paths =
            ConfigPaths::with_dirs(Some(project_dir.clone()), Some(temp.path().join("user")));

        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        let config = loader.config();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(loader.config_path(), Some(project_dir.join("config.yaml").as_path()));
    }

    #[test]
    fn test_user_config_overrides_project() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("taskboard");
        let user_dir = temp.path().join("user");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::create_dir_all(&user_dir).unwrap();

        let project_config = r#"
server:
  port: 4000
client:
  notification_ttl_ms: 1000
"#;
        std::fs::write(project_dir.join("config.yaml"), project_config).unwrap();

        let user_config = r#"
server:
  port: 5000
"#;
        std::fs::write(user_dir.join("config.yaml"), user_config).unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), Some(user_dir));

        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        let config = loader.config();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.client.notification_ttl_ms, 1000);
    }

    #[test]
    fn test_unparseable_tier_is_skipped() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("taskboard");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join("config.yaml"), "server: [unclosed").unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), None);
        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        assert_eq!(loader.config().server.port, DEFAULT_PORT);
    }

    #[test]
    fn test_explicit_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("custom.yaml");
        std::fs::write(&file, "client:\n  server_url: http://example.test:1\n").unwrap();

        let loader = ConfigLoader::load_explicit(ConfigPaths::with_dirs(None, None), file).unwrap();
        assert_eq!(loader.config().client.server_url, "http://example.test:1");
    }
}
