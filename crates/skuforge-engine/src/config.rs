//! # Engine Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SKUFORGE_DB_PATH=/var/lib/skuforge/skuforge.db                     │
//! │     SKUFORGE_MAX_RETRIES=8                                             │
//! │     SKUFORGE_DEFAULT_PATTERN={CATEGORY_CODE}-{INCREMENT}               │
//! │     SKUFORGE_SEPARATOR=_                                               │
//! │     SKUFORGE_CASE=lower                                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/skuforge/engine.toml (Linux)                             │
//! │     ~/Library/Application Support/com.skuforge.engine/engine.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "skuforge.db"
//! max_connections = 5
//!
//! [generation]
//! max_retries = 5       # Path 2 suffix attempts
//! assign_attempts = 3   # service-level retries on UNIQUE violations
//!
//! [defaults]
//! pattern = "{CATEGORY_CODE}-{PRODUCT_NAME}-{INCREMENT}"
//! separator = "-"
//! case_type = "upper"
//! ```
//!
//! `[defaults]` applies only when the database holds no pattern setting for
//! the scope or globally.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use skuforge_core::pattern::validate_pattern;
use skuforge_core::validation::{validate_max_retries, validate_separator};
use skuforge_core::{CaseType, PatternConfig, DEFAULT_MAX_RETRIES, DEFAULT_PATTERN, DEFAULT_SEPARATOR};

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "skuforge", "engine")
        .map(|dirs| dirs.data_dir().join("skuforge.db"))
        .unwrap_or_else(|| PathBuf::from("skuforge.db"))
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// `[generation]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Suffix attempts on the pattern-without-increment path.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// How many times a service assignment regenerates after the UNIQUE
    /// index rejects its write.
    #[serde(default = "default_assign_attempts")]
    pub assign_attempts: u32,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_assign_attempts() -> u32 {
    3
}

impl Default for GenerationSettings {
    fn default() -> Self {
        GenerationSettings {
            max_retries: default_max_retries(),
            assign_attempts: default_assign_attempts(),
        }
    }
}

/// `[defaults]` section: the last fallback of pattern resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternDefaults {
    #[serde(default = "default_pattern")]
    pub pattern: String,

    #[serde(default = "default_separator")]
    pub separator: String,

    #[serde(default)]
    pub case_type: CaseType,
}

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

impl Default for PatternDefaults {
    fn default() -> Self {
        PatternDefaults {
            pattern: default_pattern(),
            separator: default_separator(),
            case_type: CaseType::default(),
        }
    }
}

impl From<&PatternDefaults> for PatternConfig {
    fn from(defaults: &PatternDefaults) -> Self {
        PatternConfig {
            pattern: defaults.pattern.clone(),
            separator: defaults.separator.clone(),
            case_type: defaults.case_type,
        }
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub generation: GenerationSettings,

    #[serde(default)]
    pub defaults: PatternDefaults,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (engine.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> EngineResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| EngineError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Engine config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(EngineError::Config("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(EngineError::Config(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        validate_max_retries(self.generation.max_retries)
            .map_err(|e| EngineError::Config(e.to_string()))?;

        if self.generation.assign_attempts == 0 {
            return Err(EngineError::Config(
                "generation.assign_attempts must be greater than 0".into(),
            ));
        }

        validate_pattern(&self.defaults.pattern)
            .map_err(|e| EngineError::Config(format!("defaults.pattern: {e}")))?;
        validate_separator(&self.defaults.separator)
            .map_err(|e| EngineError::Config(format!("defaults.separator: {e}")))?;

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `SKUFORGE_*` overrides read through `lookup`. Unparseable
    /// numbers and case names are ignored with a warning.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("SKUFORGE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(retries) = lookup("SKUFORGE_MAX_RETRIES") {
            match retries.parse::<u32>() {
                Ok(n) => self.generation.max_retries = n,
                Err(_) => warn!(value = %retries, "Ignoring non-numeric SKUFORGE_MAX_RETRIES"),
            }
        }

        if let Some(pattern) = lookup("SKUFORGE_DEFAULT_PATTERN") {
            debug!(pattern = %pattern, "Overriding default pattern from environment");
            self.defaults.pattern = pattern;
        }

        if let Some(separator) = lookup("SKUFORGE_SEPARATOR") {
            self.defaults.separator = separator;
        }

        if let Some(case) = lookup("SKUFORGE_CASE") {
            match case.parse() {
                Ok(parsed) => self.defaults.case_type = parsed,
                Err(_) => warn!(case = %case, "Unknown case type in environment"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "skuforge", "engine")
            .map(|dirs| dirs.config_dir().join("engine.toml"))
    }

    /// The configured fallback pattern.
    pub fn default_pattern_config(&self) -> PatternConfig {
        PatternConfig::from(&self.defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.generation.max_retries, 5);
        assert_eq!(config.generation.assign_attempts, 3);
        assert_eq!(config.defaults.pattern, DEFAULT_PATTERN);
        assert_eq!(config.defaults.case_type, CaseType::Upper);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.generation.max_retries = 0;
        assert!(config.validate().is_err());
        config.generation.max_retries = 5;

        config.defaults.pattern = "{CATEGORY_CODE}-{SEASON}".into();
        assert!(config.validate().is_err());
        config.defaults.pattern = DEFAULT_PATTERN.into();

        config.defaults.separator = "ab".into();
        assert!(config.validate().is_err());
        config.defaults.separator = "_".into();

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("SKUFORGE_DB_PATH", "/tmp/other.db"),
            ("SKUFORGE_MAX_RETRIES", "9"),
            ("SKUFORGE_SEPARATOR", "_"),
            ("SKUFORGE_CASE", "lower"),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.generation.max_retries, 9);
        assert_eq!(config.defaults.separator, "_");
        assert_eq!(config.defaults.case_type, CaseType::Lower);
        assert_eq!(config.defaults.pattern, DEFAULT_PATTERN);
    }

    #[test]
    fn test_bad_override_is_ignored() {
        let mut config = EngineConfig::default();
        config.apply_overrides(|key| match key {
            "SKUFORGE_MAX_RETRIES" => Some("lots".to_string()),
            "SKUFORGE_CASE" => Some("title".to_string()),
            _ => None,
        });

        assert_eq!(config.generation.max_retries, 5);
        assert_eq!(config.defaults.case_type, CaseType::Upper);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");

        let mut config = EngineConfig::default();
        config.generation.max_retries = 7;
        config.defaults.pattern = "{BRAND_CODE}-{INCREMENT}".into();
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[generation]"));

        let loaded: EngineConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: EngineConfig = toml::from_str("[generation]\nmax_retries = 2\n").unwrap();
        assert_eq!(config.generation.max_retries, 2);
        assert_eq!(config.generation.assign_attempts, 3);
        assert_eq!(config.defaults.separator, "-");
    }
}
