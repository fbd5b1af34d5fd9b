#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! schemagen Configuration
//!
//! This crate provides configuration management for the generators.
//! It handles loading, saving, and locating the configuration file that specifies:
//! - Logging configuration
//! - Code generation parameters (generator tags, indentation)
//!
//! Configuration is stored in TOML format. The generators take no optional
//! command-line flags, so anything tunable lives here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable that points at an explicit configuration file
pub const CONFIG_ENV: &str = "SCHEMAGEN_CONFIG";

/// Errors that can occur when loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    /// Failed to parse the TOML configuration file
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize configuration to TOML format
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// Configuration file named by `SCHEMAGEN_CONFIG` was not found
    #[error("Config file not found at: {0}")]
    NotFound(PathBuf),
    /// Could not locate the user's configuration directory
    #[error("Could not find user config directory")]
    ConfigDirUnavailable,
    /// A configured value is out of range
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Code generation settings
    pub codegen: CodegenConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
}

/// Code generation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    /// Sentinel tag of the JSON codec generator (`__<tag>_...`)
    pub json_tag: String,
    /// Tag of the RPC dispatch generator
    pub rpc_tag: String,
    /// Indent with this many spaces instead of a tab
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_width: Option<usize>,
}

impl Config {
    /// Load configuration from a TOML file at `path`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save this configuration as a pretty-printed TOML file at `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Returns the default config file path:
    /// `{config_dir()}/schemagen/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir =
            dirs::config_dir().ok_or(ConfigError::ConfigDirUnavailable)?.join("schemagen");
        Ok(config_dir.join("config.toml"))
    }

    /// Load the effective configuration.
    ///
    /// `SCHEMAGEN_CONFIG` must name an existing file when set. Otherwise the default
    /// path is used if it exists, and built-in defaults apply if it does not.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::load_internal(explicit, Self::default_path().ok())
    }

    /// Internal function for testing - allows injection of environment values
    fn load_internal(
        explicit: Option<PathBuf>,
        default_path: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path));
            }
            return Self::from_file(path);
        }

        match default_path {
            Some(path) if path.is_file() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// The indentation unit generated code uses
    pub fn indent_unit(&self) -> String {
        match self.codegen.indent_width {
            Some(width) => " ".repeat(width),
            None => "\t".to_string(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, tag) in [("json_tag", &self.codegen.json_tag), ("rpc_tag", &self.codegen.rpc_tag)]
        {
            let valid = !tag.is_empty()
                && tag.chars().all(|c| c.is_ascii_alphanumeric())
                && tag.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
            if !valid {
                return Err(ConfigError::Invalid(format!(
                    "codegen.{} must be alphanumeric and start with a letter, got `{}`",
                    key, tag
                )));
            }
        }
        if self.codegen.indent_width == Some(0) {
            return Err(ConfigError::Invalid("codegen.indent_width must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self { Self { level: "info".to_string() } }
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self { json_tag: "jsongen".to_string(), rpc_tag: "rpcgen".to_string(), indent_width: None }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_from_file() {
        let temp_file = NamedTempFile::new().expect("Failed to create temporary file");
        let toml_content = r#"
            [logging]
            level = "debug"

            [codegen]
            json_tag = "jsongen"
            rpc_tag = "rpcgen"
            indent_width = 4
        "#;
        fs::write(&temp_file, toml_content)
            .expect("Failed to write TOML content to temporary file");

        let loaded_config =
            Config::from_file(&temp_file).expect("Failed to load config from temporary file");
        assert_eq!(loaded_config.logging.level, "debug");
        assert_eq!(loaded_config.codegen.json_tag, "jsongen");
        assert_eq!(loaded_config.codegen.indent_width, Some(4));
        assert_eq!(loaded_config.indent_unit(), "    ");

        // Missing sections fall back to defaults
        let temp_file2 = NamedTempFile::new().expect("Failed to create second temporary file");
        fs::write(&temp_file2, "[logging]\nlevel = \"warn\"\n")
            .expect("Failed to write second TOML content to temporary file");
        let loaded_config2 = Config::from_file(&temp_file2)
            .expect("Failed to load second config from temporary file");
        assert_eq!(loaded_config2.logging.level, "warn");
        assert_eq!(loaded_config2.codegen, CodegenConfig::default());
        assert_eq!(loaded_config2.indent_unit(), "\t");

        // Test file not found error
        let result = Config::from_file("nonexistent_file.toml");
        match result.expect_err("Expected error for nonexistent file") {
            ConfigError::FileRead(_) => {}
            other => panic!("Expected FileRead error, got {:?}", other),
        }

        // Test parse error
        let temp_file =
            NamedTempFile::new().expect("Failed to create temporary file for parse error test");
        fs::write(&temp_file, "invalid toml content")
            .expect("Failed to write invalid TOML content");
        match Config::from_file(&temp_file).expect_err("Expected parse error for invalid TOML") {
            ConfigError::Parse(_) => {}
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let temp_file = NamedTempFile::new().expect("Failed to create temporary file");
        fs::write(&temp_file, "[codegen]\njson_tag = \"json_gen\"\n").expect("write config");
        match Config::from_file(&temp_file).expect_err("underscore in tag breaks the sentinel") {
            ConfigError::Invalid(msg) => assert!(msg.contains("json_tag")),
            other => panic!("Expected Invalid error, got {:?}", other),
        }

        fs::write(&temp_file, "[codegen]\nindent_width = 0\n").expect("write config");
        assert!(matches!(Config::from_file(&temp_file), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_save() {
        let config = Config::default();
        let temp_file =
            NamedTempFile::new().expect("Failed to create temporary file for save test");

        config.save(&temp_file).expect("save succeeds");

        let contents = fs::read_to_string(&temp_file).expect("Failed to read saved config file");
        assert!(contents.contains("jsongen"));
        assert!(contents.contains("rpcgen"));
        assert!(contents.contains("info"));
        assert_eq!(Config::from_file(&temp_file).expect("reload"), config);

        let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory");
        let non_existent_subdir = temp_dir.path().join("nonexistent").join("config.toml");
        match config.save(&non_existent_subdir).expect_err("parent directory is missing") {
            ConfigError::FileRead(_) => (),
            other => panic!("Expected FileRead error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_path() {
        let path = Config::default_path().expect("Failed to get default config path");
        let path_str = path.to_str().expect("Path should be valid UTF-8");
        assert!(path_str.contains("schemagen"));
        assert!(path_str.ends_with("config.toml"));
    }

    #[test]
    fn test_load_internal() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory");

        // Nothing configured: built-in defaults
        let config = Config::load_internal(None, Some(temp_dir.path().join("absent.toml")))
            .expect("defaults");
        assert_eq!(config, Config::default());

        // Default path present
        let default_path = temp_dir.path().join("config.toml");
        fs::write(&default_path, "[logging]\nlevel = \"trace\"\n").expect("write config");
        let config = Config::load_internal(None, Some(default_path.clone())).expect("load");
        assert_eq!(config.logging.level, "trace");

        // Explicit path wins over the default path
        let explicit = temp_dir.path().join("explicit.toml");
        fs::write(&explicit, "[logging]\nlevel = \"error\"\n").expect("write config");
        let config =
            Config::load_internal(Some(explicit), Some(default_path)).expect("explicit load");
        assert_eq!(config.logging.level, "error");

        // Explicit path must exist
        let missing = temp_dir.path().join("missing.toml");
        match Config::load_internal(Some(missing), None).expect_err("explicit path missing") {
            ConfigError::NotFound(_) => (),
            other => panic!("Expected NotFound error, got {:?}", other),
        }
    }
}
