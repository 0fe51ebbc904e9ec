//! CLI configuration and settings management

use crate::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use witness_core::{PrettyOptions, TargetKind, WitnessOptions};

/// Name of the project-local configuration file.
pub const LOCAL_CONFIG_FILE: &str = "witness.toml";

/// CLI configuration loaded from config files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WitnessConfig {
    /// Rendering settings
    pub formatting: FormattingConfig,

    /// Defaults applied beneath every attachment site's own arguments
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormattingConfig {
    /// Spaces per indentation level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_size: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// `struct` or `class`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,

    /// Attributes placed on every generated witness type
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
}

impl WitnessConfig {
    /// Load configuration from file, falling back to defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        // Standard locations, least specific first
        let mut candidates = Vec::new();
        if let Some(user_config) = Self::default_config_path() {
            candidates.push(user_config);
        }
        if let Some(home_dir) = dirs::home_dir() {
            candidates.push(home_dir.join(".witness.toml"));
        }
        candidates.push(PathBuf::from(LOCAL_CONFIG_FILE));

        let mut config = Self::default();
        for path in candidates.iter().filter(|path| path.is_file()) {
            debug!(path = %path.display(), "loading configuration");
            config = config.merge(Self::load_from_file(path)?);
        }
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            CliError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CliError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        std::fs::write(path, content)
            .map_err(|e| CliError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Merge this configuration with another; settings present in `other`
    /// take precedence.
    pub fn merge(self, other: Self) -> Self {
        let attributes = if other.defaults.attributes.is_empty() {
            self.defaults.attributes
        } else {
            other.defaults.attributes
        };
        Self {
            formatting: FormattingConfig {
                indent_size: other.formatting.indent_size.or(self.formatting.indent_size),
            },
            defaults: DefaultsConfig {
                target_type: other.defaults.target_type.or(self.defaults.target_type),
                attributes,
            },
        }
    }

    pub fn pretty_options(&self) -> PrettyOptions {
        let mut options = PrettyOptions::default();
        if let Some(indent_size) = self.formatting.indent_size {
            options.indent_size = indent_size;
        }
        options
    }

    pub fn witness_options(&self) -> Result<WitnessOptions> {
        let mut options = WitnessOptions::default();
        if let Some(target) = &self.defaults.target_type {
            options.target = TargetKind::parse(target).ok_or_else(|| {
                CliError::Config(format!(
                    "Unknown target_type `{target}`; expected `struct` or `class`"
                ))
            })?;
        }
        for attribute in &self.defaults.attributes {
            options = options.with_attribute(attribute);
        }
        Ok(options)
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("witness").join("config.toml"))
    }
}
