//! Configuration File Loading
//!
//! Finds the configuration file in the usual locations, parses it as TOML or
//! JSON depending on its extension, and validates the result.

use super::Config;
use crate::error::{Error, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "THERMOCAP_CONFIG";

/// Configuration file loader
pub struct ConfigLoader {
    /// Search paths for configuration files (without extension)
    search_paths: Vec<PathBuf>,
    /// Supported configuration file formats
    supported_formats: Vec<ConfigFormat>,
    /// Current configuration file path (if loaded)
    current_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Pick a format from a file extension, defaulting to TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }

    fn name(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Json => "JSON",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Whether to fall back to the default config if none exists
    pub create_default: bool,
    /// Whether to validate configuration after loading
    pub validate: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            create_default: true,
            validate: true,
        }
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            search_paths: Self::get_search_paths(),
            supported_formats: vec![ConfigFormat::Toml, ConfigFormat::Json],
            current_path: None,
        }
    }

    /// Load configuration with default options
    pub fn load() -> Result<Config> {
        Self::new().load_with_options(LoadOptions::default())
    }

    /// Load configuration with custom options
    pub fn load_with_options(&mut self, options: LoadOptions) -> Result<Config> {
        if let Some((path, config)) = self.find_and_load_config()? {
            if options.validate {
                validate_config(&config)?;
            }
            info!("Configuration loaded from {}", path.display());
            self.current_path = Some(path);
            return Ok(config);
        }

        if options.create_default {
            debug!("No configuration file found, using defaults");
            let config = Config::default();
            if options.validate {
                validate_config(&config)?;
            }
            Ok(config)
        } else {
            Err(Error::ConfigNotFound)
        }
    }

    /// Load and validate a specific configuration file
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(Error::ConfigLoadFailed {
                path: path.to_path_buf(),
                reason: "Configuration file does not exist".to_string(),
            });
        }
        let config = load_config_file(path, ConfigFormat::from_path(path))?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config: &Config, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let format = ConfigFormat::from_path(path);
        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| {
                Error::ConfigSerializationFailed {
                    format: format.name().to_string(),
                    reason: e.to_string(),
                }
            })?,
            ConfigFormat::Toml => {
                toml::to_string_pretty(config).map_err(|e| Error::ConfigSerializationFailed {
                    format: format.name().to_string(),
                    reason: e.to_string(),
                })?
            }
        };

        fs::write(path, content).map_err(|e| Error::ConfigSaveFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Find and load configuration from search paths
    fn find_and_load_config(&self) -> Result<Option<(PathBuf, Config)>> {
        for path in &self.search_paths {
            for format in &self.supported_formats {
                let config_path = path.with_extension(format.extension());

                if config_path.exists() {
                    match load_config_file(&config_path, *format) {
                        Ok(config) => return Ok(Some((config_path, config))),
                        Err(e) => {
                            // Keep searching; a broken file should not hide a good one
                            warn!("Failed to load config from {}: {}", config_path.display(), e);
                            continue;
                        }
                    }
                }
            }
        }

        Ok(None)
    }

    /// Get default search paths for configuration files
    fn get_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(explicit) = env::var(CONFIG_ENV_VAR) {
            let explicit = PathBuf::from(explicit);
            // with_extension() would clobber the user's extension, so strip it here
            paths.push(explicit.with_extension(""));
        }

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("thermocap").join("config"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".thermocap"));
        }

        if let Ok(cwd) = env::current_dir() {
            paths.push(cwd.join(".thermocap"));
        }

        paths
    }

    /// Get the current configuration file path
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// List all search paths
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Clear all search paths and add a single path
    pub fn set_search_path(&mut self, path: PathBuf) {
        self.search_paths = vec![path];
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load a specific configuration file
fn load_config_file(path: &Path, format: ConfigFormat) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    match format {
        ConfigFormat::Toml => toml::from_str(&content).map_err(|e| Error::ConfigParseFailed {
            format: format.name().to_string(),
            reason: e.to_string(),
        }),
        ConfigFormat::Json => serde_json::from_str(&content).map_err(|e| Error::ConfigParseFailed {
            format: format.name().to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.camera.host.trim().is_empty() {
        return Err(Error::ConfigValidationFailed {
            field: "camera.host".to_string(),
            reason: "Camera host cannot be empty".to_string(),
        });
    }

    if config.camera.binary.as_os_str().is_empty() {
        return Err(Error::ConfigValidationFailed {
            field: "camera.binary".to_string(),
            reason: "Capture binary path cannot be empty".to_string(),
        });
    }

    if config.capture.frame_target == 0 {
        return Err(Error::ConfigValidationFailed {
            field: "capture.frame_target".to_string(),
            reason: "Frame target must be at least 1".to_string(),
        });
    }

    if config.capture.hard_timeout_secs == 0 {
        return Err(Error::ConfigValidationFailed {
            field: "capture.hard_timeout_secs".to_string(),
            reason: "Hard timeout must be greater than 0".to_string(),
        });
    }

    if config.capture.poll_interval_ms == 0 {
        return Err(Error::ConfigValidationFailed {
            field: "capture.poll_interval_ms".to_string(),
            reason: "Poll interval must be greater than 0".to_string(),
        });
    }

    if config.capture.poll_interval_ms > config.capture.hard_timeout_secs.saturating_mul(1000) {
        return Err(Error::ConfigValidationFailed {
            field: "capture.poll_interval_ms".to_string(),
            reason: "Poll interval cannot exceed the hard timeout".to_string(),
        });
    }

    if config.capture.terminate_grace_ms > 60_000 {
        return Err(Error::ConfigValidationFailed {
            field: "capture.terminate_grace_ms".to_string(),
            reason: "Terminate grace period cannot exceed 60 seconds".to_string(),
        });
    }

    if config.pipeline.file_suffix.trim().is_empty() {
        return Err(Error::ConfigValidationFailed {
            field: "pipeline.file_suffix".to_string(),
            reason: "File suffix cannot be empty".to_string(),
        });
    }

    if config.pipeline.data_dir.as_os_str().is_empty() {
        return Err(Error::ConfigValidationFailed {
            field: "pipeline.data_dir".to_string(),
            reason: "Data directory cannot be empty".to_string(),
        });
    }

    Ok(())
}
