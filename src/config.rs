//! Configuration management for the layover planner
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::PlannerError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoverConfig {
    /// Geocoding / places / distance matrix service
    #[serde(default)]
    pub maps: MapsConfig,
    /// Text generation service
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Time budget and candidate selection
    #[serde(default)]
    pub planner: PlannerConfig,
    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Maps API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsConfig {
    /// API key, falls back to `GOOGLE_MAPS_API_KEY`
    pub api_key: Option<String>,
    /// Base URL for the maps web services
    #[serde(default = "default_maps_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Wait before requesting a continuation page
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    /// Optional result language
    pub language: Option<String>,
    /// Optional region bias (ccTLD)
    pub region: Option<String>,
}

/// Generation API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// API key, falls back to `GOOGLE_API_KEY`
    pub api_key: Option<String>,
    /// Base URL for the generative language API
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,
    /// Model name
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Send the plan schema as a structured-output constraint
    #[serde(default = "default_structured_output")]
    pub structured_output: bool,
}

/// Planner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Minutes needed to exit the airport
    #[serde(default = "default_leave_buffer")]
    pub leave_buffer_minutes: u32,
    /// Minutes needed to be back before the flight cutoff
    #[serde(default = "default_return_buffer")]
    pub return_buffer_minutes: u32,
    /// Assumed average ground speed used for the search radius
    #[serde(default = "default_average_speed")]
    pub average_speed_kmh: u32,
    /// Maximum places kept after discovery
    #[serde(default = "default_max_discovery_results")]
    pub max_discovery_results: usize,
    /// Maximum ranked candidates handed to generation
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    /// Optional minimum rating for discovered places
    pub min_rating: Option<f64>,
    /// Optional minimum review count for discovered places
    pub min_reviews: Option<u32>,
    /// Overall deadline for one planning request
    #[serde(default = "default_deadline")]
    pub deadline_seconds: u32,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allow-list
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_maps_base_url() -> String {
    "https://maps.googleapis.com/maps/api".to_string()
}

fn default_generation_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_timeout() -> u32 {
    20
}

fn default_generation_timeout() -> u32 {
    60
}

fn default_max_retries() -> u32 {
    2
}

fn default_page_delay_ms() -> u64 {
    2000
}

fn default_structured_output() -> bool {
    true
}

fn default_leave_buffer() -> u32 {
    45
}

fn default_return_buffer() -> u32 {
    90
}

fn default_average_speed() -> u32 {
    40
}

fn default_max_discovery_results() -> usize {
    80
}

fn default_max_candidates() -> usize {
    30
}

fn default_deadline() -> u32 {
    120
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:8000".to_string(),
    ]
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_maps_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            page_delay_ms: default_page_delay_ms(),
            language: None,
            region: None,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_generation_base_url(),
            model: default_model(),
            timeout_seconds: default_generation_timeout(),
            max_retries: default_max_retries(),
            structured_output: default_structured_output(),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            leave_buffer_minutes: default_leave_buffer(),
            return_buffer_minutes: default_return_buffer(),
            average_speed_kmh: default_average_speed(),
            max_discovery_results: default_max_discovery_results(),
            max_candidates: default_max_candidates(),
            min_rating: None,
            min_reviews: None,
            deadline_seconds: default_deadline(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl MapsConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }

    #[must_use]
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

impl GenerationConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl PlannerConfig {
    #[must_use]
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_seconds.into())
    }
}

impl LayoverConfig {
    /// Load configuration from a file (or the default location) and environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // LAYOVER__PLANNER__LEAVE_BUFFER_MINUTES=60 style overrides
        builder = builder.add_source(
            Environment::with_prefix("LAYOVER")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("server.allowed_origins"),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: LayoverConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.apply_key_fallbacks();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("layover-planner").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.maps.base_url.is_empty() {
            self.maps.base_url = default_maps_base_url();
        }
        if self.maps.timeout_seconds == 0 {
            self.maps.timeout_seconds = default_timeout();
        }
        if self.generation.base_url.is_empty() {
            self.generation.base_url = default_generation_base_url();
        }
        if self.generation.model.is_empty() {
            self.generation.model = default_model();
        }
        if self.generation.timeout_seconds == 0 {
            self.generation.timeout_seconds = default_generation_timeout();
        }
        if self.planner.average_speed_kmh == 0 {
            self.planner.average_speed_kmh = default_average_speed();
        }
        if self.planner.max_discovery_results == 0 {
            self.planner.max_discovery_results = default_max_discovery_results();
        }
        if self.planner.max_candidates == 0 {
            self.planner.max_candidates = default_max_candidates();
        }
        if self.planner.deadline_seconds == 0 {
            self.planner.deadline_seconds = default_deadline();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Pick up the conventional Google key variables when no key was configured
    pub fn apply_key_fallbacks(&mut self) {
        if self.maps.api_key.is_none() {
            self.maps.api_key = std::env::var("GOOGLE_MAPS_API_KEY").ok();
        }
        if self.generation.api_key.is_none() {
            self.generation.api_key = std::env::var("GOOGLE_API_KEY").ok();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        for (name, key) in [
            ("Maps", &self.maps.api_key),
            ("Generation", &self.generation.api_key),
        ] {
            match key {
                None => {
                    return Err(PlannerError::config(format!(
                        "{name} API key is not set"
                    ))
                    .into());
                }
                Some(key) if key.trim().is_empty() => {
                    return Err(PlannerError::config(format!(
                        "{name} API key cannot be empty"
                    ))
                    .into());
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.maps.timeout_seconds > 300 || self.generation.timeout_seconds > 300 {
            return Err(PlannerError::config("API timeout cannot exceed 300 seconds").into());
        }

        if self.maps.max_retries > 10 || self.generation.max_retries > 10 {
            return Err(PlannerError::config("API max retries cannot exceed 10").into());
        }

        if self.planner.average_speed_kmh > 200 {
            return Err(PlannerError::config("Average speed cannot exceed 200 km/h").into());
        }

        if self.planner.max_candidates > 100 {
            return Err(PlannerError::config("Maximum candidates cannot exceed 100").into());
        }

        if self.planner.max_discovery_results > 500 {
            return Err(
                PlannerError::config("Maximum discovery results cannot exceed 500").into(),
            );
        }

        if let Some(rating) = self.planner.min_rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(
                    PlannerError::config("Minimum rating must be between 0 and 5").into(),
                );
            }
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(PlannerError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(PlannerError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for url in [&self.maps.base_url, &self.generation.base_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(PlannerError::config(format!(
                    "API base URL must be a valid HTTP or HTTPS URL, got '{url}'"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed_config() -> LayoverConfig {
        let mut config = LayoverConfig::default();
        config.maps.api_key = Some("maps_key_123".to_string());
        config.generation.api_key = Some("genai_key_123".to_string());
        config
    }

    #[test]
    fn test_default_config() {
        let config = LayoverConfig::default();
        assert_eq!(config.planner.leave_buffer_minutes, 45);
        assert_eq!(config.planner.return_buffer_minutes, 90);
        assert_eq!(config.planner.average_speed_kmh, 40);
        assert_eq!(config.planner.max_candidates, 30);
        assert_eq!(config.maps.page_delay(), Duration::from_secs(2));
        assert_eq!(config.generation.model, "gemini-2.5-flash");
        assert!(config.maps.api_key.is_none());
    }

    #[test]
    fn test_config_validation_missing_api_key() {
        let config = LayoverConfig::default();
        let result = config.validate_api_keys();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Maps API key"));
    }

    #[test]
    fn test_config_validation_valid_keys() {
        assert!(keyed_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = keyed_config();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = keyed_config();
        config.maps.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_min_rating_range() {
        let mut config = keyed_config();
        config.planner.min_rating = Some(7.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_defaults_fills_zeroes() {
        let mut config = keyed_config();
        config.planner.max_candidates = 0;
        config.logging.format = String::new();
        config.apply_defaults();
        assert_eq!(config.planner.max_candidates, 30);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = LayoverConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("layover-planner"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
