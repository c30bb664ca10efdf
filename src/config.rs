//! Configuration management for the incident map client.
//!
//! Configuration is layered with figment: built-in defaults, then the TOML
//! config file, then `INCIDENT_MAP_` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::state::data::Coordinate;
use crate::state::region::Region;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory name used under the platform config and cache dirs.
const APP_DIR_NAME: &str = "incident-map";

/// Prefix for environment overrides, e.g. `INCIDENT_MAP_API__BASE_URL`.
const ENV_PREFIX: &str = "INCIDENT_MAP_";

/// Legacy variable holding the geocoding key.
const MAP_API_ENV: &str = "MAP_API";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `INCIDENT_MAP_`, sections split by `__`)
/// 2. TOML config file at `~/.config/incident-map/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Incident service settings.
    pub api: ApiConfig,
    /// Geocoding service settings.
    pub geocoding: GeocodingConfig,
    /// Map defaults.
    pub map: MapConfig,
    /// Device location source.
    pub location: LocationConfig,
    /// Camera capture settings.
    pub capture: CaptureConfig,
    /// Log filter settings.
    pub logging: LoggingConfig,
}

/// Incident service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the incident service, without a trailing path.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Geocoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Geocoding JSON endpoint.
    pub endpoint: String,
    /// API key. Falls back to the `MAP_API` environment variable.
    pub api_key: Option<String>,
}

/// Map configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Latitude shown before any location is known.
    pub default_latitude: f64,
    /// Longitude shown before any location is known.
    pub default_longitude: f64,
    /// Latitude/longitude delta for freshly centered regions.
    pub default_delta: f64,
    /// Center displacement (degrees, either axis) that triggers a refetch.
    pub refresh_threshold: f64,
}

/// Device location configuration.
///
/// Desktops have no GPS; the device position comes from here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// When false, location permission is reported as denied.
    pub enabled: bool,
    /// Device latitude.
    pub latitude: Option<f64>,
    /// Device longitude.
    pub longitude: Option<f64>,
}

/// Camera capture configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Program and arguments. `{output}` is replaced with the target file path.
    /// Empty disables capture.
    pub command: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive, overridden by `RUST_LOG`.
    pub filter: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            timeout_secs: 15,
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://maps.googleapis.com/maps/api/geocode/json".to_string(),
            api_key: None,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_latitude: 30.3165,
            default_longitude: 78.0322,
            default_delta: 0.01,
            refresh_threshold: 0.01,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            latitude: None,
            longitude: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "incident_map=info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: Config = figment.extract()?;
        if config.geocoding.api_key.is_none() {
            config.geocoding.api_key = std::env::var(MAP_API_ENV).ok().filter(|k| !k.is_empty());
        }
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Directory for captured media and previews.
    #[must_use]
    pub fn cache_dir() -> PathBuf {
        dirs::cache_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if let Err(e) = reqwest::Url::parse(&self.api.base_url) {
            return Err(Error::ConfigValidation {
                message: format!("api.base_url '{}' is not a URL: {e}", self.api.base_url),
            });
        }

        if self.api.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "api.timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.map.default_delta <= 0.0 || self.map.refresh_threshold <= 0.0 {
            return Err(Error::ConfigValidation {
                message: "map.default_delta and map.refresh_threshold must be positive".to_string(),
            });
        }

        check_coordinate("map.default", self.map.default_latitude, self.map.default_longitude)?;

        if let Some(lat) = self.location.latitude {
            check_latitude("location.latitude", lat)?;
        }
        if let Some(lon) = self.location.longitude {
            check_longitude("location.longitude", lon)?;
        }

        Ok(())
    }

    /// The region shown at startup.
    #[must_use]
    pub fn default_region(&self) -> Region {
        Region::centered(self.default_coordinate(), self.map.default_delta)
    }

    /// The fallback coordinate.
    #[must_use]
    pub fn default_coordinate(&self) -> Coordinate {
        Coordinate::new(self.map.default_latitude, self.map.default_longitude)
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}

fn check_coordinate(section: &str, lat: f64, lon: f64) -> Result<()> {
    check_latitude(&format!("{section}_latitude"), lat)?;
    check_longitude(&format!("{section}_longitude"), lon)
}

fn check_latitude(key: &str, lat: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(Error::ConfigValidation {
            message: format!("{key} {lat} is outside -90..=90"),
        });
    }
    Ok(())
}

fn check_longitude(key: &str, lon: f64) -> Result<()> {
    if !(-180.0..=180.0).contains(&lon) {
        return Err(Error::ConfigValidation {
            message: format!("{key} {lon} is outside -180..=180"),
        });
    }
    Ok(())
}
