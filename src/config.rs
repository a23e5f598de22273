use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::core::{ComplianceChecker, DeterminationEngine};
use crate::models::Thresholds;
use crate::services::GeodataEndpoints;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub geodata: GeodataSettings,
    #[serde(default)]
    pub regulation: RegulationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    /// L2 tier; the cache runs in-process only when unset
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeodataSettings {
    #[serde(default = "default_address_url")]
    pub address_url: String,
    #[serde(default = "default_geo_api_url")]
    pub geo_api_url: String,
    #[serde(default = "default_apicarto_url")]
    pub apicarto_url: String,
    /// Per-call timeout
    #[serde(default = "default_geodata_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GeodataSettings {
    fn default() -> Self {
        Self {
            address_url: default_address_url(),
            geo_api_url: default_geo_api_url(),
            apicarto_url: default_apicarto_url(),
            timeout_secs: default_geodata_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl GeodataSettings {
    pub fn endpoints(&self) -> GeodataEndpoints {
        GeodataEndpoints {
            address_url: self.address_url.clone(),
            geo_api_url: self.geo_api_url.clone(),
            apicarto_url: self.apicarto_url.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_address_url() -> String { "https://api-adresse.data.gouv.fr".to_string() }
fn default_geo_api_url() -> String { "https://geo.api.gouv.fr".to_string() }
fn default_apicarto_url() -> String { "https://apicarto.ign.fr/api".to_string() }
fn default_geodata_timeout() -> u64 { 8 }
fn default_user_agent() -> String { format!("permis-engine/{}", env!("CARGO_PKG_VERSION")) }

/// Regulatory thresholds, overridable per deployment
#[derive(Debug, Clone, Deserialize)]
pub struct RegulationSettings {
    #[serde(default = "default_architect_floor_area")]
    pub architect_floor_area_m2: f64,
    #[serde(default = "default_standalone_dp_max")]
    pub standalone_dp_max_m2: f64,
    #[serde(default = "default_extension_dp_max")]
    pub extension_dp_max_m2: f64,
    #[serde(default = "default_story_height")]
    pub story_height_m: f64,
    #[serde(default = "default_max_counted_stories")]
    pub max_counted_stories: u32,
    #[serde(default = "default_pool_shelter_height")]
    pub pool_shelter_caveat_height_m: f64,
    #[serde(default = "default_coverage_warning_ratio")]
    pub coverage_warning_ratio: f64,
    #[serde(default = "default_green_space_warning_ratio")]
    pub green_space_warning_ratio: f64,
}

impl Default for RegulationSettings {
    fn default() -> Self {
        Self {
            architect_floor_area_m2: default_architect_floor_area(),
            standalone_dp_max_m2: default_standalone_dp_max(),
            extension_dp_max_m2: default_extension_dp_max(),
            story_height_m: default_story_height(),
            max_counted_stories: default_max_counted_stories(),
            pool_shelter_caveat_height_m: default_pool_shelter_height(),
            coverage_warning_ratio: default_coverage_warning_ratio(),
            green_space_warning_ratio: default_green_space_warning_ratio(),
        }
    }
}

impl RegulationSettings {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            architect_floor_area_m2: self.architect_floor_area_m2,
            standalone_dp_max_m2: self.standalone_dp_max_m2,
            extension_dp_max_m2: self.extension_dp_max_m2,
            story_height_m: self.story_height_m,
            max_counted_stories: self.max_counted_stories,
            pool_shelter_caveat_height_m: self.pool_shelter_caveat_height_m,
        }
    }

    pub fn engine(&self) -> DeterminationEngine {
        DeterminationEngine::new(self.thresholds())
    }

    pub fn checker(&self) -> ComplianceChecker {
        ComplianceChecker::new(self.coverage_warning_ratio, self.green_space_warning_ratio)
    }
}

fn default_architect_floor_area() -> f64 { 150.0 }
fn default_standalone_dp_max() -> f64 { 20.0 }
fn default_extension_dp_max() -> f64 { 40.0 }
fn default_story_height() -> f64 { 2.5 }
fn default_max_counted_stories() -> u32 { 2 }
fn default_pool_shelter_height() -> f64 { 1.8 }
fn default_coverage_warning_ratio() -> f64 { 0.9 }
fn default_green_space_warning_ratio() -> f64 { 1.1 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `info` or `permis_engine=debug,actix_web=info`
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty`, `compact` or `full`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "full".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with PERMIS_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Local development overrides
            .add_source(File::with_name("config/local").required(false))
            // e.g., PERMIS__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("PERMIS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }
}

/// Apply the conventional unprefixed variables on top of the config
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    for (var, key) in [
        ("DATABASE_URL", "database.url"),
        ("REDIS_URL", "cache.redis_url"),
        ("LOG_LEVEL", "logging.level"),
        ("LOG_FORMAT", "logging.format"),
    ] {
        if let Ok(value) = env::var(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}
