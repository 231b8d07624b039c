use std::time::Duration;

use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub announcements: AnnouncementsConfig,
    pub geolocation: GeolocationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// When off the board runs purely in memory.
    pub enabled: bool,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Bearer token for the admin routes. Admin routes reject everything
    /// when unset.
    pub admin_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnnouncementsConfig {
    pub default_posted_by: String,
    pub seed_demo_data: bool,
    pub notification_duration_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeolocationConfig {
    pub high_accuracy: bool,
    pub initial_timeout_ms: u64,
    pub initial_max_age_ms: u64,
    pub watch_timeout_ms: u64,
    pub watch_max_age_ms: u64,
    pub min_accuracy_circle_px: f64,
}

impl GeolocationConfig {
    pub fn initial_timeout(&self) -> Duration {
        Duration::from_millis(self.initial_timeout_ms)
    }

    pub fn initial_max_age(&self) -> Duration {
        Duration::from_millis(self.initial_max_age_ms)
    }

    pub fn watch_timeout(&self) -> Duration {
        Duration::from_millis(self.watch_timeout_ms)
    }

    pub fn watch_max_age(&self) -> Duration {
        Duration::from_millis(self.watch_max_age_ms)
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.base_url", "http://localhost:8080")?
            .set_default("database.enabled", false)?
            .set_default("database.url", "sqlite://campus-connect.db?mode=rwc")?
            .set_default("database.max_connections", 5)?
            .set_default("announcements.default_posted_by", "Admin")?
            .set_default("announcements.seed_demo_data", true)?
            .set_default("announcements.notification_duration_ms", 2000)?
            .set_default("geolocation.high_accuracy", true)?
            .set_default("geolocation.initial_timeout_ms", 10000)?
            .set_default("geolocation.initial_max_age_ms", 5000)?
            .set_default("geolocation.watch_timeout_ms", 15000)?
            .set_default("geolocation.watch_max_age_ms", 1000)?
            .set_default("geolocation.min_accuracy_circle_px", 30.0)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with CAMPUS__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("CAMPUS").separator("__"))

            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                enabled: false,
                url: "sqlite://campus-connect.db?mode=rwc".to_string(),
                max_connections: 5,
            },
            auth: AuthConfig { admin_token: None },
            announcements: AnnouncementsConfig {
                default_posted_by: "Admin".to_string(),
                seed_demo_data: true,
                notification_duration_ms: 2000,
            },
            geolocation: GeolocationConfig {
                high_accuracy: true,
                initial_timeout_ms: 10_000,
                initial_max_age_ms: 5_000,
                watch_timeout_ms: 15_000,
                watch_max_age_ms: 1_000,
                min_accuracy_circle_px: 30.0,
            },
        }
    }
}
