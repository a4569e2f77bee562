//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_duration_minutes: u64,
    pub qr_secret: String,
    pub qr_grace_period_seconds: u64,
    pub campus_latitude: f64,
    pub campus_longitude: f64,
    pub campus_geofence_radius: f64,
    pub min_geofence_radius: f64,
    pub max_geofence_radius: f64,
    pub profile_cache_ttl_seconds: u64,
    pub dashboard_cache_ttl_seconds: u64,
    pub rate_limit_window_seconds: u64,
    pub rate_limit_max_requests: u32,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// This method is used internally to populate the singleton. It panics
    /// if required variables are missing or improperly formatted.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "attendance-api".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "api=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "4000".into())
                .parse()
                .expect("PORT must be a valid u16"),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "dev-jwt-secret".into()),
            jwt_duration_minutes: env::var("JWT_DURATION_MINUTES")
                .unwrap_or("60".into())
                .parse()
                .expect("JWT_DURATION_MINUTES must be a valid integer"),
            qr_secret: env::var("QR_SECRET").unwrap_or_else(|_| "fallback-secret".into()),
            qr_grace_period_seconds: env::var("QR_GRACE_PERIOD_SECONDS")
                .unwrap_or("30".into())
                .parse()
                .expect("QR_GRACE_PERIOD_SECONDS must be a valid integer"),
            campus_latitude: env::var("CAMPUS_LATITUDE")
                .unwrap_or("21.128471766438903".into())
                .parse()
                .expect("CAMPUS_LATITUDE must be a valid float"),
            campus_longitude: env::var("CAMPUS_LONGITUDE")
                .unwrap_or("81.76613230185365".into())
                .parse()
                .expect("CAMPUS_LONGITUDE must be a valid float"),
            campus_geofence_radius: env::var("CAMPUS_GEOFENCE_RADIUS")
                .unwrap_or("1200".into())
                .parse()
                .expect("CAMPUS_GEOFENCE_RADIUS must be a valid float"),
            min_geofence_radius: env::var("MIN_GEOFENCE_RADIUS")
                .unwrap_or("15".into())
                .parse()
                .expect("MIN_GEOFENCE_RADIUS must be a valid float"),
            max_geofence_radius: env::var("MAX_GEOFENCE_RADIUS")
                .unwrap_or("1200".into())
                .parse()
                .expect("MAX_GEOFENCE_RADIUS must be a valid float"),
            profile_cache_ttl_seconds: env::var("PROFILE_CACHE_TTL_SECONDS")
                .unwrap_or("3600".into())
                .parse()
                .expect("PROFILE_CACHE_TTL_SECONDS must be a valid integer"),
            dashboard_cache_ttl_seconds: env::var("DASHBOARD_CACHE_TTL_SECONDS")
                .unwrap_or("300".into())
                .parse()
                .expect("DASHBOARD_CACHE_TTL_SECONDS must be a valid integer"),
            rate_limit_window_seconds: env::var("RATE_LIMIT_WINDOW_SECONDS")
                .unwrap_or("900".into())
                .parse()
                .expect("RATE_LIMIT_WINDOW_SECONDS must be a valid integer"),
            rate_limit_max_requests: env::var("RATE_LIMIT_MAX_REQUESTS")
                .unwrap_or("100".into())
                .parse()
                .expect("RATE_LIMIT_MAX_REQUESTS must be a valid integer"),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock.write().unwrap();
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    ///
    /// Used by public per-field setter methods.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }

    pub fn set_host(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.host = value.into());
    }

    pub fn set_port(value: u16) {
        AppConfig::set_field(|cfg| cfg.port = value);
    }

    pub fn set_jwt_secret(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.jwt_secret = value.into());
    }

    pub fn set_jwt_duration_minutes(value: u64) {
        AppConfig::set_field(|cfg| cfg.jwt_duration_minutes = value);
    }

    pub fn set_qr_secret(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.qr_secret = value.into());
    }

    pub fn set_qr_grace_period_seconds(value: u64) {
        AppConfig::set_field(|cfg| cfg.qr_grace_period_seconds = value);
    }

    pub fn set_campus_geofence_radius(value: f64) {
        AppConfig::set_field(|cfg| cfg.campus_geofence_radius = value);
    }

    pub fn set_profile_cache_ttl_seconds(value: u64) {
        AppConfig::set_field(|cfg| cfg.profile_cache_ttl_seconds = value);
    }

    pub fn set_dashboard_cache_ttl_seconds(value: u64) {
        AppConfig::set_field(|cfg| cfg.dashboard_cache_ttl_seconds = value);
    }

    pub fn set_rate_limit_window_seconds(value: u64) {
        AppConfig::set_field(|cfg| cfg.rate_limit_window_seconds = value);
    }

    pub fn set_rate_limit_max_requests(value: u32) {
        AppConfig::set_field(|cfg| cfg.rate_limit_max_requests = value);
    }
}

// --- Free accessors used throughout the workspace ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn jwt_secret() -> String {
    AppConfig::global().jwt_secret.clone()
}

pub fn jwt_duration_minutes() -> u64 {
    AppConfig::global().jwt_duration_minutes
}

pub fn qr_secret() -> String {
    AppConfig::global().qr_secret.clone()
}

/// Grace period applied after nominal QR expiry, in milliseconds.
pub fn qr_grace_period_ms() -> i64 {
    AppConfig::global().qr_grace_period_seconds as i64 * 1000
}

pub fn campus_latitude() -> f64 {
    AppConfig::global().campus_latitude
}

pub fn campus_longitude() -> f64 {
    AppConfig::global().campus_longitude
}

pub fn campus_geofence_radius() -> f64 {
    AppConfig::global().campus_geofence_radius
}

pub fn min_geofence_radius() -> f64 {
    AppConfig::global().min_geofence_radius
}

pub fn max_geofence_radius() -> f64 {
    AppConfig::global().max_geofence_radius
}

pub fn profile_cache_ttl_seconds() -> u64 {
    AppConfig::global().profile_cache_ttl_seconds
}

pub fn dashboard_cache_ttl_seconds() -> u64 {
    AppConfig::global().dashboard_cache_ttl_seconds
}

pub fn rate_limit_window_seconds() -> u64 {
    AppConfig::global().rate_limit_window_seconds
}

pub fn rate_limit_max_requests() -> u32 {
    AppConfig::global().rate_limit_max_requests
}
