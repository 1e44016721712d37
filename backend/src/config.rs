use chrono_tz::Tz;
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a number, got {0:?}")]
    InvalidPort(String),
    #[error("DEFAULT_TIMEZONE is not a known IANA timezone: {0:?}")]
    InvalidTimezone(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub default_timezone: Tz,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
        let port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;

        let timezone = env::var("DEFAULT_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        let default_timezone = timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(timezone))?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:8081".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:chorepoints.db?mode=rwc".to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "development-secret-key-change-in-production".to_string()),
            default_timezone,
            cors_origins,
        })
    }
}
