// config.rs
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub database_max_connections: u32,
    pub max_referral_depth: usize,
    pub cors_origins: Vec<String>,
    pub log_level: LevelFilter,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET_KEY")?;

        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|raw| split_origins(&raw))
            .unwrap_or_else(|_| vec!["http://localhost:5173".to_string()]);

        Ok(Config {
            database_url,
            jwt_secret,
            port: parsed_or("PORT", 8000)?,
            database_max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 10)?,
            max_referral_depth: parsed_or("MAX_REFERRAL_DEPTH", 64)?,
            cors_origins,
            log_level: parsed_or("RUST_LOG_LEVEL", LevelFilter::DEBUG)?,
        })
    }
}
