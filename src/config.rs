use std::env;
use std::fmt;
use std::ops::RangeInclusive;

/// Raised when the environment does not describe a runnable server.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "{} has an invalid value: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// One day.
const MAX_ACCESS_TOKEN_TTL_MINUTES: i64 = 24 * 60;
/// One year.
const MAX_REFRESH_TOKEN_TTL_DAYS: i64 = 365;

pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_port: u16,
    pub server_host: String,
    /// Origin allowed by CORS; credentials (cookies) are allowed for it.
    pub frontend_url: String,
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub bcrypt_cost: u32,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            server_port: parse_or(&lookup, "SERVER_PORT", 8080)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            frontend_url: lookup("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:3001".to_string()),
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl_minutes: parse_in_range(
                &lookup,
                "ACCESS_TOKEN_TTL_MINUTES",
                15,
                1..=MAX_ACCESS_TOKEN_TTL_MINUTES,
            )?,
            refresh_token_ttl_days: parse_in_range(
                &lookup,
                "REFRESH_TOKEN_TTL_DAYS",
                7,
                1..=MAX_REFRESH_TOKEN_TTL_DAYS,
            )?,
            bcrypt_cost: parse_in_range(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST, 4..=31)?,
            cookie_secure: parse_or(&lookup, "COOKIE_SECURE", false)?,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

/// Like [`parse_or`], but a parsed value outside `range` is also `Invalid`.
fn parse_in_range<F, T>(
    lookup: &F,
    key: &'static str,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd,
{
    let value = parse_or(lookup, key, default)?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            key,
            value: lookup(key).unwrap_or_default(),
        })
    }
}
