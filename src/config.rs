use chrono::Duration;
use std::env;
use std::fmt;

use crate::auth::token::DEFAULT_TOKEN_TTL_SECONDS;

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs the service on in-memory stores.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    /// `Some` moves the revocation registry into Redis.
    pub redis_url: Option<String>,
    pub bcrypt_cost: u32,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has an invalid value: {:?}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        fn parse<T: std::str::FromStr>(
            key: &'static str,
            raw: Option<String>,
            default: T,
        ) -> Result<T, ConfigError> {
            match raw {
                None => Ok(default),
                Some(value) => {
                    let parsed = value.trim().parse::<T>();
                    parsed.map_err(|_| ConfigError::Invalid { key, value })
                }
            }
        }

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let ttl_seconds: i64 = parse("JWT_TTL_SECONDS", get("JWT_TTL_SECONDS"), DEFAULT_TOKEN_TTL_SECONDS)?;
        if ttl_seconds <= 0 {
            return Err(ConfigError::Invalid {
                key: "JWT_TTL_SECONDS",
                value: ttl_seconds.to_string(),
            });
        }

        let bcrypt_cost: u32 = parse("BCRYPT_COST", get("BCRYPT_COST"), bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        Ok(Self {
            database_url: get("DATABASE_URL"),
            database_max_connections: parse(
                "DATABASE_MAX_CONNECTIONS",
                get("DATABASE_MAX_CONNECTIONS"),
                10,
            )?,
            server_port: parse("SERVER_PORT", get("SERVER_PORT"), 8080)?,
            server_host: get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt_secret,
            token_ttl: Duration::seconds(ttl_seconds),
            redis_url: get("REDIS_URL"),
            bcrypt_cost,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}
