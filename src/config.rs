use std::{env, fmt::Display, str::FromStr};

use log::{info, warn};
use thiserror::Error;

use crate::constants::{
    DEFAULT_JWT_LIFETIME_HOURS, DEFAULT_PAGE_SIZE, MAX_JWT_LIFETIME_HOURS, MAX_PAGE_SIZE,
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Environment variable {0} is required")]
    Missing(String),

    #[error("Invalid {key} value: {reason}")]
    Invalid { key: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_lifetime_hours: i64,
    pub page_size: i64,
}

impl Config {
    /// Reads the environment, loading `.env` first when one exists.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            info!("No .env file loaded ({e})");
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let page_size: i64 = try_load(&lookup, "PAGE_SIZE", &DEFAULT_PAGE_SIZE.to_string())?;
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ConfigError::Invalid {
                key: "PAGE_SIZE".to_owned(),
                reason: format!("must be between 1 and {MAX_PAGE_SIZE}"),
            });
        }

        let jwt_lifetime_hours: i64 = try_load(
            &lookup,
            "JWT_LIFETIME_HOURS",
            &DEFAULT_JWT_LIFETIME_HOURS.to_string(),
        )?;
        if !(1..=MAX_JWT_LIFETIME_HOURS).contains(&jwt_lifetime_hours) {
            return Err(ConfigError::Invalid {
                key: "JWT_LIFETIME_HOURS".to_owned(),
                reason: format!("must be between 1 and {MAX_JWT_LIFETIME_HOURS}"),
            });
        }

        Ok(Self {
            database_url: require(&lookup, "DATABASE_URL")?,
            database_max_connections: try_load(&lookup, "DATABASE_MAX_CONNECTIONS", "5")?,
            jwt_secret: require(&lookup, "JWT_SECRET")?,
            jwt_lifetime_hours,
            page_size,
        })
    }
}

fn require<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_owned()),
        _ => {
            warn!("Environment variable {key} not found");
            Err(ConfigError::Missing(key.to_owned()))
        }
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_owned()
        })
        .trim()
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key: key.to_owned(),
                reason: e.to_string(),
            }
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_fill_optional_values() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/recipes"),
            ("JWT_SECRET", "hunter2"),
        ]))
        .unwrap();

        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.jwt_lifetime_hours, 24);
        assert_eq!(config.database_max_connections, 5);
    }

    #[test]
    fn missing_secret_is_reported() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/x")]))
            .unwrap_err();

        assert_eq!(err, ConfigError::Missing("JWT_SECRET".to_owned()));
    }

    #[test]
    fn rejects_unparsable_and_out_of_range_numbers() {
        let base = [
            ("DATABASE_URL", "postgres://localhost/x"),
            ("JWT_SECRET", "s"),
        ];

        let mut pairs = base.to_vec();
        pairs.push(("JWT_LIFETIME_HOURS", "soon"));
        assert!(matches!(
            Config::from_lookup(lookup(&pairs)),
            Err(ConfigError::Invalid { .. })
        ));

        for hours in ["0", "-5", "9223372036854775807"] {
            let mut pairs = base.to_vec();
            pairs.push(("JWT_LIFETIME_HOURS", hours));
            assert_eq!(
                Config::from_lookup(lookup(&pairs)).unwrap_err(),
                ConfigError::Invalid {
                    key: "JWT_LIFETIME_HOURS".to_owned(),
                    reason: format!("must be between 1 and {MAX_JWT_LIFETIME_HOURS}"),
                }
            );
        }

        let mut pairs = base.to_vec();
        pairs.push(("PAGE_SIZE", "0"));
        assert!(matches!(
            Config::from_lookup(lookup(&pairs)),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
