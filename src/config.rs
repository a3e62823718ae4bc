use std::env;
use std::ops::RangeInclusive;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Upper bound for `EVENT_TTL_SECS`: one year.
pub const MAX_EVENT_TTL_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "postgres" => Ok(StoreBackend::Postgres),
            _ => Err(()),
        }
    }
}

/// Table names used inside the key-value store.
#[derive(Debug, Clone)]
pub struct Tables {
    pub products: String,
    pub orders: String,
    pub events: String,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            products: "products".to_string(),
            orders: "orders".to_string(),
            events: "product_events".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub tables: Tables,
    pub event_ttl_secs: i64,
    pub event_channel_capacity: usize,
    pub expiry_sweep_interval_secs: u64,
    pub default_actor_email: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            backend: StoreBackend::Memory,
            database_url: None,
            tables: Tables::default(),
            event_ttl_secs: 300,
            event_channel_capacity: 1024,
            expiry_sweep_interval_secs: 60,
            default_actor_email: "admin@example.com".to_string(),
        }
    }
}

impl Config {
    /// Read the configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup, falling back
    /// to the defaults for anything unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let backend = parse_or(&lookup, "STORE_BACKEND", defaults.backend)?;
        let database_url = lookup("DATABASE_URL");
        if backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        Ok(Config {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            backend,
            database_url,
            tables: Tables {
                products: lookup("PRODUCTS_TABLE").unwrap_or(defaults.tables.products),
                orders: lookup("ORDERS_TABLE").unwrap_or(defaults.tables.orders),
                events: lookup("EVENTS_TABLE").unwrap_or(defaults.tables.events),
            },
            event_ttl_secs: parse_in_range(
                &lookup,
                "EVENT_TTL_SECS",
                defaults.event_ttl_secs,
                1..=MAX_EVENT_TTL_SECS,
            )?,
            event_channel_capacity: parse_or(
                &lookup,
                "EVENT_CHANNEL_CAPACITY",
                defaults.event_channel_capacity,
            )?,
            expiry_sweep_interval_secs: parse_or(
                &lookup,
                "EXPIRY_SWEEP_INTERVAL_SECS",
                defaults.expiry_sweep_interval_secs,
            )?,
            default_actor_email: lookup("DEFAULT_ACTOR_EMAIL")
                .unwrap_or(defaults.default_actor_email),
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn parse_in_range<F>(
    lookup: &F,
    name: &'static str,
    default: i64,
    range: RangeInclusive<i64>,
) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(lookup, name, default)?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        })
    }
}
