use std::{env, fmt::Display, str::FromStr, time::Duration};

use anyhow::{Result, anyhow};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend `{other}`, expected postgres or memory")),
        }
    }
}

/// Where the unit price of an order line comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PricingPolicy {
    /// Keep the price the client submitted with the cart line.
    #[default]
    Client,
    /// Re-price every line from the current catalog.
    Catalog,
}

impl FromStr for PricingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "client" => Ok(PricingPolicy::Client),
            "catalog" => Ok(PricingPolicy::Catalog),
            other => Err(format!("unknown pricing policy `{other}`, expected client or catalog")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: String,
    pub pool_max_size: u32,
    pub transaction_timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
}

#[derive(Clone, Debug, Default)]
pub struct OrdersConfig {
    pub pricing: PricingPolicy,
    pub decrement_stock: bool,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub orders: OrdersConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig { port: 5000 },
            database: DatabaseConfig {
                backend: StoreBackend::Memory,
                url: String::new(),
                pool_max_size: 5,
                transaction_timeout: Duration::from_secs(30),
            },
            auth: AuthConfig {
                jwt_secret: String::new(),
                token_ttl: chrono::Duration::days(30),
            },
            orders: OrdersConfig::default(),
        }
    }
}

/// Reads the configuration from the process environment.
pub fn load() -> Result<Config> {
    Config::from_lookup(|key| env::var(key).ok())
}

impl Config {
    /// Builds the configuration from any key lookup, e.g. the environment or a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend: StoreBackend = try_load(&lookup, "STORE_BACKEND", "postgres")?;
        let url = match backend {
            StoreBackend::Postgres => require(&lookup, "DATABASE_URL")?,
            StoreBackend::Memory => lookup("DATABASE_URL").unwrap_or_default(),
        };
        let timeout_secs: u64 = try_load(&lookup, "DATABASE_TRANSACTION_TIMEOUT_SECS", "30")?;
        let ttl_days: i64 = try_load(&lookup, "JWT_EXPIRES_IN_DAYS", "30")?;

        Ok(Config {
            server: ServerConfig {
                port: try_load(&lookup, "PORT", "5000")?,
            },
            database: DatabaseConfig {
                backend,
                url,
                pool_max_size: try_load(&lookup, "DATABASE_POOL_MAX_SIZE", "5")?,
                transaction_timeout: Duration::from_secs(timeout_secs),
            },
            auth: AuthConfig {
                jwt_secret: require(&lookup, "JWT_SECRET")?,
                token_ttl: chrono::Duration::days(ttl_days),
            },
            orders: OrdersConfig {
                pricing: try_load(&lookup, "ORDER_PRICING", "client")?,
                decrement_stock: try_load(&lookup, "ORDER_DECREMENT_STOCK", "false")?,
            },
        })
    }
}

fn require<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| anyhow!("Environment variable {key} must be set"))
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        debug!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e| anyhow!("Invalid {key} value `{raw}`: {e}"))
}
