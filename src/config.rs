use std::net::SocketAddr;

use anyhow::{anyhow, Context};
use sqlx::postgres::PgConnectOptions;

const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Where the store lives. Credentials never fall back to built-in values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Database {
    Url(String),
    Parts {
        host: String,
        port: u16,
        user: String,
        password: String,
        name: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: Database,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Config> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| anyhow!("environment variable `{}` must be set", key))
        };

        let database = match get("DATABASE_URL") {
            Some(url) => Database::Url(url),
            None => Database::Parts {
                host: get("DB_HOST").unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
                port: match get("DB_PORT") {
                    Some(port) => port.parse().context("`DB_PORT` is not a valid port")?,
                    None => DEFAULT_DB_PORT,
                },
                user: required("DB_USER")?,
                password: required("DB_PASSWORD")?,
                name: required("DB_NAME")?,
            },
        };

        let max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(max) => max
                .parse()
                .context("`DB_MAX_CONNECTIONS` is not a number")?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("`BIND_ADDR` is not a socket address")?;

        Ok(Config {
            database,
            max_connections,
            bind_addr,
        })
    }

    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        Ok(match &self.database {
            Database::Url(url) => url.parse().context("`DATABASE_URL` is malformed")?,
            Database::Parts {
                host,
                port,
                user,
                password,
                name,
            } => PgConnectOptions::new()
                .host(host)
                .port(*port)
                .username(user)
                .password(password)
                .database(name),
        })
    }
}
