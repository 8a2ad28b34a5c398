//! Runtime configuration from the environment.

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub nats_url: Option<String>,
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let port = match std::env::var("PORT") {
            Ok(v) => v.parse().context("PORT is not a valid port number")?,
            Err(_) => 8084,
        };
        let max_connections = match std::env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(v) => v.parse().context("DATABASE_MAX_CONNECTIONS is not a number")?,
            Err(_) => 10,
        };
        Ok(Self {
            database_url,
            port,
            nats_url: std::env::var("NATS_URL").ok(),
            max_connections,
        })
    }
}
