use std::{net::SocketAddr, str::FromStr};

use anyhow::Context;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StoreKind {
    Sql,
    Memory,
}

impl FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sql" | "sqlite" => Ok(StoreKind::Sql),
            "memory" => Ok(StoreKind::Memory),
            other => anyhow::bail!("unknown store {other:?}, expected \"sql\" or \"memory\""),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub store: StoreKind,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://catalog.db?mode=rwc".to_string());

        let store: StoreKind = std::env::var("CATALOG_STORE")
            .unwrap_or_else(|_| "sql".to_string())
            .parse()
            .context("CATALOG_STORE")?;

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            store,
        })
    }
}
