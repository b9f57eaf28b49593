use std::time::Duration;

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: Option<String>,
    pub schema: String,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreKind,
    pub db: DbConfig,
    pub host: String,
    pub port: u16,
}

/// Schema names are spliced into SQL text, so they must be plain identifiers.
pub fn is_valid_schema(schema: &str) -> bool {
    lazy_static! {
        static ref SCHEMA_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    }
    SCHEMA_RE.is_match(schema)
}

fn parse_store_kind(raw: &str) -> anyhow::Result<StoreKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "postgres" | "pg" => Ok(StoreKind::Postgres),
        "memory" | "mem" => Ok(StoreKind::Memory),
        other => anyhow::bail!("unknown STORE value: {other}"),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = match std::env::var("STORE") {
            Ok(v) => parse_store_kind(&v)?,
            Err(_) => StoreKind::Postgres,
        };

        let url = std::env::var("DATABASE_URL").ok();
        if store == StoreKind::Postgres && url.is_none() {
            anyhow::bail!("DATABASE_URL is required when STORE=postgres");
        }

        let schema = std::env::var("MAIN_DB_SCHEMA").unwrap_or_else(|_| "public".into());
        if !is_valid_schema(&schema) {
            anyhow::bail!("MAIN_DB_SCHEMA is not a valid identifier: {schema}");
        }

        let db = DbConfig {
            url,
            schema,
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(5),
            connect_timeout: Duration::from_secs(
                std::env::var("DB_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(5),
            ),
        };

        let port = match std::env::var("APP_PORT") {
            Ok(v) => v.parse::<u16>().context("APP_PORT must be a port number")?,
            Err(_) => 8080,
        };

        Ok(Self {
            store,
            db,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
        })
    }
}
