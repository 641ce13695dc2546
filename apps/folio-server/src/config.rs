use anyhow::Context;
use axum::http::HeaderValue;
use std::{net::SocketAddr, path::PathBuf};

const DEFAULT_LISTEN: &str = "0.0.0.0:3000";

const DEV_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
];

/// Server settings read from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    /// `FOLIO_LISTEN`, 0.0.0.0:3000 by default.
    pub listen: SocketAddr,
    /// `FOLIO_DATA`, snapshot file; everything stays in memory when unset.
    pub data: Option<PathBuf>,
    /// `FOLIO_CORS_ORIGINS`, comma separated.
    pub cors_origins: Vec<HeaderValue>,
    /// `FOLIO_GRANT_SECRET`, required by the access grant endpoint.
    pub grant_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| dotenvy::var(key).ok())
    }

    fn from_vars<F: Fn(&str) -> Option<String>>(var: F) -> anyhow::Result<Self> {
        let listen = var("FOLIO_LISTEN")
            .unwrap_or_else(|| DEFAULT_LISTEN.to_owned())
            .parse::<SocketAddr>()
            .context("FOLIO_LISTEN is not a socket address")?;

        let data = var("FOLIO_DATA")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let cors_origins = match var("FOLIO_CORS_ORIGINS") {
            Some(origins) => origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(|origin| {
                    origin
                        .parse::<HeaderValue>()
                        .with_context(|| format!("invalid cors origin {origin}"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?,
            None => DEV_ORIGINS
                .into_iter()
                .map(HeaderValue::from_static)
                .collect(),
        };

        let grant_secret = var("FOLIO_GRANT_SECRET")
            .map(|secret| secret.trim().to_owned())
            .filter(|secret| !secret.is_empty());

        Ok(Self {
            listen,
            data,
            cors_origins,
            grant_secret,
        })
    }
}
