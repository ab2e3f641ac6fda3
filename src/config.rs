use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

impl ServerConfig {
    /// Reads `HOST`, `PORT` and `STATIC_DIR`. Call `dotenvy::dotenv()` first
    /// if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let host = lookup("HOST").unwrap_or(defaults.host);
        let port: u16 = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {:?}", raw))?,
            None => defaults.port,
        };
        let static_dir = lookup("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);
        Ok(Self {
            host,
            port,
            static_dir,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        socket_addr(&self.host, self.port)
    }

    /// Address tried when the primary port is taken.
    pub fn fallback_addr(&self) -> Result<SocketAddr> {
        let port = self
            .port
            .checked_add(1)
            .context("no fallback port above 65535")?;
        socket_addr(&self.host, port)
    }
}

fn socket_addr(host: &str, port: u16) -> Result<SocketAddr> {
    format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("cannot parse bind address {}:{}", host, port))
}
