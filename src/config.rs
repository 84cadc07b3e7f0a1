//! Proxy and client configuration

use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Default mount point of the proxy routes.
pub const API_PREFIX: &str = "/api/mail";

/// Upstream provider and listener configuration for the proxy
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub base_url: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: Option<String>,
}

impl ProxyConfig {
    /// Load proxy configuration from environment variables
    ///
    /// Reads from `.env` file if present. Required variables:
    /// - `BASE_URL` (upstream provider API root)
    /// - `PASSWORD` (password given to every created account)
    ///
    /// Optional (with defaults):
    /// - `HOST` (default: `127.0.0.1`)
    /// - `PORT` (default: `5000`)
    /// - `FRONTEND_URL` (CORS origin, unset disables CORS)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required variable is missing or
    /// `PORT` is not a valid port number.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            base_url: env::var("BASE_URL")
                .map_err(|_| Error::Config("BASE_URL not set".into()))?,
            password: env::var("PASSWORD")
                .map_err(|_| Error::Config("PASSWORD not set".into()))?,
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|e| Error::Config(format!("Invalid PORT: {e}")))?,
            frontend_url: env::var("FRONTEND_URL").ok().filter(|v| !v.is_empty()),
        })
    }

    /// The `host:port` pair the proxy listens on.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Where the client finds the proxy and keeps its session
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub proxy_url: String,
    pub session_file: PathBuf,
}

impl ClientConfig {
    /// Load client configuration from environment variables
    ///
    /// Optional (with defaults):
    /// - `TEMPMAIL_PROXY_URL` (default: `http://127.0.0.1:5000/api/mail`)
    /// - `TEMPMAIL_SESSION_FILE` (default: `<data dir>/tempmail/session.json`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no session file is configured and
    /// the platform has no data directory.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let session_file = match env::var("TEMPMAIL_SESSION_FILE") {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => dirs::data_dir()
                .ok_or_else(|| Error::Config("No data directory available".into()))?
                .join("tempmail")
                .join("session.json"),
        };

        Ok(Self {
            proxy_url: env::var("TEMPMAIL_PROXY_URL")
                .unwrap_or_else(|_| format!("http://127.0.0.1:5000{API_PREFIX}")),
            session_file,
        })
    }
}
