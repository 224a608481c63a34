//! HTTP server bind configuration.
//!
//! # Example
//!
//! ```rust,ignore
//! use utils::server::ServerConfig;
//!
//! let config = ServerConfig::new("0.0.0.0", 9000).with_env_overrides();
//! let listener = tokio::net::TcpListener::bind(config.socket_addr()?).await?;
//! ```

use crate::error::{Result, UtilsError};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for the HTTP front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whole-request timeout in seconds. Covers the outbound calls a chat
    /// request makes.
    #[serde(default = "default_timeout_secs", alias = "timeout")]
    pub timeout_secs: u64,

    /// Enable permissive CORS for browser front ends.
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

impl ServerConfig {
    /// Create a new server configuration.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout_secs: default_timeout_secs(),
            enable_cors: default_enable_cors(),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Enable or disable CORS support.
    pub fn with_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| UtilsError::ServerError(format!("Invalid socket address: {}", e)))
    }

    /// Apply `HOST` and `PORT` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var("HOST") {
            self.host = host;
        }
        if let Some(port) = std::env::var("PORT").ok().and_then(|s| s.parse().ok()) {
            self.port = port;
        }
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(default_host(), default_port())
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9000
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_enable_cors() -> bool {
    true
}
