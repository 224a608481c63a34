//! Shared helpers for the fastknowledge workspace.
//!
//! This crate holds the pieces that are not specific to chat or retrieval:
//! configuration loading, bounded retry policies for outbound calls and the
//! HTTP server bind configuration.
//!
//! # Modules
//!
//! ## Config (`config`)
//!
//! Environment variable and file loading with format auto-detection:
//!
//! ```rust,ignore
//! use utils::config::{get_env_or, load_config_file};
//!
//! let path = get_env_or("FASTKNOWLEDGE_CONFIG", "config/fastknowledge.yaml");
//! let config: AppConfig = load_config_file(&path)?;
//! ```
//!
//! ## Retry (`retry`)
//!
//! A retry policy is a value handed to the component that performs the
//! outbound call, never hard-coded inside it:
//!
//! ```rust,ignore
//! use utils::retry::{with_retry_if, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(3).with_initial_delay(Duration::from_millis(200));
//! let docs = with_retry_if(&policy, "search_docs", |e: &SearchError| e.is_retryable(), || {
//!     client.search_docs(&query)
//! })
//! .await?;
//! ```
//!
//! ## Server (`server`)
//!
//! Bind address and request timeout for the HTTP front end.
//!
//! # Features
//!
//! - `server` - Server configuration (enabled by default)
//! - `config` - Configuration loading (enabled by default)

pub mod error;
pub mod retry;

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "config")]
pub mod config;

// Re-export commonly used types
pub use error::{Result, UtilsError};
pub use retry::{with_retry, with_retry_if, RetryPolicy};

#[cfg(feature = "server")]
pub use server::ServerConfig;

#[cfg(feature = "config")]
pub use config::{get_env_or, load_config_file, load_json_config, load_yaml_config, ValidateConfig};
