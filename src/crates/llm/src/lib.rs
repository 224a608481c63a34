//! Chat model backends for fastknowledge.
//!
//! This crate defines the [`ChatModel`] capability and its implementations:
//!
//! - **cyou** - the internal LLM gateway, authenticated per request with an
//!   MD5 signature over a canonical JSON body. Available as an async client
//!   ([`remote::CyouClient`]) and a blocking one
//!   ([`remote::BlockingCyouClient`]).
//! - **OpenAI** - any OpenAI-compatible `/chat/completions` endpoint.
//!
//! Backends are usually reached through a [`ModelRegistry`] built from
//! configuration, which resolves model names and applies the retry policy.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use llm::config::{CyouConfig, ModelConfig};
//! use llm::{ChatMessage, GenerationParams, ModelRegistry};
//! use std::collections::HashMap;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut models = HashMap::new();
//!     models.insert(
//!         "cyou-api".to_string(),
//!         ModelConfig::Cyou(CyouConfig::new(client_id, private_key, "http://10.0.0.5:8100")),
//!     );
//!
//!     let registry = ModelRegistry::from_configs(&models)?.with_default_model("cyou-api");
//!     let result = registry
//!         .generate(None, &[ChatMessage::user("What is Rust?")], &GenerationParams::new(0.7))
//!         .await?;
//!
//!     println!("{}", result.content);
//!     Ok(())
//! }
//! ```

pub mod canonical;
pub mod config;
pub mod error;
pub mod message;
pub mod model;
pub mod registry;
pub mod remote;

// Re-export commonly used types
pub use config::{CyouConfig, ModelConfig, RemoteLlmConfig};
pub use error::{LlmError, Result};
pub use message::{ChatMessage, ChatResult, GenerationParams, Role, UnsupportedRole};
pub use model::ChatModel;
pub use registry::ModelRegistry;
