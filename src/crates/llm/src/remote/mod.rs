//! Remote chat backends.
//!
//! # Providers
//!
//! - **cyou** - the signed internal gateway (MD5 request signing)
//! - **OpenAI** - any OpenAI-compatible `/chat/completions` endpoint

pub mod cyou;
pub mod openai;

pub use cyou::{BlockingCyouClient, CyouClient, RequestSigner, SignedRequest};
pub use openai::OpenAiClient;
