//! Client for the signed cyou LLM gateway.
//!
//! Every call is authenticated with an MD5 digest over
//! `client_id ∥ private_key ∥ api_path ∥ timestamp ∥ body`, where `body` is the
//! canonical JSON text of `{"bodyArray": [...], "temperature": t}`. The
//! digest, timestamp, a random nonce and the client id travel as query
//! parameters; the body is sent exactly as it was hashed.
//!
//! Two call surfaces share the signer and the envelope parser:
//! [`CyouClient`] (async, implements [`ChatModel`]) and
//! [`BlockingCyouClient`] (synchronous, must not be used from inside an async
//! runtime).
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::config::CyouConfig;
//! use llm::remote::CyouClient;
//! use llm::{ChatMessage, ChatModel, GenerationParams};
//!
//! let config = CyouConfig::new(client_id, private_key, "http://10.0.0.5:8100");
//! let client = CyouClient::new(config)?;
//!
//! let result = client
//!     .generate(&[ChatMessage::user("你是谁")], &GenerationParams::new(0.7))
//!     .await?;
//! println!("{} ({} tokens)", result.content, result.token_usage);
//! ```

use crate::canonical::to_canonical_string;
use crate::config::CyouConfig;
use crate::error::{LlmError, Result};
use crate::message::{ChatMessage, ChatResult, GenerationParams};
use crate::model::ChatModel;
use async_trait::async_trait;
use md5::{Digest, Md5};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Digest algorithm name sent with every request.
pub const SIGN_ALGORITHM: &str = "MD5";

/// Tag reported on results produced by this backend.
pub const MODEL_TAG: &str = "cyou-chat";

#[derive(Serialize)]
struct CyouRequestBody<'a> {
    #[serde(rename = "bodyArray")]
    body_array: &'a [ChatMessage],
    temperature: f64,
}

/// A fully signed, ready-to-send request.
///
/// Built fresh for every call: the timestamp and nonce are never reused, and
/// any change to body, timestamp or path requires a new signature.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub url: String,
    pub client_id: String,
    pub timestamp: i64,
    pub nonce: f64,
    pub algorithm: &'static str,
    pub signature: String,
    pub body: String,
}

impl SignedRequest {
    /// Query parameters in the order the gateway documents them.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("clientId", self.client_id.clone()),
            ("timestamp", self.timestamp.to_string()),
            ("random", self.nonce.to_string()),
            ("algorithm", self.algorithm.to_string()),
            ("sign", self.signature.clone()),
        ]
    }
}

/// Computes signatures and builds [`SignedRequest`]s.
#[derive(Clone)]
pub struct RequestSigner {
    client_id: String,
    private_key: String,
    api_path: String,
    endpoint: String,
}

impl RequestSigner {
    pub fn new(config: &CyouConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            private_key: config.private_key.clone(),
            api_path: config.api_path.clone(),
            endpoint: config.endpoint(),
        }
    }

    /// Canonical body text for `messages` at `temperature`.
    pub fn canonical_body(messages: &[ChatMessage], temperature: f64) -> Result<String> {
        let body = CyouRequestBody {
            body_array: messages,
            temperature,
        };
        Ok(to_canonical_string(&body)?)
    }

    /// Hex MD5 over `client_id ∥ private_key ∥ api_path ∥ timestamp ∥ body`.
    pub fn signature(&self, timestamp: i64, body: &str) -> String {
        let mut hasher = Md5::new();
        hasher.update(self.client_id.as_bytes());
        hasher.update(self.private_key.as_bytes());
        hasher.update(self.api_path.as_bytes());
        hasher.update(timestamp.to_string().as_bytes());
        hasher.update(body.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Sign `messages` with the current wall-clock time.
    pub fn sign(&self, messages: &[ChatMessage], temperature: f64) -> Result<SignedRequest> {
        self.sign_at(messages, temperature, chrono::Utc::now().timestamp_millis())
    }

    /// Sign `messages` at an explicit timestamp (epoch milliseconds).
    pub fn sign_at(
        &self,
        messages: &[ChatMessage],
        temperature: f64,
        timestamp: i64,
    ) -> Result<SignedRequest> {
        let body = Self::canonical_body(messages, temperature)?;
        let signature = self.signature(timestamp, &body);

        Ok(SignedRequest {
            url: self.endpoint.clone(),
            client_id: self.client_id.clone(),
            timestamp,
            nonce: rand::random::<f64>(),
            algorithm: SIGN_ALGORITHM,
            signature,
            body,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CyouEnvelope {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<CyouData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CyouData {
    content: String,
    #[serde(default)]
    total_tokens: u64,
}

/// Map a gateway response body to a [`ChatResult`].
///
/// A null `msg` means success and `data` carries the completion. A non-null
/// `msg` carries a remote error and becomes an ordinary result with content
/// `error_code:<status> error_message:<message>` and zero token usage.
pub fn parse_envelope(raw: &str) -> Result<ChatResult> {
    let envelope: CyouEnvelope = serde_json::from_str(raw)
        .map_err(|e| LlmError::ResponseFormatError(format!("invalid envelope: {}", e)))?;

    match envelope.msg {
        None => {
            let data = envelope.data.ok_or_else(|| {
                LlmError::ResponseFormatError("success envelope without data".to_string())
            })?;
            Ok(ChatResult::new(data.content, data.total_tokens, MODEL_TAG))
        }
        Some(msg) => {
            let (status, message) = parse_embedded_error(&msg)?;
            Ok(ChatResult::remote_error(&status, &message, MODEL_TAG))
        }
    }
}

/// Decode the `"<prefix>, \"<json>\""` error string the gateway puts in `msg`.
///
/// This shape is undocumented upstream; everything that depends on it stays
/// in this function.
fn parse_embedded_error(msg: &str) -> Result<(String, String)> {
    let malformed = |why: &str| LlmError::ResponseFormatError(format!("{}: {}", why, msg));

    let (_, quoted) = msg
        .split_once(", ")
        .ok_or_else(|| malformed("error message has no delimiter"))?;
    let inner = unquote_once(quoted.trim()).ok_or_else(|| malformed("error payload is not quoted"))?;

    let payload: Value =
        serde_json::from_str(&inner).map_err(|_| malformed("error payload is not JSON"))?;
    let error = payload
        .get("error")
        .ok_or_else(|| malformed("error payload has no error object"))?;

    let message = error
        .get("message")
        .map(scalar_text)
        .ok_or_else(|| malformed("error object has no message"))?;
    let status = error
        .get("status")
        .map(scalar_text)
        .ok_or_else(|| malformed("error object has no status"))?;

    Ok((status, message))
}

/// Remove exactly one layer of double quoting.
///
/// A valid JSON string literal is unescaped once; otherwise the surrounding
/// quotes are dropped and the text kept as is.
fn unquote_once(text: &str) -> Option<String> {
    if text.len() < 2 || !text.starts_with('"') || !text.ends_with('"') {
        return None;
    }
    match serde_json::from_str::<String>(text) {
        Ok(unescaped) => Some(unescaped),
        Err(_) => Some(text[1..text.len() - 1].to_string()),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Async client for the cyou gateway.
#[derive(Clone)]
pub struct CyouClient {
    signer: RequestSigner,
    client: reqwest::Client,
    timeout: Duration,
}

impl CyouClient {
    /// Create a client with its own connection pool.
    pub fn new(config: CyouConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| LlmError::ConfigError(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(config, client))
    }

    /// Create a client sharing an existing connection pool.
    pub fn with_client(config: CyouConfig, client: reqwest::Client) -> Self {
        Self {
            signer: RequestSigner::new(&config),
            timeout: config.timeout(),
            client,
        }
    }

    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }
}

#[async_trait]
impl ChatModel for CyouClient {
    async fn generate(&self, messages: &[ChatMessage], params: &GenerationParams) -> Result<ChatResult> {
        params.validate()?;
        let signed = self.signer.sign(messages, params.temperature)?;
        debug!(
            url = %signed.url,
            timestamp = signed.timestamp,
            messages = messages.len(),
            body_bytes = signed.body.len(),
            "Sending signed chat request"
        );

        let start = Instant::now();
        let response = self
            .client
            .post(&signed.url)
            .query(&signed.query_params())
            .header(CONTENT_TYPE, "application/json")
            .body(signed.body)
            .timeout(params.timeout.unwrap_or(self.timeout))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "cyou gateway returned an error status");
            return Err(LlmError::TransportError {
                status: status.as_u16(),
                body: text,
            });
        }

        let result = parse_envelope(&text)?;
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            tokens = result.token_usage,
            "cyou chat completed"
        );
        Ok(result)
    }

    fn model_tag(&self) -> &str {
        MODEL_TAG
    }
}

/// Synchronous client for the cyou gateway.
///
/// Uses `reqwest::blocking`, so it must be created, used and dropped outside
/// of an async runtime (or inside `spawn_blocking`).
pub struct BlockingCyouClient {
    signer: RequestSigner,
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl BlockingCyouClient {
    pub fn new(config: CyouConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| LlmError::ConfigError(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            signer: RequestSigner::new(&config),
            timeout: config.timeout(),
            client,
        })
    }

    /// Generate a completion, blocking the current thread.
    pub fn generate(&self, messages: &[ChatMessage], params: &GenerationParams) -> Result<ChatResult> {
        params.validate()?;
        let signed = self.signer.sign(messages, params.temperature)?;
        debug!(
            url = %signed.url,
            timestamp = signed.timestamp,
            messages = messages.len(),
            "Sending signed chat request (blocking)"
        );

        let start = Instant::now();
        let response = self
            .client
            .post(&signed.url)
            .query(&signed.query_params())
            .header(CONTENT_TYPE, "application/json")
            .body(signed.body)
            .timeout(params.timeout.unwrap_or(self.timeout))
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "cyou gateway returned an error status");
            return Err(LlmError::TransportError {
                status: status.as_u16(),
                body: text,
            });
        }

        let result = parse_envelope(&text)?;
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            tokens = result.token_usage,
            "cyou chat completed (blocking)"
        );
        Ok(result)
    }

    pub fn model_tag(&self) -> &str {
        MODEL_TAG
    }
}
