//! Language-model access with a single, explicit failure contract.
//!
//! [`ModelGateway::make_request`] never returns an error type: a missing API
//! key, a transport fault and an empty answer all come back as
//! [`ModelResponse::Failure`] with a message that names the request intent
//! and the cause.  Callers decide how loudly to report it.
//!
//! The transport (an OpenAI-compatible chat completions endpoint by default)
//! is created on the first request, from the credential resolved at that
//! moment, and reused for every later request of the same gateway.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::KeysFile;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 8000;
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

// ── Transport ────────────────────────────────────────────────────────────────

/// Error raised by a model transport.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("API returned error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("API request failed: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Something that turns a prompt into model text.
pub trait ModelTransport {
    /// Send `prompt` and return the raw answer text (possibly empty).
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ModelError>;

    fn model_name(&self) -> &str;
}

/// Chat completions client for OpenAI and compatible services (OpenRouter, …).
pub struct OpenAiTransport {
    agent: ureq::Agent,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiTransport {
    pub fn new(api_key: &str, settings: &ModelSettings) -> Self {
        let base_url = settings
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim()
            .trim_end_matches('/')
            .to_string();

        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(120))
                .build(),
            api_key: api_key.to_string(),
            base_url,
            model: settings.model.clone(),
        }
    }
}

impl ModelTransport for OpenAiTransport {
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_completion_tokens": max_tokens,
        });

        debug!("POST {} (model {})", url, self.model);

        let response = self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("Content-Type", "application/json")
            .send_json(payload)
            .map_err(|e| match e {
                ureq::Error::Status(status, resp) => ModelError::Api {
                    status,
                    message: resp.into_string().unwrap_or_default(),
                },
                ureq::Error::Transport(t) => ModelError::Network(t.to_string()),
            })?;

        let body: Value = response
            .into_json()
            .map_err(|e| ModelError::Parse(e.to_string()))?;

        Ok(extract_message_content(&body))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// `choices[0].message.content`, trimmed; empty when absent.
fn extract_message_content(body: &Value) -> String {
    body.get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(|content| content.trim().to_string())
        .unwrap_or_default()
}

// ── Settings and credentials ─────────────────────────────────────────────────

/// Model selection and request limits.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    /// OpenAI-compatible endpoint; `None` uses api.openai.com
    pub base_url: Option<String>,
    pub max_tokens: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        ModelSettings {
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Where the API key comes from: an environment variable, then a key file.
#[derive(Debug, Clone)]
pub struct CredentialSource {
    pub env_var: String,
    pub key_file: Option<PathBuf>,
}

impl Default for CredentialSource {
    fn default() -> Self {
        CredentialSource {
            env_var: API_KEY_ENV.to_string(),
            key_file: KeysFile::default_path(),
        }
    }
}

impl CredentialSource {
    pub fn resolve(&self) -> Option<String> {
        if let Ok(key) = std::env::var(&self.env_var) {
            if !key.trim().is_empty() {
                return Some(key.trim().to_string());
            }
        }

        let path = self.key_file.as_ref()?;
        KeysFile::load(path)
            .api_key
            .filter(|key| !key.trim().is_empty())
    }

    fn key_file_display(&self) -> String {
        self.key_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "~/.config/blue_cli/keys.json".to_string())
    }
}

// ── Responses ────────────────────────────────────────────────────────────────

/// Why a gateway request produced no text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelFailure {
    #[error(
        "OpenAI API key not found. Set it with `export {env_var}=your_key_here` \
         or add \"api_key\" to {key_file}"
    )]
    MissingCredential { env_var: String, key_file: String },

    #[error("Error getting {intent}: {cause}")]
    Transport { intent: String, cause: String },

    #[error("Error getting {intent}: empty response from model")]
    Empty { intent: String },
}

/// Outcome of one gateway request.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    /// Non-empty, trimmed answer text
    Success(String),
    Failure(ModelFailure),
}

impl ModelResponse {
    /// Wrap raw model text; blank text becomes [`ModelFailure::Empty`].
    pub fn from_content(content: &str, intent: &str) -> Self {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            ModelResponse::Failure(ModelFailure::Empty {
                intent: intent.to_string(),
            })
        } else {
            ModelResponse::Success(trimmed.to_string())
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ModelResponse::Success(_))
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            ModelResponse::Success(content) => Some(content),
            ModelResponse::Failure(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            ModelResponse::Success(_) => None,
            ModelResponse::Failure(failure) => Some(failure.to_string()),
        }
    }

    pub fn is_missing_credential(&self) -> bool {
        matches!(
            self,
            ModelResponse::Failure(ModelFailure::MissingCredential { .. })
        )
    }
}

// ── Gateway ──────────────────────────────────────────────────────────────────

/// Builds a transport from an API key.
pub type Connector = Box<dyn Fn(&str, &ModelSettings) -> Box<dyn ModelTransport>>;

/// Owns the (lazily created) model connection for one run.
pub struct ModelGateway {
    settings: ModelSettings,
    credentials: CredentialSource,
    connector: Connector,
    connection: Option<Box<dyn ModelTransport>>,
}

impl ModelGateway {
    /// Gateway backed by [`OpenAiTransport`].
    pub fn new(settings: ModelSettings, credentials: CredentialSource) -> Self {
        Self::with_connector(
            settings,
            credentials,
            Box::new(
                |api_key: &str, settings: &ModelSettings| -> Box<dyn ModelTransport> {
                    Box::new(OpenAiTransport::new(api_key, settings))
                },
            ),
        )
    }

    pub fn with_connector(
        settings: ModelSettings,
        credentials: CredentialSource,
        connector: Connector,
    ) -> Self {
        ModelGateway {
            settings,
            credentials,
            connector,
            connection: None,
        }
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    /// Send `prompt`; `intent` names the request in failure messages.
    pub fn make_request(&mut self, prompt: &str, intent: &str) -> ModelResponse {
        let max_tokens = self.settings.max_tokens;

        let transport = match self.connection() {
            Ok(transport) => transport,
            Err(failure) => return ModelResponse::Failure(failure),
        };

        debug!("model request ({}), {} chars", intent, prompt.len());

        match transport.complete(prompt, max_tokens) {
            Ok(content) => ModelResponse::from_content(&content, intent),
            Err(e) => ModelResponse::Failure(ModelFailure::Transport {
                intent: intent.to_string(),
                cause: e.to_string(),
            }),
        }
    }

    /// The shared transport, created on first use.
    fn connection(&mut self) -> Result<&dyn ModelTransport, ModelFailure> {
        let transport = match self.connection.take() {
            Some(transport) => transport,
            None => {
                let api_key = self.credentials.resolve().ok_or_else(|| {
                    ModelFailure::MissingCredential {
                        env_var: self.credentials.env_var.clone(),
                        key_file: self.credentials.key_file_display(),
                    }
                })?;
                let transport = (self.connector)(&api_key, &self.settings);
                info!("using model {}", transport.model_name());
                transport
            }
        };

        Ok(&**self.connection.insert(transport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FixedTransport {
        answer: Result<String, String>,
    }

    impl ModelTransport for FixedTransport {
        fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String, ModelError> {
            self.answer.clone().map_err(ModelError::Network)
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    fn credentials_from_file(dir: &tempfile::TempDir, contents: Option<&str>) -> CredentialSource {
        let path = dir.path().join("keys.json");
        if let Some(contents) = contents {
            std::fs::write(&path, contents).unwrap();
        }
        CredentialSource {
            env_var: "BLUEREC_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            key_file: Some(path),
        }
    }

    fn gateway(
        credentials: CredentialSource,
        answer: Result<String, String>,
        connects: Rc<Cell<u32>>,
    ) -> ModelGateway {
        ModelGateway::with_connector(
            ModelSettings::default(),
            credentials,
            Box::new(move |_key: &str, _settings: &ModelSettings| -> Box<dyn ModelTransport> {
                connects.set(connects.get() + 1);
                Box::new(FixedTransport {
                    answer: answer.clone(),
                })
            }),
        )
    }

    #[test]
    fn test_missing_credential_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let connects = Rc::new(Cell::new(0));
        let mut gw = gateway(
            credentials_from_file(&dir, None),
            Ok("Ride - Nowhere".into()),
            connects.clone(),
        );

        let response = gw.make_request("prompt", "AI recommendations");
        assert!(!response.is_success());
        assert!(response.is_missing_credential());
        let message = response.error_message().unwrap();
        assert!(message.contains("BLUEREC_TEST_KEY_THAT_IS_NEVER_SET"));
        assert!(message.contains("keys.json"));
        assert_eq!(connects.get(), 0);
    }

    #[test]
    fn test_key_file_credential_and_single_connection() {
        let dir = tempfile::tempdir().unwrap();
        let connects = Rc::new(Cell::new(0));
        let mut gw = gateway(
            credentials_from_file(&dir, Some(r#"{"api_key": "sk-test"}"#)),
            Ok("  Ride - Nowhere\n".into()),
            connects.clone(),
        );

        let first = gw.make_request("prompt", "AI recommendations");
        let second = gw.make_request("prompt", "general explanation");
        assert_eq!(first.content(), Some("Ride - Nowhere"));
        assert!(second.is_success());
        assert_eq!(connects.get(), 1);
    }

    #[test]
    fn test_transport_error_embeds_intent_and_cause() {
        let dir = tempfile::tempdir().unwrap();
        let mut gw = gateway(
            credentials_from_file(&dir, Some(r#"{"api_key": "sk-test"}"#)),
            Err("connection refused".into()),
            Rc::new(Cell::new(0)),
        );

        let response = gw.make_request("prompt", "general explanation");
        let message = response.error_message().unwrap();
        assert!(message.contains("general explanation"));
        assert!(message.contains("connection refused"));
        assert!(response.content().is_none());
    }

    #[test]
    fn test_empty_answer_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut gw = gateway(
            credentials_from_file(&dir, Some(r#"{"api_key": "sk-test"}"#)),
            Ok("   \n".into()),
            Rc::new(Cell::new(0)),
        );

        let response = gw.make_request("prompt", "AI recommendations");
        assert_eq!(
            response,
            ModelResponse::Failure(ModelFailure::Empty {
                intent: "AI recommendations".to_string()
            })
        );
    }

    #[test]
    fn test_blank_key_in_file_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let credentials = credentials_from_file(&dir, Some(r#"{"api_key": "  "}"#));
        assert!(credentials.resolve().is_none());
    }

    #[test]
    fn test_extract_message_content() {
        let body = json!({
            "choices": [{ "message": { "role": "assistant", "content": " Lush - Spooky \n" } }]
        });
        assert_eq!(extract_message_content(&body), "Lush - Spooky");
        assert_eq!(extract_message_content(&json!({ "choices": [] })), "");
    }
}
