use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatRequest};
use tracing::debug;

use super::error::VerifierError;

const SYSTEM_PROMPT: &str = "You review documentation for lifecycle cleanup. Answer only in \
    the requested line format.";

/// Single-call request/response boundary to an external reasoning model.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Sends one prompt and returns the free-text reply.
    async fn complete(&self, prompt: &str) -> Result<String, VerifierError>;

    /// Model or service name, for logs.
    fn name(&self) -> &str;
}

/// [`ReasoningService`] backed by a `genai` client.
pub struct GenaiReasoner {
    client: Client,
    model: String,
}

impl std::fmt::Debug for GenaiReasoner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiReasoner")
            .field("model", &self.model)
            .finish()
    }
}

impl GenaiReasoner {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::default(),
            model: model.into(),
        }
    }

    /// Creates a reasoner after checking that the model's provider key is present.
    ///
    /// Hosted providers are recognised from the model name (or an explicit
    /// `provider::model` namespace); models with no key requirement, such as local
    /// Ollama models, are accepted as-is.
    pub fn checked(model: &str) -> Result<Self, VerifierError> {
        let model = model.trim();
        if model.is_empty() {
            return Err(VerifierError::Unavailable {
                reason: "no verifier model configured".to_string(),
            });
        }

        if let Some(key) = required_api_key(model) {
            let present = std::env::var(key).is_ok_and(|v| !v.trim().is_empty());
            if !present {
                return Err(VerifierError::Unavailable {
                    reason: format!("{key} is not set for model '{model}'"),
                });
            }
        }

        Ok(Self::new(model))
    }
}

#[async_trait]
impl ReasoningService for GenaiReasoner {
    async fn complete(&self, prompt: &str) -> Result<String, VerifierError> {
        let request = ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(prompt.to_string()),
        ]);

        let response = self
            .client
            .exec_chat(&self.model, request, None)
            .await
            .map_err(|e| VerifierError::Request {
                reason: e.to_string(),
            })?;

        let text = response.first_text().unwrap_or_default().to_string();
        debug!(model = %self.model, chars = text.len(), "Verification response received");
        if text.trim().is_empty() {
            return Err(VerifierError::EmptyResponse);
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// API key variable a hosted model needs, or `None` when no key is required.
pub fn required_api_key(model: &str) -> Option<&'static str> {
    let model = model.to_ascii_lowercase();

    if let Some((provider, _)) = model.split_once("::") {
        return match provider {
            "anthropic" => Some("ANTHROPIC_API_KEY"),
            "openai" => Some("OPENAI_API_KEY"),
            "gemini" => Some("GEMINI_API_KEY"),
            "xai" => Some("XAI_API_KEY"),
            "deepseek" => Some("DEEPSEEK_API_KEY"),
            "groq" => Some("GROQ_API_KEY"),
            "cohere" => Some("COHERE_API_KEY"),
            _ => None,
        };
    }

    if model.starts_with("claude") {
        Some("ANTHROPIC_API_KEY")
    } else if model.starts_with("gpt")
        || model.starts_with("chatgpt")
        || is_openai_o_series(&model)
    {
        Some("OPENAI_API_KEY")
    } else if model.starts_with("gemini") {
        Some("GEMINI_API_KEY")
    } else if model.starts_with("grok") {
        Some("XAI_API_KEY")
    } else if model.starts_with("deepseek") {
        Some("DEEPSEEK_API_KEY")
    } else if model.starts_with("command") {
        Some("COHERE_API_KEY")
    } else {
        None
    }
}

/// `o1`, `o3-mini`, `o4-mini` and similar.
fn is_openai_o_series(model: &str) -> bool {
    let mut chars = model.chars();
    chars.next() == Some('o') && chars.next().is_some_and(|c| c.is_ascii_digit())
}
