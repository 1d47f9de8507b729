//! AI research assistant gateway
//!
//! Relays a chat conversation to an OpenAI-compatible chat completions
//! gateway and hands back the raw server-sent event stream. Upstream
//! status codes are mapped onto `AppError` so the HTTP layer can answer
//! 429 / 402 / 500 without inspecting the upstream response itself.

use crate::config::AssistantConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use axum::body::Bytes;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Raw upstream body, chunk by chunk
pub type ChatStream = BoxStream<'static, std::io::Result<Bytes>>;

/// One turn of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// Trait for streaming chat completion
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Send the full message list (system prompt included) and stream the reply
    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<ChatStream>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Build the assistant's system prompt around the live publication count
pub fn build_system_prompt(publication_count: Option<u64>, fallback: &str) -> String {
    let count = match publication_count {
        Some(n) if n > 0 => n.to_string(),
        _ => fallback.to_string(),
    };

    format!(
        "You are a NASA Space Biology Research Assistant with expertise in analyzing bioscience \
experiments conducted in space. You help researchers, students, and mission planners explore \
insights from {count} NASA publications.

Your capabilities:
- Explain complex space biology concepts clearly
- Identify research trends and knowledge gaps
- Suggest relevant publications and connections
- Provide actionable insights for space missions
- Answer questions about organisms, experiments, and findings

Be concise, accurate, and enthusiastic about space biology. When referencing studies, mention \
organism types, experiment conditions, and key findings.

**Formatting Instructions:**
- Use markdown formatting for better readability
- Use **bold** for key terms and emphasis
- Use bullet points (- or *) for lists
- Use headings (## or ###) to organize longer responses
- Use code blocks (```) for technical terms or data
- Add relevant emojis where they help: 🚀 space/missions, 🧬 biology, 🔬 experiments, \
📊 data, 💡 insights, 🌍 Earth, 🌌 space, 🧪 research, 📚 publications
- Keep responses well-structured and easy to scan"
    )
}

/// Map a non-success upstream status onto the error the client should see
pub fn map_upstream_status(status: StatusCode, body: String) -> AppError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited,
        StatusCode::PAYMENT_REQUIRED => AppError::CreditsDepleted,
        other => AppError::AiService {
            status: other.as_u16(),
            body,
        },
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

/// HTTP client for an OpenAI-compatible chat completions gateway
pub struct HttpChatGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl HttpChatGateway {
    /// Create a new gateway client
    pub fn new(config: &AssistantConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e)
            })?;

        Ok(Self {
            client,
            endpoint: config.gateway_url.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl ChatGateway for HttpChatGateway {
    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<ChatStream> {
        let api_key = self.api_key.as_deref().ok_or_else(|| AppError::Configuration {
            message: "AI gateway API key is not configured".to_string(),
        })?;

        let request = CompletionRequest {
            model: &self.model,
            messages,
            stream: true,
        };

        let response = self.client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_upstream_status(status, body));
        }

        Ok(response.bytes_stream().map_err(std::io::Error::other).boxed())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Scripted reply for `MockChatGateway`
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Stream these chunks verbatim
    Chunks(Vec<String>),
    /// Fail as if the upstream answered with this status
    Status(u16),
}

/// Mock gateway for local runs and tests
pub struct MockChatGateway {
    reply: MockReply,
    last_request: Mutex<Option<Vec<ChatMessage>>>,
}

impl MockChatGateway {
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            last_request: Mutex::new(None),
        }
    }

    /// Replies with a single SSE frame echoing the last user message
    pub fn echo() -> Self {
        Self::new(MockReply::Chunks(Vec::new()))
    }

    /// Messages received by the most recent call
    pub fn last_request(&self) -> Option<Vec<ChatMessage>> {
        self.last_request.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl ChatGateway for MockChatGateway {
    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<ChatStream> {
        if let Ok(mut guard) = self.last_request.lock() {
            *guard = Some(messages.clone());
        }

        let chunks = match &self.reply {
            MockReply::Status(code) => {
                let status = StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                return Err(map_upstream_status(status, "mock upstream failure".to_string()));
            }
            MockReply::Chunks(chunks) if chunks.is_empty() => {
                let last = messages
                    .iter()
                    .rev()
                    .find(|m| m.role == "user")
                    .map(|m| m.content.clone())
                    .unwrap_or_default();
                let frame = serde_json::json!({
                    "choices": [{ "delta": { "content": last } }]
                });
                vec![format!("data: {}\n\n", frame), "data: [DONE]\n\n".to_string()]
            }
            MockReply::Chunks(chunks) => chunks.clone(),
        };

        Ok(stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from(c)))).boxed())
    }

    fn model_name(&self) -> &str {
        "mock-chat"
    }
}

/// Create a chat gateway based on configuration
pub fn create_chat_gateway(config: &AssistantConfig) -> Result<Arc<dyn ChatGateway>> {
    match config.provider.as_str() {
        "gateway" => Ok(Arc::new(HttpChatGateway::new(config)?)),
        "mock" => Ok(Arc::new(MockChatGateway::echo())),
        other => {
            tracing::warn!(provider = other, "Unknown assistant provider, using gateway");
            Ok(Arc::new(HttpChatGateway::new(config)?))
        }
    }
}
