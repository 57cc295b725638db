//! OpenAI-compatible chat completion provider (`/v1/chat/completions`).
//!
//! Exposes a blocking `complete` and a server-sent-events `stream`. All
//! OpenAI wire types are private to this module — callers only ever see
//! text fragments. The provider is stateless: one request, one reply.

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};

use crate::llm::{CompletionStream, ProviderError, STREAM_BUFFER};

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for any HTTP endpoint implementing `/v1/chat/completions`.
///
/// Covers OpenAI, OpenAI-compatible local servers (Ollama, LM Studio…),
/// and hosted alternatives. Constructed once at startup, then cheaply cloned
/// because `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    api_base_url: String,
    model: String,
    temperature: f32,
    api_key: Option<String>,
}

impl OpenAiCompatibleProvider {
    /// Build a provider from config values and an optional API key.
    ///
    /// `api_key` is `None` for keyless local models. When present it is sent
    /// as `Authorization: Bearer <key>` on every request.
    pub fn new(
        api_base_url: String,
        model: String,
        temperature: f32,
        timeout_seconds: u64,
        api_key: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_base_url, model, temperature, api_key })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `content` as the user message and optionally `system` as the system prompt.
    pub async fn complete(&self, content: &str, system: Option<&str>) -> Result<String, ProviderError> {
        let payload = self.request_body(content, system, false);

        debug!(
            model = %payload.model,
            temperature = ?payload.temperature,
            content_len = content.len(),
            "sending LLM request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full LLM request payload");
        }

        let response = self.send(&payload).await?;

        let parsed = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize LLM response");
            ProviderError::Request(format!("failed to parse response body: {e}"))
        })?;

        debug!(choices = parsed.choices.len(), "received LLM response");

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ProviderError::Request("empty or missing content in response".into()))
    }

    /// Start a streamed completion (`"stream": true`).
    ///
    /// The HTTP status is checked before returning, so configuration and auth
    /// errors surface as `Err` here. The body is then decoded on a spawned
    /// task that forwards each content delta; the task exits as soon as the
    /// receiver is dropped. An in-band error event, or a body that ends
    /// without `[DONE]`, is forwarded as a final `Err` item.
    pub async fn stream(&self, content: &str, system: Option<&str>) -> Result<CompletionStream, ProviderError> {
        let payload = self.request_body(content, system, true);
        debug!(model = %payload.model, content_len = content.len(), "sending streamed LLM request");

        let response = self.send(&payload).await?;
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);

        tokio::spawn(async move {
            let mut events = std::pin::pin!(response.bytes_stream().eventsource());

            while let Some(event) = events.next().await {
                let decoded = match event {
                    Ok(event) => decode_chunk(&event.data),
                    Err(e) => Err(ProviderError::Stream(format!("SSE stream error: {e}"))),
                };
                match decoded {
                    Ok(ChunkEvent::Delta(text)) => {
                        if tx.send(Ok(text)).await.is_err() {
                            debug!("stream receiver dropped — abandoning LLM stream");
                            return;
                        }
                    }
                    Ok(ChunkEvent::Empty) => {}
                    Ok(ChunkEvent::Done) => return,
                    Err(e) => {
                        warn!(error = %e, "LLM stream interrupted");
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }

            // A body that closes without `[DONE]` was cut off upstream.
            warn!("LLM stream ended before [DONE]");
            let _ = tx.send(Err(ProviderError::Stream("stream ended before [DONE]".into()))).await;
        });

        Ok(rx)
    }

    fn request_body(&self, content: &str, system: Option<&str>, stream: bool) -> ChatCompletionRequest {
        // Some models (gpt-5 family) do not accept a temperature parameter.
        let temperature = if self.model.starts_with("gpt-5") {
            None
        } else {
            Some(self.temperature)
        };

        let mut messages = Vec::new();
        if let Some(sys) = system {
            messages.push(Message { role: "system".to_string(), content: sys.to_string() });
        }
        messages.push(Message { role: "user".to_string(), content: content.to_string() });

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature,
            stream: stream.then_some(true),
        }
    }

    async fn send(&self, payload: &ChatCompletionRequest) -> Result<reqwest::Response, ProviderError> {
        let mut req = self.client.post(&self.api_base_url).json(payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await.map_err(|e| {
            error!(url = %self.api_base_url, error = %e, "LLM HTTP request failed (transport)");
            ProviderError::Request(e.to_string())
        })?;

        check_status(response).await
    }
}

// ── SSE chunk decoding ────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum ChunkEvent {
    Delta(String),
    /// Role-only or otherwise contentless chunk.
    Empty,
    Done,
}

/// Decode the `data` field of one SSE event.
///
/// An in-band `{"error": {...}}` envelope is a stream failure, not an empty chunk.
fn decode_chunk(data: &str) -> Result<ChunkEvent, ProviderError> {
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(ChunkEvent::Done);
    }
    if data.is_empty() {
        return Ok(ChunkEvent::Empty);
    }

    let chunk = serde_json::from_str::<ChatCompletionChunk>(data)
        .map_err(|e| ProviderError::Stream(format!("bad stream chunk: {e}")))?;

    if let Some(err) = chunk.error {
        return Err(ProviderError::Stream(format!("provider error in stream: {}", err.message)));
    }

    let text: String = chunk.choices.into_iter().filter_map(|c| c.delta.content).collect();
    if text.is_empty() {
        Ok(ChunkEvent::Empty)
    } else {
        Ok(ChunkEvent::Delta(text))
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

// Error envelope used by OpenAI and compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Consume the response and return it if successful, or a structured error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = if let Ok(env) = serde_json::from_str::<ErrorEnvelope>(&body) {
        let code = env.error.code.map(|v| match v {
            serde_json::Value::String(s) => format!(" [code={s}]"),
            other => format!(" [code={other}]"),
        }).unwrap_or_default();
        format!("HTTP {status}{code}: {}", env.error.message)
    } else {
        format!("HTTP {status}: {body}")
    };

    error!(%status, %message, "LLM request returned HTTP error");
    Err(ProviderError::Request(message))
}
