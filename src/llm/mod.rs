//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities — clone them freely.
//! Both the `llm` handler kind and the `llm` classifier sit on top of this
//! type; neither knows which backend is configured.

pub mod providers;

use thiserror::Error;
use tokio::sync::mpsc;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("provider stream failed: {0}")]
    Stream(String),
}

/// Receiving end of a streamed completion.
///
/// Fragments arrive in generation order; an `Err` item ends the stream early.
/// Dropping the receiver tells the producing task to stop.
pub type CompletionStream = mpsc::Receiver<Result<String, ProviderError>>;

/// Channel depth between a streaming provider task and its consumer.
pub(crate) const STREAM_BUFFER: usize = 32;

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
///
/// Enum dispatch keeps the provider set closed: adding a backend means a new
/// module, a new variant and new match arms below.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Send `content` (with an optional system prompt) and return the full reply.
    pub async fn complete(&self, content: &str, system: Option<&str>) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(content, system).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(content, system).await,
        }
    }

    /// Start a streamed completion and return the fragment receiver.
    ///
    /// Errors returned here happen before the first fragment (connection,
    /// HTTP status); later failures arrive as an `Err` item on the stream.
    pub async fn stream(&self, content: &str, system: Option<&str>) -> Result<CompletionStream, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.stream(content, system).await,
            LlmProvider::OpenAiCompatible(p) => p.stream(content, system).await,
        }
    }

    /// Model id sent upstream; the dummy backend has none.
    pub fn model(&self) -> Option<&str> {
        match self {
            LlmProvider::Dummy(_) => None,
            LlmProvider::OpenAiCompatible(p) => Some(p.model()),
        }
    }

    /// Provider id as used in config (`"dummy"`, `"openai"`).
    pub fn kind(&self) -> &'static str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::OpenAiCompatible(_) => "openai",
        }
    }
}
