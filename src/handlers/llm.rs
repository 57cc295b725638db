//! LLM capability — a language agent backed by the configured provider.
//!
//! The handler's `role` is sent as the system prompt (e.g. "You only answer
//! in English"); the query is the user message.

use async_trait::async_trait;
use tracing::debug;

use crate::llm::LlmProvider;

use super::{Capability, FragmentStream, HandlerError, TextResult};

#[derive(Debug, Clone)]
pub struct LlmCapability {
    provider: LlmProvider,
    role: Option<String>,
    stream: bool,
}

impl LlmCapability {
    pub fn new(provider: LlmProvider, role: Option<String>) -> Self {
        Self { provider, role, stream: false }
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

#[async_trait]
impl Capability for LlmCapability {
    async fn answer(&self, query: &str) -> Result<TextResult, HandlerError> {
        let system = self.role.as_deref();
        debug!(provider = self.provider.kind(), stream = self.stream, "llm capability answering");
        if self.stream {
            let rx = self.provider.stream(query, system).await?;
            Ok(TextResult::Stream(FragmentStream::from_receiver(rx)))
        } else {
            let text = self.provider.complete(query, system).await?;
            Ok(TextResult::Text(text))
        }
    }
}
