//! Dummy LLM provider — echoes input back prefixed with `[echo]`.
//! Used for running the router end-to-end without an API key.

use tokio::sync::mpsc;

use crate::llm::{CompletionStream, ProviderError, STREAM_BUFFER};

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn complete(&self, content: &str, _system: Option<&str>) -> Result<String, ProviderError> {
        Ok(format!("[echo] {content}"))
    }

    /// Stream the echo reply one word at a time (whitespace kept on each word).
    pub async fn stream(&self, content: &str, system: Option<&str>) -> Result<CompletionStream, ProviderError> {
        let reply = self.complete(content, system).await?;
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(async move {
            for word in reply.split_inclusive(' ') {
                if tx.send(Ok(word.to_string())).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}
