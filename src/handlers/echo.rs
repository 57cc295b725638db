//! Echo capability — answers with the query itself.
//!
//! Useful as a stand-in answerer when wiring up routing without a model
//! behind it. With `streaming(true)` the reply is split into word fragments.

use async_trait::async_trait;

use super::{Capability, FragmentStream, HandlerError, TextResult};

#[derive(Debug, Clone, Default)]
pub struct EchoCapability {
    prefix: Option<String>,
    stream: bool,
}

impl EchoCapability {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix, stream: false }
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    fn reply(&self, query: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}{query}"),
            None => query.to_string(),
        }
    }
}

#[async_trait]
impl Capability for EchoCapability {
    async fn answer(&self, query: &str) -> Result<TextResult, HandlerError> {
        let reply = self.reply(query);
        if !self.stream {
            return Ok(TextResult::Text(reply));
        }
        let fragments: Vec<Result<String, HandlerError>> = reply
            .split_inclusive(' ')
            .map(|word| Ok(word.to_string()))
            .collect();
        Ok(TextResult::Stream(FragmentStream::from_fragments(fragments)))
    }
}
