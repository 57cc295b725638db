//! Model-backed classifier — delegates language identification to the LLM.
//!
//! Only the model's *classification* is trusted, never its wording: the reply
//! is normalised and must name one of the offered categories, otherwise the
//! query is unclassified. The fallback message itself is never generated.

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::llm::LlmProvider;

use super::{Classification, Classifier, ClassifierError, UNCLASSIFIED, match_category};

#[derive(Debug, Clone)]
pub struct LlmClassifier {
    provider: LlmProvider,
}

impl LlmClassifier {
    pub fn new(provider: LlmProvider) -> Self {
        Self { provider }
    }
}

/// System prompt listing the allowed answers.
fn system_prompt(categories: &[String]) -> String {
    format!(
        "You are a language router. Identify the language of the user's message. \
         Reply with exactly one word from this list: {}. \
         If the message is in any other language, reply with {UNCLASSIFIED}. \
         Do not answer the message itself.",
        categories.join(", ")
    )
}

/// Map a raw model reply onto the category set.
fn parse_reply(reply: &str, categories: &[String]) -> Classification {
    let cleaned = reply
        .trim()
        .trim_end_matches(['.', '!'])
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '*')
        .trim();

    if cleaned.eq_ignore_ascii_case(UNCLASSIFIED) {
        return Classification::Unclassified;
    }
    match match_category(cleaned, categories) {
        Some(c) => Classification::Category(c.to_string()),
        None => Classification::Unclassified,
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    fn name(&self) -> &str {
        "llm"
    }

    async fn classify(&self, query: &str, categories: &[String]) -> Result<Classification, ClassifierError> {
        let system = system_prompt(categories);
        let reply = self.provider.complete(query, Some(&system)).await?;
        trace!(reply = %reply, "llm classifier reply");
        let classification = parse_reply(&reply, categories);
        debug!(?classification, "llm classifier decided");
        Ok(classification)
    }
}
