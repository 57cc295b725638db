//! Classifier — decides which category a query belongs to.
//!
//! The router only relies on the [`Classifier`] contract: given a query and
//! the registry's categories, return one of those categories or
//! [`Classification::Unclassified`]. How the decision is made is up to the
//! implementation:
//!
//! - [`TableClassifier`] — fixed query → category lookup.
//! - [`ScriptClassifier`] — deterministic Unicode-script and stop-word
//!   language detection.
//! - [`LlmClassifier`] — asks the configured model to name the language.
//!
//! Classifiers may fail or hang; the router turns both into a fallback, so
//! implementations should return errors rather than guess.

mod llm;
mod script;
mod table;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::{ClassifierConfig, ClassifierKind};
use crate::llm::{LlmProvider, ProviderError};

pub use llm::LlmClassifier;
pub use script::{Language, ScriptClassifier};
pub use table::TableClassifier;

/// Sentinel used in config tables and model replies for "no category".
pub const UNCLASSIFIED: &str = "UNCLASSIFIED";

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "category", rename_all = "snake_case")]
pub enum Classification {
    Category(String),
    Unclassified,
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier failed: {0}")]
    Failed(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Short id used in traces and logs.
    fn name(&self) -> &str;

    /// Classify `query` into one of `categories` (registry order) or
    /// [`Classification::Unclassified`].
    async fn classify(&self, query: &str, categories: &[String]) -> Result<Classification, ClassifierError>;
}

/// Find `candidate` in `categories` ignoring ASCII case and surrounding
/// whitespace, returning the registry's own spelling.
pub(crate) fn match_category<'a>(candidate: &str, categories: &'a [String]) -> Option<&'a str> {
    let candidate = candidate.trim();
    categories
        .iter()
        .find(|c| c.eq_ignore_ascii_case(candidate))
        .map(String::as_str)
}

// ── Factory ───────────────────────────────────────────────────────────────────

/// Build the configured classifier. `provider` backs the `llm` kind.
pub fn build(config: &ClassifierConfig, provider: &LlmProvider) -> Arc<dyn Classifier> {
    match config.kind {
        ClassifierKind::Table => Arc::new(TableClassifier::from_entries(
            config.table.iter().map(|(q, c)| (q.as_str(), c.as_str())),
        )),
        ClassifierKind::Script => Arc::new(ScriptClassifier::new()),
        ClassifierKind::Llm => Arc::new(LlmClassifier::new(provider.clone())),
    }
}
