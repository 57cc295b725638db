//! Handlers — named answerers, each bound to exactly one category.
//!
//! A [`Handler`] pairs a unique name and category with a [`Capability`]
//! that turns a query into a [`TextResult`]. Handlers are built once at
//! startup and owned by the [`HandlerRegistry`]; nothing about them changes
//! while the router is serving.
//!
//! The configurable capability set is closed (`echo`, `llm`) and built by
//! [`build`]. The trait stays open so embedders and tests can plug their own
//! capability in when constructing the registry by hand.

mod echo;
mod llm;
mod registry;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::{HandlerConfig, HandlerKind};
use crate::llm::{LlmProvider, ProviderError};

pub use echo::EchoCapability;
pub use llm::LlmCapability;
pub use registry::{HandlerRegistry, RegistryError};

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    #[error("capability failed: {0}")]
    Capability(String),
    #[error("stream failed: {0}")]
    Stream(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

// ── TextResult ────────────────────────────────────────────────────────────────

/// What a capability hands back: one finished string, or a fragment stream.
pub enum TextResult {
    Text(String),
    Stream(FragmentStream),
}

impl fmt::Debug for TextResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextResult::Text(text) => f.debug_tuple("Text").field(text).finish(),
            TextResult::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Lazy, finite, single-pass sequence of answer fragments.
///
/// An `Err` item means the producer failed mid-answer; consumers stop there.
/// The stream cannot be restarted — once consumed (or dropped) it is gone.
pub struct FragmentStream {
    inner: BoxStream<'static, Result<String, HandlerError>>,
}

impl FragmentStream {
    pub fn new<S>(inner: S) -> Self
    where
        S: futures_util::Stream<Item = Result<String, HandlerError>> + Send + 'static,
    {
        Self { inner: inner.boxed() }
    }

    /// Wrap the receiving end of a channel fed by a producer task.
    ///
    /// Dropping the stream drops the receiver, which the producer observes as
    /// a failed `send` and uses to stop early.
    pub fn from_receiver<E>(rx: mpsc::Receiver<Result<String, E>>) -> Self
    where
        E: Into<HandlerError> + Send + 'static,
    {
        Self::new(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item.map_err(Into::into), rx))
        }))
    }

    /// A stream over already-known fragments.
    pub fn from_fragments<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = Result<String, HandlerError>>,
        I::IntoIter: Send + 'static,
    {
        Self::new(stream::iter(fragments))
    }

    pub async fn next(&mut self) -> Option<Result<String, HandlerError>> {
        self.inner.next().await
    }
}

// ── Capability ────────────────────────────────────────────────────────────────

/// The single thing a handler can do: answer a query.
///
/// Implementations may call remote services and may be slow; the router
/// bounds every call with the caller's timeout and drops the future on
/// cancellation, so implementations need no timeout logic of their own.
#[async_trait]
pub trait Capability: Send + Sync {
    async fn answer(&self, query: &str) -> Result<TextResult, HandlerError>;
}

// ── Handler ───────────────────────────────────────────────────────────────────

/// A named capability bound to one category.
#[derive(Clone)]
pub struct Handler {
    name: String,
    category: String,
    capability: Arc<dyn Capability>,
}

impl Handler {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        capability: impl Capability + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            capability: Arc::new(capability),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub async fn answer(&self, query: &str) -> Result<TextResult, HandlerError> {
        self.capability.answer(query).await
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

// ── Factory ───────────────────────────────────────────────────────────────────

/// Build a handler from its config entry.
///
/// `provider` is the process-wide LLM backend; only `llm` handlers use it.
pub fn build(config: &HandlerConfig, provider: &LlmProvider) -> Handler {
    match config.kind {
        HandlerKind::Echo => Handler::new(
            &config.name,
            &config.category,
            EchoCapability::new(config.prefix.clone()).streaming(config.stream),
        ),
        HandlerKind::Llm => Handler::new(
            &config.name,
            &config.category,
            LlmCapability::new(provider.clone(), config.role.clone()).streaming(config.stream),
        ),
    }
}

/// Build a registry from config entries, preserving their order.
pub fn build_registry(configs: &[HandlerConfig], provider: &LlmProvider) -> Result<HandlerRegistry, RegistryError> {
    let mut registry = HandlerRegistry::new();
    for config in configs {
        registry.register(build(config, provider))?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::providers::dummy::DummyProvider;

    fn handler_config(name: &str, category: &str, kind: HandlerKind) -> HandlerConfig {
        HandlerConfig {
            name: name.into(),
            category: category.into(),
            kind,
            role: None,
            prefix: None,
            stream: false,
        }
    }

    #[tokio::test]
    async fn fragment_stream_from_receiver_maps_provider_errors() {
        let (tx, rx) = mpsc::channel::<Result<String, ProviderError>>(4);
        tx.send(Ok("Hel".into())).await.unwrap();
        tx.send(Err(ProviderError::Stream("reset".into()))).await.unwrap();
        drop(tx);

        let mut s = FragmentStream::from_receiver(rx);
        assert_eq!(s.next().await.unwrap().unwrap(), "Hel");
        assert!(matches!(s.next().await, Some(Err(HandlerError::Provider(_)))));
        assert!(s.next().await.is_none());
    }

    #[tokio::test]
    async fn fragment_stream_from_fragments_yields_in_order() {
        let mut s = FragmentStream::from_fragments(vec![Ok("Bon".to_string()), Ok("jour".to_string())]);
        assert_eq!(s.next().await.unwrap().unwrap(), "Bon");
        assert_eq!(s.next().await.unwrap().unwrap(), "jour");
        assert!(s.next().await.is_none());
    }

    #[tokio::test]
    async fn build_registry_keeps_config_order() {
        let provider = LlmProvider::Dummy(DummyProvider);
        let configs = vec![
            handler_config("English Agent", "English", HandlerKind::Llm),
            handler_config("Chinese Agent", "Chinese", HandlerKind::Echo),
        ];
        let registry = build_registry(&configs, &provider).unwrap();
        assert_eq!(registry.categories(), ["English", "Chinese"]);

        let english = registry.lookup("English").unwrap();
        match english.answer("How are you?").await.unwrap() {
            TextResult::Text(text) => assert_eq!(text, "[echo] How are you?"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn build_registry_rejects_duplicate_category() {
        let provider = LlmProvider::Dummy(DummyProvider);
        let configs = vec![
            handler_config("A", "French", HandlerKind::Echo),
            handler_config("B", "French", HandlerKind::Echo),
        ];
        let err = build_registry(&configs, &provider).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateCategory { .. }));
    }
}
