//! Router — the per-request dispatch protocol.
//!
//! Owns the [`HandlerRegistry`] and the [`Classifier`] and runs each query
//! through `classify → dispatch → assemble`, or `classify → fallback →
//! assemble` when no handler is eligible. At most one handler is ever
//! invoked per request; there is no fan-out.
//!
//! Every per-request failure (classifier error or timeout, handler error or
//! timeout, mid-stream breakage) is recovered into a fallback [`Response`].
//! Only an empty query and caller cancellation surface as [`RouterError`].
//!
//! The router is cheap to clone and holds no mutable state, so concurrent
//! requests need no coordination.

mod assemble;
mod bounded;
mod response;
mod state;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::classifier::{Classification, Classifier};
use crate::handlers::{HandlerRegistry, RegistryError, TextResult};

use assemble::{Envelope, assemble_fallback, assemble_text};
use bounded::{Bounded, bounded};

pub use assemble::ResponseStream;
pub use response::{FallbackReason, Outcome, Response, TraceEntry, TraceStep};
pub use state::RequestState;

/// Placeholder a fallback template must contain.
pub const CATEGORIES_PLACEHOLDER: &str = "{categories}";

pub const DEFAULT_FALLBACK: &str = "I can only answer in the following languages: {categories}. \
                                    Please ask your question in one of these languages.";

// ── Errors ────────────────────────────────────────────────────────────────────

/// Construction-time failures. The router refuses to start on any of these.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("registry has no handlers")]
    EmptyRegistry,
    #[error("fallback template is missing the {{categories}} placeholder")]
    MissingPlaceholder,
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Per-request failures surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("query is empty")]
    EmptyQuery,
    #[error("request cancelled")]
    Cancelled,
}

// ── Options ───────────────────────────────────────────────────────────────────

/// How a streaming handler's fragments reach the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamingMode {
    /// Drain the stream and return one concatenated response.
    #[default]
    Eager,
    /// Hand the stream to the caller as [`Reply::Streaming`].
    PassThrough,
}

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub mode: StreamingMode,
    /// Bound on each remote call (classifier, then handler). `None` waits
    /// forever.
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: StreamingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Fresh deadline for the next remote call.
    fn deadline(&self) -> Option<Instant> {
        self.timeout.map(|t| Instant::now() + t)
    }
}

// ── Reply ─────────────────────────────────────────────────────────────────────

/// What [`Router::handle`] returns.
///
/// `Streaming` only appears in pass-through mode when the matched handler
/// answered with a stream; everything else is `Complete`.
pub enum Reply {
    Complete(Response),
    Streaming(ResponseStream),
}

impl Reply {
    /// Collapse into a single response, draining the stream if there is one.
    pub async fn into_response(self) -> Result<Response, RouterError> {
        match self {
            Reply::Complete(response) => Ok(response),
            Reply::Streaming(stream) => stream.finish().await,
        }
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Complete(r) => f.debug_tuple("Complete").field(r).finish(),
            Reply::Streaming(s) => f
                .debug_struct("Streaming")
                .field("request_id", &s.request_id())
                .field("handler", &s.handler_name())
                .finish_non_exhaustive(),
        }
    }
}

// ── Fallback template ─────────────────────────────────────────────────────────

/// Rejection message with a `{categories}` slot for the supported list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackTemplate(String);

impl FallbackTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, SetupError> {
        let template = template.into();
        if !template.contains(CATEGORIES_PLACEHOLDER) {
            return Err(SetupError::MissingPlaceholder);
        }
        Ok(Self(template))
    }

    /// Substitute the categories, comma-separated in registry order.
    pub fn render(&self, categories: &[String]) -> String {
        self.0.replace(CATEGORIES_PLACEHOLDER, &categories.join(", "))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FallbackTemplate {
    fn default() -> Self {
        Self(DEFAULT_FALLBACK.to_string())
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    registry: HandlerRegistry,
    classifier: Arc<dyn Classifier>,
    /// Rendered once; the registry never changes after construction.
    fallback_message: String,
}

impl Router {
    pub fn new(
        registry: HandlerRegistry,
        classifier: Arc<dyn Classifier>,
        fallback: FallbackTemplate,
    ) -> Result<Self, SetupError> {
        if registry.is_empty() {
            return Err(SetupError::EmptyRegistry);
        }
        let fallback_message = fallback.render(registry.categories());
        debug!(
            handlers = registry.len(),
            categories = ?registry.categories(),
            classifier = classifier.name(),
            "router constructed"
        );
        Ok(Self {
            inner: Arc::new(RouterInner { registry, classifier, fallback_message }),
        })
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.inner.registry
    }

    pub fn categories(&self) -> &[String] {
        self.inner.registry.categories()
    }

    pub fn classifier_name(&self) -> &str {
        self.inner.classifier.name()
    }

    pub fn fallback_message(&self) -> &str {
        &self.inner.fallback_message
    }

    /// Route one query.
    pub async fn handle(&self, query: &str, options: &RequestOptions) -> Result<Reply, RouterError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RouterError::EmptyQuery);
        }

        let mut env = Envelope::new();
        let request_id = env.request_id;
        let cancel = options.cancel.as_ref();
        debug!(%request_id, query_len = query.len(), "request received");

        // ── classify ──
        env.state.advance(RequestState::Classifying);
        let classifier = &self.inner.classifier;
        let categories = self.inner.registry.categories();
        let classified = bounded(classifier.classify(query, categories), options.deadline(), cancel).await;

        let category = match classified {
            Bounded::Cancelled => {
                debug!(%request_id, "cancelled during classification");
                return Err(RouterError::Cancelled);
            }
            Bounded::TimedOut => {
                warn!(%request_id, classifier = classifier.name(), "classifier timed out");
                env.trace.record(TraceStep::Classify, "classifier timed out");
                return Ok(self.fallback(env, FallbackReason::ClassifierFailed, String::new()));
            }
            Bounded::Completed(Err(e)) => {
                warn!(%request_id, classifier = classifier.name(), error = %e, "classifier failed");
                env.trace.record(TraceStep::Classify, format!("classifier failed: {e}"));
                return Ok(self.fallback(env, FallbackReason::ClassifierFailed, String::new()));
            }
            Bounded::Completed(Ok(Classification::Unclassified)) => {
                env.trace.record(TraceStep::Classify, "unclassified");
                return Ok(self.fallback(env, FallbackReason::Unclassified, String::new()));
            }
            Bounded::Completed(Ok(Classification::Category(category))) => category,
        };

        env.trace.record(TraceStep::Classify, format!("category={category}"));
        env.category = Some(category.clone());

        let handler = match self.inner.registry.lookup(&category) {
            Ok(handler) => handler,
            Err(_) => {
                debug!(%request_id, %category, "no handler for classified category");
                return Ok(self.fallback(
                    env,
                    FallbackReason::UnsupportedCategory,
                    format!(" category={category}"),
                ));
            }
        };

        // ── dispatch ──
        env.state.advance(RequestState::Dispatching);
        env.trace.record(
            TraceStep::Dispatch,
            format!("handler={} category={category}", handler.name()),
        );
        debug!(%request_id, handler = handler.name(), %category, "dispatching");

        let deadline = options.deadline();
        let answer = match bounded(handler.answer(query), deadline, cancel).await {
            Bounded::Cancelled => {
                debug!(%request_id, handler = handler.name(), "cancelled during dispatch");
                return Err(RouterError::Cancelled);
            }
            Bounded::TimedOut => {
                warn!(%request_id, handler = handler.name(), "handler timed out");
                return Ok(self.fallback(
                    env,
                    FallbackReason::HandlerFailed,
                    format!(" handler={}: timed out", handler.name()),
                ));
            }
            Bounded::Completed(Err(e)) => {
                warn!(%request_id, handler = handler.name(), error = %e, "handler failed");
                return Ok(self.fallback(
                    env,
                    FallbackReason::HandlerFailed,
                    format!(" handler={}: {e}", handler.name()),
                ));
            }
            Bounded::Completed(Ok(answer)) => answer,
        };

        // ── assemble ──
        match answer {
            TextResult::Text(text) => Ok(Reply::Complete(assemble_text(env, handler.name(), text))),
            TextResult::Stream(fragments) => {
                let stream = ResponseStream::new(
                    env,
                    handler.name(),
                    fragments,
                    deadline,
                    options.cancel.clone(),
                    self.inner.fallback_message.clone(),
                );
                match options.mode {
                    StreamingMode::Eager => stream.finish().await.map(Reply::Complete),
                    StreamingMode::PassThrough => Ok(Reply::Streaming(stream)),
                }
            }
        }
    }

    /// Route one query and always return a single [`Response`].
    pub async fn handle_eager(&self, query: &str, options: &RequestOptions) -> Result<Response, RouterError> {
        let options = options.clone().with_mode(StreamingMode::Eager);
        self.handle(query, &options).await?.into_response().await
    }

    fn fallback(&self, mut env: Envelope, reason: FallbackReason, detail: String) -> Reply {
        env.state.advance(RequestState::Fallback);
        env.trace.record(TraceStep::Fallback, format!("reason={}{detail}", reason.as_str()));
        debug!(request_id = %env.request_id, reason = reason.as_str(), "fallback");
        Reply::Complete(assemble_fallback(env, reason, self.inner.fallback_message.clone()))
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("categories", &self.categories())
            .field("classifier", &self.classifier_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifierError, TableClassifier, UNCLASSIFIED};
    use crate::handlers::{Capability, FragmentStream, Handler, HandlerError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ── mocks ──

    /// Replies with a fixed result and counts calls.
    struct Counting {
        reply: &'static str,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Capability for Counting {
        async fn answer(&self, _query: &str) -> Result<TextResult, HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TextResult::Text(self.reply.to_string()))
        }
    }

    struct Failing;

    #[async_trait]
    impl Capability for Failing {
        async fn answer(&self, _query: &str) -> Result<TextResult, HandlerError> {
            Err(HandlerError::Capability("model unavailable".into()))
        }
    }

    struct Slow;

    #[async_trait]
    impl Capability for Slow {
        async fn answer(&self, _query: &str) -> Result<TextResult, HandlerError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(TextResult::Text("late".into()))
        }
    }

    struct Streaming(Vec<Result<String, HandlerError>>);

    #[async_trait]
    impl Capability for Streaming {
        async fn answer(&self, _query: &str) -> Result<TextResult, HandlerError> {
            Ok(TextResult::Stream(FragmentStream::from_fragments(self.0.clone())))
        }
    }

    /// Wraps a table classifier and counts calls.
    struct CountingClassifier {
        inner: TableClassifier,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Classifier for CountingClassifier {
        fn name(&self) -> &str {
            "counting"
        }

        async fn classify(&self, query: &str, categories: &[String]) -> Result<Classification, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.classify(query, categories).await
        }
    }

    struct BrokenClassifier;

    #[async_trait]
    impl Classifier for BrokenClassifier {
        fn name(&self) -> &str {
            "broken"
        }

        async fn classify(&self, _query: &str, _categories: &[String]) -> Result<Classification, ClassifierError> {
            Err(ClassifierError::Failed("upstream 503".into()))
        }
    }

    struct HangingClassifier;

    #[async_trait]
    impl Classifier for HangingClassifier {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn classify(&self, _query: &str, _categories: &[String]) -> Result<Classification, ClassifierError> {
            std::future::pending().await
        }
    }

    fn table() -> TableClassifier {
        TableClassifier::new()
            .with("Comment allez-vous?", "French")
            .with("How are you?", "English")
            .with("你好吗？", "Chinese")
            .with("Come stai?", UNCLASSIFIED)
            .with("Wie geht's?", "German")
    }

    struct Fixture {
        router: Router,
        handler_calls: [Arc<AtomicUsize>; 3],
        classifier_calls: Arc<AtomicUsize>,
    }

    fn fixture() -> Fixture {
        let handler_calls: [Arc<AtomicUsize>; 3] = Default::default();
        let registry = HandlerRegistry::from_handlers([
            Handler::new("EchoEN", "English", Counting { reply: "en", calls: handler_calls[0].clone() }),
            Handler::new("EchoZH", "Chinese", Counting { reply: "zh", calls: handler_calls[1].clone() }),
            Handler::new("EchoFR", "French", Counting { reply: "fr", calls: handler_calls[2].clone() }),
        ])
        .unwrap();
        let classifier_calls = Arc::new(AtomicUsize::new(0));
        let classifier = CountingClassifier { inner: table(), calls: classifier_calls.clone() };
        let router = Router::new(registry, Arc::new(classifier), FallbackTemplate::default()).unwrap();
        Fixture { router, handler_calls, classifier_calls }
    }

    fn single(handler: Handler, classifier: Arc<dyn Classifier>) -> Router {
        let registry = HandlerRegistry::from_handlers([handler]).unwrap();
        Router::new(registry, classifier, FallbackTemplate::default()).unwrap()
    }

    fn french_table() -> Arc<dyn Classifier> {
        Arc::new(TableClassifier::new().with("Bonjour", "French"))
    }

    fn steps(r: &Response) -> Vec<TraceStep> {
        r.trace.iter().map(|e| e.step).collect()
    }

    // ── construction ──

    #[test]
    fn empty_registry_is_rejected() {
        let err = Router::new(HandlerRegistry::new(), french_table(), FallbackTemplate::default()).unwrap_err();
        assert!(matches!(err, SetupError::EmptyRegistry));
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        assert!(matches!(
            FallbackTemplate::new("Sorry, wrong language."),
            Err(SetupError::MissingPlaceholder)
        ));
    }

    #[test]
    fn fallback_lists_categories_in_registry_order() {
        let f = fixture();
        assert_eq!(
            f.router.fallback_message(),
            "I can only answer in the following languages: English, Chinese, French. \
             Please ask your question in one of these languages."
        );
    }

    // ── routing ──

    #[tokio::test]
    async fn matched_category_invokes_exactly_one_handler() {
        let f = fixture();
        let r = f.router.handle_eager("Comment allez-vous?", &RequestOptions::new()).await.unwrap();
        assert_eq!(r.handler_name.as_deref(), Some("EchoFR"));
        assert_eq!(r.content, "fr");
        assert_eq!(r.outcome, Outcome::Answered);
        assert_eq!(steps(&r), [TraceStep::Classify, TraceStep::Dispatch, TraceStep::Assemble]);
        let counts: Vec<usize> = f.handler_calls.iter().map(|c| c.load(Ordering::SeqCst)).collect();
        assert_eq!(counts, [0, 0, 1]);
    }

    #[tokio::test]
    async fn unclassified_query_falls_back_without_dispatch() {
        let f = fixture();
        let r = f.router.handle_eager("Come stai?", &RequestOptions::new()).await.unwrap();
        assert_eq!(r.content, f.router.fallback_message());
        assert_eq!(r.handler_name, None);
        assert_eq!(r.fallback_reason(), Some(FallbackReason::Unclassified));
        assert_eq!(steps(&r), [TraceStep::Classify, TraceStep::Fallback, TraceStep::Assemble]);
        assert!(f.handler_calls.iter().all(|c| c.load(Ordering::SeqCst) == 0));
    }

    #[tokio::test]
    async fn unregistered_category_is_unsupported() {
        let f = fixture();
        let r = f.router.handle_eager("Wie geht's?", &RequestOptions::new()).await.unwrap();
        assert_eq!(r.fallback_reason(), Some(FallbackReason::UnsupportedCategory));
        assert_eq!(r.category.as_deref(), Some("German"));
        assert_eq!(r.handler_name, None);
        assert!(r.trace[1].detail.contains("category=German"));
    }

    #[tokio::test]
    async fn empty_query_never_reaches_classifier() {
        let f = fixture();
        for q in ["", "   ", "\n\t"] {
            let err = f.router.handle(q, &RequestOptions::new()).await.unwrap_err();
            assert_eq!(err, RouterError::EmptyQuery);
        }
        assert_eq!(f.classifier_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn query_is_trimmed_before_classification() {
        let f = fixture();
        let r = f.router.handle_eager("  How are you?\n", &RequestOptions::new()).await.unwrap();
        assert_eq!(r.handler_name.as_deref(), Some("EchoEN"));
    }

    #[tokio::test]
    async fn identical_queries_route_identically() {
        let f = fixture();
        let a = f.router.handle_eager("你好吗？", &RequestOptions::new()).await.unwrap();
        let b = f.router.handle_eager("你好吗？", &RequestOptions::new()).await.unwrap();
        assert_eq!(a.handler_name, b.handler_name);
        assert_eq!(a.content, b.content);
        assert_eq!(a.trace, b.trace);
        assert_ne!(a.request_id, b.request_id);
    }

    // ── recovered failures ──

    #[tokio::test]
    async fn classifier_error_degrades_to_fallback() {
        let router = single(Handler::new("EchoFR", "French", Failing), Arc::new(BrokenClassifier));
        let r = router.handle_eager("Bonjour", &RequestOptions::new()).await.unwrap();
        assert_eq!(r.fallback_reason(), Some(FallbackReason::ClassifierFailed));
        assert!(r.trace[0].detail.contains("upstream 503"));
    }

    #[tokio::test(start_paused = true)]
    async fn classifier_timeout_degrades_to_fallback() {
        let router = single(Handler::new("EchoFR", "French", Failing), Arc::new(HangingClassifier));
        let options = RequestOptions::new().with_timeout(Duration::from_millis(200));
        let r = router.handle_eager("Bonjour", &options).await.unwrap();
        assert_eq!(r.fallback_reason(), Some(FallbackReason::ClassifierFailed));
        assert_eq!(r.trace[0].detail, "classifier timed out");
    }

    #[tokio::test]
    async fn handler_error_is_distinct_from_unsupported() {
        let router = single(Handler::new("EchoFR", "French", Failing), french_table());
        let r = router.handle_eager("Bonjour", &RequestOptions::new()).await.unwrap();
        assert_eq!(r.fallback_reason(), Some(FallbackReason::HandlerFailed));
        assert_eq!(r.handler_name, None);
        assert_eq!(r.content, router.fallback_message());
        assert_eq!(
            steps(&r),
            [TraceStep::Classify, TraceStep::Dispatch, TraceStep::Fallback, TraceStep::Assemble]
        );
        assert!(r.trace[2].detail.contains("model unavailable"));
    }

    #[tokio::test(start_paused = true)]
    async fn handler_timeout_is_handler_failed() {
        let router = single(Handler::new("EchoFR", "French", Slow), french_table());
        let options = RequestOptions::new().with_timeout(Duration::from_secs(1));
        let r = router.handle_eager("Bonjour", &options).await.unwrap();
        assert_eq!(r.fallback_reason(), Some(FallbackReason::HandlerFailed));
        assert!(r.trace[2].detail.contains("timed out"));
    }

    // ── streaming ──

    #[tokio::test]
    async fn eager_mode_concatenates_fragments() {
        let cap = Streaming(vec![Ok("Bon".into()), Ok("jour".into())]);
        let router = single(Handler::new("EchoFR", "French", cap), french_table());
        let r = router.handle_eager("Bonjour", &RequestOptions::new()).await.unwrap();
        assert_eq!(r.content, "Bonjour");
        assert!(r.streamed);
        assert_eq!(r.outcome, Outcome::Answered);
    }

    #[tokio::test]
    async fn pass_through_delivers_fragments_in_order() {
        let cap = Streaming(vec![Ok("Bon".into()), Ok("jour".into())]);
        let router = single(Handler::new("EchoFR", "French", cap), french_table());
        let options = RequestOptions::new().with_mode(StreamingMode::PassThrough);
        let Reply::Streaming(mut stream) = router.handle("Bonjour", &options).await.unwrap() else {
            panic!("expected a stream");
        };
        let mut seen = Vec::new();
        while let Some(fragment) = stream.next().await {
            seen.push(fragment);
        }
        assert_eq!(seen, ["Bon", "jour"]);
        assert_eq!(stream.finish().await.unwrap().content, "Bonjour");
    }

    #[tokio::test]
    async fn pass_through_on_blocking_handler_is_complete() {
        let f = fixture();
        let options = RequestOptions::new().with_mode(StreamingMode::PassThrough);
        let reply = f.router.handle("How are you?", &options).await.unwrap();
        assert!(matches!(reply, Reply::Complete(_)));
    }

    #[tokio::test]
    async fn mid_stream_failure_returns_partial_content() {
        let cap = Streaming(vec![
            Ok("Hel".into()),
            Ok("lo".into()),
            Err(HandlerError::Stream("connection reset".into())),
        ]);
        let router = single(Handler::new("EchoFR", "French", cap), french_table());
        for mode in [StreamingMode::Eager, StreamingMode::PassThrough] {
            let options = RequestOptions::new().with_mode(mode);
            let r = router.handle("Bonjour", &options).await.unwrap().into_response().await.unwrap();
            assert_eq!(r.content, "Hello");
            assert!(r.truncated);
            assert_eq!(r.fallback_reason(), Some(FallbackReason::HandlerFailed));
            assert!(r.trace.iter().any(|e| e.detail.contains("truncated: true")));
        }
    }

    // ── cancellation & concurrency ──

    #[tokio::test]
    async fn cancelled_request_returns_cancelled() {
        let router = single(Handler::new("EchoFR", "French", Slow), french_table());
        let token = CancellationToken::new();
        let options = RequestOptions::new().with_cancel(token.clone());
        let trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });
        let err = router.handle("Bonjour", &options).await.unwrap_err();
        assert_eq!(err, RouterError::Cancelled);
        trigger.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_do_not_interfere() {
        let f = fixture();
        let queries = ["Comment allez-vous?", "How are you?", "你好吗？", "Come stai?"];
        let tasks: Vec<_> = (0..40)
            .map(|i| {
                let router = f.router.clone();
                let q = queries[i % queries.len()];
                tokio::spawn(async move { (q, router.handle_eager(q, &RequestOptions::new()).await) })
            })
            .collect();

        for task in tasks {
            let (q, result) = task.await.unwrap();
            let r = result.unwrap();
            let expected = match q {
                "Comment allez-vous?" => Some("EchoFR"),
                "How are you?" => Some("EchoEN"),
                "你好吗？" => Some("EchoZH"),
                _ => None,
            };
            assert_eq!(r.handler_name.as_deref(), expected);
        }
        let total: usize = f.handler_calls.iter().map(|c| c.load(Ordering::SeqCst)).sum();
        assert_eq!(total, 30);
        assert_eq!(f.classifier_calls.load(Ordering::SeqCst), 40);
    }
}
