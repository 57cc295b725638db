//! Response assembly — turns handler output into a [`Response`].
//!
//! Blocking results and fallbacks are packaged directly. Streams are wrapped
//! in a [`ResponseStream`], which the router either drains on the caller's
//! behalf (eager mode) or hands out as-is (pass-through mode). Both paths
//! share the same truncation rule: if a stream fails part-way, whatever
//! arrived so far is kept and the response is marked `truncated: true` with
//! reason `handler_failed`.

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::handlers::FragmentStream;

use super::RouterError;
use super::bounded::{Bounded, bounded};
use super::response::{FallbackReason, Outcome, Response, Trace, TraceStep};
use super::state::RequestState;

/// Per-request bookkeeping carried from classification into assembly.
#[derive(Debug)]
pub(crate) struct Envelope {
    pub request_id: Uuid,
    pub category: Option<String>,
    pub state: RequestState,
    pub trace: Trace,
}

impl Envelope {
    pub(crate) fn new() -> Self {
        Self {
            request_id: Uuid::now_v7(),
            category: None,
            state: RequestState::Received,
            trace: Trace::default(),
        }
    }
}

/// Package a blocking handler result.
pub(crate) fn assemble_text(mut env: Envelope, handler_name: &str, text: String) -> Response {
    env.state.advance(RequestState::Assembling);
    env.trace.record(TraceStep::Assemble, format!("blocking result, {} bytes", text.len()));
    env.state.advance(RequestState::Done);

    Response {
        request_id: env.request_id,
        content: text,
        handler_name: Some(handler_name.to_string()),
        category: env.category,
        trace: env.trace.into_entries(),
        streamed: false,
        truncated: false,
        outcome: Outcome::Answered,
    }
}

/// Package the fallback message. `env` must already be in `Fallback`.
pub(crate) fn assemble_fallback(mut env: Envelope, reason: FallbackReason, message: String) -> Response {
    env.state.advance(RequestState::Assembling);
    env.trace.record(
        TraceStep::Assemble,
        format!("fallback message, reason={}", reason.as_str()),
    );
    env.state.advance(RequestState::DoneFallback);

    Response {
        request_id: env.request_id,
        content: message,
        handler_name: None,
        category: env.category,
        trace: env.trace.into_entries(),
        streamed: false,
        truncated: false,
        outcome: Outcome::Fallback { reason },
    }
}

// ── Streaming ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum StreamEnd {
    Exhausted,
    Failed(String),
    TimedOut,
    Cancelled,
}

/// A handler's answer being delivered fragment by fragment.
///
/// Call [`next`](Self::next) until it returns `None` (the sequence is
/// complete, cleanly or not), then [`finish`](Self::finish) for the final
/// [`Response`]. `finish` may also be called early; it drains the rest.
/// Dropping the stream abandons the handler call.
pub struct ResponseStream {
    env: Envelope,
    handler_name: String,
    fragments: FragmentStream,
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
    fallback_message: String,
    content: String,
    fragment_count: usize,
    end: Option<StreamEnd>,
}

impl ResponseStream {
    pub(crate) fn new(
        mut env: Envelope,
        handler_name: &str,
        fragments: FragmentStream,
        deadline: Option<Instant>,
        cancel: Option<CancellationToken>,
        fallback_message: String,
    ) -> Self {
        env.state.advance(RequestState::Assembling);
        Self {
            env,
            handler_name: handler_name.to_string(),
            fragments,
            deadline,
            cancel,
            fallback_message,
            content: String::new(),
            fragment_count: 0,
            end: None,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.env.request_id
    }

    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    /// Content received so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Next fragment in arrival order, or `None` once the sequence is over.
    pub async fn next(&mut self) -> Option<String> {
        if self.end.is_some() {
            return None;
        }
        match bounded(self.fragments.next(), self.deadline, self.cancel.as_ref()).await {
            Bounded::Completed(Some(Ok(fragment))) => {
                self.content.push_str(&fragment);
                self.fragment_count += 1;
                Some(fragment)
            }
            Bounded::Completed(Some(Err(e))) => {
                self.end = Some(StreamEnd::Failed(e.to_string()));
                None
            }
            Bounded::Completed(None) => {
                self.end = Some(StreamEnd::Exhausted);
                None
            }
            Bounded::TimedOut => {
                self.end = Some(StreamEnd::TimedOut);
                None
            }
            Bounded::Cancelled => {
                self.end = Some(StreamEnd::Cancelled);
                None
            }
        }
    }

    /// Drain any remaining fragments and build the final response.
    pub async fn finish(mut self) -> Result<Response, RouterError> {
        while self.next().await.is_some() {}
        self.into_response()
    }

    fn into_response(self) -> Result<Response, RouterError> {
        let ResponseStream {
            mut env,
            handler_name,
            content,
            fragment_count,
            end,
            fallback_message,
            ..
        } = self;

        let failure = match end {
            Some(StreamEnd::Exhausted) | None => None,
            Some(StreamEnd::Failed(msg)) => Some(format!("handler stream failed: {msg}")),
            Some(StreamEnd::TimedOut) => Some("handler timed out mid-stream".to_string()),
            Some(StreamEnd::Cancelled) => {
                debug!(request_id = %env.request_id, handler = %handler_name, "stream cancelled by caller");
                return Err(RouterError::Cancelled);
            }
        };

        let Some(failure) = failure else {
            env.trace.record(
                TraceStep::Assemble,
                format!("stream complete, {fragment_count} fragments, {} bytes", content.len()),
            );
            env.state.advance(RequestState::Done);
            return Ok(Response {
                request_id: env.request_id,
                content,
                handler_name: Some(handler_name),
                category: env.category,
                trace: env.trace.into_entries(),
                streamed: true,
                truncated: false,
                outcome: Outcome::Answered,
            });
        };

        warn!(
            request_id = %env.request_id,
            handler = %handler_name,
            fragments = fragment_count,
            error = %failure,
            "handler failed mid-stream — returning partial content"
        );
        env.trace.record(
            TraceStep::Fallback,
            format!("reason=handler_failed handler={handler_name}: {failure}"),
        );
        env.trace.record(
            TraceStep::Assemble,
            format!("partial stream, {fragment_count} fragments; truncated: true"),
        );
        env.state.advance(RequestState::DoneFallback);

        // Partial output is still the handler's; with none at all the caller
        // gets the fallback text instead of an empty answer.
        let (content, handler_name) = if content.is_empty() {
            (fallback_message, None)
        } else {
            (content, Some(handler_name))
        };

        Ok(Response {
            request_id: env.request_id,
            content,
            handler_name,
            category: env.category,
            trace: env.trace.into_entries(),
            streamed: true,
            truncated: true,
            outcome: Outcome::Fallback { reason: FallbackReason::HandlerFailed },
        })
    }
}
