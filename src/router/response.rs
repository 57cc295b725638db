//! Response shape returned to callers, and the trace that explains it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which protocol step produced a trace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStep {
    Classify,
    Dispatch,
    Fallback,
    Assemble,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub step: TraceStep,
    pub detail: String,
}

/// Why a request ended in the fallback path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// Classifier found no category.
    Unclassified,
    /// Classifier named a category no handler owns.
    UnsupportedCategory,
    /// Classifier errored or timed out.
    ClassifierFailed,
    /// The matched handler errored, timed out or broke off mid-stream.
    HandlerFailed,
}

impl FallbackReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FallbackReason::Unclassified => "unclassified",
            FallbackReason::UnsupportedCategory => "unsupported_category",
            FallbackReason::ClassifierFailed => "classifier_failed",
            FallbackReason::HandlerFailed => "handler_failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Answered,
    Fallback { reason: FallbackReason },
}

/// The router's uniform answer to one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub request_id: Uuid,
    pub content: String,
    /// Handler whose output is in `content`; `None` when `content` is the
    /// fallback message.
    pub handler_name: Option<String>,
    /// Category the classifier settled on, registered or not.
    pub category: Option<String>,
    pub trace: Vec<TraceEntry>,
    pub streamed: bool,
    pub truncated: bool,
    pub outcome: Outcome,
}

impl Response {
    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, Outcome::Fallback { .. })
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self.outcome {
            Outcome::Fallback { reason } => Some(reason),
            Outcome::Answered => None,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Chronological trace under construction for one request.
#[derive(Debug, Clone, Default)]
pub(crate) struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    pub(crate) fn record(&mut self, step: TraceStep, detail: impl Into<String>) {
        self.entries.push(TraceEntry { step, detail: detail.into() });
    }

    pub(crate) fn into_entries(self) -> Vec<TraceEntry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Response {
        Response {
            request_id: Uuid::nil(),
            content: "Hello".into(),
            handler_name: Some("EchoEN".into()),
            category: Some("English".into()),
            trace: vec![
                TraceEntry { step: TraceStep::Classify, detail: "category=English".into() },
                TraceEntry { step: TraceStep::Assemble, detail: "truncated: true".into() },
            ],
            streamed: true,
            truncated: true,
            outcome: Outcome::Fallback { reason: FallbackReason::HandlerFailed },
        }
    }

    #[test]
    fn response_serializes_trace_steps_as_snake_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["trace"][0]["step"], "classify");
        assert_eq!(json["trace"][1]["step"], "assemble");
        assert_eq!(json["handler_name"], "EchoEN");
        assert_eq!(json["outcome"]["status"], "fallback");
        assert_eq!(json["outcome"]["reason"], "handler_failed");
    }

    #[test]
    fn response_round_trips_through_serde() {
        let r = sample();
        let back: Response = serde_json::from_str(&r.to_json()).unwrap();
        assert_eq!(back, r);
        assert!(back.is_fallback());
        assert_eq!(back.fallback_reason(), Some(FallbackReason::HandlerFailed));
    }

    #[test]
    fn answered_outcome_has_no_reason() {
        let json = serde_json::to_value(Outcome::Answered).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "answered" }));
    }

    #[test]
    fn reason_strings_match_serde_names() {
        for reason in [
            FallbackReason::Unclassified,
            FallbackReason::UnsupportedCategory,
            FallbackReason::ClassifierFailed,
            FallbackReason::HandlerFailed,
        ] {
            let json = serde_json::to_value(reason).unwrap();
            assert_eq!(json, reason.as_str());
        }
    }

    #[test]
    fn trace_keeps_insertion_order() {
        let mut t = Trace::default();
        t.record(TraceStep::Classify, "unclassified");
        t.record(TraceStep::Fallback, "reason=unclassified");
        let entries = t.into_entries();
        assert_eq!(entries[0].step, TraceStep::Classify);
        assert_eq!(entries[1].step, TraceStep::Fallback);
    }
}
