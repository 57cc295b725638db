//! Per-request protocol states.
//!
//! ```text
//! Received → Classifying → Dispatching ─┬→ Assembling → Done
//!                       ↘               ↓            ↘
//!                         Fallback ─────→ Assembling → DoneFallback
//! ```
//!
//! Dispatching may drop to Fallback (handler failed before answering), and
//! Assembling may end in DoneFallback (stream broke off part-way).

use std::fmt;

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    Classifying,
    Dispatching,
    Fallback,
    Assembling,
    Done,
    DoneFallback,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestState::Done | RequestState::DoneFallback)
    }

    pub fn can_advance_to(self, next: RequestState) -> bool {
        use RequestState::*;
        matches!(
            (self, next),
            (Received, Classifying)
                | (Classifying, Dispatching)
                | (Classifying, Fallback)
                | (Dispatching, Assembling)
                | (Dispatching, Fallback)
                | (Fallback, Assembling)
                | (Assembling, Done)
                | (Assembling, DoneFallback)
        )
    }

    /// Move to `next`. An illegal edge is a bug in the router, caught in
    /// debug builds.
    pub fn advance(&mut self, next: RequestState) {
        debug_assert!(
            self.can_advance_to(next),
            "illegal request state transition {self} -> {next}"
        );
        trace!(from = %self, to = %next, "request state");
        *self = next;
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestState::Received => "received",
            RequestState::Classifying => "classifying",
            RequestState::Dispatching => "dispatching",
            RequestState::Fallback => "fallback",
            RequestState::Assembling => "assembling",
            RequestState::Done => "done",
            RequestState::DoneFallback => "done_fallback",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RequestState::*;

    #[test]
    fn happy_path_is_legal() {
        let mut s = Received;
        for next in [Classifying, Dispatching, Assembling, Done] {
            s.advance(next);
        }
        assert!(s.is_terminal());
    }

    #[test]
    fn fallback_paths_are_legal() {
        assert!(Classifying.can_advance_to(Fallback));
        assert!(Dispatching.can_advance_to(Fallback));
        assert!(Fallback.can_advance_to(Assembling));
        assert!(Assembling.can_advance_to(DoneFallback));
    }

    #[test]
    fn shortcuts_are_illegal() {
        assert!(!Received.can_advance_to(Dispatching));
        assert!(!Classifying.can_advance_to(Assembling));
        assert!(!Fallback.can_advance_to(Dispatching));
        assert!(!Done.can_advance_to(Classifying));
        assert!(!DoneFallback.can_advance_to(Assembling));
    }

    #[test]
    #[should_panic(expected = "illegal request state transition")]
    #[cfg(debug_assertions)]
    fn advance_panics_on_illegal_edge_in_debug() {
        let mut s = Received;
        s.advance(Done);
    }

    #[test]
    fn display_is_snake_case() {
        assert_eq!(DoneFallback.to_string(), "done_fallback");
        assert_eq!(Classifying.to_string(), "classifying");
    }
}
