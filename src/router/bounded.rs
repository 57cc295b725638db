//! Deadline + cancellation wrapper for the router's remote calls.

use std::future::Future;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Bounded<T> {
    Completed(T),
    TimedOut,
    Cancelled,
}

/// Drive `fut` until it completes, `deadline` passes, or `cancel` fires.
///
/// Cancellation wins ties, then the deadline. Losing futures are dropped on
/// return, which is what releases an in-flight HTTP request.
pub(crate) async fn bounded<F: Future>(
    fut: F,
    deadline: Option<Instant>,
    cancel: Option<&CancellationToken>,
) -> Bounded<F::Output> {
    let cancelled = async {
        match cancel {
            Some(token) => token.cancelled().await,
            None => std::future::pending::<()>().await,
        }
    };
    let expired = async {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        _ = cancelled => Bounded::Cancelled,
        _ = expired => Bounded::TimedOut,
        out = fut => Bounded::Completed(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn completes_without_limits() {
        assert_eq!(bounded(async { 7 }, None, None).await, Bounded::Completed(7));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expires_before_slow_future() {
        let deadline = Instant::now() + Duration::from_millis(50);
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            1
        };
        assert_eq!(bounded(slow, Some(deadline), None).await, Bounded::TimedOut);
    }

    #[tokio::test]
    async fn cancelled_token_wins() {
        let token = CancellationToken::new();
        token.cancel();
        let never = std::future::pending::<u8>();
        assert_eq!(bounded(never, None, Some(&token)).await, Bounded::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_mid_flight_releases_future() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });
        let slow = tokio::time::sleep(Duration::from_secs(60));
        assert_eq!(bounded(slow, None, Some(&token)).await, Bounded::Cancelled);
    }
}
