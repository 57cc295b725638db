//! Console front end — routes queries and prints the answers to stdout.
//!
//! Used three ways by the binary: one-shot queries from the command line,
//! the built-in demo set, and the interactive REPL ([`Console::run`]), which
//! reads stdin line by line until EOF or the shutdown token fires (Ctrl-C).
//!
//! Pass-through streams are printed fragment by fragment as they arrive.
//! With `--json` every answer is printed as one JSON [`Response`] per line.

use std::io::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::router::{Outcome, Reply, RequestOptions, Response, Router, RouterError};

/// One query per supported language plus one the default setup rejects.
pub const DEMO_QUERIES: [&str; 4] = ["Comment allez-vous?", "How are you?", "你好吗？", "Come stai?"];

pub struct Console {
    router: Router,
    options: RequestOptions,
    json: bool,
}

impl Console {
    pub fn new(router: Router, options: RequestOptions, json: bool) -> Self {
        Self { router, options, json }
    }

    /// Route one query and print the answer.
    ///
    /// Only cancellation is returned as an error; an empty query is reported
    /// and skipped.
    pub async fn ask(&self, query: &str) -> Result<(), RouterError> {
        match self.router.handle(query, &self.options).await {
            Ok(reply) => self.print(reply).await,
            Err(RouterError::EmptyQuery) => {
                eprintln!("(empty query ignored)");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn print(&self, reply: Reply) -> Result<(), RouterError> {
        let stream = match reply {
            Reply::Complete(response) => {
                self.print_response(&response);
                return Ok(());
            }
            Reply::Streaming(stream) if self.json => {
                let response = stream.finish().await?;
                self.print_response(&response);
                return Ok(());
            }
            Reply::Streaming(stream) => stream,
        };

        let mut stream = stream;
        let mut out = std::io::stdout();
        while let Some(fragment) = stream.next().await {
            let _ = write!(out, "{fragment}");
            let _ = out.flush();
        }
        let _ = writeln!(out);
        let response = stream.finish().await?;
        println!("{}", summary_line(&response));
        Ok(())
    }

    fn print_response(&self, response: &Response) {
        if self.json {
            println!("{}", response.to_json());
        } else {
            println!("{}", response.content);
            println!("{}", summary_line(response));
        }
    }

    /// Interactive loop. Returns when stdin closes or `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), AppError> {
        info!("console started — type a question and press Enter. Ctrl-C to quit.");
        println!("─────────────────────────────────────────");
        println!(" Polyglot router  ({})", self.router.categories().join(", "));
        println!(" Ctrl-C to quit");
        println!("─────────────────────────────────────────");

        let stdin = tokio::io::stdin();
        let mut lines = BufReader::new(stdin).lines();

        loop {
            print!("> ");
            let _ = std::io::stdout().flush();

            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    println!();
                    info!("console shutting down");
                    break;
                }

                line = lines.next_line() => {
                    match line {
                        Err(e) => {
                            warn!("console read error: {e}");
                            return Err(AppError::Io(e));
                        }
                        Ok(None) => {
                            info!("console stdin closed");
                            break;
                        }
                        Ok(Some(input)) => {
                            let input = input.trim();
                            if input.is_empty() { continue; }

                            debug!(input = %input, "console received line");

                            if let Err(RouterError::Cancelled) = self.ask(input).await {
                                info!("request cancelled — closing console");
                                break;
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// One-line provenance note printed under each answer.
pub fn summary_line(response: &Response) -> String {
    let who = match (&response.outcome, &response.handler_name) {
        (Outcome::Answered, Some(name)) => format!("answered by {name}"),
        (Outcome::Fallback { reason }, Some(name)) => format!("partial answer from {name} ({})", reason.as_str()),
        (Outcome::Fallback { reason }, None) => format!("fallback ({})", reason.as_str()),
        (Outcome::Answered, None) => "answered".to_string(),
    };
    let category = response.category.as_deref().unwrap_or("unclassified");
    let mut line = format!("  ↳ {who} · category: {category}");
    if response.streamed {
        line.push_str(" · streamed");
    }
    if response.truncated {
        line.push_str(" · truncated");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{FallbackReason, TraceEntry};
    use uuid::Uuid;

    fn response(outcome: Outcome, handler: Option<&str>, category: Option<&str>) -> Response {
        Response {
            request_id: Uuid::nil(),
            content: "x".into(),
            handler_name: handler.map(str::to_string),
            category: category.map(str::to_string),
            trace: Vec::<TraceEntry>::new(),
            streamed: false,
            truncated: false,
            outcome,
        }
    }

    #[test]
    fn summary_names_the_handler() {
        let r = response(Outcome::Answered, Some("EchoFR"), Some("French"));
        assert_eq!(summary_line(&r), "  ↳ answered by EchoFR · category: French");
    }

    #[test]
    fn summary_names_the_fallback_reason() {
        let r = response(
            Outcome::Fallback { reason: FallbackReason::Unclassified },
            None,
            None,
        );
        assert_eq!(summary_line(&r), "  ↳ fallback (unclassified) · category: unclassified");
    }

    #[test]
    fn summary_flags_truncated_streams() {
        let mut r = response(
            Outcome::Fallback { reason: FallbackReason::HandlerFailed },
            Some("EchoEN"),
            Some("English"),
        );
        r.streamed = true;
        r.truncated = true;
        let line = summary_line(&r);
        assert!(line.contains("partial answer from EchoEN (handler_failed)"));
        assert!(line.ends_with("· streamed · truncated"));
    }

    #[test]
    fn demo_queries_cover_every_default_language_and_one_more() {
        assert_eq!(DEMO_QUERIES.len(), 4);
        assert!(DEMO_QUERIES.contains(&"Come stai?"));
    }
}
