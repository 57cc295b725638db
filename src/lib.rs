// Library root — the router core plus the startup wiring the binary uses.
// The binary entry point is src/main.rs.

pub mod classifier;
pub mod config;
pub mod console;
pub mod error;
pub mod handlers;
pub mod llm;
pub mod logger;
pub mod router;
pub mod setup;

pub use router::{
    FallbackReason, FallbackTemplate, Outcome, Reply, RequestOptions, Response, ResponseStream, Router,
    RouterError, SetupError, StreamingMode, TraceEntry, TraceStep,
};
