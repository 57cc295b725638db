//! Startup wiring: config → provider → registry + classifier → router.
//!
//! Any error here is a misconfiguration and stops the process before the
//! first query is served.

use tracing::info;

use crate::config::Config;
use crate::error::AppError;
use crate::router::{FallbackTemplate, RequestOptions, Router};
use crate::{classifier, handlers, llm};

/// Build the router described by `config`.
pub fn build_router(config: &Config) -> Result<Router, AppError> {
    let provider = llm::providers::build(&config.llm, config.llm_api_key.clone())?;
    let registry = handlers::build_registry(&config.handlers, &provider)?;
    let classifier = classifier::build(&config.classifier, &provider);
    let fallback = FallbackTemplate::new(config.router.fallback.clone())?;

    let router = Router::new(registry, classifier, fallback)?;

    info!(
        provider = provider.kind(),
        model = provider.model().unwrap_or("-"),
        classifier = router.classifier_name(),
        handlers = ?router.registry().names(),
        "router ready"
    );
    Ok(router)
}

/// Per-request options taken from `[router]`. Callers add their own
/// cancellation token.
pub fn request_options(config: &Config) -> RequestOptions {
    RequestOptions {
        mode: config.router.mode,
        timeout: config.router.timeout,
        cancel: None,
    }
}
