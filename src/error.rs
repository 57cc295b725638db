//! Application-wide error types.
//!
//! Library modules keep their own error enums; [`AppError`] is what the
//! binary and the startup path surface.

use thiserror::Error;

use crate::handlers::RegistryError;
use crate::llm::ProviderError;
use crate::router::SetupError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("router setup error: {0}")]
    Setup(#[from] SetupError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
