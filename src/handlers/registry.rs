//! Handler registry — ordered, category-indexed, unambiguous.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use super::Handler;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("category {category:?} already handled by {existing:?} (while registering {rejected:?})")]
    DuplicateCategory {
        category: String,
        existing: String,
        rejected: String,
    },
    #[error("duplicate handler name: {0:?}")]
    DuplicateName(String),
    #[error("no handler for category: {0:?}")]
    NotFound(String),
}

/// Registry of handlers, keyed by category.
///
/// Registration order is kept for traces and for the fallback message's
/// category list; it never decides which handler answers. Once the router
/// takes ownership the registry is only read.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: Vec<Handler>,
    categories: Vec<String>,
    by_category: HashMap<String, usize>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler. Fails if its category or its name is already taken;
    /// the category check runs first.
    pub fn register(&mut self, handler: Handler) -> Result<(), RegistryError> {
        if let Some(&idx) = self.by_category.get(handler.category()) {
            return Err(RegistryError::DuplicateCategory {
                category: handler.category().to_string(),
                existing: self.handlers[idx].name().to_string(),
                rejected: handler.name().to_string(),
            });
        }
        if self.handlers.iter().any(|h| h.name() == handler.name()) {
            return Err(RegistryError::DuplicateName(handler.name().to_string()));
        }

        debug!(name = %handler.name(), category = %handler.category(), "registering handler");
        self.by_category.insert(handler.category().to_string(), self.handlers.len());
        self.categories.push(handler.category().to_string());
        self.handlers.push(handler);
        Ok(())
    }

    /// Build a registry from handlers in order, stopping at the first conflict.
    pub fn from_handlers(handlers: impl IntoIterator<Item = Handler>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for handler in handlers {
            registry.register(handler)?;
        }
        Ok(registry)
    }

    pub fn lookup(&self, category: &str) -> Result<&Handler, RegistryError> {
        self.by_category
            .get(category)
            .map(|&idx| &self.handlers[idx])
            .ok_or_else(|| RegistryError::NotFound(category.to_string()))
    }

    pub fn contains(&self, category: &str) -> bool {
        self.by_category.contains_key(category)
    }

    /// Registered categories in registration order. Each appears once.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn handlers(&self) -> impl Iterator<Item = &Handler> {
        self.handlers.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.handlers.iter().map(Handler::name).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
