use thiserror::Error;

use crate::application::deck::MaterializeError;
use crate::application::render::RenderError;
use crate::domain::error::DeckError;
use crate::infra::{error::InfraError, staging::StagingError};

/// Top-level error surfaced by the `taskdeck` binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Deck(#[from] DeckError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Materialize(#[from] MaterializeError),
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("validation failed: {0}")]
    Validation(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Message chain from this error down to its root cause.
    pub fn messages(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut current = std::error::Error::source(self);
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        messages
    }
}
