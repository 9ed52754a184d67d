use thiserror::Error;

/// Errors raised at the deck API boundary. These indicate programming errors in
/// task code and propagate to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeckError {
    #[error("invalid argument `{argument}`: {message}")]
    InvalidArgument {
        argument: &'static str,
        message: String,
    },
    #[error("no deck registry is active for the current execution")]
    NoActiveExecution,
}

impl DeckError {
    pub fn invalid_argument(argument: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            message: message.into(),
        }
    }
}
