//! Dispatch error model.

use thiserror::Error;

use crate::dispatchable::MessageKind;

/// Result type used across the dispatch layer.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Everything a dispatch can end with besides a reply.
///
/// Bus-level failures are explicit variants. Whatever a handler itself fails
/// with is carried opaquely in [`DispatchError::Handler`] and can be recovered
/// with `downcast_ref`.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler is registered under the dispatchable's name.
    #[error("not dispatchable: no handler registered for {0:?}")]
    NotDispatchable(String),

    /// A handler received a dispatchable of the wrong kind or concrete type.
    #[error("unexpected dispatchable: expected {expected}, got {found:?}")]
    UnexpectedDispatchable { expected: String, found: String },

    /// The call scope was cancelled before the handler completed.
    #[error("dispatch cancelled")]
    Cancelled,

    /// The call scope's deadline passed before the handler completed.
    #[error("dispatch deadline exceeded")]
    DeadlineExceeded,

    /// The bus stopped before the dispatch could be served.
    #[error("bus stopped before the dispatch was served")]
    BusStopped,

    /// The handler panicked; the payload message when it had one.
    #[error("handler panicked: {0}")]
    HandlerPanicked(String),

    /// Error returned by the handler, passed through unchanged.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl DispatchError {
    pub fn not_dispatchable(name: impl Into<String>) -> Self {
        Self::NotDispatchable(name.into())
    }

    pub fn unexpected(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedDispatchable {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_kind(expected: MessageKind, found: impl Into<String>) -> Self {
        Self::unexpected(expected.to_string(), found)
    }

    /// Wrap a handler-originated error.
    pub fn handler<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Handler(anyhow::Error::new(err))
    }

    /// True for the two ways a call scope can end early.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Borrow the handler error as `E`, if this is a handler error of that type.
    pub fn downcast_handler_ref<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        match self {
            Self::Handler(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}
