//! Call scope: cancellation plus an optional deadline.
//!
//! A [`Scope`] travels with every dispatch. Handlers observe it through
//! [`Scope::done`] (async) or [`Scope::err`] (polling). Deriving a scope with
//! [`Scope::with_timeout`] never extends the parent's deadline, and cancelling
//! a derived scope never cancels its parent.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::DispatchError;

#[derive(Debug, Clone, Default)]
pub struct Scope {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Scope {
    /// A root scope without deadline; it ends only when [`Scope::cancel`] is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// A root scope governed by an existing token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derive a scope that is cancelled with `self` but can be cancelled on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a child scope ending at `now + timeout` or at the parent's deadline,
    /// whichever comes first.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.child(),
        }
    }

    /// Derive a child scope ending at `deadline` or at the parent's deadline,
    /// whichever comes first.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Why the scope ended, or `None` while it is still live.
    ///
    /// Explicit cancellation wins over an expired deadline.
    pub fn err(&self) -> Option<DispatchError> {
        if self.token.is_cancelled() {
            return Some(DispatchError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(DispatchError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolve once the scope ends, with the reason it ended.
    pub async fn done(&self) -> DispatchError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => DispatchError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => DispatchError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                DispatchError::Cancelled
            }
        }
    }
}
