//! `cqrs-eda-bus`: name-routed dispatch.
//!
//! Two routers share one handler signature:
//!
//! - [`Bus`]: a routing table plus a direct call, awaited in the caller's task.
//! - [`ConcurrentBus`]: submission decoupled from execution through a run loop,
//!   a bounded admission pool, a uniform per-call timeout, and a private
//!   response channel per dispatch.
//!
//! ```text
//! dispatch ──► submission channel ──► run loop ──► admission pool ──► worker
//!    ▲                                   │ unknown name                 │
//!    └──────────── PendingResponse ◄─────┴──────────────────────────────┘
//! ```
//!
//! Both implement [`Dispatcher`], the seam used by callers that only need
//! "dispatch and wait for the result".

mod bus;
mod concurrent;
mod config;
mod dispatcher;
mod handler;

#[cfg(test)]
mod fixtures;

pub use bus::Bus;
pub use concurrent::{ConcurrentBus, PendingResponse, RunError};
pub use config::{CONCURRENCY_LIMIT_ENV, ConcurrentBusConfig, ConfigError, TIMEOUT_ENV};
pub use dispatcher::Dispatcher;
pub use handler::{Handler, HandlerFuture, Reply, Response, handler_fn};

pub use cqrs_eda_core::{DispatchError, Dispatchable, MessageKind, Scope};
