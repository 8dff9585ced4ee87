//! `cqrs-eda-cqrs`: commands, queries and their handler middleware.
//!
//! Typed handlers ([`CommandHandler`], [`QueryHandler`]) are composed with
//! middleware through a [`Pipeline`] and exposed on a bus with
//! [`command_handler`] / [`query_handler`].
//!
//! - [`ErrorLogging`] logs failures and passes results through.
//! - [`EventPublishing`] dispatches the events of successful commands on an
//!   events bus.

mod adapter;
mod command;
mod middleware;
mod query;

#[cfg(test)]
mod testing;

pub use adapter::{command_handler, query_handler};
pub use command::{Command, CommandHandler, CommandHandlerFn, Events, command_handler_fn};
pub use middleware::{ErrorLogging, EventPublishing, Middleware, Pipeline};
pub use query::{Query, QueryHandler, QueryHandlerFn, query_handler_fn};
