//! `cqrs-eda-core`: dispatch foundation building blocks.
//!
//! This crate contains the contracts every other crate routes through
//! (no buses, no handlers, no IO).

pub mod aggregate;
pub mod dispatchable;
pub mod error;
pub mod id;
pub mod scope;

pub use aggregate::{AggregateBasic, AggregateRoot};
pub use dispatchable::{AsDispatchable, Dispatchable, MessageKind, downcast};
pub use error::{DispatchError, DispatchResult};
pub use id::{AggregateId, EventId, InvalidId};
pub use scope::Scope;
