//! `cqrs-eda-events`: event contract and listeners.
//!
//! Events reach listeners through a plain channel. A bus handler built with
//! [`forward_to`] sits between the two, so publishing an event is just
//! dispatching it:
//!
//! ```text
//! bus.dispatch(event) ──► forward_to::<E> ──► mpsc channel ──► Listener ──► handlers
//! ```

mod event;
mod forward;
mod listener;

pub use event::{Event, EventBasic};
pub use forward::{ListenerClosed, forward_to};
pub use listener::{EventHandler, Listener, ListenerError};
