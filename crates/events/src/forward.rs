//! Bridge from a bus to a listener channel.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use cqrs_eda_bus::{Handler, Reply, handler_fn};
use cqrs_eda_core::{DispatchError, Dispatchable, MessageKind, Scope, downcast};

use crate::event::Event;

#[derive(Debug, Error)]
#[error("listener channel for {name} is closed")]
pub struct ListenerClosed {
    pub name: String,
}

/// Bus handler that hands every dispatched `E` to a listener channel.
///
/// Anything that is not an `E` event fails with
/// [`DispatchError::UnexpectedDispatchable`]. The send is raced against the
/// call scope, so a full channel never outlives the dispatch deadline. The
/// reply is `()`.
pub fn forward_to<E: Event>(tx: mpsc::Sender<Arc<dyn Event>>) -> Handler {
    handler_fn(move |scope: Scope, dispatchable: Arc<dyn Dispatchable>| {
        forward::<E>(tx.clone(), scope, dispatchable)
    })
}

async fn forward<E: Event>(
    tx: mpsc::Sender<Arc<dyn Event>>,
    scope: Scope,
    dispatchable: Arc<dyn Dispatchable>,
) -> Result<Reply, DispatchError> {
    let event: Arc<dyn Event> = downcast::<E>(dispatchable, MessageKind::Event)?;
    let name = event.name().to_string();

    tokio::select! {
        biased;

        reason = scope.done() => Err(reason),

        sent = tx.send(event) => match sent {
            Ok(()) => Ok(Box::new(()) as Reply),
            Err(_) => Err(DispatchError::handler(ListenerClosed { name })),
        },
    }
}
