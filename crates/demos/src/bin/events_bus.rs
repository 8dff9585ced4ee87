//! An event dispatched on the synchronous bus and fanned out by a listener.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use cqrs_eda_bus::{Bus, Scope};
use cqrs_eda_core::AggregateId;
use cqrs_eda_events::{Event, EventBasic, Listener, forward_to};

const EVENT_NAME: &str = "anEvent";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cqrs_eda_observability::init();

    let (events_tx, events_rx) = mpsc::channel(1);
    let listener = Listener::new(events_rx, EVENT_NAME, Vec::new())
        .with_handler(|e: &dyn Event| {
            tracing::info!(handler = "eh1", event = e.name(), id = %e.aggregate_id(), "received");
        })
        .with_handler(|e: &dyn Event| {
            tracing::info!(handler = "eh2", event = e.name(), id = %e.aggregate_id(), "received");
        });

    let shutdown = CancellationToken::new();
    let (errors_tx, mut errors_rx) = mpsc::channel(1);
    tokio::spawn(async move {
        while let Some(err) = errors_rx.recv().await {
            tracing::warn!(error = %err, "events listener");
        }
    });
    let listening = tokio::spawn(listener.listen(shutdown.clone(), errors_tx));

    let mut bus = Bus::new();
    bus.register(EVENT_NAME, forward_to::<EventBasic>(events_tx));

    let event = EventBasic::new(AggregateId::new(), EVENT_NAME, serde_json::Value::Null);
    bus.dispatch(&Scope::new(), Arc::new(event)).await?;

    // Dropping the bus closes the listener channel once the event is handled.
    drop(bus);
    listening.await?;
    shutdown.cancel();

    Ok(())
}
