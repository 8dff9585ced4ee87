//! Two events dispatched concurrently, each forwarded to its own listener.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use cqrs_eda_bus::{ConcurrentBus, ConcurrentBusConfig, Scope};
use cqrs_eda_core::AggregateId;
use cqrs_eda_events::{Event, EventBasic, Listener, ListenerError, forward_to};

const CONCURRENCY_LIMIT: usize = 2;
const DISPATCH_TIMEOUT: Duration = Duration::from_secs(1);
const LISTENERS: usize = 2;

fn event_name(i: usize) -> String {
    format!("event{i}")
}

fn listener(i: usize, rx: mpsc::Receiver<Arc<dyn Event>>) -> Listener {
    Listener::new(rx, event_name(i), Vec::new())
        .with_handler(move |e: &dyn Event| {
            let handler = format!("eh {i}.1");
            tracing::info!(%handler, event = e.name(), id = %e.aggregate_id(), "received");
        })
        .with_handler(move |e: &dyn Event| {
            let handler = format!("eh {i}.2");
            tracing::info!(%handler, event = e.name(), id = %e.aggregate_id(), "received");
        })
}

fn report_errors(mut errors: mpsc::Receiver<ListenerError>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(err) = errors.recv().await {
            tracing::warn!(error = %err, "events listener");
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cqrs_eda_observability::init();

    let shutdown = CancellationToken::new();
    let bus = ConcurrentBus::new(ConcurrentBusConfig::new(DISPATCH_TIMEOUT, CONCURRENCY_LIMIT))?;

    let (errors_tx, errors_rx) = mpsc::channel(LISTENERS);
    let reporter = report_errors(errors_rx);
    let mut listening = Vec::with_capacity(LISTENERS);
    for i in 0..LISTENERS {
        let (tx, rx) = mpsc::channel(1);
        bus.register(event_name(i), forward_to::<EventBasic>(tx));
        listening.push(tokio::spawn(listener(i, rx).listen(shutdown.clone(), errors_tx.clone())));
    }
    drop(errors_tx);

    let running = tokio::spawn({
        let bus = bus.clone();
        let shutdown = shutdown.clone();
        async move { bus.run(shutdown).await }
    });

    let scope = Scope::new();
    let first = bus.dispatch(
        &scope,
        Arc::new(EventBasic::new(AggregateId::new(), event_name(0), serde_json::Value::Null)),
    );
    let second = bus.dispatch(
        &scope,
        Arc::new(EventBasic::new(AggregateId::new(), event_name(1), serde_json::Value::Null)),
    );

    let (first, second) = tokio::join!(first, second);
    for (i, response) in [first, second].into_iter().enumerate() {
        match response {
            Ok(_) => tracing::info!(response = i + 1, "dispatchable processed"),
            Err(err) => tracing::warn!(response = i + 1, error = %err, "dispatch failed"),
        }
    }

    // Let the listeners drain what was forwarded before stopping everything.
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.cancel();
    running.await??;
    for listener in listening {
        listener.await?;
    }
    reporter.await?;

    Ok(())
}
