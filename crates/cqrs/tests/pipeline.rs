//! Command bus → middleware pipeline → concurrent events bus → listeners.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use cqrs_eda_bus::{
    Bus, ConcurrentBus, ConcurrentBusConfig, DispatchError, Dispatchable, MessageKind, Scope,
};
use cqrs_eda_core::AggregateId;
use cqrs_eda_cqrs::{
    Command, CommandHandler, ErrorLogging, EventPublishing, Events, Pipeline, command_handler,
    command_handler_fn,
};
use cqrs_eda_events::{Event, EventBasic, Listener, ListenerError, forward_to};

const USER_ADDED: &str = "user.added";

#[derive(Debug)]
struct AddUser {
    id: AggregateId,
    user_name: String,
}

impl Dispatchable for AddUser {
    fn name(&self) -> &str {
        "user.add"
    }

    fn kind(&self) -> MessageKind {
        MessageKind::Command
    }
}

impl Command for AddUser {}

fn add_user_handler() -> Arc<dyn CommandHandler<AddUser>> {
    Arc::new(command_handler_fn(|_scope, cmd: Arc<AddUser>| async move {
        if cmd.user_name.is_empty() {
            return Err(DispatchError::handler(std::io::Error::other("empty user name")));
        }
        let body = serde_json::json!({ "name": cmd.user_name });
        let added = EventBasic::new(cmd.id, USER_ADDED, body);
        Ok(vec![Arc::new(added) as Arc<dyn Event>])
    }))
}

struct Wiring {
    commands: Bus,
    shutdown: CancellationToken,
    received: Arc<Mutex<Vec<(String, AggregateId)>>>,
    errors: mpsc::Receiver<ListenerError>,
    listener: tokio::task::JoinHandle<()>,
}

fn wire() -> Wiring {
    let shutdown = CancellationToken::new();
    let received = Arc::new(Mutex::new(Vec::new()));
    let (err_tx, errors) = mpsc::channel(8);

    let events_bus =
        ConcurrentBus::new(ConcurrentBusConfig::new(Duration::from_secs(1), 2)).unwrap();
    let (event_tx, event_rx) = mpsc::channel(8);
    events_bus.register(USER_ADDED, forward_to::<EventBasic>(event_tx));

    let listener = Listener::new(event_rx, USER_ADDED, Vec::new())
        .with_handler({
            let received = Arc::clone(&received);
            move |e: &dyn Event| {
                received
                    .lock()
                    .unwrap()
                    .push((format!("eh1:{}", e.name()), e.aggregate_id()))
            }
        })
        .with_handler({
            let received = Arc::clone(&received);
            move |e: &dyn Event| {
                received
                    .lock()
                    .unwrap()
                    .push((format!("eh2:{}", e.name()), e.aggregate_id()))
            }
        });
    let listener = tokio::spawn(listener.listen(shutdown.clone(), err_tx));

    tokio::spawn({
        let events_bus = events_bus.clone();
        let shutdown = shutdown.clone();
        async move { events_bus.run(shutdown).await }
    });

    let handler = Pipeline::<dyn CommandHandler<AddUser>>::new()
        .with(ErrorLogging)
        .with(EventPublishing::new(Arc::new(events_bus)))
        .build(add_user_handler());

    let mut commands = Bus::new();
    commands.register("user.add", command_handler(handler));

    Wiring {
        commands,
        shutdown,
        received,
        errors,
        listener,
    }
}

async fn wait_for(received: &Mutex<Vec<(String, AggregateId)>>, count: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while received.lock().unwrap().len() < count {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("listeners should receive the published events");
}

#[tokio::test]
async fn successful_command_events_reach_every_listener_handler() {
    let mut wiring = wire();
    let id = AggregateId::new();

    let reply = wiring
        .commands
        .dispatch(
            &Scope::new(),
            Arc::new(AddUser {
                id,
                user_name: "Bond, James Bond".to_string(),
            }),
        )
        .await
        .unwrap();

    let events = reply.downcast::<Events>().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].aggregate_id(), id);

    wait_for(&wiring.received, 2).await;
    assert_eq!(
        *wiring.received.lock().unwrap(),
        vec![
            (format!("eh1:{USER_ADDED}"), id),
            (format!("eh2:{USER_ADDED}"), id),
        ]
    );

    wiring.shutdown.cancel();
    wiring.listener.await.unwrap();
    assert!(wiring.errors.try_recv().is_err());
}

#[tokio::test]
async fn failed_command_publishes_nothing() {
    let wiring = wire();

    let err = wiring
        .commands
        .dispatch(
            &Scope::new(),
            Arc::new(AddUser {
                id: AggregateId::new(),
                user_name: String::new(),
            }),
        )
        .await
        .unwrap_err();

    assert!(err.downcast_handler_ref::<std::io::Error>().is_some());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(wiring.received.lock().unwrap().is_empty());
    wiring.shutdown.cancel();
}
