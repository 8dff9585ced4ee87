//! Shared test fixtures: sample messages, canned handlers and log capture.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::Level;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use cqrs_eda_core::{AggregateId, DispatchError, Dispatchable, MessageKind};
use cqrs_eda_events::{Event, EventBasic};

use crate::command::{Command, CommandHandler, Events, command_handler_fn};
use crate::query::Query;

#[derive(Debug, thiserror::Error)]
#[error("failed: {0}")]
pub struct Failed(pub &'static str);

#[derive(Debug)]
pub struct AddUser {
    pub user_name: String,
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

pub fn add_user(user_name: &str) -> Arc<AddUser> {
    Arc::new(AddUser {
        user_name: user_name.to_string(),
    })
}

#[derive(Debug)]
pub struct FindUser;

impl Dispatchable for FindUser {
    fn name(&self) -> &str {
        "user.find"
    }

    fn kind(&self) -> MessageKind {
        MessageKind::Query
    }
}

impl Query for FindUser {}

pub fn failing_command(reason: &'static str) -> Arc<dyn CommandHandler<AddUser>> {
    Arc::new(command_handler_fn(move |_scope, _cmd: Arc<AddUser>| async move {
        Err(DispatchError::handler(Failed(reason)))
    }))
}

/// Command handler succeeding with one event per name, in order.
pub fn emitting(names: &[&'static str]) -> Arc<dyn CommandHandler<AddUser>> {
    let names = names.to_vec();
    Arc::new(command_handler_fn(move |_scope, _cmd: Arc<AddUser>| {
        let aggregate = AggregateId::new();
        let events: Events = names
            .iter()
            .map(|name| {
                let event = EventBasic::new(aggregate, *name, serde_json::Value::Null);
                Arc::new(event) as Arc<dyn Event>
            })
            .collect();
        async move { Ok(events) }
    }))
}

/// Events captured by [`capture_logs`], rendered as `message field=value ...`.
#[derive(Clone, Default)]
pub struct Logs(Arc<Mutex<Vec<(Level, String)>>>);

impl Logs {
    pub fn at(&self, level: Level) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, line)| line.clone())
            .collect()
    }
}

impl<S: tracing::Subscriber> Layer<S> for Logs {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut line = Line(String::new());
        event.record(&mut line);
        self.0.lock().unwrap().push((*event.metadata().level(), line.0));
    }
}

struct Line(String);

impl Visit for Line {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0.insert_str(0, &format!("{value:?}"));
        } else {
            self.0.push_str(&format!(" {}={value:?}", field.name()));
        }
    }
}

/// Capture every tracing event emitted on this thread while the guard lives.
pub fn capture_logs() -> (Logs, DefaultGuard) {
    let logs = Logs::default();
    let subscriber = tracing_subscriber::registry().with(logs.clone());
    (logs, tracing::subscriber::set_default(subscriber))
}
