use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cqrs_eda_core::{AggregateId, Dispatchable, EventId, MessageKind};

/// A domain event: a named fact about one aggregate.
///
/// Events are dispatchables, so the same value can be routed through a bus
/// and delivered to a [`Listener`](crate::Listener).
pub trait Event: Dispatchable {
    /// The aggregate this event is about.
    fn aggregate_id(&self) -> AggregateId;
}

impl fmt::Debug for dyn Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name())
            .field("aggregate_id", &self.aggregate_id())
            .finish()
    }
}

/// General-purpose event with an arbitrary JSON body.
///
/// Each instance gets a fresh [`EventId`] and records when it was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBasic {
    id: EventId,
    aggregate_id: AggregateId,
    name: String,
    body: serde_json::Value,
    occurred_at: DateTime<Utc>,
}

impl EventBasic {
    pub fn new(
        aggregate_id: AggregateId,
        name: impl Into<String>,
        body: serde_json::Value,
    ) -> Self {
        Self {
            id: EventId::new(),
            aggregate_id,
            name: name.into(),
            body,
            occurred_at: Utc::now(),
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn body(&self) -> &serde_json::Value {
        &self.body
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

impl Dispatchable for EventBasic {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> MessageKind {
        MessageKind::Event
    }
}

impl Event for EventBasic {
    fn aggregate_id(&self) -> AggregateId {
        self.aggregate_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_event_gets_its_own_id() {
        let aggregate = AggregateId::new();
        let a = EventBasic::new(aggregate, "user.added", json!({"name": "Bond"}));
        let b = EventBasic::new(aggregate, "user.added", json!({"name": "Bond"}));

        assert_ne!(a.id(), b.id());
        assert_eq!(a.aggregate_id(), b.aggregate_id());
        assert_eq!(a.kind(), MessageKind::Event);
        assert_eq!(a.body()["name"], "Bond");
    }

    #[test]
    fn serialized_form_keeps_the_routing_name() {
        let event = EventBasic::new(AggregateId::new(), "user.added", serde_json::Value::Null);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["name"], "user.added");
        assert_eq!(value["aggregate_id"], event.aggregate_id().to_string());

        let back: EventBasic = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }
}
