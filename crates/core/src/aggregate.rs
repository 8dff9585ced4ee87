//! Aggregate root trait and a thread-safe recorder for the events it raises.

use std::sync::{Mutex, PoisonError};

use crate::id::AggregateId;

/// Aggregate root marker + minimal interface.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;
}

/// Base aggregate that buffers the domain events it records.
///
/// Command handlers record events while they mutate the aggregate and drain
/// them with [`AggregateBasic::events`] once the command succeeded, typically
/// returning them so the event publishing middleware can fan them out.
///
/// Recording is safe from any number of threads; draining hands over every
/// event recorded so far exactly once.
#[derive(Debug)]
pub struct AggregateBasic<E> {
    id: AggregateId,
    events: Mutex<Vec<E>>,
}

impl<E> AggregateBasic<E> {
    pub fn new(id: AggregateId) -> Self {
        Self {
            id,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn record_event(&self, event: E) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Take every recorded event, leaving the buffer empty.
    pub fn events(&self) -> Vec<E> {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *events)
    }

    /// Number of recorded events not drained yet.
    pub fn pending(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<E> AggregateRoot for AggregateBasic<E> {
    type Id = AggregateId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum UserEvent {
        Added,
        Renamed,
    }

    #[test]
    fn events_drains_the_buffer() {
        let aggregate = AggregateBasic::new(AggregateId::new());
        aggregate.record_event(UserEvent::Added);
        aggregate.record_event(UserEvent::Renamed);
        assert_eq!(aggregate.pending(), 2);

        assert_eq!(aggregate.events(), vec![UserEvent::Added, UserEvent::Renamed]);
        assert_eq!(aggregate.pending(), 0);
        assert!(aggregate.events().is_empty());
    }

    #[test]
    fn concurrent_recording_keeps_every_event() {
        let aggregate = AggregateBasic::new(AggregateId::new());

        std::thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..1000 {
                    aggregate.record_event(UserEvent::Added);
                }
            });
            s.spawn(|| {
                for _ in 0..1000 {
                    aggregate.record_event(UserEvent::Renamed);
                }
            });
        });

        let events = aggregate.events();
        assert_eq!(events.len(), 2000);
        assert_eq!(events.iter().filter(|e| **e == UserEvent::Added).count(), 1000);
        assert_eq!(events.iter().filter(|e| **e == UserEvent::Renamed).count(), 1000);
    }

    #[test]
    fn id_is_stable() {
        let id = AggregateId::new();
        let aggregate: AggregateBasic<UserEvent> = AggregateBasic::new(id);
        assert_eq!(*aggregate.id(), id);
    }
}
