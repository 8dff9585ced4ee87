//! The routing contract shared by every bus.
//!
//! A bus knows nothing about commands, queries, or events: it reads
//! [`Dispatchable::name`] once per call and routes on that string alone.
//! The [`MessageKind`] discriminant is only consulted at the adapter boundary,
//! where a generic dispatchable is narrowed back to a typed message.

use core::any::{Any, type_name};
use core::fmt;
use std::sync::Arc;

use crate::error::DispatchError;

/// Discriminant carried by every dispatchable.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Command,
    Query,
    Event,
    /// Anything routed through a bus that is not a CQRS message.
    Message,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageKind::Command => "command",
            MessageKind::Query => "query",
            MessageKind::Event => "event",
            MessageKind::Message => "message",
        };
        f.write_str(s)
    }
}

/// Anything routable through a bus by name.
///
/// `name` must be non-empty and stable for the lifetime of a dispatch.
pub trait Dispatchable: AsDispatchable {
    /// Routing key.
    fn name(&self) -> &str;

    fn kind(&self) -> MessageKind {
        MessageKind::Message
    }
}

/// Object-safe conversions for [`Dispatchable`] trait objects.
///
/// Blanket-implemented for every sized dispatchable; never implement it by hand.
pub trait AsDispatchable: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    fn into_dispatchable(self: Arc<Self>) -> Arc<dyn Dispatchable>;
}

impl<T: Dispatchable> AsDispatchable for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn into_dispatchable(self: Arc<Self>) -> Arc<dyn Dispatchable> {
        self
    }
}

impl fmt::Debug for dyn Dispatchable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatchable")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}

/// Narrow a routed dispatchable back to its concrete message type.
///
/// The kind is checked first, then the concrete type; either mismatch is an
/// [`DispatchError::UnexpectedDispatchable`].
pub fn downcast<T: Dispatchable>(
    dispatchable: Arc<dyn Dispatchable>,
    expected: MessageKind,
) -> Result<Arc<T>, DispatchError> {
    if dispatchable.kind() != expected {
        return Err(DispatchError::unexpected_kind(expected, dispatchable.name()));
    }

    let found = dispatchable.name().to_string();
    dispatchable
        .into_any()
        .downcast::<T>()
        .map_err(|_| DispatchError::unexpected(type_name::<T>(), found))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct AddUser {
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

    #[derive(Debug)]
    struct RemoveUser;

    impl Dispatchable for RemoveUser {
        fn name(&self) -> &str {
            "user.remove"
        }

        fn kind(&self) -> MessageKind {
            MessageKind::Command
        }
    }

    struct Ping;

    impl Dispatchable for Ping {
        fn name(&self) -> &str {
            "ping"
        }
    }

    #[test]
    fn downcast_recovers_the_concrete_message() {
        let d: Arc<dyn Dispatchable> = Arc::new(AddUser {
            user_name: "Bond, James Bond".to_string(),
        });
        let cmd = downcast::<AddUser>(d, MessageKind::Command).unwrap();
        assert_eq!(cmd.user_name, "Bond, James Bond");
    }

    #[test]
    fn downcast_rejects_wrong_kind() {
        let d: Arc<dyn Dispatchable> = Arc::new(Ping);
        let err = downcast::<AddUser>(d, MessageKind::Command).unwrap_err();
        assert!(matches!(err, DispatchError::UnexpectedDispatchable { .. }));
    }

    #[test]
    fn downcast_rejects_wrong_type_of_the_right_kind() {
        let d: Arc<dyn Dispatchable> = Arc::new(RemoveUser);
        match downcast::<AddUser>(d, MessageKind::Command).unwrap_err() {
            DispatchError::UnexpectedDispatchable { expected, found } => {
                assert!(expected.ends_with("AddUser"));
                assert_eq!(found, "user.remove");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn default_kind_is_plain_message() {
        assert_eq!(Ping.kind(), MessageKind::Message);
        assert_eq!(MessageKind::Event.to_string(), "event");
    }
}
