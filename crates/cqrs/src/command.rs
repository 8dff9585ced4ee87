use std::fmt;
use std::future::Future;
use std::sync::Arc;

use cqrs_eda_core::{DispatchError, Dispatchable, Scope};
use cqrs_eda_events::Event;

/// A request to change state.
///
/// Implementors report [`MessageKind::Command`](cqrs_eda_core::MessageKind::Command)
/// from [`Dispatchable::kind`] so bus adapters accept them.
pub trait Command: Dispatchable + fmt::Debug {}

/// Domain events produced by a successful command.
pub type Events = Vec<Arc<dyn Event>>;

#[async_trait::async_trait]
pub trait CommandHandler<C>: Send + Sync {
    async fn handle(&self, scope: &Scope, command: Arc<C>) -> Result<Events, DispatchError>;
}

/// [`CommandHandler`] backed by an async closure; see [`command_handler_fn`].
#[derive(Clone)]
pub struct CommandHandlerFn<F> {
    f: F,
}

/// Turn an async closure into a [`CommandHandler`].
///
/// ```ignore
/// let handler = command_handler_fn(|_scope, cmd: Arc<AddUser>| async move {
///     info!(user = %cmd.user_name, "added user");
///     Ok(Events::new())
/// });
/// ```
pub fn command_handler_fn<C, F, Fut>(f: F) -> CommandHandlerFn<F>
where
    C: Command,
    F: Fn(Scope, Arc<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Events, DispatchError>> + Send + 'static,
{
    CommandHandlerFn { f }
}

#[async_trait::async_trait]
impl<C, F, Fut> CommandHandler<C> for CommandHandlerFn<F>
where
    C: Command,
    F: Fn(Scope, Arc<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Events, DispatchError>> + Send + 'static,
{
    async fn handle(&self, scope: &Scope, command: Arc<C>) -> Result<Events, DispatchError> {
        (self.f)(scope.clone(), command).await
    }
}
