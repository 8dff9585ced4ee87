//! Bus adapters: expose typed command and query handlers as bus [`Handler`]s.

use std::sync::Arc;

use cqrs_eda_bus::{Handler, Reply, Response, handler_fn};
use cqrs_eda_core::{Dispatchable, MessageKind, Scope, downcast};

use crate::command::{Command, CommandHandler};
use crate::query::{Query, QueryHandler};

/// Bus handler running `handler` for dispatched `C` commands.
///
/// The reply is the handler's [`Events`](crate::Events). Any other
/// dispatchable fails with `UnexpectedDispatchable`.
pub fn command_handler<C: Command>(handler: Arc<dyn CommandHandler<C>>) -> Handler {
    handler_fn(move |scope: Scope, dispatchable: Arc<dyn Dispatchable>| {
        handle_command(Arc::clone(&handler), scope, dispatchable)
    })
}

/// Bus handler running `handler` for dispatched `Q` queries; the reply is the `R` result.
pub fn query_handler<Q, R>(handler: Arc<dyn QueryHandler<Q, R>>) -> Handler
where
    Q: Query,
    R: Send + 'static,
{
    handler_fn(move |scope: Scope, dispatchable: Arc<dyn Dispatchable>| {
        handle_query(Arc::clone(&handler), scope, dispatchable)
    })
}

async fn handle_command<C: Command>(
    handler: Arc<dyn CommandHandler<C>>,
    scope: Scope,
    dispatchable: Arc<dyn Dispatchable>,
) -> Response {
    let command = downcast::<C>(dispatchable, MessageKind::Command)?;
    let events = handler.handle(&scope, command).await?;
    Ok(Box::new(events) as Reply)
}

async fn handle_query<Q, R>(
    handler: Arc<dyn QueryHandler<Q, R>>,
    scope: Scope,
    dispatchable: Arc<dyn Dispatchable>,
) -> Response
where
    Q: Query,
    R: Send + 'static,
{
    let query = downcast::<Q>(dispatchable, MessageKind::Query)?;
    let result = handler.handle(&scope, query).await?;
    Ok(Box::new(result) as Reply)
}
