//! A command routed through the synchronous bus to a typed handler.

use std::sync::Arc;

use cqrs_eda_bus::{Bus, Dispatchable, MessageKind, Scope};
use cqrs_eda_core::{AggregateId, DispatchError};
use cqrs_eda_cqrs::{Command, CommandHandler, ErrorLogging, Events, Pipeline, command_handler};

const ADD_USER: &str = "add_user";

#[derive(Debug)]
struct AddUserCommand {
    id: AggregateId,
    user_name: String,
}

impl Dispatchable for AddUserCommand {
    fn name(&self) -> &str {
        ADD_USER
    }

    fn kind(&self) -> MessageKind {
        MessageKind::Command
    }
}

impl Command for AddUserCommand {}

struct AddUserCommandHandler;

#[async_trait::async_trait]
impl CommandHandler<AddUserCommand> for AddUserCommandHandler {
    async fn handle(
        &self,
        _scope: &Scope,
        cmd: Arc<AddUserCommand>,
    ) -> Result<Events, DispatchError> {
        tracing::info!(user_name = %cmd.user_name, id = %cmd.id, "added user");
        Ok(Events::new())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cqrs_eda_observability::init();

    let handler = Pipeline::<dyn CommandHandler<AddUserCommand>>::new()
        .with(ErrorLogging)
        .build(Arc::new(AddUserCommandHandler));

    let mut bus = Bus::new();
    bus.register(ADD_USER, command_handler(handler));

    let cmd = AddUserCommand {
        id: AggregateId::new(),
        user_name: "Bond, James Bond".to_string(),
    };
    bus.dispatch(&Scope::new(), Arc::new(cmd)).await?;

    Ok(())
}
