//! Dispatch-and-wait seam shared by both buses.

use std::sync::Arc;

use cqrs_eda_core::{Dispatchable, Scope};

use crate::bus::Bus;
use crate::concurrent::ConcurrentBus;
use crate::handler::Response;

/// Anything that routes a dispatchable by name and yields one response.
///
/// Middleware that forwards messages (event publication, for instance) holds an
/// `Arc<dyn Dispatcher>` so it works on either bus.
#[async_trait::async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, scope: &Scope, dispatchable: Arc<dyn Dispatchable>) -> Response;
}

#[async_trait::async_trait]
impl Dispatcher for Bus {
    async fn dispatch(&self, scope: &Scope, dispatchable: Arc<dyn Dispatchable>) -> Response {
        Bus::dispatch(self, scope, dispatchable).await
    }
}

#[async_trait::async_trait]
impl Dispatcher for ConcurrentBus {
    async fn dispatch(&self, scope: &Scope, dispatchable: Arc<dyn Dispatchable>) -> Response {
        ConcurrentBus::dispatch(self, scope, dispatchable).await
    }
}
