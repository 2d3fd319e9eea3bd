//! Transport seams

use async_trait::async_trait;
use drover_core::ActionError;
use std::fmt::Debug;
use std::sync::Arc;

use crate::session::Session;

/// The persistent connection of one session
///
/// The transport itself lives outside this crate; the scheduler only needs to
/// re-establish it after a disconnect.
#[async_trait]
pub trait Connection: Send + Sync + Debug {
    /// Re-establish the connection; a `Disconnected` error asks for another attempt
    async fn reconnect(&self) -> Result<(), ActionError>;
}

/// Opens the connection for a new session
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, session: &Arc<Session>) -> Result<Arc<dyn Connection>, ActionError>;
}

/// Connection for scripts that never talk to a persistent transport
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineConnection;

#[async_trait]
impl Connection for OfflineConnection {
    async fn reconnect(&self) -> Result<(), ActionError> {
        Ok(())
    }
}

#[async_trait]
impl Connector for OfflineConnection {
    async fn connect(&self, _session: &Arc<Session>) -> Result<Arc<dyn Connection>, ActionError> {
        Ok(Arc::new(OfflineConnection))
    }
}
