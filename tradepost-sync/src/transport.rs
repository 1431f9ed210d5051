//! Transport layer abstraction.
//!
//! The server pushes messages to one client at a time. A transport only has
//! to deliver them reliably and in order; framing and the network are its own
//! business.

use crate::error::{SyncError, SyncResult};
use crate::protocol::{ClientId, SyncMessage};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::debug;

/// Delivers server messages to clients.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// Sends one message to `to`.
    async fn send(&self, to: &ClientId, message: SyncMessage) -> SyncResult<()>;
}

/// In-process transport: one unbounded channel per connected client.
#[derive(Debug, Clone, Default)]
pub struct ChannelTransport {
    clients: Arc<RwLock<HashMap<ClientId, mpsc::UnboundedSender<SyncMessage>>>>,
}

impl ChannelTransport {
    /// Creates a transport with no clients.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects a client and returns its inbox. Reconnecting replaces the
    /// previous inbox.
    pub async fn connect(&self, client: ClientId) -> mpsc::UnboundedReceiver<SyncMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        debug!("Client {} connected", client);
        self.clients.write().await.insert(client, tx);
        rx
    }

    /// Disconnects a client. Its inbox sees the channel close.
    pub async fn disconnect(&self, client: &ClientId) {
        if self.clients.write().await.remove(client).is_some() {
            debug!("Client {} disconnected", client);
        }
    }

    /// Whether `client` is connected.
    pub async fn is_connected(&self, client: &ClientId) -> bool {
        self.clients.read().await.contains_key(client)
    }
}

#[async_trait]
impl SyncTransport for ChannelTransport {
    async fn send(&self, to: &ClientId, message: SyncMessage) -> SyncResult<()> {
        let clients = self.clients.read().await;
        let tx = clients
            .get(to)
            .ok_or_else(|| SyncError::UnknownClient(to.to_string()))?;
        tx.send(message).map_err(|_| SyncError::ChannelClosed)
    }
}

/// A mock transport for testing.
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Mutex, PoisonError};

    /// Records every message instead of delivering it.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingTransport {
        sent: Arc<Mutex<VecDeque<(ClientId, SyncMessage)>>>,
    }

    impl RecordingTransport {
        /// Creates an empty recorder.
        pub fn new() -> Self {
            Self::default()
        }

        /// Removes and returns everything recorded so far.
        pub fn take(&self) -> Vec<(ClientId, SyncMessage)> {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .drain(..)
                .collect()
        }

        /// Number of recorded messages.
        pub fn len(&self) -> usize {
            self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
        }

        /// Whether nothing was recorded.
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl SyncTransport for RecordingTransport {
        async fn send(&self, to: &ClientId, message: SyncMessage) -> SyncResult<()> {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back((to.clone(), message));
            Ok(())
        }
    }
}
