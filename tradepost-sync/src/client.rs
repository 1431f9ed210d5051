//! Client side: consumes server messages and rebuilds the catalog.
//!
//! The client is a pure state machine; [`SyncClient::receive_until_ready`] is
//! the only part that waits on I/O.

use crate::codec::CategoryPayload;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::protocol::{
    CategoryBatchMessage, ClientId, CompletionMessage, HeaderMessage, RequestMessage, SyncMessage,
};
use crate::state::{ClientState, DatasetAssembly};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};
use tradepost_catalog::CatalogStore;

/// Catalog consumer.
#[derive(Debug)]
pub struct SyncClient {
    config: SyncConfig,
    state: ClientState,
    /// In-flight datasets by identifier.
    pending: HashMap<String, DatasetAssembly>,
    /// Header arrival order.
    announced: Vec<String>,
    store: CatalogStore,
    warning: String,
    last_progress: Instant,
}

impl SyncClient {
    /// Creates an idle client with an empty store.
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            state: ClientState::Idle,
            pending: HashMap::new(),
            announced: Vec::new(),
            store: CatalogStore::new(),
            warning: String::new(),
            last_progress: Instant::now(),
        }
    }

    /// Current state.
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Whether a completed catalog is published.
    pub fn is_ready(&self) -> bool {
        self.state == ClientState::Ready
    }

    /// The last published catalog. Empty until the first completion.
    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// Warning text of the last completion.
    pub fn warning(&self) -> &str {
        &self.warning
    }

    /// Datasets in flight.
    pub fn pending_datasets(&self) -> usize {
        self.pending.len()
    }

    /// Starts a new cycle and returns the request to send.
    ///
    /// Any in-flight reconstruction is dropped. The published store stays
    /// until the new cycle completes.
    pub fn begin_request(&mut self, client: impl Into<ClientId>) -> SyncMessage {
        self.reset_cycle();
        self.state = ClientState::AwaitingHeader;
        self.last_progress = Instant::now();
        debug!("Sync requested");
        SyncMessage::Request(RequestMessage::new(client))
    }

    /// Applies one message from the server.
    ///
    /// An error means the message was logged and discarded; the state did
    /// not change.
    pub fn handle_message(&mut self, message: SyncMessage) -> SyncResult<()> {
        let kind = message.kind();
        let result = match message {
            SyncMessage::Header(header) => self.on_header(header),
            SyncMessage::CategoryBatch(batch) => self.on_batch(batch),
            SyncMessage::Completion(completion) => self.on_completion(completion),
            SyncMessage::Request(_) => {
                Err(SyncError::Protocol("clients do not serve requests".into()))
            }
        };
        if let Err(e) = &result {
            warn!("Discarding {} in state {:?}: {}", kind, self.state, e);
        }
        result
    }

    /// Decodes and applies one JSON-encoded message from the server.
    ///
    /// A message that fails to decode is logged and dropped like any other
    /// rejected message.
    pub fn handle_encoded(&mut self, json: &str) -> SyncResult<()> {
        let message = SyncMessage::from_json(json).map_err(|e| {
            warn!("Dropping undecodable message in state {:?}: {}", self.state, e);
            SyncError::Decode(e)
        })?;
        self.handle_message(message)
    }

    /// Drops an in-flight cycle that has made no progress for the sync
    /// timeout. Returns whether the client expired. The published store is
    /// kept.
    pub fn expire_if_stalled(&mut self, now: Instant) -> bool {
        if !self.in_flight() {
            return false;
        }
        if now.saturating_duration_since(self.last_progress) < self.config.sync_timeout {
            return false;
        }
        warn!(
            "Sync stalled for {:?} with {} datasets pending; back to idle",
            self.config.sync_timeout,
            self.pending.len()
        );
        self.reset_cycle();
        self.state = ClientState::Idle;
        true
    }

    /// Forgets everything, published store included.
    pub fn disconnect(&mut self) {
        self.reset_cycle();
        self.store.clear();
        self.warning.clear();
        self.state = ClientState::Idle;
        info!("Sync client disconnected");
    }

    /// Applies messages from `inbox` until the cycle completes.
    ///
    /// Fails with [`SyncError::Timeout`] after the sync timeout passes
    /// without progress (the client is then idle), and with
    /// [`SyncError::ChannelClosed`] if the inbox closes first.
    pub async fn receive_until_ready(
        &mut self,
        inbox: &mut mpsc::UnboundedReceiver<SyncMessage>,
    ) -> SyncResult<()> {
        loop {
            match self.state {
                ClientState::Ready => return Ok(()),
                ClientState::Idle => {
                    return Err(SyncError::Protocol("no sync in progress".into()));
                }
                ClientState::AwaitingHeader | ClientState::ReceivingBatches => {}
            }

            let deadline = self.last_progress + self.config.sync_timeout;
            match timeout_at(deadline, inbox.recv()).await {
                Ok(Some(message)) => {
                    // Rejections are logged by handle_message.
                    let _ = self.handle_message(message);
                }
                Ok(None) => return Err(SyncError::ChannelClosed),
                Err(_) => {
                    self.expire_if_stalled(Instant::now());
                    return Err(SyncError::Timeout);
                }
            }
        }
    }

    fn in_flight(&self) -> bool {
        matches!(
            self.state,
            ClientState::AwaitingHeader | ClientState::ReceivingBatches
        )
    }

    fn check_in_flight(&self) -> SyncResult<()> {
        match self.state {
            ClientState::Idle => Err(SyncError::Protocol("no sync in progress".into())),
            ClientState::Ready => Err(SyncError::Protocol("cycle already complete".into())),
            ClientState::AwaitingHeader | ClientState::ReceivingBatches => Ok(()),
        }
    }

    fn reset_cycle(&mut self) {
        self.pending.clear();
        self.announced.clear();
    }

    fn on_header(&mut self, header: HeaderMessage) -> SyncResult<()> {
        self.check_in_flight()?;
        if header.dataset_id.is_empty() {
            return Err(SyncError::Protocol("header without dataset id".into()));
        }

        let id = header.dataset_id.clone();
        debug!(
            "Header {}: {} items, {:?} categories",
            id, header.item_count, header.category_count
        );
        if self.pending.insert(id.clone(), DatasetAssembly::new(header)).is_some() {
            warn!("Dataset {} announced twice; restarting it", id);
        } else {
            self.announced.push(id);
        }
        self.state = ClientState::ReceivingBatches;
        self.last_progress = Instant::now();
        Ok(())
    }

    fn on_batch(&mut self, batch: CategoryBatchMessage) -> SyncResult<()> {
        self.check_in_flight()?;
        let payload = CategoryPayload::decode(&batch.payload, self.config.payload_ceiling)?;
        let assembly = self.pending.get_mut(&payload.dataset_id).ok_or_else(|| {
            SyncError::Protocol(format!(
                "batch for unannounced dataset {}",
                payload.dataset_id
            ))
        })?;

        debug!(
            "Batch {} of {} for {} in {} ({} items)",
            payload.batch_index,
            payload.total_batches,
            payload.category_id,
            payload.dataset_id,
            payload.items.len()
        );
        assembly.merge(payload)?;
        self.last_progress = Instant::now();
        Ok(())
    }

    fn on_completion(&mut self, completion: CompletionMessage) -> SyncResult<()> {
        self.check_in_flight()?;

        let mut store = CatalogStore::new();
        let mut received_categories: usize = 0;
        for id in std::mem::take(&mut self.announced) {
            let Some(assembly) = self.pending.remove(&id) else {
                continue;
            };
            if !assembly.is_complete() {
                warn!(
                    "Dataset {} incomplete: {}/{} items, {} complete categories; not published",
                    id,
                    assembly.received_items(),
                    assembly.header().item_count,
                    assembly.complete_categories()
                );
                continue;
            }
            received_categories += assembly.complete_categories();
            store.register_dataset(assembly.into_dataset());
        }
        self.pending.clear();

        if usize::try_from(completion.category_count).is_ok_and(|n| n != received_categories) {
            warn!(
                "Server announced {} categories, {} received complete",
                completion.category_count, received_categories
            );
        }
        if !completion.warning.is_empty() {
            warn!("Server notice: {}", completion.warning);
        }

        info!(
            "Catalog sync complete: {} datasets, {} categories",
            store.dataset_count(),
            received_categories
        );
        self.store = store;
        self.warning = completion.warning;
        self.state = ClientState::Ready;
        self.last_progress = Instant::now();
        Ok(())
    }
}

impl Default for SyncClient {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}
