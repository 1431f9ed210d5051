//! Server side: turns the catalog into the message sequence of one cycle.

use crate::codec::split_category;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::protocol::{
    CategoryBatchMessage, ClientId, CompletionMessage, HeaderMessage, RequestMessage, Role,
    SyncMessage,
};
use crate::transport::SyncTransport;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tradepost_catalog::CatalogStore;

/// Everything the server sends for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReply {
    /// Recipient.
    pub client: ClientId,
    /// Headers, batches and the completion, in send order.
    pub messages: Vec<SyncMessage>,
    /// Categories shipped; equals the completion's count.
    pub category_count: u32,
    /// Items left out because they do not fit in a payload.
    pub omitted: Vec<String>,
}

/// Answers sync requests from a read-only catalog.
///
/// Holds no per-client state, so one server can answer any number of clients
/// concurrently.
#[derive(Debug, Clone)]
pub struct SyncServer {
    store: Arc<CatalogStore>,
    config: SyncConfig,
}

impl SyncServer {
    /// Creates a server over `store`.
    pub fn new(store: Arc<CatalogStore>, config: SyncConfig) -> Self {
        Self { store, config }
    }

    /// The catalog being served.
    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// The configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Validates a request and produces the full reply.
    ///
    /// Datasets go out in registration order, each header followed by its
    /// batches; categories go out in display order. The header counts only
    /// what is actually shipped.
    pub fn handle_request(&self, role: Role, request: &RequestMessage) -> SyncResult<SyncReply> {
        if role != Role::Server {
            warn!("Ignoring sync request outside the server role");
            return Err(SyncError::NotServerRole);
        }
        let client = match &request.requester {
            Some(client) if !client.is_empty() => client.clone(),
            _ => {
                warn!("Ignoring sync request without requester");
                return Err(SyncError::MissingRequester);
            }
        };

        let mut messages = Vec::new();
        let mut category_count: u32 = 0;
        let mut omitted = Vec::new();

        for dataset in self.store.datasets() {
            let mut batches = Vec::new();
            let mut items: usize = 0;
            let mut categories: u32 = 0;

            for category in dataset.ordered_categories() {
                let split = split_category(&dataset.id, category, self.config.payload_ceiling)?;
                omitted.extend(split.omitted);
                if split.payloads.is_empty() {
                    continue;
                }
                items += split.item_count;
                categories += 1;
                batches.extend(
                    split
                        .payloads
                        .into_iter()
                        .map(|p| SyncMessage::CategoryBatch(CategoryBatchMessage::new(p))),
                );
            }

            if categories == 0 {
                warn!("Dataset {} has no categories to ship; skipped", dataset.id);
                continue;
            }
            debug!(
                "Dataset {}: {} categories, {} items, {} batches",
                dataset.id,
                categories,
                items,
                batches.len()
            );
            let header = HeaderMessage::new(
                dataset.id.clone(),
                dataset.display_name.clone(),
                u32::try_from(items).unwrap_or(u32::MAX),
                dataset.icon.clone(),
            )
            .with_category_count(categories);
            messages.push(SyncMessage::Header(header));
            messages.extend(batches);
            category_count = category_count.saturating_add(categories);
        }

        let warning = self.completion_warning(&omitted);
        messages.push(SyncMessage::Completion(CompletionMessage::new(
            category_count,
            warning,
        )));

        info!(
            "Prepared catalog for {}: {} datasets, {} categories, {} messages",
            client,
            self.store.dataset_count(),
            category_count,
            messages.len()
        );
        Ok(SyncReply {
            client,
            messages,
            category_count,
            omitted,
        })
    }

    /// Handles a request and pushes the reply through `transport`. Returns
    /// the number of categories shipped.
    pub async fn serve<T: SyncTransport + ?Sized>(
        &self,
        role: Role,
        request: &RequestMessage,
        transport: &T,
    ) -> SyncResult<u32> {
        let reply = self.handle_request(role, request)?;
        for message in reply.messages {
            transport.send(&reply.client, message).await?;
        }
        Ok(reply.category_count)
    }

    fn completion_warning(&self, omitted: &[String]) -> String {
        let mut warning = self.config.warn_text.clone();
        if !omitted.is_empty() {
            if !warning.is_empty() {
                warning.push('\n');
            }
            warning.push_str(&format!(
                "{} item(s) omitted: larger than the {} byte payload limit",
                omitted.len(),
                self.config.payload_ceiling
            ));
        }
        warning
    }
}
