//! Client reconstruction state.
//!
//! While a cycle is in flight the client keeps one [`DatasetAssembly`] per
//! announced dataset. Batches are merged into it by category; only a complete
//! assembly turns into a [`Dataset`].

use crate::codec::CategoryPayload;
use crate::error::{SyncError, SyncResult};
use crate::protocol::HeaderMessage;
use std::collections::{BTreeMap, BTreeSet};
use tradepost_catalog::{Category, Dataset, Item, effective_price, effective_sell_percent};

/// Where the client is in a sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// No cycle in progress; every server message is discarded.
    Idle,
    /// Request sent, nothing received yet.
    AwaitingHeader,
    /// At least one header received.
    ReceivingBatches,
    /// Completion received; the store is published.
    Ready,
}

/// One category being received.
#[derive(Debug, Clone)]
pub struct CategoryAssembly {
    category: Category,
    total_batches: u32,
    received: BTreeSet<u32>,
    items: usize,
}

impl CategoryAssembly {
    fn new(payload: &CategoryPayload) -> Self {
        let base_price = effective_price(payload.base_price, 0);
        let sell_percent = effective_sell_percent(payload.sell_percent, 0);
        Self {
            category: Category::new(
                payload.category_id.clone(),
                payload.display_name.clone(),
                base_price,
                sell_percent,
            ),
            total_batches: payload.total_batches,
            received: BTreeSet::new(),
            items: 0,
        }
    }

    /// Whether every batch of the category has arrived.
    pub fn is_complete(&self) -> bool {
        u32::try_from(self.received.len()).is_ok_and(|n| n == self.total_batches)
    }

    /// Items received so far, as shipped.
    pub fn item_count(&self) -> usize {
        self.items
    }
}

/// One dataset being received.
#[derive(Debug, Clone)]
pub struct DatasetAssembly {
    header: HeaderMessage,
    categories: BTreeMap<String, CategoryAssembly>,
    /// Arrival order of categories; the server sends them in display order.
    order: Vec<String>,
}

impl DatasetAssembly {
    /// Opens an assembly from its header.
    pub fn new(header: HeaderMessage) -> Self {
        Self {
            header,
            categories: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    /// The announcing header.
    pub fn header(&self) -> &HeaderMessage {
        &self.header
    }

    /// Merges one batch.
    ///
    /// Rejects batches whose index is out of range, that repeat an index
    /// already merged, or that disagree with earlier batches of the same
    /// category on the batch total. Nothing is merged on rejection.
    pub fn merge(&mut self, payload: CategoryPayload) -> SyncResult<()> {
        if payload.category_id.is_empty() {
            return Err(SyncError::Protocol("batch without category id".into()));
        }
        if payload.batch_index >= payload.total_batches {
            return Err(SyncError::Protocol(format!(
                "batch {}/{} of {} is out of range",
                payload.batch_index, payload.total_batches, payload.category_id
            )));
        }
        if let Some(existing) = self.categories.get(&payload.category_id) {
            if existing.total_batches != payload.total_batches {
                return Err(SyncError::Protocol(format!(
                    "{} announced {} batches, now {}",
                    payload.category_id, existing.total_batches, payload.total_batches
                )));
            }
            if existing.received.contains(&payload.batch_index) {
                return Err(SyncError::Protocol(format!(
                    "duplicate batch {} of {}",
                    payload.batch_index, payload.category_id
                )));
            }
        }

        if !self.categories.contains_key(&payload.category_id) {
            self.order.push(payload.category_id.clone());
        }
        let assembly = self
            .categories
            .entry(payload.category_id.clone())
            .or_insert_with(|| CategoryAssembly::new(&payload));
        assembly.received.insert(payload.batch_index);
        assembly.items += payload.items.len();

        let category_price = i64::from(assembly.category.base_price);
        let category_sell = i64::from(assembly.category.sell_percent);
        for record in &payload.items {
            let item: Item = record.to_item(category_price, category_sell);
            assembly.category.insert_item(item);
        }
        Ok(())
    }

    /// Categories whose batches have all arrived.
    pub fn complete_categories(&self) -> usize {
        self.categories.values().filter(|c| c.is_complete()).count()
    }

    /// Items received across all categories.
    pub fn received_items(&self) -> usize {
        self.categories.values().map(CategoryAssembly::item_count).sum()
    }

    /// Whether everything the header promised has arrived. A dataset with
    /// no categories is never complete.
    pub fn is_complete(&self) -> bool {
        if self.categories.is_empty() {
            return false;
        }
        let categories_done = self.categories.values().all(CategoryAssembly::is_complete);
        let items_match = u32::try_from(self.received_items())
            .is_ok_and(|n| n == self.header.item_count);
        let count_matches = self.header.category_count.is_none_or(|expected| {
            u32::try_from(self.complete_categories()).is_ok_and(|n| n == expected)
        });
        categories_done && items_match && count_matches
    }

    /// Builds the dataset. Categories keep their arrival order.
    pub fn into_dataset(self) -> Dataset {
        let mut dataset = Dataset::new(
            self.header.dataset_id,
            self.header.display_name,
            self.header.icon,
        );
        let mut categories = self.categories;
        for id in self.order {
            if let Some(assembly) = categories.remove(&id) {
                dataset.push_category(assembly.category);
            }
        }
        dataset
    }
}
