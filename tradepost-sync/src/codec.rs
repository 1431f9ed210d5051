//! Category payload encoding and splitting.
//!
//! A `CategoryBatch` carries one [`CategoryPayload`] encoded as compact JSON.
//! Every encoded payload must be non-empty and at most the configured ceiling
//! in bytes. Categories too large for one payload are split across several
//! batches that share the category fields and differ in `batch_index` and
//! their slice of items.

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use tracing::warn;
use tradepost_catalog::{Category, Item, effective_price, effective_sell_percent};

/// One item as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemRecord {
    pub name: String,
    pub price: i64,
    pub sell_percent: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
}

impl From<&Item> for ItemRecord {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            price: i64::from(item.price),
            sell_percent: i64::from(item.sell_percent),
            variants: item.variants.clone(),
            attachments: item.attachments.clone(),
        }
    }
}

impl ItemRecord {
    /// Rebuilds the item. Non-positive values fall back to the category's,
    /// then to the catalog defaults.
    pub fn to_item(&self, category_price: i64, category_sell_percent: i64) -> Item {
        let non_empty = |names: &[String]| -> Vec<String> {
            names.iter().filter(|n| !n.is_empty()).cloned().collect()
        };
        Item::new(
            self.name.clone(),
            effective_price(self.price, category_price),
            effective_sell_percent(self.sell_percent, category_sell_percent),
        )
        .with_attachments(non_empty(&self.attachments))
        .with_variants(non_empty(&self.variants))
    }
}

/// One category chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CategoryPayload {
    #[serde(rename = "DatasetID")]
    pub dataset_id: String,
    #[serde(rename = "CategoryID")]
    pub category_id: String,
    pub display_name: String,
    pub base_price: i64,
    pub sell_percent: i64,
    pub batch_index: u32,
    pub total_batches: u32,
    #[serde(default)]
    pub items: Vec<ItemRecord>,
}

impl CategoryPayload {
    /// A payload with the category fields filled and no items.
    pub fn for_category(dataset_id: impl Into<String>, category: &Category) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            category_id: category.id.clone(),
            display_name: category.display_name.clone(),
            base_price: i64::from(category.base_price),
            sell_percent: i64::from(category.sell_percent),
            batch_index: 0,
            total_batches: 1,
            items: Vec::new(),
        }
    }

    /// Encodes as compact JSON.
    pub fn encode(&self) -> SyncResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Checks the size bounds, then decodes.
    pub fn decode(payload: &str, ceiling: usize) -> SyncResult<Self> {
        check_payload_size(payload, ceiling)?;
        Ok(serde_json::from_str(payload)?)
    }
}

/// Rejects empty payloads and payloads longer than `ceiling` bytes.
pub fn check_payload_size(payload: &str, ceiling: usize) -> SyncResult<()> {
    if payload.is_empty() {
        return Err(SyncError::EmptyPayload);
    }
    if payload.len() > ceiling {
        return Err(SyncError::PayloadTooLarge {
            len: payload.len(),
            ceiling,
        });
    }
    Ok(())
}

/// A category cut into payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitCategory {
    /// Encoded payloads in batch order. Empty when even an item-less chunk
    /// does not fit.
    pub payloads: Vec<String>,
    /// Items placed in some payload.
    pub item_count: usize,
    /// Items that do not fit in a payload on their own.
    pub omitted: Vec<String>,
}

/// Splits a category into payloads of at most `ceiling` bytes.
///
/// Items are packed greedily in mapping order. Chunks are sized with the
/// widest possible batch indices, so the final encoding is never longer than
/// what was measured. An empty category yields one item-less payload.
pub fn split_category(
    dataset_id: &str,
    category: &Category,
    ceiling: usize,
) -> SyncResult<SplitCategory> {
    let mut probe = CategoryPayload::for_category(dataset_id, category);
    probe.batch_index = u32::MAX;
    probe.total_batches = u32::MAX;

    let mut split = SplitCategory::default();
    if probe.encode()?.len() > ceiling {
        warn!(
            "Category {} of {} does not fit in {} bytes even without items",
            category.id, dataset_id, ceiling
        );
        split.omitted = category.items.keys().cloned().collect();
        return Ok(split);
    }

    let mut chunks: Vec<Vec<ItemRecord>> = Vec::new();
    for item in category.items.values() {
        probe.items.push(ItemRecord::from(item));
        if probe.encode()?.len() <= ceiling {
            continue;
        }
        let Some(record) = probe.items.pop() else {
            continue;
        };
        if !probe.items.is_empty() {
            chunks.push(std::mem::take(&mut probe.items));
            probe.items.push(record);
            if probe.encode()?.len() <= ceiling {
                continue;
            }
            probe.items.clear();
        }
        warn!(
            "Item {} in {} is too large for a {} byte payload; omitted",
            item.name, category.id, ceiling
        );
        split.omitted.push(item.name.clone());
    }
    if !probe.items.is_empty() || chunks.is_empty() {
        chunks.push(probe.items);
    }

    let total_batches = u32::try_from(chunks.len()).unwrap_or(u32::MAX);
    for (index, items) in chunks.into_iter().enumerate() {
        split.item_count += items.len();
        let payload = CategoryPayload {
            batch_index: u32::try_from(index).unwrap_or(u32::MAX),
            total_batches,
            items,
            ..CategoryPayload::for_category(dataset_id, category)
        };
        split.payloads.push(payload.encode()?);
    }
    Ok(split)
}
