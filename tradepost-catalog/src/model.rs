//! Catalog entities and the rules that turn raw records into them.
//!
//! Price precedence for an item is: its own `BasePrice`, then the value it
//! inherits (category base price, or the declaring item for a synthesized
//! variant), then [`DEFAULT_BUY_PRICE`]. Sell percent follows the same chain
//! ending in [`DEFAULT_SELL_PERCENT`]. Effective values are therefore always
//! at least 1.

use crate::raw::{RawCategory, RawDataset, RawItem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Buy price used when neither the item nor anything it inherits from has one.
pub const DEFAULT_BUY_PRICE: u32 = 100;

/// Sell percent used when neither the item nor anything it inherits from has one.
pub const DEFAULT_SELL_PERCENT: u32 = 50;

/// Icon reference for datasets that do not declare one.
pub const MISSING_ICON: &str = "set:dayz_inventory image:missing";

/// Prefix that marks a dataset identifier.
pub const DATASET_PREFIX: &str = "DS_";

/// Prefix that marks a category identifier.
pub const CATEGORY_PREFIX: &str = "CAT_";

fn positive(value: i64) -> Option<u32> {
    u32::try_from(value).ok().filter(|v| *v > 0)
}

/// Resolves a price against the fallback chain.
pub fn effective_price(own: i64, inherited: i64) -> u32 {
    positive(own)
        .or_else(|| positive(inherited))
        .unwrap_or(DEFAULT_BUY_PRICE)
}

/// Resolves a sell percent against the fallback chain.
pub fn effective_sell_percent(own: i64, inherited: i64) -> u32 {
    positive(own)
        .or_else(|| positive(inherited))
        .unwrap_or(DEFAULT_SELL_PERCENT)
}

/// Display name for an identifier: the identifier minus `prefix`, or the
/// identifier itself when it does not carry the prefix (or is only the prefix).
pub fn strip_display_prefix<'a>(id: &'a str, prefix: &str) -> &'a str {
    id.strip_prefix(prefix)
        .filter(|rest| !rest.is_empty())
        .unwrap_or(id)
}

fn non_empty(names: &[String]) -> Vec<String> {
    names.iter().filter(|n| !n.is_empty()).cloned().collect()
}

/// A tradeable entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub price: u32,
    pub sell_percent: u32,
    pub attachments: Vec<String>,
    pub variants: Vec<String>,
}

impl Item {
    /// Builds an item from its raw entry.
    ///
    /// Returns `None` when the entry is absent; the caller skips it.
    pub fn from_raw(
        name: impl Into<String>,
        raw: Option<&RawItem>,
        inherited_price: i64,
        inherited_sell_percent: i64,
    ) -> Option<Self> {
        let raw = raw?;
        Some(Self {
            name: name.into(),
            price: effective_price(raw.base_price, inherited_price),
            sell_percent: effective_sell_percent(raw.sell_percent, inherited_sell_percent),
            attachments: non_empty(&raw.attachments),
            variants: non_empty(&raw.variants),
        })
    }

    /// An item whose values are already effective (used by sync reconstruction).
    pub fn new(name: impl Into<String>, price: u32, sell_percent: u32) -> Self {
        Self {
            name: name.into(),
            price: price.max(1),
            sell_percent: sell_percent.max(1),
            attachments: Vec::new(),
            variants: Vec::new(),
        }
    }

    /// Sets the attachment list.
    pub fn with_attachments(mut self, attachments: Vec<String>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Sets the variant list.
    pub fn with_variants(mut self, variants: Vec<String>) -> Self {
        self.variants = variants;
        self
    }

    /// A synthesized variant: same price and sell percent, nothing nested.
    fn variant_of(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            price: self.price,
            sell_percent: self.sell_percent,
            attachments: Vec::new(),
            variants: Vec::new(),
        }
    }
}

/// A group of items inside one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub display_name: String,
    pub base_price: u32,
    pub sell_percent: u32,
    pub items: BTreeMap<String, Item>,
}

impl Category {
    /// An empty category with already-effective values.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        base_price: u32,
        sell_percent: u32,
    ) -> Self {
        let id = id.into();
        let display_name = display_name.into();
        let display_name = if display_name.is_empty() {
            strip_display_prefix(&id, CATEGORY_PREFIX).to_string()
        } else {
            display_name
        };
        Self {
            id,
            display_name,
            base_price: base_price.max(1),
            sell_percent: sell_percent.max(1),
            items: BTreeMap::new(),
        }
    }

    /// Builds a category from its raw record.
    ///
    /// The category's own base price and sell percent are authoritative; when
    /// invalid they fall back to the global defaults only. Declared items are
    /// built first, then every variant that is not declared on its own is
    /// synthesized from the item that names it.
    pub fn from_raw(id: impl Into<String>, raw: &RawCategory) -> Self {
        let id = id.into();
        let base_price = effective_price(raw.base_price, 0);
        let sell_percent = effective_sell_percent(raw.sell_percent, 0);
        let mut category = Self::new(id, raw.display_name.clone(), base_price, sell_percent);

        for (name, entry) in &raw.items {
            match Item::from_raw(
                name.clone(),
                entry.as_ref(),
                i64::from(base_price),
                i64::from(sell_percent),
            ) {
                Some(item) => {
                    category.items.insert(name.clone(), item);
                }
                None => debug!("Skipping null item entry {} in {}", name, category.id),
            }
        }

        let mut synthesized: BTreeMap<String, Item> = BTreeMap::new();
        for item in category.items.values() {
            for variant in &item.variants {
                if category.items.contains_key(variant) || synthesized.contains_key(variant) {
                    continue;
                }
                synthesized.insert(variant.clone(), item.variant_of(variant));
            }
        }
        category.items.extend(synthesized);

        category
    }

    /// Inserts or replaces an item.
    pub fn insert_item(&mut self, item: Item) {
        self.items.insert(item.name.clone(), item);
    }

    /// Looks up an item by exact name.
    pub fn item(&self, name: &str) -> Option<&Item> {
        self.items.get(name)
    }

    /// Number of items, synthesized variants included.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

/// Top-level catalog unit, one per source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub display_name: String,
    pub version: i64,
    pub icon: String,
    pub categories: BTreeMap<String, Category>,
    /// Display order; always a permutation of the keys of `categories`.
    pub category_order: Vec<String>,
}

impl Dataset {
    /// An empty dataset shell.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        let id = id.into();
        let display_name = display_name.into();
        let display_name = if display_name.is_empty() {
            strip_display_prefix(&id, DATASET_PREFIX).to_string()
        } else {
            display_name
        };
        let icon = icon.into();
        Self {
            id,
            display_name,
            version: 0,
            icon: if icon.is_empty() {
                MISSING_ICON.to_string()
            } else {
                icon
            },
            categories: BTreeMap::new(),
            category_order: Vec::new(),
        }
    }

    /// Builds a dataset from a parsed source file.
    ///
    /// `CategoryOrder` is reconciled against the built categories: unknown or
    /// repeated identifiers are dropped, and categories missing from the
    /// explicit order are appended in mapping order.
    pub fn from_raw(raw: &RawDataset) -> Self {
        let mut dataset = Self::new(
            raw.dataset_name.clone(),
            raw.display_name.clone(),
            raw.icon.clone(),
        );
        dataset.version = raw.version;

        for (category_id, entry) in &raw.categories {
            match entry {
                Some(raw_category) => {
                    dataset.categories.insert(
                        category_id.clone(),
                        Category::from_raw(category_id.clone(), raw_category),
                    );
                }
                None => debug!("Skipping null category {} in {}", category_id, dataset.id),
            }
        }

        for ordered in &raw.category_order {
            if ordered.is_empty() {
                continue;
            }
            if !dataset.categories.contains_key(ordered) {
                warn!(
                    "CategoryOrder references unknown category {} in {}",
                    ordered, dataset.id
                );
                continue;
            }
            if !dataset.category_order.contains(ordered) {
                dataset.category_order.push(ordered.clone());
            }
        }
        for category_id in dataset.categories.keys() {
            if !dataset.category_order.contains(category_id) {
                dataset.category_order.push(category_id.clone());
            }
        }

        dataset
    }

    /// Appends a category, keeping `category_order` in step with the mapping.
    pub fn push_category(&mut self, category: Category) {
        if !self.category_order.contains(&category.id) {
            self.category_order.push(category.id.clone());
        }
        self.categories.insert(category.id.clone(), category);
    }

    /// Looks up a category by identifier.
    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.get(id)
    }

    /// Categories in display order.
    pub fn ordered_categories(&self) -> impl Iterator<Item = &Category> {
        self.category_order
            .iter()
            .filter_map(|id| self.categories.get(id))
    }

    /// Total number of items across all categories.
    pub fn item_count(&self) -> usize {
        self.categories.values().map(Category::item_count).sum()
    }
}
