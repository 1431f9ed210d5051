//! In-memory registry of datasets.
//!
//! The store is built once (server: from files, client: from a completed sync)
//! and read afterwards. Registration keeps an item index so that item and
//! membership lookups do not rescan every category. When the same item name
//! exists in several categories, the first one in dataset registration order
//! and category mapping order wins, exactly as a linear scan would find it.

use crate::model::{Category, Dataset, Item};
use rand::Rng;
use rand::seq::IteratorRandom;
use std::collections::HashMap;
use tracing::{debug, info};

/// Where an item lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemLocation {
    pub dataset_id: String,
    pub category_id: String,
}

/// Authoritative catalog index, keyed by dataset identifier.
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    datasets: HashMap<String, Dataset>,
    /// Registration order.
    order: Vec<String>,
    item_index: HashMap<String, ItemLocation>,
    /// Lowercased item name -> first location.
    folded_index: HashMap<String, ItemLocation>,
}

impl CatalogStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a dataset. Datasets without an identifier are ignored.
    ///
    /// A re-registered dataset keeps its original position in
    /// [`dataset_ids`](Self::dataset_ids).
    pub fn register_dataset(&mut self, dataset: Dataset) {
        if dataset.id.is_empty() {
            debug!("Ignoring dataset without identifier");
            return;
        }
        if !self.datasets.contains_key(&dataset.id) {
            self.order.push(dataset.id.clone());
        }
        info!(
            "Registered dataset {} ({} categories, {} items)",
            dataset.id,
            dataset.categories.len(),
            dataset.item_count()
        );
        self.datasets.insert(dataset.id.clone(), dataset);
        self.rebuild_index();
    }

    /// Drops every dataset.
    pub fn clear(&mut self) {
        self.datasets.clear();
        self.order.clear();
        self.item_index.clear();
        self.folded_index.clear();
    }

    /// Number of registered datasets.
    pub fn dataset_count(&self) -> usize {
        self.order.len()
    }

    /// Whether no dataset is registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Looks up a dataset by identifier.
    pub fn dataset(&self, id: &str) -> Option<&Dataset> {
        self.datasets.get(id)
    }

    /// Dataset identifiers in registration order.
    pub fn dataset_ids(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Datasets in registration order.
    pub fn datasets(&self) -> impl Iterator<Item = &Dataset> {
        self.order.iter().filter_map(|id| self.datasets.get(id))
    }

    /// Dataset display names in registration order.
    pub fn dataset_display_names(&self) -> Vec<&str> {
        self.datasets().map(|d| d.display_name.as_str()).collect()
    }

    /// Looks up a category inside a known dataset.
    pub fn category(&self, dataset_id: &str, category_id: &str) -> Option<&Category> {
        self.dataset(dataset_id)?.category(category_id)
    }

    /// Category identifiers of a dataset in display order.
    pub fn category_ids(&self, dataset_id: &str) -> Vec<&str> {
        self.dataset(dataset_id)
            .map(|d| d.ordered_categories().map(|c| c.id.as_str()).collect())
            .unwrap_or_default()
    }

    /// Items of a category in mapping order.
    pub fn items_in_category(&self, dataset_id: &str, category_id: &str) -> Vec<&Item> {
        self.category(dataset_id, category_id)
            .map(|c| c.items.values().collect())
            .unwrap_or_default()
    }

    /// Items of the first category named `category_id` in any dataset.
    pub fn items_in(&self, category_id: &str) -> Vec<&Item> {
        self.find_category(category_id)
            .map(|c| c.items.values().collect())
            .unwrap_or_default()
    }

    /// Every item in the catalog, dataset by dataset.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.datasets()
            .flat_map(|d| d.categories.values())
            .flat_map(|c| c.items.values())
    }

    /// Finds a category in any dataset; first match in registration order.
    pub fn find_category(&self, category_id: &str) -> Option<&Category> {
        self.datasets().find_map(|d| d.category(category_id))
    }

    /// Finds an item by exact name.
    pub fn item(&self, name: &str) -> Option<&Item> {
        self.item_at(self.item_index.get(name)?, name)
    }

    /// Finds an item ignoring case. An exact match is tried first.
    pub fn item_case_insensitive(&self, name: &str) -> Option<&Item> {
        if let Some(item) = self.item(name) {
            return Some(item);
        }
        let location = self.folded_index.get(&name.to_lowercase())?;
        self.category(&location.dataset_id, &location.category_id)?
            .items
            .values()
            .find(|item| item.name.to_lowercase() == name.to_lowercase())
    }

    /// Price of an item, or `None` when the item is unknown.
    pub fn price(&self, name: &str) -> Option<u32> {
        self.item(name).map(|item| item.price)
    }

    /// Dataset and category holding an item (exact name).
    pub fn locate_item(&self, name: &str) -> Option<&ItemLocation> {
        self.item_index.get(name)
    }

    /// Category holding an item (exact name).
    pub fn category_of(&self, name: &str) -> Option<&Category> {
        let location = self.locate_item(name)?;
        self.category(&location.dataset_id, &location.category_id)
    }

    /// Dataset holding an item (exact name).
    pub fn dataset_of(&self, name: &str) -> Option<&Dataset> {
        self.dataset(&self.locate_item(name)?.dataset_id)
    }

    /// Picks up to `count` distinct items across the whole catalog.
    pub fn random_items<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<&Item> {
        self.items().choose_multiple(rng, count)
    }

    fn item_at(&self, location: &ItemLocation, name: &str) -> Option<&Item> {
        self.category(&location.dataset_id, &location.category_id)?
            .item(name)
    }

    fn rebuild_index(&mut self) {
        self.item_index.clear();
        self.folded_index.clear();
        for dataset_id in &self.order {
            let Some(dataset) = self.datasets.get(dataset_id) else {
                continue;
            };
            for category in dataset.categories.values() {
                for name in category.items.keys() {
                    let location = ItemLocation {
                        dataset_id: dataset.id.clone(),
                        category_id: category.id.clone(),
                    };
                    self.folded_index
                        .entry(name.to_lowercase())
                        .or_insert_with(|| location.clone());
                    self.item_index.entry(name.clone()).or_insert(location);
                }
            }
        }
    }
}
