//! Catalog model and authoritative store for the Tradepost economy.
//!
//! The catalog is a three-level hierarchy:
//! - **Dataset**: one per source file, e.g. `DS_Firearms`
//! - **Category**: a group of items sharing a base price, e.g. `CAT_Pistols`
//! - **Item**: a tradeable entry with price, sell percent, attachments and variants
//!
//! # Architecture
//!
//! - **Raw records** ([`RawDataset`], [`RawCategory`], [`RawItem`]) mirror the
//!   source files field for field and accept any value, valid or not.
//! - **Model** ([`Dataset`], [`Category`], [`Item`]) is what the rest of the
//!   system reads. Building the model applies the price/sell-percent fallback
//!   chain and synthesizes undeclared variants, so every effective value is
//!   positive.
//! - **Store** ([`CatalogStore`]) indexes registered datasets and answers
//!   lookups. The server fills it from files; the client fills it only
//!   through the sync protocol.
//!
//! # Example
//!
//! ```
//! use tradepost_catalog::{CatalogStore, Dataset, RawCategory, RawDataset, RawItem};
//!
//! let mut raw = RawDataset::named("DS_Firearms");
//! let mut pistols = RawCategory::priced(100);
//! pistols.items.insert("Glock19".into(), Some(RawItem::default()));
//! raw.categories.insert("CAT_Pistols".into(), Some(pistols));
//!
//! let mut store = CatalogStore::new();
//! store.register_dataset(Dataset::from_raw(&raw));
//! assert_eq!(store.price("Glock19"), Some(100));
//! ```

mod error;
pub mod loader;
mod model;
mod raw;
mod store;

pub use error::{CatalogError, CatalogResult};
pub use loader::{load_dataset_dir, load_raw_dataset};
pub use model::{
    CATEGORY_PREFIX, Category, DATASET_PREFIX, DEFAULT_BUY_PRICE, DEFAULT_SELL_PERCENT, Dataset,
    Item, MISSING_ICON, effective_price, effective_sell_percent, strip_display_prefix,
};
pub use raw::{RawCategory, RawDataset, RawItem};
pub use store::{CatalogStore, ItemLocation};
