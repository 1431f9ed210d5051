//! Override sets and trade mode resolution for Tradepost.
//!
//! A trader is configured with an ordered list of override sets ("setups").
//! Each set maps keys to a [`Mode`]; a key names a dataset (`DS_...`), a
//! category (`CAT_...`) or a single item. [`SetupResolver`] answers "what may
//! players do with this item at this trader?" by combining the sets with the
//! catalog, where item keys beat category keys and category keys beat
//! dataset keys.
//!
//! # Example
//!
//! ```
//! use tradepost_catalog::CatalogStore;
//! use tradepost_setup::{KeyTier, Mode, OverrideSet, SetupResolver};
//!
//! let resolver = SetupResolver::new(Vec::new());
//! resolver.register_inline("Trader_A", OverrideSet::from_entries("", [("AKM", 1)]));
//!
//! let store = CatalogStore::new();
//! let resolved = resolver.resolve_item_mode(&store, "AKM", &["Trader_A"]).unwrap();
//! assert_eq!(resolved.mode, Mode::BuyOnly);
//! assert_eq!(resolved.tier, KeyTier::Item);
//! ```

mod error;
mod mode;
mod resolver;
mod setup;

pub use error::{SetupError, SetupResult};
pub use mode::{KeyTier, Mode};
pub use resolver::{ResolvedMode, SetupResolver};
pub use setup::{OverrideSet, load_override_set};
