//! Priority-based mode resolution over a list of override sets.
//!
//! For an item, each named set is checked in the order given. Inside a set the
//! item's own key is checked first, then the key of the category holding it,
//! then the key of its dataset. The best tier found across all sets wins; on a
//! tie the earlier set wins. A later set can therefore upgrade a category
//! match to an item match, but never the other way round.

use crate::mode::{KeyTier, Mode};
use crate::setup::{OverrideSet, load_override_set};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};
use tradepost_catalog::CatalogStore;

/// A successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMode {
    pub mode: Mode,
    /// Tier of the key that matched.
    pub tier: KeyTier,
    /// Name of the set that supplied the mode.
    pub setup: String,
}

/// Loads override sets on demand and resolves modes against them.
///
/// Loaded sets are cached for the resolver's lifetime. Missing or unreadable
/// sets are never cached, so a later call retries every location.
#[derive(Debug, Default)]
pub struct SetupResolver {
    search_dirs: Vec<PathBuf>,
    cache: RwLock<HashMap<String, Arc<OverrideSet>>>,
}

impl SetupResolver {
    /// A resolver that looks for `<dir>/<name>.json` in each directory, in order.
    pub fn new(search_dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            search_dirs: search_dirs.into_iter().collect(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// A resolver over the standard server layout:
    /// `<profile>/Market/Setups`, `<profile>/Market/Traders`, `<mission>/Traders`.
    pub fn with_default_layout(profile_dir: &Path, mission_dir: &Path) -> Self {
        let market = profile_dir.join("Market");
        Self::new([
            market.join("Setups"),
            market.join("Traders"),
            mission_dir.join("Traders"),
        ])
    }

    /// Directories searched for setup files.
    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Installs or replaces a set without touching the filesystem.
    pub fn register_inline(&self, name: impl Into<String>, mut set: OverrideSet) {
        let name = name.into();
        set.name = name.clone();
        info!("Registered inline setup {} ({} entries)", name, set.len());
        self.write_cache().insert(name, Arc::new(set));
    }

    /// Forgets every cached set, inline ones included.
    pub fn clear_cache(&self) {
        self.write_cache().clear();
    }

    /// Returns a set by name, loading it on a cache miss.
    ///
    /// The first candidate file that exists is used. If it fails to parse the
    /// lookup fails; later candidates are not consulted.
    pub fn setup(&self, name: &str) -> Option<Arc<OverrideSet>> {
        if name.is_empty() {
            return None;
        }
        if let Some(set) = self.read_cache().get(name) {
            return Some(Arc::clone(set));
        }

        let file_name = format!("{name}.json");
        let path = self
            .search_dirs
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file());
        let Some(path) = path else {
            debug!("Setup {} not found in {} locations", name, self.search_dirs.len());
            return None;
        };

        match load_override_set(name, &path) {
            Ok(set) => {
                info!("Loaded setup {} from {} ({} entries)", name, path.display(), set.len());
                let set = Arc::new(set);
                self.write_cache()
                    .insert(name.to_string(), Arc::clone(&set));
                Some(set)
            }
            Err(e) => {
                warn!("Failed to load setup {} from {}: {}", name, path.display(), e);
                None
            }
        }
    }

    /// Resolves the mode for an item across `setups`, honouring tier priority.
    ///
    /// The item's category and dataset come from `store` (first match). An
    /// item unknown to the store can still match on its own key.
    pub fn resolve_item_mode<S: AsRef<str>>(
        &self,
        store: &CatalogStore,
        item: &str,
        setups: &[S],
    ) -> Option<ResolvedMode> {
        if item.is_empty() {
            return None;
        }
        let location = store.locate_item(item);
        let keys = [
            (KeyTier::Item, Some(item)),
            (KeyTier::Category, location.map(|l| l.category_id.as_str())),
            (KeyTier::Dataset, location.map(|l| l.dataset_id.as_str())),
        ];

        let mut best: Option<ResolvedMode> = None;
        for name in setups {
            let name = name.as_ref();
            let Some(set) = self.setup(name) else {
                continue;
            };
            for (tier, key) in keys {
                if best.as_ref().is_some_and(|b| b.tier >= tier) {
                    break;
                }
                let Some(mode) = key.and_then(|k| set.mode(k)) else {
                    continue;
                };
                best = Some(ResolvedMode {
                    mode,
                    tier,
                    setup: name.to_string(),
                });
                break;
            }
            if best.as_ref().is_some_and(|b| b.tier == KeyTier::Item) {
                break;
            }
        }

        if let Some(found) = &best {
            debug!(
                "Resolved {} to {} via {} key in setup {}",
                item, found.mode, found.tier, found.setup
            );
        }
        best
    }

    /// First valid dataset-level mode across `setups`. The `DS_` prefix is
    /// added to `key` when missing.
    pub fn resolve_dataset_mode<S: AsRef<str>>(&self, key: &str, setups: &[S]) -> Option<Mode> {
        self.resolve_tier(KeyTier::Dataset, key, setups)
    }

    /// First valid category-level mode across `setups`. The `CAT_` prefix is
    /// added to `key` when missing.
    pub fn resolve_category_mode<S: AsRef<str>>(&self, key: &str, setups: &[S]) -> Option<Mode> {
        self.resolve_tier(KeyTier::Category, key, setups)
    }

    fn resolve_tier<S: AsRef<str>>(&self, tier: KeyTier, key: &str, setups: &[S]) -> Option<Mode> {
        if key.is_empty() {
            return None;
        }
        let key = tier.normalize(key);
        setups
            .iter()
            .filter_map(|name| self.setup(name.as_ref()))
            .find_map(|set| set.mode(&key))
    }

    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<OverrideSet>>> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<OverrideSet>>> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }
}
