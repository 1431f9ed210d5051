//! Override sets ("setups"): named key → mode mappings.

use crate::error::{SetupError, SetupResult};
use crate::mode::Mode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

/// One override set, as stored in a setup file.
///
/// ```json
/// { "Version": "1", "CurrencyMode": { "Coin": 2 },
///   "SetupItems": { "DS_Firearms": 3, "CAT_Pistols": 2, "AKM": 0 } }
/// ```
///
/// Values in `setup_items` are kept as written; range checks happen on lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OverrideSet {
    /// Setup name; not part of the file, filled in by whoever loads it.
    #[serde(skip)]
    pub name: String,
    pub version: String,
    /// Accepted currencies and their modes. Opaque to resolution.
    pub currency_mode: BTreeMap<String, i64>,
    pub setup_items: BTreeMap<String, i64>,
}

impl OverrideSet {
    /// An override set built in code.
    pub fn from_entries<I, K>(name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, i64)>,
        K: Into<String>,
    {
        Self {
            name: name.into(),
            setup_items: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Self::default()
        }
    }

    /// Sets the currency map.
    pub fn with_currency_mode<I, K>(mut self, currencies: I) -> Self
    where
        I: IntoIterator<Item = (K, i64)>,
        K: Into<String>,
    {
        self.currency_mode = currencies.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self
    }

    /// Raw configured value for `key`, valid or not.
    pub fn raw_value(&self, key: &str) -> Option<i64> {
        self.setup_items.get(key).copied()
    }

    /// Valid mode configured for `key`.
    ///
    /// An out-of-range value is logged and reported as absent.
    pub fn mode(&self, key: &str) -> Option<Mode> {
        let value = self.raw_value(key)?;
        match Mode::try_from(value) {
            Ok(mode) => Some(mode),
            Err(e) => {
                warn!("Ignoring {} for {} in setup {}: {}", value, key, self.name, e);
                None
            }
        }
    }

    /// Number of configured keys.
    pub fn len(&self) -> usize {
        self.setup_items.len()
    }

    /// Whether the set configures nothing.
    pub fn is_empty(&self) -> bool {
        self.setup_items.is_empty()
    }
}

/// Reads an override set from a file. `name` becomes the set's name.
pub fn load_override_set(name: &str, path: &Path) -> SetupResult<OverrideSet> {
    let contents = fs::read_to_string(path).map_err(|source| SetupError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut set: OverrideSet = serde_json::from_str(&contents)?;
    set.name = name.to_string();
    Ok(set)
}
