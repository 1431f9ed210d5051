//! Raw source records, exactly as an external loader parses them.
//!
//! Field names follow the dataset files (`BasePrice`, `SellPercent`, ...).
//! Nothing here is validated: prices may be zero or negative, entries may be
//! `null`, and `CategoryOrder` may name categories that do not exist.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One item entry inside a raw category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawItem {
    pub base_price: i64,
    pub sell_percent: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub variants: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub attachments: Vec<String>,
}

impl RawItem {
    /// An entry with its own base price.
    pub fn priced(base_price: i64) -> Self {
        Self {
            base_price,
            ..Self::default()
        }
    }

    /// Adds variant names to the entry.
    pub fn with_variants<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variants = variants.into_iter().map(Into::into).collect();
        self
    }

    /// Adds attachment names to the entry.
    pub fn with_attachments<I, S>(mut self, attachments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attachments = attachments.into_iter().map(Into::into).collect();
        self
    }
}

/// One category inside a raw dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawCategory {
    pub base_price: i64,
    pub sell_percent: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub display_name: String,
    /// `null` entries are allowed in source files and are skipped at build time.
    #[serde(deserialize_with = "null_as_default")]
    pub items: BTreeMap<String, Option<RawItem>>,
}

impl RawCategory {
    /// A category with a base price and no items.
    pub fn priced(base_price: i64) -> Self {
        Self {
            base_price,
            ..Self::default()
        }
    }
}

/// A whole source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawDataset {
    pub version: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub dataset_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub icon: String,
    #[serde(deserialize_with = "null_as_default")]
    pub categories: BTreeMap<String, Option<RawCategory>>,
    #[serde(deserialize_with = "null_as_default")]
    pub category_order: Vec<String>,
}

impl RawDataset {
    /// An empty dataset record with the given identifier.
    pub fn named(dataset_name: impl Into<String>) -> Self {
        Self {
            dataset_name: dataset_name.into(),
            ..Self::default()
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
