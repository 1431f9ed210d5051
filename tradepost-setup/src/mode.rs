//! Trade modes and key tiers.

use crate::error::SetupError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tradepost_catalog::{CATEGORY_PREFIX, DATASET_PREFIX};

/// What a trader allows for an item.
///
/// Serialized as its integer value, which is what setup files contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Mode {
    Disabled,
    ViewOnly,
    BuyOnly,
    SellOnly,
    BuyAndSell,
}

impl Mode {
    /// Integer value used in setup files.
    pub fn value(self) -> i64 {
        match self {
            Self::Disabled => -1,
            Self::ViewOnly => 0,
            Self::BuyOnly => 1,
            Self::SellOnly => 2,
            Self::BuyAndSell => 3,
        }
    }

    /// Whether players may buy under this mode.
    pub fn can_buy(self) -> bool {
        matches!(self, Self::BuyOnly | Self::BuyAndSell)
    }

    /// Whether players may sell under this mode.
    pub fn can_sell(self) -> bool {
        matches!(self, Self::SellOnly | Self::BuyAndSell)
    }
}

impl TryFrom<i64> for Mode {
    type Error = SetupError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Disabled),
            0 => Ok(Self::ViewOnly),
            1 => Ok(Self::BuyOnly),
            2 => Ok(Self::SellOnly),
            3 => Ok(Self::BuyAndSell),
            other => Err(SetupError::ModeOutOfRange(other)),
        }
    }
}

impl From<Mode> for i64 {
    fn from(mode: Mode) -> Self {
        mode.value()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disabled => "disabled",
            Self::ViewOnly => "view-only",
            Self::BuyOnly => "buy-only",
            Self::SellOnly => "sell-only",
            Self::BuyAndSell => "buy-and-sell",
        };
        write!(f, "{name} ({})", self.value())
    }
}

/// Granularity of a setup key. Ordered by priority: `Item` beats `Category`
/// beats `Dataset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KeyTier {
    Dataset,
    Category,
    Item,
}

impl KeyTier {
    /// Classifies a setup key by its prefix. A key that is only a prefix
    /// (`"DS_"`) names an item. Empty keys have no tier.
    pub fn of(key: &str) -> Option<Self> {
        if key.is_empty() {
            return None;
        }
        let carries = |prefix: &str| key.len() > prefix.len() && key.starts_with(prefix);
        Some(if carries(DATASET_PREFIX) {
            Self::Dataset
        } else if carries(CATEGORY_PREFIX) {
            Self::Category
        } else {
            Self::Item
        })
    }

    /// Prefix a key of this tier carries, if any.
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            Self::Dataset => Some(DATASET_PREFIX),
            Self::Category => Some(CATEGORY_PREFIX),
            Self::Item => None,
        }
    }

    /// Adds this tier's prefix to `key` unless it is already there.
    pub fn normalize(self, key: &str) -> String {
        match self.prefix() {
            Some(prefix) if !key.starts_with(prefix) => format!("{prefix}{key}"),
            _ => key.to_string(),
        }
    }
}

impl fmt::Display for KeyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dataset => write!(f, "dataset"),
            Self::Category => write!(f, "category"),
            Self::Item => write!(f, "item"),
        }
    }
}
