//! Sync protocol messages and types.
//!
//! One sync cycle answers one client pull:
//! 1. The client sends a `Request` carrying its identity
//! 2. The server sends one `Header` per dataset
//! 3. The server sends one or more `CategoryBatch` per category, after the
//!    header of the owning dataset
//! 4. The server sends a single `Completion`
//!
//! The transport is reliable and ordered; there is no acknowledgement and no
//! retry. A failed cycle is recovered by the client sending a new `Request`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol version for compatibility checking.
pub const PROTOCOL_VERSION: u32 = 1;

/// Maximum byte length of one category batch payload.
pub const MAX_PAYLOAD_BYTES: usize = 2000;

/// Which side of the protocol this process plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
}

/// Identity of a connected client, as the transport addresses it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Wraps a transport identity.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identity is blank.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A sync protocol message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyncMessage {
    /// Client asks for the full catalog.
    Request(RequestMessage),

    /// Announces one dataset.
    Header(HeaderMessage),

    /// Carries one encoded category chunk.
    CategoryBatch(CategoryBatchMessage),

    /// Ends the cycle.
    Completion(CompletionMessage),
}

impl SyncMessage {
    /// Short name of the message kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Request(_) => "Request",
            Self::Header(_) => "Header",
            Self::CategoryBatch(_) => "CategoryBatch",
            Self::Completion(_) => "Completion",
        }
    }

    /// Encodes the message as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decodes a message from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Client pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMessage {
    /// Protocol version.
    pub version: u32,
    /// Who is asking. The server answers only to this identity.
    pub requester: Option<ClientId>,
}

impl RequestMessage {
    /// Creates a request from `requester`.
    pub fn new(requester: impl Into<ClientId>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            requester: Some(requester.into()),
        }
    }

    /// A request with no identity; the server rejects it.
    pub fn anonymous() -> Self {
        Self {
            version: PROTOCOL_VERSION,
            requester: None,
        }
    }
}

/// Dataset announcement. Opens the dataset on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMessage {
    pub dataset_id: String,
    pub display_name: String,
    /// Items the server will ship for this dataset.
    pub item_count: u32,
    pub icon: String,
    /// Categories the server will ship for this dataset.
    #[serde(default)]
    pub category_count: Option<u32>,
}

impl HeaderMessage {
    /// Creates a header.
    pub fn new(
        dataset_id: impl Into<String>,
        display_name: impl Into<String>,
        item_count: u32,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            display_name: display_name.into(),
            item_count,
            icon: icon.into(),
            category_count: None,
        }
    }

    /// Adds the category count.
    pub fn with_category_count(mut self, count: u32) -> Self {
        self.category_count = Some(count);
        self
    }
}

/// One encoded category chunk; see [`CategoryPayload`](crate::CategoryPayload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBatchMessage {
    pub payload: String,
}

impl CategoryBatchMessage {
    /// Wraps an encoded payload.
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

/// End of a sync cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMessage {
    /// Categories shipped in full during this cycle.
    pub category_count: u32,
    /// Server notice shown to the player; may be empty.
    pub warning: String,
}

impl CompletionMessage {
    /// Creates a completion.
    pub fn new(category_count: u32, warning: impl Into<String>) -> Self {
        Self {
            category_count,
            warning: warning.into(),
        }
    }
}
