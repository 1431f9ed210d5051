//! Server-to-client catalog sync for Tradepost.
//!
//! Clients never read dataset files. They pull the server's catalog with a
//! four-phase exchange and rebuild a [`CatalogStore`](tradepost_catalog::CatalogStore)
//! from it.
//!
//! # Architecture
//!
//! - **Protocol**: the four message kinds and their constructors
//! - **Codec**: category payloads, the byte ceiling and category splitting
//! - **Server**: produces the full message sequence for one request
//! - **Client**: the `Idle → AwaitingHeader → ReceivingBatches → Ready`
//!   state machine that consumes it
//! - **Transport**: delivery abstraction plus an in-process channel transport
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tradepost_catalog::CatalogStore;
//! use tradepost_sync::{Role, SyncClient, SyncConfig, SyncMessage, SyncServer};
//!
//! let server = SyncServer::new(Arc::new(CatalogStore::new()), SyncConfig::default());
//! let mut client = SyncClient::new(SyncConfig::default());
//!
//! let SyncMessage::Request(request) = client.begin_request("player-1") else {
//!     unreachable!()
//! };
//! let reply = server.handle_request(Role::Server, &request).unwrap();
//! for message in reply.messages {
//!     client.handle_message(message).unwrap();
//! }
//! assert!(client.is_ready());
//! ```

mod client;
mod codec;
mod config;
mod error;
pub mod protocol;
mod server;
mod state;
pub mod transport;

pub use client::SyncClient;
pub use codec::{CategoryPayload, ItemRecord, SplitCategory, check_payload_size, split_category};
pub use config::{SyncConfig, load_warn_text};
pub use error::{SyncError, SyncResult};
pub use protocol::{
    CategoryBatchMessage, ClientId, CompletionMessage, HeaderMessage, MAX_PAYLOAD_BYTES,
    PROTOCOL_VERSION, RequestMessage, Role, SyncMessage,
};
pub use server::{SyncReply, SyncServer};
pub use state::{CategoryAssembly, ClientState, DatasetAssembly};
pub use transport::{ChannelTransport, SyncTransport};
