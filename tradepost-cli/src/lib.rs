//! Reports behind the `tradepost` command.

use anyhow::{Context, Result, bail};
use std::fmt::{self, Write as _};
use std::sync::Arc;
use tradepost_catalog::CatalogStore;
use tradepost_setup::SetupResolver;
use tradepost_sync::{
    ChannelTransport, ClientId, Role, SyncClient, SyncConfig, SyncMessage, SyncServer,
    SyncTransport,
};
use tracing::info;

/// Datasets, their categories in display order and item counts.
pub fn inspect_report(store: &CatalogStore) -> String {
    let mut out = String::new();
    for dataset in store.datasets() {
        let _ = writeln!(
            out,
            "{} \"{}\" ({} categories, {} items)",
            dataset.id,
            dataset.display_name,
            dataset.categories.len(),
            dataset.item_count()
        );
        for category in dataset.ordered_categories() {
            let _ = writeln!(
                out,
                "  {} \"{}\" price {} sell {}% ({} items)",
                category.id,
                category.display_name,
                category.base_price,
                category.sell_percent,
                category.item_count()
            );
        }
    }
    if out.is_empty() {
        out.push_str("no datasets\n");
    }
    out
}

/// Resolved mode of `item` across `setups`, or a note that nothing applies.
pub fn resolve_report(
    store: &CatalogStore,
    resolver: &SetupResolver,
    item: &str,
    setups: &[String],
) -> String {
    let location = match store.locate_item(item) {
        Some(l) => format!("{} / {}", l.dataset_id, l.category_id),
        None => "not in catalog".to_string(),
    };
    match resolver.resolve_item_mode(store, item, setups) {
        Some(resolved) => format!(
            "{item} ({location}): {} from {} key in setup {}",
            resolved.mode, resolved.tier, resolved.setup
        ),
        None => format!("{item} ({location}): no override"),
    }
}

/// Outcome of an in-process sync.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub messages: usize,
    pub categories_shipped: u32,
    pub store: CatalogStore,
    pub warning: String,
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} messages, {} categories shipped",
            self.messages, self.categories_shipped
        )?;
        if !self.warning.is_empty() {
            writeln!(f, "warning: {}", self.warning)?;
        }
        write!(f, "client catalog:\n{}", inspect_report(&self.store))
    }
}

/// Serves `store` to one in-process client and returns what it rebuilt.
pub async fn simulate(store: CatalogStore, config: SyncConfig) -> Result<SimulationReport> {
    let server = SyncServer::new(Arc::new(store), config.clone());
    let transport = ChannelTransport::new();
    let id = ClientId::new("simulated-client");
    let mut inbox = transport.connect(id.clone()).await;

    let mut client = SyncClient::new(config);
    let SyncMessage::Request(request) = client.begin_request(id) else {
        bail!("client produced no request");
    };

    let reply = server
        .handle_request(Role::Server, &request)
        .context("server rejected the request")?;
    let messages = reply.messages.len();
    let categories_shipped = reply.category_count;
    for message in reply.messages {
        transport
            .send(&reply.client, message)
            .await
            .context("failed to deliver message")?;
    }

    client
        .receive_until_ready(&mut inbox)
        .await
        .context("client did not finish the sync")?;
    info!(
        "Simulation delivered {} messages for {} datasets",
        messages,
        server.store().dataset_count()
    );

    Ok(SimulationReport {
        messages,
        categories_shipped,
        store: client.store().clone(),
        warning: client.warning().to_string(),
    })
}
