use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::time::Instant;
use tradepost_sync::{
    CategoryBatchMessage, CategoryPayload, ClientState, CompletionMessage, HeaderMessage,
    ItemRecord, MAX_PAYLOAD_BYTES, RequestMessage, SyncClient, SyncConfig, SyncError, SyncMessage,
};

fn make_client() -> SyncClient {
    SyncClient::new(SyncConfig::default())
}

fn record(name: &str, price: i64) -> ItemRecord {
    ItemRecord {
        name: name.into(),
        price,
        sell_percent: 0,
        variants: Vec::new(),
        attachments: Vec::new(),
    }
}

fn header(dataset_id: &str, item_count: u32) -> SyncMessage {
    SyncMessage::Header(HeaderMessage::new(dataset_id, "", item_count, ""))
}

fn batch(
    dataset_id: &str,
    category_id: &str,
    index: u32,
    total: u32,
    items: Vec<ItemRecord>,
) -> SyncMessage {
    let payload = CategoryPayload {
        dataset_id: dataset_id.into(),
        category_id: category_id.into(),
        display_name: String::new(),
        base_price: 25,
        sell_percent: 40,
        batch_index: index,
        total_batches: total,
        items,
    };
    SyncMessage::CategoryBatch(CategoryBatchMessage::new(payload.encode().unwrap()))
}

fn completion(count: u32) -> SyncMessage {
    SyncMessage::Completion(CompletionMessage::new(count, ""))
}

// ── Full cycle ───────────────────────────────────────────────────

#[test]
fn two_batch_cycle_reaches_ready() {
    let mut client = make_client();
    assert_eq!(client.state(), ClientState::Idle);

    let request = client.begin_request("player-1");
    assert!(matches!(request, SyncMessage::Request(RequestMessage { requester: Some(_), .. })));
    assert_eq!(client.state(), ClientState::AwaitingHeader);

    client.handle_message(header("DS_Test", 3)).unwrap();
    assert_eq!(client.state(), ClientState::ReceivingBatches);

    let tools = vec![record("Axe", 30), record("Saw", 0)];
    client
        .handle_message(batch("DS_Test", "CAT_Tools", 0, 2, tools))
        .unwrap();
    client
        .handle_message(batch("DS_Test", "CAT_Tools", 1, 2, vec![record("Pick", 45)]))
        .unwrap();
    assert_eq!(client.state(), ClientState::ReceivingBatches);

    client.handle_message(completion(1)).unwrap();
    assert_eq!(client.state(), ClientState::Ready);

    let store = client.store();
    assert!(store.dataset_ids().contains(&"DS_Test"));
    assert_eq!(store.price("Axe"), Some(30));
    assert_eq!(store.price("Saw"), Some(25));
    assert_eq!(store.item("Saw").unwrap().sell_percent, 40);
    assert_eq!(store.dataset("DS_Test").unwrap().display_name, "Test");
    assert_eq!(store.category("DS_Test", "CAT_Tools").unwrap().display_name, "Tools");
}

#[test]
fn completion_without_headers_gives_empty_store() {
    let mut client = make_client();
    client.begin_request("player-1");
    client.handle_message(completion(0)).unwrap();
    assert!(client.is_ready());
    assert!(client.store().is_empty());
}

#[test]
fn interleaved_datasets_are_reconstructed() {
    let mut client = make_client();
    client.begin_request("player-1");
    client.handle_message(header("DS_A", 1)).unwrap();
    client.handle_message(header("DS_B", 1)).unwrap();
    client.handle_message(batch("DS_B", "CAT_B", 0, 1, vec![record("Bee", 5)])).unwrap();
    client.handle_message(batch("DS_A", "CAT_A", 0, 1, vec![record("Ant", 3)])).unwrap();
    client.handle_message(completion(2)).unwrap();

    assert_eq!(client.store().dataset_ids(), vec!["DS_A", "DS_B"]);
    assert_eq!(client.store().price("Bee"), Some(5));
}

#[test]
fn category_order_follows_arrival() {
    let mut client = make_client();
    client.begin_request("player-1");
    client.handle_message(header("DS_A", 0)).unwrap();
    client.handle_message(batch("DS_A", "CAT_Zulu", 0, 1, Vec::new())).unwrap();
    client.handle_message(batch("DS_A", "CAT_Alpha", 0, 1, Vec::new())).unwrap();
    client.handle_message(completion(2)).unwrap();

    assert_eq!(client.store().category_ids("DS_A"), vec!["CAT_Zulu", "CAT_Alpha"]);
}

#[test]
fn warning_is_kept() {
    let mut client = make_client();
    client.begin_request("player-1");
    client
        .handle_message(SyncMessage::Completion(CompletionMessage::new(0, "Prices are beta")))
        .unwrap();
    assert_eq!(client.warning(), "Prices are beta");
}

// ── Discarded messages ───────────────────────────────────────────

#[test]
fn batch_in_idle_is_discarded() {
    let mut client = make_client();
    let result = client.handle_message(batch("DS_Unknown", "CAT_X", 0, 1, vec![record("X", 1)]));
    assert!(matches!(result, Err(SyncError::Protocol(_))));
    assert_eq!(client.state(), ClientState::Idle);
    assert!(client.store().is_empty());
    assert_eq!(client.pending_datasets(), 0);
}

#[test]
fn header_and_completion_in_idle_are_discarded() {
    let mut client = make_client();
    assert!(client.handle_message(header("DS_A", 0)).is_err());
    assert!(client.handle_message(completion(0)).is_err());
    assert_eq!(client.state(), ClientState::Idle);
}

#[test]
fn batch_without_header_is_discarded() {
    let mut client = make_client();
    client.begin_request("player-1");
    assert!(client.handle_message(batch("DS_Ghost", "CAT_X", 0, 1, Vec::new())).is_err());
    assert_eq!(client.state(), ClientState::AwaitingHeader);
}

#[test]
fn batch_after_completion_is_not_merged() {
    let mut client = make_client();
    client.begin_request("player-1");
    client.handle_message(header("DS_A", 1)).unwrap();
    client.handle_message(batch("DS_A", "CAT_A", 0, 1, vec![record("Ant", 3)])).unwrap();
    client.handle_message(completion(1)).unwrap();

    assert!(client.handle_message(batch("DS_A", "CAT_A", 0, 1, vec![record("Late", 9)])).is_err());
    assert!(client.store().item("Late").is_none());
    assert!(client.is_ready());
}

#[test]
fn request_message_is_rejected() {
    let mut client = make_client();
    client.begin_request("player-1");
    let result = client.handle_message(SyncMessage::Request(RequestMessage::new("other")));
    assert!(result.is_err());
}

#[test]
fn oversized_batch_is_rejected_ceiling_batch_accepted() {
    let mut client = make_client();
    client.begin_request("player-1");
    client.handle_message(header("DS_A", 0)).unwrap();

    let mut payload = CategoryPayload {
        dataset_id: "DS_A".into(),
        category_id: "CAT_Big".into(),
        display_name: String::new(),
        base_price: 1,
        sell_percent: 1,
        batch_index: 0,
        total_batches: 1,
        items: Vec::new(),
    };
    let base = payload.encode().unwrap().len();
    payload.display_name = "x".repeat(MAX_PAYLOAD_BYTES - base + 1);
    let too_big = payload.encode().unwrap();
    assert_eq!(too_big.len(), MAX_PAYLOAD_BYTES + 1);
    let result =
        client.handle_message(SyncMessage::CategoryBatch(CategoryBatchMessage::new(too_big)));
    assert!(matches!(result, Err(SyncError::PayloadTooLarge { .. })));

    payload.display_name.pop();
    let exact = payload.encode().unwrap();
    assert_eq!(exact.len(), MAX_PAYLOAD_BYTES);
    client
        .handle_message(SyncMessage::CategoryBatch(CategoryBatchMessage::new(exact)))
        .unwrap();

    client.handle_message(completion(1)).unwrap();
    assert!(client.store().category("DS_A", "CAT_Big").is_some());
}

#[test]
fn empty_and_malformed_batches_are_rejected() {
    let mut client = make_client();
    client.begin_request("player-1");
    client.handle_message(header("DS_A", 0)).unwrap();

    let empty = client.handle_message(SyncMessage::CategoryBatch(CategoryBatchMessage::new("")));
    assert!(matches!(empty, Err(SyncError::EmptyPayload)));
    let garbage =
        client.handle_message(SyncMessage::CategoryBatch(CategoryBatchMessage::new("not json")));
    assert!(matches!(garbage, Err(SyncError::Serialization(_))));
}

#[test]
fn out_of_range_and_duplicate_batches_are_rejected() {
    let mut client = make_client();
    client.begin_request("player-1");
    client.handle_message(header("DS_A", 1)).unwrap();

    assert!(client.handle_message(batch("DS_A", "CAT_A", 2, 2, Vec::new())).is_err());
    assert!(client.handle_message(batch("DS_A", "CAT_A", 0, 0, Vec::new())).is_err());
    client.handle_message(batch("DS_A", "CAT_A", 0, 2, vec![record("Ant", 3)])).unwrap();
    assert!(client.handle_message(batch("DS_A", "CAT_A", 0, 2, vec![record("Ant", 3)])).is_err());
    assert!(client.handle_message(batch("DS_A", "CAT_A", 1, 3, Vec::new())).is_err());
}

// ── Completeness ─────────────────────────────────────────────────

#[test]
fn dataset_missing_a_batch_is_not_published() {
    let mut client = make_client();
    client.begin_request("player-1");
    client.handle_message(header("DS_Partial", 2)).unwrap();
    client.handle_message(header("DS_Whole", 1)).unwrap();
    client
        .handle_message(batch("DS_Partial", "CAT_P", 0, 2, vec![record("One", 1)]))
        .unwrap();
    client
        .handle_message(batch("DS_Whole", "CAT_W", 0, 1, vec![record("Two", 2)]))
        .unwrap();
    client.handle_message(completion(2)).unwrap();

    assert!(client.is_ready());
    assert_eq!(client.store().dataset_ids(), vec!["DS_Whole"]);
    assert!(client.store().item("One").is_none());
}

#[test]
fn dataset_with_item_count_mismatch_is_not_published() {
    let mut client = make_client();
    client.begin_request("player-1");
    client.handle_message(header("DS_A", 5)).unwrap();
    client.handle_message(batch("DS_A", "CAT_A", 0, 1, vec![record("Ant", 3)])).unwrap();
    client.handle_message(completion(1)).unwrap();
    assert!(client.store().is_empty());
}

#[test]
fn dataset_with_missing_category_is_not_published() {
    let mut client = make_client();
    client.begin_request("player-1");
    let announced = HeaderMessage::new("DS_A", "", 1, "").with_category_count(2);
    client.handle_message(SyncMessage::Header(announced)).unwrap();
    client.handle_message(batch("DS_A", "CAT_A", 0, 1, vec![record("Ant", 3)])).unwrap();
    client.handle_message(completion(2)).unwrap();
    assert!(client.store().is_empty());
}

#[test]
fn dataset_without_categories_is_not_published() {
    let mut client = make_client();
    client.begin_request("player-1");
    client.handle_message(header("DS_Hollow", 0)).unwrap();
    client.handle_message(header("DS_A", 1)).unwrap();
    client.handle_message(batch("DS_A", "CAT_A", 0, 1, vec![record("Ant", 3)])).unwrap();
    client.handle_message(completion(1)).unwrap();

    assert!(client.is_ready());
    assert_eq!(client.store().dataset_ids(), vec!["DS_A"]);
    assert!(client.store().dataset("DS_Hollow").is_none());
}

// ── Encoded messages ─────────────────────────────────────────────

#[test]
fn encoded_messages_round_trip() {
    let messages = [
        SyncMessage::Request(RequestMessage::new("player-1")),
        SyncMessage::Header(HeaderMessage::new("DS_A", "Alpha", 2, "icon").with_category_count(1)),
        batch("DS_A", "CAT_A", 0, 1, vec![record("Ant \"queen\"", 3)]),
        SyncMessage::Completion(CompletionMessage::new(1, "line one\nline two")),
    ];
    for message in messages {
        let json = message.to_json().unwrap();
        assert_eq!(SyncMessage::from_json(&json).unwrap(), message);
    }
}

#[test]
fn encoded_cycle_reaches_ready() {
    let mut client = make_client();
    client.begin_request("player-1");
    for message in [
        header("DS_A", 1),
        batch("DS_A", "CAT_A", 0, 1, vec![record("Ant", 3)]),
        completion(1),
    ] {
        client.handle_encoded(&message.to_json().unwrap()).unwrap();
    }
    assert!(client.is_ready());
    assert_eq!(client.store().price("Ant"), Some(3));
}

#[test]
fn truncated_header_and_completion_are_dropped() {
    let mut client = make_client();
    client.begin_request("player-1");
    client.handle_message(header("DS_A", 1)).unwrap();
    assert_eq!(client.state(), ClientState::ReceivingBatches);

    let late_header = header("DS_B", 4).to_json().unwrap();
    let result = client.handle_encoded(&late_header[..late_header.len() / 2]);
    assert!(matches!(result, Err(SyncError::Decode(_))));

    let done = completion(1).to_json().unwrap();
    let result = client.handle_encoded(&done[..done.len() - 1]);
    assert!(matches!(result, Err(SyncError::Decode(_))));

    let result = client.handle_encoded(r#"{"Farewell":{}}"#);
    assert!(matches!(result, Err(SyncError::Decode(_))));

    assert_eq!(client.state(), ClientState::ReceivingBatches);
    assert_eq!(client.pending_datasets(), 1);
    assert!(client.store().is_empty());

    client.handle_message(batch("DS_A", "CAT_A", 0, 1, vec![record("Ant", 3)])).unwrap();
    client.handle_message(completion(1)).unwrap();
    assert_eq!(client.store().dataset_ids(), vec!["DS_A"]);
}

// ── Lifecycle ────────────────────────────────────────────────────

#[test]
fn new_request_resets_in_flight_state() {
    let mut client = make_client();
    client.begin_request("player-1");
    client.handle_message(header("DS_Old", 1)).unwrap();
    assert_eq!(client.pending_datasets(), 1);

    client.begin_request("player-1");
    assert_eq!(client.pending_datasets(), 0);
    assert_eq!(client.state(), ClientState::AwaitingHeader);
}

#[test]
fn new_cycle_replaces_published_store() {
    let mut client = make_client();
    client.begin_request("player-1");
    client.handle_message(header("DS_Old", 0)).unwrap();
    client.handle_message(batch("DS_Old", "CAT_Old", 0, 1, Vec::new())).unwrap();
    client.handle_message(completion(1)).unwrap();
    assert_eq!(client.store().dataset_ids(), vec!["DS_Old"]);

    client.begin_request("player-1");
    assert_eq!(client.store().dataset_ids(), vec!["DS_Old"]);
    client.handle_message(header("DS_New", 0)).unwrap();
    client.handle_message(batch("DS_New", "CAT_New", 0, 1, Vec::new())).unwrap();
    client.handle_message(completion(1)).unwrap();
    assert_eq!(client.store().dataset_ids(), vec!["DS_New"]);
}

#[test]
fn disconnect_drops_everything() {
    let mut client = make_client();
    client.begin_request("player-1");
    client.handle_message(header("DS_A", 1)).unwrap();
    client.handle_message(batch("DS_A", "CAT_A", 0, 1, vec![record("Ant", 3)])).unwrap();
    client.handle_message(completion(1)).unwrap();
    assert_eq!(client.store().price("Ant"), Some(3));

    client.disconnect();
    assert_eq!(client.state(), ClientState::Idle);
    assert!(client.store().is_empty());
    assert!(client.handle_message(batch("DS_A", "CAT_A", 0, 1, Vec::new())).is_err());
}

#[tokio::test(start_paused = true)]
async fn stalled_cycle_expires_to_idle() {
    let mut client = SyncClient::new(SyncConfig {
        sync_timeout: Duration::from_secs(5),
        ..Default::default()
    });
    client.begin_request("player-1");
    client.handle_message(header("DS_A", 1)).unwrap();

    assert!(!client.expire_if_stalled(Instant::now()));
    tokio::time::advance(Duration::from_secs(6)).await;
    assert!(client.expire_if_stalled(Instant::now()));
    assert_eq!(client.state(), ClientState::Idle);
    assert_eq!(client.pending_datasets(), 0);
}

#[tokio::test(start_paused = true)]
async fn ready_client_never_expires() {
    let mut client = make_client();
    client.begin_request("player-1");
    client.handle_message(completion(0)).unwrap();
    tokio::time::advance(Duration::from_secs(3600)).await;
    assert!(!client.expire_if_stalled(Instant::now()));
    assert!(client.is_ready());
}
