use pretty_assertions::assert_eq;
use tradepost_catalog::{Category, DEFAULT_BUY_PRICE, DEFAULT_SELL_PERCENT, Item};
use tradepost_sync::{
    CategoryPayload, ItemRecord, MAX_PAYLOAD_BYTES, SyncError, check_payload_size, split_category,
};

fn make_payload(display_name: &str) -> CategoryPayload {
    CategoryPayload {
        dataset_id: "DS_Test".into(),
        category_id: "CAT_Test".into(),
        display_name: display_name.into(),
        base_price: 10,
        sell_percent: 50,
        batch_index: 0,
        total_batches: 1,
        items: Vec::new(),
    }
}

/// An encoded payload of exactly `len` bytes.
fn payload_of_len(len: usize) -> String {
    let base = make_payload("").encode().unwrap().len();
    let encoded = make_payload(&"x".repeat(len - base)).encode().unwrap();
    assert_eq!(encoded.len(), len);
    encoded
}

fn make_category(items: usize, name_len: usize) -> Category {
    let mut category = Category::new("CAT_Bulk", "", 10, 50);
    for i in 0..items {
        let name = format!("{i:04}{}", "n".repeat(name_len));
        category.insert_item(Item::new(name, 10 + i as u32, 50));
    }
    category
}

// ── Size guard ───────────────────────────────────────────────────

#[test]
fn payload_at_ceiling_is_accepted() {
    let payload = payload_of_len(MAX_PAYLOAD_BYTES);
    assert!(check_payload_size(&payload, MAX_PAYLOAD_BYTES).is_ok());
    let decoded = CategoryPayload::decode(&payload, MAX_PAYLOAD_BYTES).unwrap();
    assert_eq!(decoded.category_id, "CAT_Test");
}

#[test]
fn payload_over_ceiling_is_rejected() {
    let payload = payload_of_len(MAX_PAYLOAD_BYTES + 1);
    let err = CategoryPayload::decode(&payload, MAX_PAYLOAD_BYTES).unwrap_err();
    assert!(matches!(
        err,
        SyncError::PayloadTooLarge {
            len: 2001,
            ceiling: 2000
        }
    ));
}

#[test]
fn empty_payload_is_rejected() {
    assert!(matches!(
        check_payload_size("", MAX_PAYLOAD_BYTES),
        Err(SyncError::EmptyPayload)
    ));
}

#[test]
fn malformed_payload_is_a_decode_error() {
    let err = CategoryPayload::decode("{\"DatasetID\":", MAX_PAYLOAD_BYTES).unwrap_err();
    assert!(matches!(err, SyncError::Serialization(_)));
}

// ── Wire format ──────────────────────────────────────────────────

#[test]
fn payload_uses_source_field_names() {
    let mut payload = make_payload("Test");
    payload.items.push(ItemRecord {
        name: "AKM".into(),
        price: 100,
        sell_percent: 50,
        variants: vec!["AKM_Black".into()],
        attachments: Vec::new(),
    });
    let json = payload.encode().unwrap();

    assert!(json.starts_with("{\"DatasetID\":\"DS_Test\",\"CategoryID\":\"CAT_Test\""));
    assert!(json.contains("\"BatchIndex\":0"));
    assert!(json.contains("\"Variants\":[\"AKM_Black\"]"));
    assert!(!json.contains("Attachments"));
}

#[test]
fn record_falls_back_to_category_then_defaults() {
    let record = ItemRecord {
        name: "Rope".into(),
        price: 0,
        sell_percent: -3,
        variants: vec![String::new()],
        attachments: Vec::new(),
    };
    let from_category = record.to_item(40, 20);
    assert_eq!((from_category.price, from_category.sell_percent), (40, 20));
    assert!(from_category.variants.is_empty());

    let from_defaults = record.to_item(0, 0);
    assert_eq!(from_defaults.price, DEFAULT_BUY_PRICE);
    assert_eq!(from_defaults.sell_percent, DEFAULT_SELL_PERCENT);
}

// ── Splitting ────────────────────────────────────────────────────

#[test]
fn small_category_is_one_batch() {
    let split = split_category("DS_Test", &make_category(3, 4), MAX_PAYLOAD_BYTES).unwrap();
    assert_eq!(split.payloads.len(), 1);
    assert_eq!(split.item_count, 3);
    assert!(split.omitted.is_empty());
}

#[test]
fn empty_category_is_one_empty_batch() {
    let split = split_category("DS_Test", &make_category(0, 0), MAX_PAYLOAD_BYTES).unwrap();
    assert_eq!(split.payloads.len(), 1);
    let payload = CategoryPayload::decode(&split.payloads[0], MAX_PAYLOAD_BYTES).unwrap();
    assert!(payload.items.is_empty());
    assert_eq!((payload.batch_index, payload.total_batches), (0, 1));
}

#[test]
fn large_category_is_split_within_ceiling() {
    let category = make_category(200, 20);
    let split = split_category("DS_Test", &category, MAX_PAYLOAD_BYTES).unwrap();
    assert!(split.payloads.len() > 1);
    assert_eq!(split.item_count, 200);

    let total = split.payloads.len() as u32;
    let mut names = Vec::new();
    for (index, encoded) in split.payloads.iter().enumerate() {
        let payload = CategoryPayload::decode(encoded, MAX_PAYLOAD_BYTES).unwrap();
        assert_eq!(payload.batch_index, index as u32);
        assert_eq!(payload.total_batches, total);
        assert_eq!(payload.display_name, "Bulk");
        names.extend(payload.items.into_iter().map(|i| i.name));
    }
    let expected: Vec<String> = category.items.keys().cloned().collect();
    assert_eq!(names, expected);
}

#[test]
fn oversized_item_is_omitted() {
    let mut category = make_category(2, 4);
    category.insert_item(Item::new("Huge".repeat(100), 10, 50));
    let split = split_category("DS_Test", &category, 300).unwrap();

    assert_eq!(split.omitted, vec!["Huge".repeat(100)]);
    assert_eq!(split.item_count, 2);
    for encoded in &split.payloads {
        assert!(encoded.len() <= 300);
    }
}

#[test]
fn category_that_never_fits_ships_nothing() {
    let category = make_category(2, 4);
    let split = split_category("DS_Test", &category, 40).unwrap();
    assert!(split.payloads.is_empty());
    assert_eq!(split.omitted.len(), 2);
}
