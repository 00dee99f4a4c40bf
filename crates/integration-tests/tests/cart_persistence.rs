//! The file-backed cart slot across reopenings.

use std::sync::Arc;

use mambini_storefront::cart::{
    CART_STORAGE_KEY, CartHandle, CartLineInput, CartStorage, FileStorage, LineKey,
};
use rust_decimal::Decimal;

fn open(dir: &tempfile::TempDir) -> CartHandle {
    CartHandle::open(Arc::new(FileStorage::new(dir.path())))
}

#[test]
fn test_reopened_cart_keeps_order_and_quantities() {
    let dir = tempfile::tempdir().expect("temp dir");
    let cart = open(&dir);
    cart.add_to_cart(CartLineInput::new("p2", "Scarf", Decimal::new(1250, 2), "U", 1))
        .expect("scarf");
    cart.add_to_cart(CartLineInput::new("p1", "Jacket", Decimal::TEN, "M", 2))
        .expect("jacket");
    cart.update_quantity(&LineKey::new("p1", "M", None), 3)
        .expect("bump");

    let reopened = open(&dir).snapshot();
    let ids: Vec<_> = reopened.items.iter().map(|l| l.product_id.as_str()).collect();
    assert_eq!(ids, ["p2", "p1"]);
    assert_eq!(reopened.count, 6);
    assert_eq!(reopened.total, Decimal::new(6250, 2));
}

#[test]
fn test_corrupt_slot_starts_empty_and_recovers() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join("shoppingCart.json"), "{not json").expect("write");

    let cart = open(&dir);
    assert!(cart.snapshot().is_empty());

    cart.add_to_cart(CartLineInput::new("p1", "Jacket", Decimal::TEN, "M", 1))
        .expect("add after corruption");
    assert_eq!(open(&dir).snapshot().count, 1);
}

#[test]
fn test_legacy_array_is_migrated_on_write() {
    let dir = tempfile::tempdir().expect("temp dir");
    let storage = FileStorage::new(dir.path());
    storage
        .write(
            CART_STORAGE_KEY,
            r#"[{"id":"p1","name":"Jacket","price":"10","image":"","size":"M","quantity":2}]"#,
        )
        .expect("seed legacy");

    let cart = open(&dir);
    assert_eq!(cart.snapshot().count, 2);

    cart.update_quantity(&LineKey::new("p1", "M", None), 1)
        .expect("bump");
    let raw = storage
        .read(CART_STORAGE_KEY)
        .expect("read")
        .expect("slot present");
    assert!(raw.starts_with(r#"{"version":1"#));
    assert_eq!(open(&dir).snapshot().count, 3);
}
