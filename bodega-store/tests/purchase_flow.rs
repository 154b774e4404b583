mod common;

use bodega_catalog::ProductRepository;
use bodega_core::audit::ActionKind;
use bodega_core::CoreError;
use bodega_order::{LineItem, OrderStatus};

use common::{address, admin, harness, product, shopper, wait_for_audit_entries};

#[tokio::test]
async fn create_or_get_open_order_is_idempotent() {
    let h = harness();
    let nikos = shopper("nikos");

    let first = h.cart.create_or_get_open_order(&nikos, "box-1").await.unwrap();
    let second = h.cart.create_or_get_open_order(&nikos, "box-1").await.unwrap();

    assert_eq!(first.box_key, second.box_key);
    assert_eq!(first.created_at, second.created_at);
    assert_eq!(second.status(), OrderStatus::Open);
}

#[tokio::test]
async fn a_second_open_box_under_a_different_key_conflicts() {
    let h = harness();
    let nikos = shopper("nikos");

    h.cart.create_or_get_open_order(&nikos, "box-1").await.unwrap();
    let err = h
        .cart
        .create_or_get_open_order(&nikos, "box-2")
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Conflict(msg) if msg.contains("box-1")));
}

#[tokio::test]
async fn a_box_key_taken_by_another_user_conflicts() {
    let h = harness();

    h.cart
        .create_or_get_open_order(&shopper("nikos"), "box-1")
        .await
        .unwrap();
    let err = h
        .cart
        .create_or_get_open_order(&shopper("maria"), "box-1")
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Conflict(_)));
}

#[tokio::test]
async fn line_items_append_and_remove_first_match() {
    let h = harness();
    let nikos = shopper("nikos");
    h.store.insert_product(&product("feta-400g", 450, 10)).await.unwrap();

    h.cart.create_or_get_open_order(&nikos, "box-1").await.unwrap();
    h.cart.add_line_item(&nikos, "box-1", "feta-400g", 1).await.unwrap();
    let after_second = h
        .cart
        .add_line_item(&nikos, "box-1", "feta-400g", 2)
        .await
        .unwrap();
    assert_eq!(after_second.line_items.len(), 2);

    let after_remove = h
        .cart
        .remove_line_item(&nikos, "box-1", "feta-400g")
        .await
        .unwrap();
    assert_eq!(after_remove.line_items, vec![LineItem::new("feta-400g", 2)]);

    let err = h
        .cart
        .remove_line_item(&nikos, "box-1", "olive-oil-1l")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn adding_an_unknown_product_is_not_found() {
    let h = harness();
    let nikos = shopper("nikos");

    h.cart.create_or_get_open_order(&nikos, "box-1").await.unwrap();
    let err = h
        .cart
        .add_line_item(&nikos, "box-1", "ghost", 1)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::NotFound(msg) if msg.contains("ghost")));
}

#[tokio::test]
async fn adding_to_a_missing_box_is_not_found() {
    let h = harness();
    let nikos = shopper("nikos");
    h.store.insert_product(&product("feta-400g", 450, 10)).await.unwrap();

    let err = h
        .cart
        .add_line_item(&nikos, "box-9", "feta-400g", 1)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn checkout_reserves_stock_and_freezes_the_address() {
    let h = harness();
    let nikos = shopper("nikos");
    h.store.insert_product(&product("feta-400g", 450, 10)).await.unwrap();
    h.store.insert_product(&product("olive-oil-1l", 1250, 4)).await.unwrap();

    h.cart.create_or_get_open_order(&nikos, "box-1").await.unwrap();
    h.cart.add_line_item(&nikos, "box-1", "feta-400g", 1).await.unwrap();
    h.cart.add_line_item(&nikos, "box-1", "olive-oil-1l", 1).await.unwrap();

    // The submitted list drops the oil and settles the feta quantity at 3.
    let finalized = h
        .checkout
        .checkout(&nikos, "box-1", &[LineItem::new("feta-400g", 3)], address())
        .await
        .unwrap();

    assert_eq!(finalized.status(), OrderStatus::AwaitingFulfillment);
    assert_eq!(finalized.line_items, vec![LineItem::new("feta-400g", 3)]);
    assert!(finalized.checked_out_at.is_some());
    assert_eq!(finalized.delivery_address, Some(address()));

    let feta = h.store.get_product("feta-400g").await.unwrap().unwrap();
    assert_eq!(feta.quantity, 7);
    let oil = h.store.get_product("olive-oil-1l").await.unwrap().unwrap();
    assert_eq!(oil.quantity, 4);

    // The box is no longer open.
    assert!(matches!(
        h.cart.get_open_order(&nikos).await,
        Err(CoreError::NotFound(_))
    ));

    wait_for_audit_entries(&h.store, 1).await;
    let entries = h.store.audit_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, ActionKind::Checkout);
    assert_eq!(entries[0].product_key, "feta-400g");
    assert_eq!(entries[0].amount, Some(3));
    assert_eq!(entries[0].username, "nikos");
}

#[tokio::test]
async fn insufficient_stock_fails_the_whole_checkout() {
    let h = harness();
    let nikos = shopper("nikos");
    h.store.insert_product(&product("a", 100, 1)).await.unwrap();
    h.store.insert_product(&product("b", 200, 5)).await.unwrap();

    h.cart.create_or_get_open_order(&nikos, "box-1").await.unwrap();
    h.cart.add_line_item(&nikos, "box-1", "a", 1).await.unwrap();
    h.cart.add_line_item(&nikos, "box-1", "b", 1).await.unwrap();

    let err = h
        .checkout
        .checkout(
            &nikos,
            "box-1",
            &[LineItem::new("a", 2), LineItem::new("b", 1)],
            address(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Conflict(ref msg) if msg.contains('a')));

    // Zero inventory changes persisted, order still OPEN with its items.
    assert_eq!(h.store.get_product("a").await.unwrap().unwrap().quantity, 1);
    assert_eq!(h.store.get_product("b").await.unwrap().unwrap().quantity, 5);
    let open = h.cart.get_open_order(&nikos).await.unwrap();
    assert_eq!(open.status, OrderStatus::Open);
    assert_eq!(open.line_items.len(), 2);
    assert!(open.delivery_address.is_none());
}

#[tokio::test]
async fn checkout_is_rejected_for_missing_or_closed_boxes() {
    let h = harness();
    let nikos = shopper("nikos");
    h.store.insert_product(&product("feta-400g", 450, 10)).await.unwrap();

    let err = h
        .checkout
        .checkout(&nikos, "box-9", &[LineItem::new("feta-400g", 1)], address())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    h.cart.create_or_get_open_order(&nikos, "box-1").await.unwrap();
    h.cart.add_line_item(&nikos, "box-1", "feta-400g", 1).await.unwrap();
    h.checkout
        .checkout(&nikos, "box-1", &[LineItem::new("feta-400g", 1)], address())
        .await
        .unwrap();

    // A second checkout must not decrement again.
    let err = h
        .checkout
        .checkout(&nikos, "box-1", &[LineItem::new("feta-400g", 1)], address())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
    assert_eq!(
        h.store.get_product("feta-400g").await.unwrap().unwrap().quantity,
        9
    );
}

#[tokio::test]
async fn an_incomplete_address_is_rejected_before_any_reservation() {
    let h = harness();
    let nikos = shopper("nikos");
    h.store.insert_product(&product("feta-400g", 450, 10)).await.unwrap();

    h.cart.create_or_get_open_order(&nikos, "box-1").await.unwrap();
    h.cart.add_line_item(&nikos, "box-1", "feta-400g", 1).await.unwrap();

    let mut bad_address = address();
    bad_address.city = String::new();
    let err = h
        .checkout
        .checkout(&nikos, "box-1", &[LineItem::new("feta-400g", 1)], bad_address)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Validation(_)));
    assert_eq!(
        h.store.get_product("feta-400g").await.unwrap().unwrap().quantity,
        10
    );
}

#[tokio::test]
async fn delete_open_box_only_while_open() {
    let h = harness();
    let nikos = shopper("nikos");
    h.store.insert_product(&product("feta-400g", 450, 10)).await.unwrap();

    h.cart.create_or_get_open_order(&nikos, "box-1").await.unwrap();
    h.cart.delete_open_order(&nikos, "box-1").await.unwrap();
    assert!(matches!(
        h.cart.get_open_order(&nikos).await,
        Err(CoreError::NotFound(_))
    ));

    h.cart.create_or_get_open_order(&nikos, "box-2").await.unwrap();
    h.cart.add_line_item(&nikos, "box-2", "feta-400g", 1).await.unwrap();
    h.checkout
        .checkout(&nikos, "box-2", &[LineItem::new("feta-400g", 1)], address())
        .await
        .unwrap();

    let err = h.cart.delete_open_order(&nikos, "box-2").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn fulfillment_listing_and_delivery_lifecycle() {
    let h = harness();
    let nikos = shopper("nikos");
    h.store.insert_product(&product("feta-400g", 450, 10)).await.unwrap();

    h.cart.create_or_get_open_order(&nikos, "box-1").await.unwrap();
    h.cart.add_line_item(&nikos, "box-1", "feta-400g", 2).await.unwrap();
    h.checkout
        .checkout(&nikos, "box-1", &[LineItem::new("feta-400g", 2)], address())
        .await
        .unwrap();

    let awaiting = h.fulfillment.list_awaiting_fulfillment(&admin()).await.unwrap();
    assert_eq!(awaiting.len(), 1);
    assert_eq!(awaiting[0].box_key, "box-1");
    assert_eq!(awaiting[0].status, OrderStatus::AwaitingFulfillment);
    assert!(awaiting[0].line_items[0].product.is_some());

    h.fulfillment.finish_delivery(&admin(), "box-1").await.unwrap();
    let awaiting = h.fulfillment.list_awaiting_fulfillment(&admin()).await.unwrap();
    assert!(awaiting.is_empty());

    let past = h.history.get_past_order(&nikos, "box-1").await.unwrap();
    assert_eq!(past.status, OrderStatus::Complete);

    // Finishing again, or finishing an unknown box, is a quiet no-op.
    h.fulfillment.finish_delivery(&admin(), "box-1").await.unwrap();
    h.fulfillment.finish_delivery(&admin(), "box-9").await.unwrap();
    let past = h.history.get_past_order(&nikos, "box-1").await.unwrap();
    assert_eq!(past.status, OrderStatus::Complete);
}

#[tokio::test]
async fn base_tier_cannot_reach_fulfillment_operations() {
    let h = harness();
    let nikos = shopper("nikos");

    assert!(matches!(
        h.fulfillment.list_awaiting_fulfillment(&nikos).await,
        Err(CoreError::Forbidden(_))
    ));
    assert!(matches!(
        h.fulfillment.finish_delivery(&nikos, "box-1").await,
        Err(CoreError::Forbidden(_))
    ));
}

#[tokio::test]
async fn history_lists_past_orders_newest_first_and_skips_the_open_box() {
    let h = harness();
    let nikos = shopper("nikos");
    h.store.insert_product(&product("feta-400g", 450, 20)).await.unwrap();

    for key in ["box-1", "box-2"] {
        h.cart.create_or_get_open_order(&nikos, key).await.unwrap();
        h.cart.add_line_item(&nikos, key, "feta-400g", 1).await.unwrap();
        h.checkout
            .checkout(&nikos, key, &[LineItem::new("feta-400g", 1)], address())
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    h.cart.create_or_get_open_order(&nikos, "box-3").await.unwrap();

    let past = h.history.list_past_orders(&nikos).await.unwrap();
    assert_eq!(past.len(), 2);
    assert_eq!(past[0].box_key, "box-2");
    assert_eq!(past[1].box_key, "box-1");

    let open = h.history.get_open_order(&nikos).await.unwrap();
    assert_eq!(open.box_key, "box-3");
    assert!(matches!(
        h.history.get_past_order(&nikos, "box-3").await,
        Err(CoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn history_tolerates_a_product_deleted_after_purchase() {
    let h = harness();
    let nikos = shopper("nikos");
    h.store.insert_product(&product("feta-400g", 450, 10)).await.unwrap();

    h.cart.create_or_get_open_order(&nikos, "box-1").await.unwrap();
    h.cart.add_line_item(&nikos, "box-1", "feta-400g", 2).await.unwrap();
    h.checkout
        .checkout(&nikos, "box-1", &[LineItem::new("feta-400g", 2)], address())
        .await
        .unwrap();

    assert!(h.store.delete_product("feta-400g").await.unwrap());

    let past = h.history.get_past_order(&nikos, "box-1").await.unwrap();
    assert_eq!(past.line_items.len(), 1);
    assert_eq!(past.line_items[0].product_key, "feta-400g");
    assert_eq!(past.line_items[0].quantity, 2);
    assert!(past.line_items[0].product.is_none());

    // The admin listing degrades the same way instead of failing.
    let awaiting = h.fulfillment.list_awaiting_fulfillment(&admin()).await.unwrap();
    assert_eq!(awaiting.len(), 1);
    assert!(awaiting[0].line_items[0].product.is_none());
}

#[tokio::test]
async fn another_users_history_is_not_reachable() {
    let h = harness();
    let nikos = shopper("nikos");
    h.store.insert_product(&product("feta-400g", 450, 10)).await.unwrap();

    h.cart.create_or_get_open_order(&nikos, "box-1").await.unwrap();
    h.cart.add_line_item(&nikos, "box-1", "feta-400g", 1).await.unwrap();
    h.checkout
        .checkout(&nikos, "box-1", &[LineItem::new("feta-400g", 1)], address())
        .await
        .unwrap();

    let maria = shopper("maria");
    assert!(matches!(
        h.history.get_past_order(&maria, "box-1").await,
        Err(CoreError::NotFound(_))
    ));
    assert!(h.history.list_past_orders(&maria).await.unwrap().is_empty());
}
