//! Event Dispatch Tests
//!
//! Verifies that each successful mutation emits exactly one correctly
//! shaped change event, and that subscription filtering, self-event
//! suppression, ordering, and subscriber independence hold end to end.

mod common;

use common::{film_schema, init_tracing, MockStore};
use graphloom_core::events::{ChangeDispatcher, ChangeEvent, ChangeKind, SubscriptionFilter};
use graphloom_core::services::{MutationService, SubscriptionService};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::time::{timeout, Duration};

fn input(value: Value) -> Map<String, Value> {
    value.as_object().unwrap().clone()
}

fn setup(store: Arc<MockStore>) -> (MutationService, SubscriptionService) {
    init_tracing();
    let dispatcher = ChangeDispatcher::new();
    let mutations = MutationService::new(store, Arc::new(film_schema()), dispatcher.clone());
    let subscriptions = SubscriptionService::new(dispatcher);
    (mutations, subscriptions)
}

async fn recv(
    handle: &mut graphloom_core::events::SubscriptionHandle,
) -> ChangeEvent {
    timeout(Duration::from_secs(1), handle.receiver.recv())
        .await
        .expect("event should be emitted within 1 second")
        .expect("channel should stay open")
}

async fn assert_silent(handle: &mut graphloom_core::events::SubscriptionHandle) {
    let nothing = timeout(Duration::from_millis(50), handle.receiver.recv()).await;
    assert!(nothing.is_err(), "subscriber should not receive an event");
}

#[tokio::test]
async fn test_create_then_update_emit_chained_snapshots() {
    let store = Arc::new(MockStore::new());
    let (mutations, subscriptions) = setup(store.clone());
    let mut handle = subscriptions.register(SubscriptionFilter::for_type("Movie"));

    // Create emits exactly one event with no old snapshot.
    let initial = json!({"id": "m-1", "title": "Jaws", "viewers": 0});
    store.push_node(initial.clone());
    mutations
        .create("Movie", input(json!({"id": "m-1", "title": "Jaws", "viewers": 0})))
        .await
        .unwrap();

    let created = recv(&mut handle).await;
    assert_eq!(created.kind, ChangeKind::Created);
    assert!(created.old.is_none());
    assert_eq!(
        Value::Object(created.new.clone().unwrap()),
        initial
    );

    // A later update carries the prior snapshot as old and the post-write
    // state as new.
    let after = json!({"id": "m-1", "title": "Jaws", "viewers": 1});
    store.push_node(initial.clone());
    store.push_node(after.clone());
    mutations
        .update("Movie", "m-1", input(json!({"viewers_INCREMENT": 1})))
        .await
        .unwrap();

    let updated = recv(&mut handle).await;
    assert_eq!(updated.kind, ChangeKind::Updated);
    assert_eq!(Value::Object(updated.old.unwrap()), initial);
    assert_eq!(Value::Object(updated.new.unwrap()), after);

    assert_silent(&mut handle).await;
}

#[tokio::test]
async fn test_delete_emits_final_state() {
    let store = Arc::new(MockStore::new());
    let (mutations, subscriptions) = setup(store.clone());
    let mut handle = subscriptions.register(
        SubscriptionFilter::for_type("Movie").with_kinds(vec![ChangeKind::Deleted]),
    );

    let last = json!({"id": "m-1", "title": "Jaws"});
    store.push_node(last.clone());
    store.push_empty();
    mutations.delete("Movie", "m-1").await.unwrap();

    let deleted = recv(&mut handle).await;
    assert_eq!(deleted.kind, ChangeKind::Deleted);
    assert!(deleted.new.is_none());
    assert_eq!(Value::Object(deleted.old.unwrap()), last);
}

#[tokio::test]
async fn test_type_mismatch_never_reaches_subscriber() {
    let store = Arc::new(MockStore::new());
    let (mutations, subscriptions) = setup(store.clone());
    let mut actors = subscriptions.register(SubscriptionFilter::for_type("Actor"));

    store.push_node(json!({"id": "m-1", "title": "Jaws"}));
    mutations
        .create("Movie", input(json!({"title": "Jaws"})))
        .await
        .unwrap();

    assert_silent(&mut actors).await;
}

#[tokio::test]
async fn test_predicate_filters_on_current_view() {
    let store = Arc::new(MockStore::new());
    let (mutations, subscriptions) = setup(store.clone());
    let mut jaws_only = subscriptions
        .register(SubscriptionFilter::for_type("Movie").with_field("title", json!("Jaws")));

    store.push_node(json!({"id": "m-2", "title": "Alien"}));
    mutations
        .create("Movie", input(json!({"id": "m-2", "title": "Alien"})))
        .await
        .unwrap();
    assert_silent(&mut jaws_only).await;

    store.push_node(json!({"id": "m-1", "title": "Jaws"}));
    mutations
        .create("Movie", input(json!({"id": "m-1", "title": "Jaws"})))
        .await
        .unwrap();
    let event = recv(&mut jaws_only).await;
    assert_eq!(event.new.unwrap()["title"], json!("Jaws"));
}

#[tokio::test]
async fn test_client_does_not_receive_its_own_echo() {
    let store = Arc::new(MockStore::new());
    let (mutations, subscriptions) = setup(store.clone());

    let mut own =
        subscriptions.register(SubscriptionFilter::for_type("Movie").ignoring_client("session-1"));
    let mut other = subscriptions.register(SubscriptionFilter::for_type("Movie"));

    store.push_node(json!({"id": "m-1", "title": "Jaws"}));
    mutations
        .with_client("session-1")
        .create("Movie", input(json!({"title": "Jaws"})))
        .await
        .unwrap();

    let event = recv(&mut other).await;
    assert_eq!(event.source_client_id.as_deref(), Some("session-1"));
    assert_silent(&mut own).await;
}

#[tokio::test]
async fn test_per_entity_ordering_matches_write_order() {
    let store = Arc::new(MockStore::new());
    let (mutations, subscriptions) = setup(store.clone());
    let mut handle = subscriptions.register(SubscriptionFilter::for_type("Movie"));

    for viewers in 0..4 {
        store.push_node(json!({"id": "m-1", "viewers": viewers}));
        store.push_node(json!({"id": "m-1", "viewers": viewers + 1}));
        mutations
            .update("Movie", "m-1", input(json!({"viewers_INCREMENT": 1})))
            .await
            .unwrap();
    }

    for viewers in 0..4 {
        let event = recv(&mut handle).await;
        assert_eq!(event.old.unwrap()["viewers"], json!(viewers));
        assert_eq!(event.new.unwrap()["viewers"], json!(viewers + 1));
    }
}

#[tokio::test]
async fn test_dropped_subscriber_leaves_others_unaffected() {
    let store = Arc::new(MockStore::new());
    let (mutations, subscriptions) = setup(store.clone());

    let dropped = subscriptions.register(SubscriptionFilter::for_type("Movie"));
    let mut alive = subscriptions.register(SubscriptionFilter::for_type("Movie"));
    drop(dropped.receiver);

    store.push_node(json!({"id": "m-1", "title": "Jaws"}));
    mutations
        .create("Movie", input(json!({"title": "Jaws"})))
        .await
        .unwrap();

    let event = recv(&mut alive).await;
    assert_eq!(event.kind, ChangeKind::Created);
}

#[tokio::test]
async fn test_failed_write_emits_nothing() {
    let store = Arc::new(MockStore::new());
    let (mutations, subscriptions) = setup(store.clone());
    let mut handle = subscriptions.register(SubscriptionFilter::for_type("Movie"));

    store.push_node(json!({"id": "m-1", "viewers": i32::MAX}));
    mutations
        .update("Movie", "m-1", input(json!({"viewers_INCREMENT": 1})))
        .await
        .unwrap_err();

    assert_silent(&mut handle).await;
}
