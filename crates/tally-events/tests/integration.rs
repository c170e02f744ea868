//! Integration tests for the NATS event channel.
//!
//! These tests require a live NATS server. Run with:
//!
//! ```bash
//! docker compose up -d
//! cargo test -p tally-events -- --ignored
//! docker compose down
//! ```

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc
)]

use std::time::Duration;

use tally_events::{EngagementConsumer, FactPublisher, NatsFactPublisher};
use tally_store::{EngagementStore, MemoryEngagementStore};
use tally_types::{ActorId, EngagementFact, ItemId};

const NATS_URL: &str = "nats://localhost:4222";

/// Each test uses its own topic so parallel runs do not cross-deliver.
fn unique_topic(label: &str) -> String {
    format!("engagement-test.{label}.{}", ItemId::new())
}

#[tokio::test]
#[ignore = "requires live NATS"]
async fn publish_is_acknowledged_within_timeout() {
    let client = tally_events::connect(NATS_URL).await.expect("nats connect");
    let publisher = NatsFactPublisher::new(
        client,
        unique_topic("ack"),
        Duration::from_millis(500),
        true,
    );

    let fact = EngagementFact::like(ItemId::new(), ActorId::new());
    assert!(publisher.publish(&fact).await);
}

#[tokio::test]
#[ignore = "requires live NATS"]
async fn disabled_publisher_reports_failure_without_touching_broker() {
    let client = tally_events::connect(NATS_URL).await.expect("nats connect");
    let publisher = NatsFactPublisher::new(
        client,
        unique_topic("disabled"),
        Duration::from_millis(500),
        false,
    );

    let fact = EngagementFact::view(ItemId::new(), ActorId::new());
    assert!(!publisher.publish(&fact).await);
}

#[tokio::test]
#[ignore = "requires live NATS"]
async fn published_facts_flow_through_consumer_to_store() {
    let topic = unique_topic("flow");
    let item = ItemId::new();
    let actor = ActorId::new();

    let store = MemoryEngagementStore::new();
    store.insert_item(item);

    let consumer_client = tally_events::connect(NATS_URL).await.expect("nats connect");
    let consumer = EngagementConsumer::new(consumer_client, topic.clone(), store);

    // The consumer must be subscribed before anything publishes; core NATS
    // has no replay. Publish from a task after a settle delay, and bound
    // the consumer loop with a timeout so the test can inspect the store
    // afterwards.
    let publish_task = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;

        let client = tally_events::connect(NATS_URL).await.expect("nats connect");
        let publisher =
            NatsFactPublisher::new(client, topic, Duration::from_millis(500), true);

        assert!(publisher.publish(&EngagementFact::like(item, actor)).await);
        assert!(publisher.publish(&EngagementFact::view(item, actor)).await);
        // A redelivered like fact must replay harmlessly.
        assert!(publisher.publish(&EngagementFact::like(item, actor)).await);
    });

    let _ = tokio::time::timeout(Duration::from_secs(3), consumer.run()).await;
    publish_task.await.expect("publish task");

    let store = consumer.store();
    assert_eq!(store.count_likes(item).await.expect("count likes"), 1);
    assert_eq!(store.sum_views(item).await.expect("sum views"), 1);
    assert_eq!(store.count_comments(item).await.expect("count comments"), 0);
}
