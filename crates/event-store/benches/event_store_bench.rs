use common::AggregateId;
use criterion::{Criterion, criterion_group, criterion_main};
use event_store::{EventEnvelope, EventStore, InMemoryEventStore, Version};

fn make_event(aggregate_id: &AggregateId, version: i64) -> EventEnvelope {
    EventEnvelope::builder()
        .aggregate_id(aggregate_id.clone())
        .event_type("UserRegistered")
        .version(Version::new(version))
        .payload_raw(serde_json::json!({
            "type": "UserRegistered",
            "data": {
                "email": "bench@example.com",
                "auth_id": "auth-bench"
            }
        }))
        .build()
        .unwrap()
}

fn bench_append_single_event(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_single_event", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let agg_id = AggregateId::generate("User");
                store
                    .append_event(make_event(&agg_id, 0), None)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_append_sequence_10(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("event_store/append_sequence_10", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryEventStore::new();
                let agg_id = AggregateId::generate("User");
                for version in 0..10 {
                    store
                        .append_event(make_event(&agg_id, version), None)
                        .await
                        .unwrap();
                }
            });
        });
    });
}

fn bench_read_100_events(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let agg_id = AggregateId::generate("User");

    rt.block_on(async {
        for version in 0..100 {
            store
                .append_event(make_event(&agg_id, version), None)
                .await
                .unwrap();
        }
        // Noise from other streams
        for _ in 0..100 {
            store
                .append_event(make_event(&AggregateId::generate("User"), 0), None)
                .await
                .unwrap();
        }
    });

    c.bench_function("event_store/read_100_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let events = store.read_events(&agg_id).await.unwrap();
                assert_eq!(events.len(), 100);
            });
        });
    });
}

criterion_group!(
    benches,
    bench_append_single_event,
    bench_append_sequence_10,
    bench_read_100_events,
);
criterion_main!(benches);
