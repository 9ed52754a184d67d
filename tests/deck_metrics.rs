use std::collections::HashMap;
use std::fs;

use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use taskdeck::application::deck::{Deck, DeckRegistry, materialize_into};
use taskdeck::infra::telemetry::{
    ARTIFACT_WRITE_FAILURES_TOTAL, ARTIFACTS_WRITTEN_TOTAL, DECKS_MATERIALIZED_TOTAL,
    describe_metrics,
};

#[test]
fn materialization_emits_expected_counters() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    describe_metrics();

    let scratch = tempfile::tempdir().expect("tempdir");
    let registry = DeckRegistry::new();
    Deck::new(&registry, "ok", "<p>ok</p>").expect("deck");
    Deck::new(&registry, "blocked", "<p>nope</p>").expect("deck");
    fs::create_dir(scratch.path().join("blocked.html")).expect("blocker");

    let bundle = materialize_into("metrics", &registry, scratch.path()).expect("materialize");
    assert_eq!(bundle.failures.len(), 1);

    let counters: HashMap<String, u64> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(composite_key, _, _, value)| match value {
            DebugValue::Counter(count) => Some((composite_key.key().name().to_string(), count)),
            _ => None,
        })
        .collect();

    assert_eq!(counters.get(DECKS_MATERIALIZED_TOTAL), Some(&1));
    assert_eq!(counters.get(ARTIFACTS_WRITTEN_TOTAL), Some(&2));
    assert_eq!(counters.get(ARTIFACT_WRITE_FAILURES_TOTAL), Some(&1));
}
