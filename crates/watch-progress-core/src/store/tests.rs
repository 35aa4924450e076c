use super::*;
use crate::clock::ManualClock;
use crate::file_storage::FileStorage;
use crate::memory_storage::MemoryStorage;
use chrono::TimeZone;
use watch_progress_models::MediaKind;

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap()
}

fn create_store() -> (ProgressStore<MemoryStorage, ManualClock>, ManualClock) {
    let clock = ManualClock::new(start_time());
    let store = ProgressStore::with_clock(MemoryStorage::new(), StoreSettings::default(), clock.clone());
    (store, clock)
}

fn create_report(id: &str, current_time: f64, duration: f64) -> ProgressReport {
    ProgressReport {
        id: id.to_string(),
        title: format!("Title {}", id),
        url: format!("/stream/{}", id),
        image: format!("/thumb/{}.jpg", id),
        kind: MediaKind::Video,
        current_time,
        duration,
        folder: Some("movies".to_string()),
        year: None,
    }
}

#[test]
fn test_upsert_keeps_one_entry_per_id() {
    let (store, clock) = create_store();

    for position in [10.0, 30.0, 50.0] {
        assert_eq!(store.record_progress(&create_report("a", position, 100.0)), RecordOutcome::Saved);
        clock.advance(Duration::seconds(1));
    }

    let history = store.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].current_time, 50.0);
    assert_eq!(history[0].percentage, 50.0);
    assert_eq!(history[0].last_watched, start_time() + Duration::seconds(2));
}

#[test]
fn test_low_watermark_is_not_persisted() {
    let (store, _) = create_store();

    assert_eq!(
        store.record_progress(&create_report("a", 2.0, 100.0)),
        RecordOutcome::BelowThreshold
    );
    assert!(store.progress("a").is_none());
    assert!(store.storage().get("watchHistory").unwrap().is_none());
}

#[test]
fn test_high_watermark_removes_existing_entry() {
    let (store, _) = create_store();
    store.record_progress(&create_report("a", 40.0, 100.0));
    store.record_progress(&create_report("b", 40.0, 100.0));

    assert_eq!(store.record_progress(&create_report("a", 97.0, 100.0)), RecordOutcome::Completed);
    assert!(store.progress("a").is_none());
    assert!(store.progress("b").is_some());
}

#[test]
fn test_high_watermark_without_entry_creates_nothing() {
    let (store, _) = create_store();
    assert_eq!(store.record_progress(&create_report("a", 99.0, 100.0)), RecordOutcome::Completed);
    assert!(store.history().is_empty());
}

#[test]
fn test_watermark_bounds_are_inclusive() {
    let (store, _) = create_store();
    assert_eq!(store.record_progress(&create_report("low", 5.0, 100.0)), RecordOutcome::Saved);
    assert_eq!(store.record_progress(&create_report("high", 95.0, 100.0)), RecordOutcome::Saved);
    assert_eq!(store.history().len(), 2);
}

#[test]
fn test_invalid_reports_are_rejected() {
    let (store, _) = create_store();

    assert_eq!(store.record_progress(&create_report("a", 30.0, 0.0)), RecordOutcome::Rejected);
    assert_eq!(store.record_progress(&create_report("", 30.0, 100.0)), RecordOutcome::Rejected);
    assert_eq!(store.record_progress(&create_report("a", -1.0, 100.0)), RecordOutcome::Rejected);
    assert_eq!(store.record_progress(&create_report("a", f64::NAN, 100.0)), RecordOutcome::Rejected);
    assert!(store.history().is_empty());
}

#[test]
fn test_capacity_keeps_most_recent() {
    let (store, clock) = create_store();

    for i in 0..60 {
        store.record_progress(&create_report(&format!("item{}", i), 50.0, 100.0));
        clock.advance(Duration::seconds(1));
    }

    let history = store.history();
    assert_eq!(history.len(), 50);
    assert_eq!(history[0].id, "item59");
    assert_eq!(history[49].id, "item10");
    assert!(store.progress("item9").is_none());
}

#[test]
fn test_history_is_most_recent_first() {
    let (store, clock) = create_store();
    store.record_progress(&create_report("a", 20.0, 100.0));
    clock.advance(Duration::minutes(1));
    store.record_progress(&create_report("b", 20.0, 100.0));

    let history = store.history();
    assert_eq!(history[0].id, "b");
    assert_eq!(history[1].id, "a");

    // Updating an older entry moves it to the front
    clock.advance(Duration::minutes(1));
    store.record_progress(&create_report("a", 25.0, 100.0));
    assert_eq!(store.history()[0].id, "a");
}

#[test]
fn test_throttle_window() {
    let (store, clock) = create_store();

    assert_eq!(store.record_progress_throttled(&create_report("a", 10.0, 100.0)), RecordOutcome::Saved);

    clock.advance(Duration::seconds(2));
    assert_eq!(
        store.record_progress_throttled(&create_report("a", 20.0, 100.0)),
        RecordOutcome::Throttled
    );
    assert_eq!(store.progress("a").unwrap().current_time, 10.0);

    clock.advance(Duration::seconds(3));
    assert_eq!(store.record_progress_throttled(&create_report("a", 30.0, 100.0)), RecordOutcome::Saved);
    assert_eq!(store.progress("a").unwrap().current_time, 30.0);
}

#[test]
fn test_throttle_is_shared_across_ids() {
    let (store, clock) = create_store();
    store.record_progress_throttled(&create_report("a", 10.0, 100.0));

    clock.advance(Duration::seconds(1));
    assert_eq!(
        store.record_progress_throttled(&create_report("b", 10.0, 100.0)),
        RecordOutcome::Throttled
    );
    assert!(store.progress("b").is_none());
}

#[test]
fn test_unthrottled_writes_ignore_window() {
    let (store, _) = create_store();
    store.record_progress_throttled(&create_report("a", 10.0, 100.0));
    assert_eq!(store.record_progress(&create_report("a", 20.0, 100.0)), RecordOutcome::Saved);
    assert_eq!(store.progress("a").unwrap().current_time, 20.0);
}

#[test]
fn test_ignored_reports_do_not_start_window() {
    let (store, clock) = create_store();

    assert_eq!(
        store.record_progress_throttled(&create_report("a", 0.0, 0.0)),
        RecordOutcome::Rejected
    );
    assert_eq!(
        store.record_progress_throttled(&create_report("a", 1.0, 100.0)),
        RecordOutcome::BelowThreshold
    );
    assert_eq!(store.record_progress_throttled(&create_report("a", 10.0, 100.0)), RecordOutcome::Saved);

    clock.advance(Duration::seconds(1));
    assert_eq!(
        store.record_progress_throttled(&create_report("a", 20.0, 100.0)),
        RecordOutcome::Throttled
    );
}

#[test]
fn test_oversized_throttle_interval_falls_back_to_default() {
    for secs in [u64::MAX, 10_000_000_000_000_000] {
        let config = StoreConfig {
            throttle_interval_secs: secs,
            ..StoreConfig::default()
        };
        let settings = StoreSettings::from(&config);
        assert_eq!(settings.throttle_interval, Duration::seconds(5));

        let store = ProgressStore::with_clock(MemoryStorage::new(), settings, ManualClock::new(start_time()));
        assert_eq!(store.record_progress_throttled(&create_report("a", 10.0, 100.0)), RecordOutcome::Saved);
        assert_eq!(
            store.record_progress_throttled(&create_report("a", 20.0, 100.0)),
            RecordOutcome::Throttled
        );
    }
}

#[test]
fn test_round_trip_ignores_stored_order() {
    let (store, clock) = create_store();
    store.record_progress(&create_report("a", 10.0, 100.0));
    clock.advance(Duration::seconds(10));
    store.record_progress(&create_report("b", 20.0, 100.0));
    let expected = store.history();

    // Rewrite the payload oldest-first
    let mut reversed = expected.clone();
    reversed.reverse();
    let json = serde_json::to_string(&reversed).unwrap();
    store.storage().set("watchHistory", &json).unwrap();

    assert_eq!(store.history(), expected);
}

#[test]
fn test_corrupt_payload_reads_as_empty_and_self_heals() {
    let (store, _) = create_store();

    store.storage().set("watchHistory", "not json at all").unwrap();
    assert!(store.history().is_empty());

    store.storage().set("watchHistory", r#"[{"id": "a"}]"#).unwrap();
    assert!(store.history().is_empty());
    assert!(store.progress("a").is_none());

    assert_eq!(store.record_progress(&create_report("b", 50.0, 100.0)), RecordOutcome::Saved);
    assert_eq!(store.history().len(), 1);
}

#[test]
fn test_remove_item_is_idempotent() {
    let (store, _) = create_store();
    store.record_progress(&create_report("a", 50.0, 100.0));

    store.remove_item("nonexistent");
    assert_eq!(store.history().len(), 1);

    store.remove_item("a");
    store.remove_item("a");
    assert!(store.history().is_empty());
}

#[test]
fn test_clear_history() {
    let (store, _) = create_store();
    store.record_progress(&create_report("a", 50.0, 100.0));
    store.record_progress(&create_report("b", 50.0, 100.0));

    store.clear_history();
    assert!(store.history().is_empty());
    assert!(store.storage().get("watchHistory").unwrap().is_none());
}

#[test]
fn test_stats() {
    let (store, _) = create_store();
    assert_eq!(store.stats(), WatchStats::default());

    store.record_progress(&create_report("a", 10.0, 100.0));
    store.record_progress(&create_report("b", 300.0, 1000.0));

    let stats = store.stats();
    assert_eq!(stats.total_items, 2);
    assert_eq!(stats.total_watch_time, 310.0);
    assert!((stats.average_progress - 20.0).abs() < 1e-9);
}

#[test]
fn test_recently_watched_limits() {
    let (store, clock) = create_store();
    for i in 0..15 {
        store.record_progress(&create_report(&format!("item{}", i), 50.0, 100.0));
        clock.advance(Duration::seconds(1));
    }

    assert_eq!(store.recently_watched(3).len(), 3);
    assert_eq!(store.recently_watched(3)[0].id, "item14");
    assert_eq!(store.continue_watching().len(), 10);
    assert_eq!(store.recently_watched(100).len(), 15);
}

#[test]
fn test_movie_finished_scenario() {
    let (store, _) = create_store();

    let mut report = create_report("movie1", 300.0, 3600.0);
    assert_eq!(store.record_progress(&report), RecordOutcome::Saved);

    let recent = store.recently_watched(10);
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, "movie1");
    assert!((recent[0].percentage - 8.333).abs() < 0.01);
    assert_eq!(store.resume_position("movie1"), Some(300.0));

    report.current_time = 3500.0;
    assert_eq!(store.record_progress(&report), RecordOutcome::Completed);
    assert!(store.progress("movie1").is_none());
    assert_eq!(store.resume_position("movie1"), None);
}

#[test]
fn test_storage_failures_are_swallowed() {
    let (store, _) = create_store();
    store.record_progress(&create_report("a", 50.0, 100.0));

    store.storage().set_available(false);
    assert_eq!(store.record_progress(&create_report("b", 50.0, 100.0)), RecordOutcome::StorageFailed);
    assert!(store.history().is_empty());
    store.remove_item("a");
    store.clear_history();

    store.storage().set_available(true);
    let history = store.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, "a");
}

#[test]
fn test_quota_exceeded_keeps_previous_state() {
    let clock = ManualClock::new(start_time());
    let store = ProgressStore::with_clock(MemoryStorage::with_capacity(600), StoreSettings::default(), clock);

    assert_eq!(store.record_progress(&create_report("a", 50.0, 100.0)), RecordOutcome::Saved);

    let mut big = create_report("b", 50.0, 100.0);
    big.title = "x".repeat(1000);
    assert_eq!(store.record_progress(&big), RecordOutcome::StorageFailed);

    let history = store.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, "a");
}

#[test]
fn test_other_contexts_are_notified() {
    let shared = MemoryStorage::new();
    let player = ProgressStore::new(shared.open_context(), StoreSettings::default());
    let gallery = ProgressStore::new(shared.open_context(), StoreSettings::default());

    let player_events = player.subscribe().unwrap();
    let gallery_events = gallery.subscribe().unwrap();

    player.record_progress(&create_report("a", 50.0, 100.0));

    let event = gallery_events.try_recv().unwrap();
    assert!(gallery.touches_history(&event));
    assert_eq!(gallery.history()[0].id, "a");
    assert!(player_events.try_recv().is_err());
}

#[test]
fn test_custom_settings() {
    let settings = StoreSettings {
        storage_key: "progress".to_string(),
        max_entries: 2,
        low_watermark: 1.0,
        high_watermark: 90.0,
        throttle_interval: Duration::seconds(30),
        recent_limit: 1,
    };
    let clock = ManualClock::new(start_time());
    let store = ProgressStore::with_clock(MemoryStorage::new(), settings, clock.clone());

    store.record_progress(&create_report("a", 2.0, 100.0));
    clock.advance(Duration::seconds(1));
    store.record_progress(&create_report("b", 50.0, 100.0));
    clock.advance(Duration::seconds(1));
    store.record_progress(&create_report("c", 50.0, 100.0));

    assert_eq!(store.history().len(), 2);
    assert_eq!(store.continue_watching().len(), 1);
    assert!(store.storage().get("progress").unwrap().is_some());
    assert_eq!(store.record_progress(&create_report("b", 91.0, 100.0)), RecordOutcome::Completed);
}

#[test]
fn test_file_backed_history_persists() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = ProgressStore::new(FileStorage::new(dir.path()).unwrap(), StoreSettings::default());
        store.record_progress(&create_report("a", 50.0, 100.0));
    }

    let reopened = ProgressStore::new(FileStorage::new(dir.path()).unwrap(), StoreSettings::default());
    let entry = reopened.progress("a").unwrap();
    assert_eq!(entry.title, "Title a");
    assert_eq!(entry.folder.as_deref(), Some("movies"));
}
