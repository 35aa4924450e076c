use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};
use watch_progress_config::StoreConfig;
use watch_progress_models::{ProgressReport, WatchEntry, WatchStats};
use crate::clock::{Clock, SystemClock};
use crate::storage::{StorageBackend, StorageEvent, Subscription};

#[cfg(test)]
mod tests;

/// Retention and throttling policy applied by [`ProgressStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    pub storage_key: String,
    pub max_entries: usize,
    pub low_watermark: f64,
    pub high_watermark: f64,
    pub throttle_interval: Duration,
    pub recent_limit: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::from(&StoreConfig::default())
    }
}

impl From<&StoreConfig> for StoreSettings {
    fn from(config: &StoreConfig) -> Self {
        Self {
            storage_key: config.storage_key.clone(),
            max_entries: config.max_entries,
            low_watermark: config.low_watermark,
            high_watermark: config.high_watermark,
            throttle_interval: throttle_interval(config.throttle_interval_secs),
            recent_limit: config.recent_limit,
        }
    }
}

/// Values too large for a `Duration` fall back to the default window.
fn throttle_interval(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or_else(|| {
            warn!("Throttle interval of {}s is out of range, using the default", secs);
            Duration::seconds(StoreConfig::default().throttle_interval_secs as i64)
        })
}

/// What a record call ended up doing. Purely informational: no outcome is an
/// error for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Entry created or updated
    Saved,
    /// Past the high watermark; any existing entry was dropped
    Completed,
    /// Below the low watermark, nothing written
    BelowThreshold,
    /// Missing id or unusable position/duration
    Rejected,
    /// Suppressed by the write throttle
    Throttled,
    /// The backend refused the write; previous state is kept
    StorageFailed,
}

/// Bounded, recency-ordered history of partially watched media.
///
/// The whole history lives under one storage key as a JSON array. Every
/// failure to read or write it degrades to an empty history or a skipped
/// write, so callers on a playback path are never interrupted.
pub struct ProgressStore<S, C = SystemClock> {
    storage: S,
    clock: C,
    settings: StoreSettings,
    /// Serialises read-modify-write cycles within this instance
    write_lock: Mutex<()>,
    /// Time of the last throttled write let through
    last_write: Mutex<Option<DateTime<Utc>>>,
}

impl<S: StorageBackend> ProgressStore<S, SystemClock> {
    pub fn new(storage: S, settings: StoreSettings) -> Self {
        Self::with_clock(storage, settings, SystemClock)
    }
}

impl<S: StorageBackend, C: Clock> ProgressStore<S, C> {
    pub fn with_clock(storage: S, settings: StoreSettings, clock: C) -> Self {
        Self {
            storage,
            clock,
            settings,
            write_lock: Mutex::new(()),
            last_write: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Apply a playback report to the history.
    pub fn record_progress(&self, report: &ProgressReport) -> RecordOutcome {
        if !report.is_measurable() {
            debug!(
                "Ignoring progress report for {:?}: current_time={}, duration={}",
                report.id, report.current_time, report.duration
            );
            return RecordOutcome::Rejected;
        }

        let percentage = report.percentage();
        if percentage < self.settings.low_watermark {
            debug!("Progress for {} at {:.1}% is below the low watermark", report.id, percentage);
            return RecordOutcome::BelowThreshold;
        }

        let _guard = self.lock_writes();
        let mut entries = self.load();

        if percentage > self.settings.high_watermark {
            let before = entries.len();
            entries.retain(|e| e.id != report.id);
            if entries.len() != before {
                info!("Finished {} ({:.1}%), removing from history", report.id, percentage);
                if !self.save(&entries) {
                    return RecordOutcome::StorageFailed;
                }
            }
            return RecordOutcome::Completed;
        }

        let entry = WatchEntry::from_report(report, self.clock.now());
        entries.retain(|e| e.id != entry.id);
        entries.insert(0, entry);

        if entries.len() > self.settings.max_entries {
            debug!(
                "History over capacity ({} > {}), dropping oldest entries",
                entries.len(),
                self.settings.max_entries
            );
            entries.truncate(self.settings.max_entries);
        }

        if self.save(&entries) {
            debug!("Saved progress for {} at {:.1}%", report.id, percentage);
            RecordOutcome::Saved
        } else {
            RecordOutcome::StorageFailed
        }
    }

    /// Like [`record_progress`](Self::record_progress), but lets at most one
    /// report through per throttle interval. The window is shared by all
    /// media ids on this instance.
    pub fn record_progress_throttled(&self, report: &ProgressReport) -> RecordOutcome {
        let now = self.clock.now();
        let mut last_write = match self.last_write.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(last) = *last_write {
            let elapsed = now - last;
            // A clock that jumped backwards does not hold writes back
            if elapsed >= Duration::zero() && elapsed < self.settings.throttle_interval {
                return RecordOutcome::Throttled;
            }
        }

        let outcome = self.record_progress(report);

        // Only reports the store acted on open a new window
        if matches!(
            outcome,
            RecordOutcome::Saved | RecordOutcome::Completed | RecordOutcome::StorageFailed
        ) {
            *last_write = Some(now);
        }
        outcome
    }

    /// All retained entries, most recently watched first.
    pub fn history(&self) -> Vec<WatchEntry> {
        self.load()
    }

    pub fn recently_watched(&self, limit: usize) -> Vec<WatchEntry> {
        let mut entries = self.load();
        entries.truncate(limit);
        entries
    }

    /// The "continue watching" shelf, sized by the configured limit.
    pub fn continue_watching(&self) -> Vec<WatchEntry> {
        self.recently_watched(self.settings.recent_limit)
    }

    pub fn progress(&self, id: &str) -> Option<WatchEntry> {
        self.load().into_iter().find(|e| e.id == id)
    }

    /// Offset in seconds a player should offer to resume from.
    pub fn resume_position(&self, id: &str) -> Option<f64> {
        self.progress(id).map(|e| e.current_time)
    }

    pub fn remove_item(&self, id: &str) {
        let _guard = self.lock_writes();
        let mut entries = self.load();
        let before = entries.len();
        entries.retain(|e| e.id != id);

        if entries.len() == before {
            debug!("Remove requested for {} but it is not in history", id);
            return;
        }

        if self.save(&entries) {
            info!("Removed {} from watch history", id);
        }
    }

    pub fn clear_history(&self) {
        let _guard = self.lock_writes();
        match self.storage.remove(&self.settings.storage_key) {
            Ok(()) => info!("Cleared watch history"),
            Err(e) => warn!("Failed to clear watch history: {}", e),
        }
    }

    pub fn stats(&self) -> WatchStats {
        WatchStats::from_entries(&self.load())
    }

    /// Subscribe to history changes made through other contexts of the
    /// backend. Receivers should re-read [`history`](Self::history).
    pub fn subscribe(&self) -> Option<Subscription> {
        self.storage.subscribe()
    }

    /// Whether a storage event concerns this store's key.
    pub fn touches_history(&self, event: &StorageEvent) -> bool {
        event.key == self.settings.storage_key
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn load(&self) -> Vec<WatchEntry> {
        let key = &self.settings.storage_key;

        let content = match self.storage.get(key) {
            Ok(Some(content)) => content,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read watch history: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<WatchEntry>>(&content) {
            Ok(mut entries) => {
                // Stable, so equal timestamps keep their stored order
                entries.sort_by(|a, b| b.last_watched.cmp(&a.last_watched));
                entries
            }
            Err(e) => {
                warn!(
                    "Watch history corruption detected under {}: {}. Treating as empty.",
                    key, e
                );
                Vec::new()
            }
        }
    }

    fn save(&self, entries: &[WatchEntry]) -> bool {
        let json = match serde_json::to_string(entries) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize watch history: {}", e);
                return false;
            }
        };

        match self.storage.set(&self.settings.storage_key, &json) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to write watch history ({} entries): {}", entries.len(), e);
                false
            }
        }
    }
}
