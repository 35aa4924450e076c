use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::media::MediaKind;

/// One persisted record of playback progress for a single media item.
///
/// The serialized field names are the durable format shared with the web
/// gallery, so they stay camelCase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchEntry {
    pub id: String, // Storage path of the media item
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub image: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub current_time: f64,
    pub duration: f64,
    pub percentage: f64,
    pub last_watched: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

impl WatchEntry {
    /// Build an entry from a player report, stamping it with `watched_at`.
    pub fn from_report(report: &ProgressReport, watched_at: DateTime<Utc>) -> Self {
        Self {
            id: report.id.clone(),
            title: report.title.clone(),
            url: report.url.clone(),
            image: report.image.clone(),
            kind: report.kind.clone(),
            current_time: report.current_time,
            duration: report.duration,
            percentage: report.percentage(),
            last_watched: watched_at,
            folder: report.folder.clone(),
            year: report.year.clone(),
        }
    }
}

/// A playback position tick as reported by a player.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressReport {
    pub id: String,
    pub title: String,
    pub url: String,
    pub image: String,
    pub kind: MediaKind,
    pub current_time: f64,
    pub duration: f64,
    pub folder: Option<String>,
    pub year: Option<String>,
}

impl ProgressReport {
    pub fn new(id: impl Into<String>, title: impl Into<String>, current_time: f64, duration: f64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            current_time,
            duration,
            ..Self::default()
        }
    }

    /// Progress through the item in percent. Zero when the duration is not
    /// yet known.
    pub fn percentage(&self) -> f64 {
        if self.duration > 0.0 && self.duration.is_finite() {
            self.current_time / self.duration * 100.0
        } else {
            0.0
        }
    }

    /// Whether the report carries enough information to be stored at all.
    pub fn is_measurable(&self) -> bool {
        !self.id.trim().is_empty()
            && self.duration.is_finite()
            && self.duration > 0.0
            && self.current_time.is_finite()
            && self.current_time >= 0.0
    }
}

/// Aggregate figures over the retained history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WatchStats {
    pub total_items: usize,
    pub total_watch_time: f64, // Sum of current positions, seconds
    pub average_progress: f64,
}

impl WatchStats {
    pub fn from_entries(entries: &[WatchEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }

        let total_watch_time = entries.iter().map(|e| e.current_time).sum();
        let average_progress =
            entries.iter().map(|e| e.percentage).sum::<f64>() / entries.len() as f64;

        Self {
            total_items: entries.len(),
            total_watch_time,
            average_progress,
        }
    }
}
