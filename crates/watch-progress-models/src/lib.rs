pub mod media;
pub mod time;
pub mod watch_entry;

pub use media::MediaKind;
pub use time::format_time;
pub use watch_entry::{ProgressReport, WatchEntry, WatchStats};
