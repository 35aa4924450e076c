pub mod clock;
pub mod error;
pub mod file_storage;
pub mod memory_storage;
pub mod storage;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{StorageError, StorageResult};
pub use file_storage::FileStorage;
pub use memory_storage::MemoryStorage;
pub use storage::{ContextId, StorageBackend, StorageEvent, Subscription};
pub use store::{ProgressStore, RecordOutcome, StoreSettings};
