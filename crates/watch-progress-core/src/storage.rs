use crossbeam_channel::Receiver;
use std::ops::Deref;
use std::sync::{Arc, Weak};
use crate::error::StorageResult;

/// Identifies one execution context (a player window, a process) writing to
/// a shared backend.
pub type ContextId = u64;

/// Notification that a key was changed by another context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub origin: ContextId,
}

/// Receiving end of a change subscription.
///
/// Dereferences to the channel receiver. Dropping it lets the backend forget
/// the subscriber on its next write, whichever context made the write.
#[derive(Debug)]
pub struct Subscription {
    events: Receiver<StorageEvent>,
    alive: Arc<()>,
}

impl Subscription {
    pub fn new(events: Receiver<StorageEvent>) -> Self {
        Self {
            events,
            alive: Arc::new(()),
        }
    }

    /// Handle that stops upgrading once this subscription is dropped.
    pub fn liveness(&self) -> Weak<()> {
        Arc::downgrade(&self.alive)
    }
}

impl Deref for Subscription {
    type Target = Receiver<StorageEvent>;

    fn deref(&self) -> &Self::Target {
        &self.events
    }
}

/// Synchronous key -> string map backing the progress store.
///
/// Writes replace the whole value; there is no compare-and-swap, so two
/// contexts doing read-modify-write on the same key race with last write
/// winning.
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Subscribe to changes made by other contexts. Backends without a
    /// notification channel return `None`.
    fn subscribe(&self) -> Option<Subscription> {
        None
    }
}

impl<T: StorageBackend + ?Sized> StorageBackend for Arc<T> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }

    fn subscribe(&self) -> Option<Subscription> {
        (**self).subscribe()
    }
}

/// Keys double as file names, so only a conservative character set is allowed.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
