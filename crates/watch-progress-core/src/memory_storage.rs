use crossbeam_channel::{unbounded, Sender};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::{debug, trace};
use crate::error::{StorageError, StorageResult};
use crate::storage::{ContextId, StorageBackend, StorageEvent, Subscription};

/// Default capacity, matching the usual per-origin browser quota.
pub const DEFAULT_CAPACITY_BYTES: usize = 5 * 1024 * 1024;

struct Subscriber {
    context: ContextId,
    sender: Sender<StorageEvent>,
    liveness: Weak<()>,
}

struct Shared {
    values: HashMap<String, String>,
    subscribers: Vec<Subscriber>,
    capacity: usize,
    available: bool,
}

impl Shared {
    fn used_bytes(&self) -> usize {
        self.values.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    fn notify(&mut self, key: &str, origin: ContextId) {
        let event = StorageEvent {
            key: key.to_string(),
            origin,
        };
        // Dropped subscriptions are pruned here, the writer's own included
        self.subscribers.retain(|subscriber| {
            if subscriber.liveness.strong_count() == 0 {
                return false;
            }
            if subscriber.context == origin {
                return true;
            }
            subscriber.sender.send(event.clone()).is_ok()
        });
    }
}

/// In-memory, capacity-bounded storage shared between contexts.
///
/// Every handle opened with [`MemoryStorage::open_context`] sees the same
/// values. A change made through one handle is announced to subscribers of
/// every other handle, never to the writer's own.
#[derive(Clone)]
pub struct MemoryStorage {
    context: ContextId,
    next_context: Arc<AtomicU64>,
    shared: Arc<Mutex<Shared>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY_BYTES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            context: 0,
            next_context: Arc::new(AtomicU64::new(1)),
            shared: Arc::new(Mutex::new(Shared {
                values: HashMap::new(),
                subscribers: Vec::new(),
                capacity,
                available: true,
            })),
        }
    }

    /// Open another context over the same values.
    pub fn open_context(&self) -> Self {
        let context = self.next_context.fetch_add(1, Ordering::Relaxed);
        debug!("Opened storage context {}", context);
        Self {
            context,
            next_context: Arc::clone(&self.next_context),
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Toggle availability for all contexts; while unavailable every
    /// operation fails.
    pub fn set_available(&self, available: bool) {
        if let Ok(mut shared) = self.shared.lock() {
            shared.available = available;
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.shared.lock().map(|s| s.used_bytes()).unwrap_or(0)
    }

    /// Registered subscriptions across all contexts, live or not yet pruned.
    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().map(|s| s.subscribers.len()).unwrap_or(0)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Shared>> {
        let shared = self
            .shared
            .lock()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;
        if !shared.available {
            return Err(StorageError::Unavailable("storage disabled".to_string()));
        }
        Ok(shared)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let shared = self.lock()?;
        Ok(shared.values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut shared = self.lock()?;

        if shared.values.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }

        let existing = shared.values.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
        let used = shared.used_bytes() - existing;
        let needed = key.len() + value.len();
        let available = shared.capacity.saturating_sub(used);
        if needed > available {
            return Err(StorageError::QuotaExceeded { needed, available });
        }

        shared.values.insert(key.to_string(), value.to_string());
        trace!("Context {} wrote {} bytes to {}", self.context, needed, key);
        shared.notify(key, self.context);
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut shared = self.lock()?;
        if shared.values.remove(key).is_some() {
            shared.notify(key, self.context);
        }
        Ok(())
    }

    fn subscribe(&self) -> Option<Subscription> {
        let (sender, receiver) = unbounded();
        let subscription = Subscription::new(receiver);
        let mut shared = self.shared.lock().ok()?;
        shared.subscribers.push(Subscriber {
            context: self.context,
            sender,
            liveness: subscription.liveness(),
        });
        Some(subscription)
    }
}
