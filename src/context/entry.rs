use log::warn;
use std::sync::{Arc, RwLock};

use super::{
    observers::{Observers, SubscriptionId},
    storage::KeyValueStorage,
};

struct EntryState<T> {
    value: Option<T>,
    loaded: bool,
}

/// One persisted value with a read-through cache loaded at most once per process.
///
/// Writes update the cache first, then storage, then fan out to observers.
/// A storage failure is logged and never blocks the in-memory update.
pub struct StoredValue<T> {
    key: &'static str,
    storage: Arc<dyn KeyValueStorage>,
    state: RwLock<EntryState<T>>,
    observers: Observers<Option<T>>,
    decode: fn(&str) -> Option<T>,
    encode: fn(&T) -> String,
}

impl<T> StoredValue<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(
        key: &'static str,
        storage: Arc<dyn KeyValueStorage>,
        decode: fn(&str) -> Option<T>,
        encode: fn(&T) -> String,
    ) -> Self {
        Self {
            key,
            storage,
            state: RwLock::new(EntryState {
                value: None,
                loaded: false,
            }),
            observers: Observers::default(),
            decode,
            encode,
        }
    }

    pub fn get(&self) -> Option<T> {
        {
            let guard = self.state.read().unwrap_or_else(|e| e.into_inner());
            if guard.loaded {
                return guard.value.clone();
            }
        }

        let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
        if !guard.loaded {
            guard.loaded = true;
            guard.value = match self.storage.get(self.key) {
                Ok(raw) => raw.as_deref().and_then(self.decode),
                Err(err) => {
                    warn!("Failed to load '{}' from storage: {:#}", self.key, err);
                    None
                }
            };
        }
        guard.value.clone()
    }

    pub fn set(&self, value: T) {
        {
            let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
            guard.value = Some(value.clone());
            guard.loaded = true;
        }
        if let Err(err) = self.storage.set(self.key, &(self.encode)(&value)) {
            warn!("Failed to persist '{}': {:#}", self.key, err);
        }
        self.observers.notify(&Some(value));
    }

    pub fn clear(&self) {
        {
            let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
            guard.value = None;
            guard.loaded = true;
        }
        if let Err(err) = self.storage.remove(self.key) {
            warn!("Failed to remove '{}' from storage: {:#}", self.key, err);
        }
        self.observers.notify(&None);
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Option<T>) + Send + Sync + 'static,
    {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }
}
