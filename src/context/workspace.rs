use std::sync::Arc;

use super::{entry::StoredValue, observers::SubscriptionId, storage::KeyValueStorage};

pub const WORKSPACE_KEY: &str = "workspaceId";
pub const DEFAULT_WORKSPACE_ID: i64 = 1;

/// Active workspace. Only positive ids are ever stored.
pub struct WorkspaceStore {
    workspace_id: StoredValue<i64>,
}

fn decode_workspace(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

fn encode_workspace(id: &i64) -> String {
    id.to_string()
}

impl WorkspaceStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            workspace_id: StoredValue::new(WORKSPACE_KEY, storage, decode_workspace, encode_workspace),
        }
    }

    pub fn workspace_id(&self) -> Option<i64> {
        self.workspace_id.get()
    }

    /// Workspace used by page controllers when nothing has been selected yet.
    pub fn current_or_default(&self) -> i64 {
        self.workspace_id().unwrap_or(DEFAULT_WORKSPACE_ID)
    }

    /// Stores `id`, or clears the entry when `id` is not positive.
    pub fn store(&self, id: i64) {
        if id > 0 {
            self.workspace_id.set(id);
        } else {
            self.workspace_id.clear();
        }
    }

    pub fn clear(&self) {
        self.workspace_id.clear();
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(Option<i64>) + Send + Sync + 'static,
    {
        self.workspace_id.subscribe(move |id: &Option<i64>| listener(*id))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.workspace_id.unsubscribe(id)
    }
}

/// Coerces user input into a usable workspace id, falling back to the default.
pub fn normalize_workspace_id(value: i64) -> i64 {
    if value > 0 {
        value
    } else {
        DEFAULT_WORKSPACE_ID
    }
}
