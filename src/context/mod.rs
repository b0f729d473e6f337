pub mod entry;
pub mod observers;
pub mod session;
pub mod storage;
pub mod workspace;

use anyhow::Result;
use std::sync::Arc;

pub use observers::SubscriptionId;
pub use session::SessionStore;
pub use storage::{JsonFileStorage, KeyValueStorage, MemoryStorage};
pub use workspace::{normalize_workspace_id, WorkspaceStore, DEFAULT_WORKSPACE_ID};

use crate::settings::ClientSettings;

/// Session and workspace caches shared by the gateway and every controller.
#[derive(Clone)]
pub struct ClientContext {
    pub session: Arc<SessionStore>,
    pub workspace: Arc<WorkspaceStore>,
}

impl ClientContext {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            session: Arc::new(SessionStore::new(storage.clone())),
            workspace: Arc::new(WorkspaceStore::new(storage)),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        match &settings.storage_path {
            Some(path) => Ok(Self::new(Arc::new(JsonFileStorage::new(path.clone())?))),
            None => Ok(Self::in_memory()),
        }
    }
}
