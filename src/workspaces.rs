use std::sync::Arc;

use log::{info, warn};
use tokio::sync::Mutex;

use crate::{
    api::{ApiError, AtlasApi, Membership, Workspace},
    context::ClientContext,
};

const LOAD_FAILED: &str = "Unable to load workspaces";
const CREATE_FAILED: &str = "Unable to create workspace";

#[derive(thiserror::Error, Debug)]
pub enum WorkspaceError {
    #[error("Workspace name is required")]
    EmptyName,
    #[error("{message}")]
    Api {
        message: String,
        #[source]
        source: ApiError,
    },
}

#[derive(Debug, Clone, Default)]
pub struct DirectoryState {
    pub memberships: Vec<Membership>,
    pub loading: bool,
    pub error: Option<String>,
}

/// The signed-in user's workspaces and the switch between them.
pub struct WorkspaceDirectory<A: AtlasApi> {
    api: Arc<A>,
    context: ClientContext,
    state: Arc<Mutex<DirectoryState>>,
}

impl<A: AtlasApi> WorkspaceDirectory<A> {
    pub fn new(api: Arc<A>, context: ClientContext) -> Self {
        Self {
            api,
            context,
            state: Arc::new(Mutex::new(DirectoryState::default())),
        }
    }

    pub async fn get_state(&self) -> DirectoryState {
        self.state.lock().await.clone()
    }

    pub async fn refresh(&self) -> Result<Vec<Membership>, WorkspaceError> {
        {
            let mut state = self.state.lock().await;
            state.loading = true;
            state.error = None;
        }

        let result = self.api.list_memberships().await;

        let mut state = self.state.lock().await;
        state.loading = false;
        match result {
            Ok(memberships) => {
                info!("Loaded {} workspace memberships", memberships.len());
                state.memberships = memberships.clone();
                Ok(memberships)
            }
            Err(source) => {
                warn!("Failed to load workspaces: {}", source);
                let message = source.user_message(LOAD_FAILED);
                state.error = Some(message.clone());
                Err(WorkspaceError::Api { message, source })
            }
        }
    }

    /// Makes `workspace_id` the active workspace for every page.
    pub fn select(&self, workspace_id: i64) {
        self.context.workspace.store(workspace_id);
        info!("Selected workspace {}", workspace_id);
    }

    pub fn selected(&self) -> Option<i64> {
        self.context.workspace.workspace_id()
    }

    /// Creates a workspace, reloads the list and switches to the new one.
    pub async fn create(&self, name: &str) -> Result<Workspace, WorkspaceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WorkspaceError::EmptyName);
        }

        let workspace = self.api.create_workspace(name).await.map_err(|source| {
            warn!("Failed to create workspace '{}': {}", name, source);
            WorkspaceError::Api {
                message: source.user_message(CREATE_FAILED),
                source,
            }
        })?;

        info!("Created workspace {} ({})", workspace.name, workspace.id);
        if let Err(err) = self.refresh().await {
            warn!("Workspace list is stale after create: {}", err);
        }
        self.select(workspace.id);
        Ok(workspace)
    }
}
