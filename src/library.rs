use std::sync::Arc;

use log::{info, warn};
use tokio::sync::Mutex;

use crate::{
    api::{ApiError, AtlasApi},
    context::{normalize_workspace_id, ClientContext},
    schema::ModelDefinition,
};

const LOAD_FAILED: &str = "Unable to load models for this workspace";

#[derive(Debug, Clone, Default)]
pub struct LibraryState {
    pub workspace_id: i64,
    pub models: Vec<ModelDefinition>,
    pub filter: String,
    pub loading: bool,
    pub error: Option<String>,
}

impl LibraryState {
    /// Models whose name or slug contains the filter, ignoring case.
    pub fn filtered(&self) -> Vec<&ModelDefinition> {
        if self.filter.trim().is_empty() {
            return self.models.iter().collect();
        }
        let needle = self.filter.to_lowercase();
        self.models
            .iter()
            .filter(|model| {
                model.name.to_lowercase().contains(&needle)
                    || model.slug.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

/// Lists the models of the active workspace.
pub struct ModelLibrary<A: AtlasApi> {
    api: Arc<A>,
    context: ClientContext,
    state: Arc<Mutex<LibraryState>>,
}

impl<A: AtlasApi> ModelLibrary<A> {
    pub fn new(api: Arc<A>, context: ClientContext) -> Self {
        let state = LibraryState {
            workspace_id: context.workspace.current_or_default(),
            ..LibraryState::default()
        };
        Self {
            api,
            context,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub async fn get_state(&self) -> LibraryState {
        self.state.lock().await.clone()
    }

    pub async fn set_filter(&self, filter: impl Into<String>) {
        self.state.lock().await.filter = filter.into();
    }

    pub async fn visible_models(&self) -> Vec<ModelDefinition> {
        let state = self.state.lock().await;
        state.filtered().into_iter().cloned().collect()
    }

    pub async fn set_workspace(&self, workspace_id: i64) -> Result<(), ApiError> {
        let workspace_id = normalize_workspace_id(workspace_id);
        self.state.lock().await.workspace_id = workspace_id;
        self.context.workspace.store(workspace_id);
        self.refresh().await
    }

    pub async fn refresh(&self) -> Result<(), ApiError> {
        let workspace_id = {
            let mut state = self.state.lock().await;
            state.loading = true;
            state.error = None;
            state.workspace_id
        };

        let result = self.api.list_models(workspace_id).await;

        let mut state = self.state.lock().await;
        state.loading = false;
        if state.workspace_id != workspace_id {
            return Ok(());
        }
        match result {
            Ok(models) => {
                info!("Workspace {} has {} models", workspace_id, models.len());
                state.models = models;
                Ok(())
            }
            Err(err) => {
                warn!("Failed to list models for workspace {}: {}", workspace_id, err);
                state.error = Some(err.user_message(LOAD_FAILED));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{tickets_model, FakeApi};

    fn library(api: FakeApi) -> (ModelLibrary<FakeApi>, Arc<FakeApi>, ClientContext) {
        let api = Arc::new(api);
        let context = ClientContext::in_memory();
        (ModelLibrary::new(Arc::clone(&api), context.clone()), api, context)
    }

    fn models() -> Vec<ModelDefinition> {
        let mut invoices = tickets_model();
        invoices.id = 8;
        invoices.name = "Invoices".into();
        invoices.slug = "billing-docs".into();
        vec![tickets_model(), invoices]
    }

    #[tokio::test]
    async fn filter_matches_name_or_slug() {
        let api = FakeApi::default();
        *api.models.lock().unwrap() = models();
        let (library, api, _context) = library(api);
        library.refresh().await.expect("refresh");
        assert_eq!(api.model_queries.lock().unwrap().as_slice(), &[1]);

        library.set_filter("BILLING").await;
        let visible = library.visible_models().await;
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Invoices");

        library.set_filter("tick").await;
        assert_eq!(library.visible_models().await[0].slug, "tickets");

        library.set_filter("  ").await;
        assert_eq!(library.visible_models().await.len(), 2);
    }

    #[tokio::test]
    async fn workspace_is_normalised_and_stored() {
        let (library, api, context) = library(FakeApi::default());
        library.set_workspace(0).await.expect("switch");
        library.set_workspace(6).await.expect("switch");
        assert_eq!(api.model_queries.lock().unwrap().as_slice(), &[1, 6]);
        assert_eq!(context.workspace.workspace_id(), Some(6));
    }

    #[tokio::test]
    async fn failure_keeps_previous_models() {
        let api = FakeApi::default();
        *api.models.lock().unwrap() = models();
        let (library, api, _context) = library(api);
        library.refresh().await.expect("refresh");

        api.fail_reads_with(500, "");
        assert!(library.refresh().await.is_err());
        let state = library.get_state().await;
        assert_eq!(state.error.as_deref(), Some(LOAD_FAILED));
        assert_eq!(state.models.len(), 2);
    }
}
