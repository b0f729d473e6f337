use std::{collections::BTreeMap, sync::Arc};

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::{runtime::Handle, sync::Mutex};

use super::{
    state::{EditDraft, FormDraft, ListParams, ListState, ListStatus},
    RecordsError,
};
use crate::{
    api::{ApiError, AtlasApi, SortOrder},
    context::{normalize_workspace_id, ClientContext, SubscriptionId},
    fields::{validate_record_data, FieldRenderer, InputControl, InputEvent},
    schema::{ModelDefinition, RecordRow},
    settings::ClientSettings,
};

type Result<T> = std::result::Result<T, RecordsError>;

const MODEL_NOT_FOUND: &str = "Model not found for this workspace";
const MODEL_LOAD_FAILED: &str = "Unable to load model definition";
const LOAD_FAILED: &str = "Unable to load records";
const CREATE_FAILED: &str = "Unable to create record";
const UPDATE_FAILED: &str = "Unable to update record";
const DELETE_FAILED: &str = "Unable to delete record";

pub const DEFAULT_SORT_FIELD: &str = "created_at";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct UsageEstimate {
    pub used: u64,
    pub limit: u64,
}

impl UsageEstimate {
    pub fn is_over_limit(&self) -> bool {
        self.used > self.limit
    }
}

/// Read-only view of the list for rendering.
#[derive(Debug, Clone)]
pub struct ListSnapshot {
    pub status: ListStatus,
    pub model: Option<ModelDefinition>,
    /// Rows of the current page that pass the local search.
    pub rows: Vec<RecordRow>,
    pub loaded_rows: usize,
    pub params: ListParams,
    pub has_more: bool,
    pub search: String,
    pub error: Option<String>,
    pub usage: UsageEstimate,
    pub create_open: bool,
    pub create: FormDraft,
    pub editing: Option<EditDraft>,
}

#[derive(Clone, Copy)]
enum Form {
    Create,
    Edit,
}

/// Drives one model's record list: model lookup, paging, sorting, filtering,
/// local search and the create/edit/delete flows.
pub struct RecordListController<A: AtlasApi> {
    api: Arc<A>,
    context: ClientContext,
    renderer: FieldRenderer,
    state: Arc<Mutex<ListState>>,
    page_size_options: Vec<u32>,
    plan_record_limit: u64,
}

impl<A: AtlasApi> Clone for RecordListController<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            context: self.context.clone(),
            renderer: self.renderer.clone(),
            state: Arc::clone(&self.state),
            page_size_options: self.page_size_options.clone(),
            plan_record_limit: self.plan_record_limit,
        }
    }
}

impl<A: AtlasApi + 'static> RecordListController<A> {
    pub fn new(api: Arc<A>, context: ClientContext, settings: &ClientSettings) -> Self {
        let params = ListParams {
            workspace_id: context.workspace.current_or_default(),
            page: 0,
            page_size: settings.default_page_size.max(1),
            sort_by: Some(DEFAULT_SORT_FIELD.to_string()),
            sort_order: SortOrder::Desc,
            filter_key: None,
            filter_value: None,
        };

        Self {
            api,
            context,
            renderer: FieldRenderer::new(settings.display.clone()),
            state: Arc::new(Mutex::new(ListState::new(params))),
            page_size_options: settings.page_size_options.clone(),
            plan_record_limit: settings.plan_record_limit,
        }
    }

    pub fn renderer(&self) -> &FieldRenderer {
        &self.renderer
    }

    pub fn page_size_options(&self) -> &[u32] {
        &self.page_size_options
    }

    pub async fn get_state(&self) -> ListState {
        self.state.lock().await.clone()
    }

    pub async fn snapshot(&self) -> ListSnapshot {
        let state = self.state.lock().await;
        ListSnapshot {
            status: state.status,
            model: state.model.clone(),
            rows: state.visible_rows().into_iter().cloned().collect(),
            loaded_rows: state.rows.len(),
            params: state.params.clone(),
            has_more: state.has_more,
            search: state.search.clone(),
            error: state.error.clone(),
            usage: UsageEstimate {
                used: state.usage_used(),
                limit: self.plan_record_limit,
            },
            create_open: state.create_open,
            create: state.create.clone(),
            editing: state.editing.clone(),
        }
    }

    /// Resolves `slug` in the active workspace and loads its first page.
    /// The workspace is re-read from the shared context on every call.
    pub async fn open(&self, slug: &str) -> Result<()> {
        let workspace_id = self.context.workspace.current_or_default();
        {
            let mut state = self.state.lock().await;
            state.model_slug = Some(slug.to_string());
            state.params.workspace_id = workspace_id;
            state.params.page = 0;
        }
        self.load_model().await
    }

    async fn load_model(&self) -> Result<()> {
        let (lookup, workspace_id, slug) = {
            let mut state = self.state.lock().await;
            let Some(slug) = state.model_slug.clone() else {
                return Ok(());
            };
            (state.begin_model_lookup(), state.params.workspace_id, slug)
        };

        let result = self.api.list_models(workspace_id).await;

        {
            let mut state = self.state.lock().await;
            if state.model_generation != lookup {
                debug!("Discarding stale model lookup for '{}'", slug);
                return Ok(());
            }

            match result {
                Ok(models) => match models.into_iter().find(|model| model.slug == slug) {
                    Some(model) => {
                        info!(
                            "Loaded model '{}' ({} fields) in workspace {}",
                            model.slug,
                            model.fields.len(),
                            workspace_id
                        );
                        state.model = Some(model);
                    }
                    None => {
                        warn!("Model '{}' not found in workspace {}", slug, workspace_id);
                        state.model = None;
                        state.rows.clear();
                        state.has_more = false;
                        state.total = None;
                        state.editing = None;
                        state.fail(MODEL_NOT_FOUND.to_string());
                        return Err(RecordsError::ModelNotFound(MODEL_NOT_FOUND.to_string()));
                    }
                },
                Err(err) => {
                    warn!("Failed to load models for workspace {}: {}", workspace_id, err);
                    state.fail(err.user_message(MODEL_LOAD_FAILED));
                    return Err(err.into());
                }
            }
        }

        self.fetch_current().await
    }

    /// Requests the page described by the current params. A response that
    /// arrives after a newer request was issued is dropped.
    async fn fetch_current(&self) -> Result<()> {
        let (generation, model_id, query) = {
            let mut state = self.state.lock().await;
            let Some(model_id) = state.model.as_ref().map(|model| model.id) else {
                debug!("No model loaded; skipping records fetch");
                return Ok(());
            };
            let (generation, query) = state.begin_fetch();
            (generation, model_id, query)
        };

        let result = self.api.list_records(model_id, &query).await;

        let mut state = self.state.lock().await;
        if !state.is_current(generation) {
            debug!("Discarding stale records response (skip {})", query.skip);
            return Ok(());
        }

        match result {
            Ok(page) => {
                debug!(
                    "Loaded {} records for model {} (skip {}, limit {})",
                    page.items.len(),
                    model_id,
                    query.skip,
                    query.limit
                );
                state.apply_page(page);
                Ok(())
            }
            Err(err) => {
                warn!("Failed to load records for model {}: {}", model_id, err);
                state.fail(err.user_message(LOAD_FAILED));
                Err(err.into())
            }
        }
    }

    /// Applies `change` to the params; fetches only when something changed.
    async fn change_params<F>(&self, reset_page: bool, change: F) -> Result<()>
    where
        F: FnOnce(&mut ListParams),
    {
        {
            let mut state = self.state.lock().await;
            let before = state.params.clone();
            change(&mut state.params);
            if state.params == before {
                return Ok(());
            }
            if reset_page {
                state.params.page = 0;
            }
        }
        self.fetch_current().await
    }

    /// Re-requests the page currently shown. The page index is kept.
    pub async fn refresh(&self) -> Result<()> {
        self.fetch_current().await
    }

    pub async fn set_sort(&self, sort_by: Option<String>, sort_order: SortOrder) -> Result<()> {
        let sort_by = sort_by.filter(|key| !key.trim().is_empty());
        self.change_params(true, |params| {
            params.sort_by = sort_by;
            params.sort_order = sort_order;
        })
        .await
    }

    pub async fn set_filter(&self, key: Option<String>, value: Option<Value>) -> Result<()> {
        let key = key.filter(|key| !key.trim().is_empty());
        self.change_params(true, |params| {
            params.filter_key = key;
            params.filter_value = value;
        })
        .await
    }

    /// Decodes `event` with the filter field's input rules, then filters on it.
    pub async fn set_filter_input(&self, key: &str, event: InputEvent) -> Result<()> {
        let field = self.model_field(key).await?;
        let value = self
            .renderer
            .decode_input(&field, event)
            .map_err(|source| RecordsError::Input {
                slug: key.to_string(),
                source,
            })?;
        self.set_filter(Some(key.to_string()), Some(value)).await
    }

    pub async fn clear_filter(&self) -> Result<()> {
        self.set_filter(None, None).await
    }

    pub async fn set_page_size(&self, page_size: u32) -> Result<()> {
        let page_size = page_size.max(1);
        self.change_params(true, |params| params.page_size = page_size)
            .await
    }

    pub async fn set_page(&self, page: u64) -> Result<()> {
        self.change_params(false, |params| params.page = page).await
    }

    pub async fn next_page(&self) -> Result<()> {
        let page = {
            let state = self.state.lock().await;
            if !state.has_more {
                return Ok(());
            }
            state.params.page.saturating_add(1)
        };
        self.set_page(page).await
    }

    pub async fn previous_page(&self) -> Result<()> {
        let page = self.state.lock().await.params.page;
        if page == 0 {
            return Ok(());
        }
        self.set_page(page - 1).await
    }

    /// Switches the active workspace, persists it and reloads the model.
    pub async fn set_workspace(&self, workspace_id: i64) -> Result<()> {
        let workspace_id = normalize_workspace_id(workspace_id);
        let changed = {
            let mut state = self.state.lock().await;
            let changed = state.params.workspace_id != workspace_id;
            state.params.workspace_id = workspace_id;
            if changed {
                state.params.page = 0;
            }
            changed
        };
        if self.context.workspace.workspace_id() != Some(workspace_id) {
            self.context.workspace.store(workspace_id);
        }
        if changed {
            info!("Switched record list to workspace {}", workspace_id);
            self.load_model().await?;
        }
        Ok(())
    }

    /// Follows workspace changes made elsewhere through the shared context.
    /// Requires a running tokio runtime when the change fires.
    pub fn watch_workspace(&self) -> SubscriptionId {
        let controller = self.clone();
        self.context.workspace.subscribe(move |id| {
            let Some(id) = id else {
                return;
            };
            let Ok(handle) = Handle::try_current() else {
                warn!("Workspace changed to {} outside a runtime; not reloading", id);
                return;
            };
            let controller = controller.clone();
            handle.spawn(async move {
                if let Err(err) = controller.set_workspace(id).await {
                    warn!("Reload after workspace change failed: {}", err);
                }
            });
        })
    }

    pub async fn set_search(&self, search: impl Into<String>) {
        self.state.lock().await.search = search.into();
    }

    pub async fn visible_rows(&self) -> Vec<RecordRow> {
        let state = self.state.lock().await;
        state.visible_rows().into_iter().cloned().collect()
    }

    /// Display strings for `row`, one per model field in definition order.
    pub async fn display_row(&self, row: &RecordRow) -> Vec<String> {
        let state = self.state.lock().await;
        match state.model.as_ref() {
            Some(model) => model
                .fields
                .iter()
                .map(|field| self.renderer.format_display(row.data.get(&field.slug), field))
                .collect(),
            None => Vec::new(),
        }
    }

    /// `created_at`, `updated_at` and the model's field slugs.
    pub async fn sort_choices(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let mut choices = vec![DEFAULT_SORT_FIELD.to_string(), "updated_at".to_string()];
        if let Some(model) = state.model.as_ref() {
            choices.extend(model.fields.iter().map(|field| field.slug.clone()));
        }
        choices
    }

    async fn model_field(&self, slug: &str) -> Result<crate::schema::FieldDefinition> {
        let state = self.state.lock().await;
        let model = state.model.as_ref().ok_or(RecordsError::NoModel)?;
        model
            .field(slug)
            .cloned()
            .ok_or_else(|| RecordsError::UnknownField(slug.to_string()))
    }

    // ---- create ----

    pub async fn toggle_create_form(&self) -> bool {
        let mut state = self.state.lock().await;
        state.create_open = !state.create_open;
        state.create_open
    }

    /// Controls for the create form, in field order.
    pub async fn create_inputs(&self) -> Result<Vec<(String, InputControl)>> {
        let state = self.state.lock().await;
        let model = state.model.as_ref().ok_or(RecordsError::NoModel)?;
        Ok(self.inputs_for(model, &state.create.data))
    }

    pub async fn edit_inputs(&self) -> Result<Vec<(String, InputControl)>> {
        let state = self.state.lock().await;
        let model = state.model.as_ref().ok_or(RecordsError::NoModel)?;
        let editing = state.editing.as_ref().ok_or(RecordsError::NotEditing)?;
        Ok(self.inputs_for(model, &editing.form.data))
    }

    fn inputs_for(
        &self,
        model: &ModelDefinition,
        data: &Map<String, Value>,
    ) -> Vec<(String, InputControl)> {
        model
            .fields
            .iter()
            .map(|field| {
                (
                    field.slug.clone(),
                    self.renderer.render_input(field, data.get(&field.slug)),
                )
            })
            .collect()
    }

    pub async fn set_draft_input(&self, slug: &str, event: InputEvent) -> Result<()> {
        self.apply_input(Form::Create, slug, event).await
    }

    pub async fn set_edit_input(&self, slug: &str, event: InputEvent) -> Result<()> {
        self.apply_input(Form::Edit, slug, event).await
    }

    async fn apply_input(&self, form: Form, slug: &str, event: InputEvent) -> Result<()> {
        let mut state = self.state.lock().await;
        let field = state
            .model
            .as_ref()
            .ok_or(RecordsError::NoModel)?
            .field(slug)
            .cloned()
            .ok_or_else(|| RecordsError::UnknownField(slug.to_string()))?;

        let draft = match form {
            Form::Create => &mut state.create,
            Form::Edit => match state.editing.as_mut() {
                Some(editing) => &mut editing.form,
                None => return Err(RecordsError::NotEditing),
            },
        };

        match self.renderer.decode_input(&field, event) {
            Ok(Value::Null) => {
                // Cleared input; the server rejects explicit nulls.
                draft.data.remove(slug);
                draft.errors.remove(slug);
                Ok(())
            }
            Ok(value) => {
                draft.data.insert(slug.to_string(), value);
                draft.errors.remove(slug);
                Ok(())
            }
            Err(source) => {
                draft.errors.insert(slug.to_string(), source.to_string());
                Err(RecordsError::Input {
                    slug: slug.to_string(),
                    source,
                })
            }
        }
    }

    /// Validates the create draft, posts it and reloads the first page.
    pub async fn submit_create(&self) -> Result<()> {
        let (model_id, data) = {
            let mut state = self.state.lock().await;
            if !state.create_open {
                return Err(RecordsError::FormClosed);
            }
            let model = state.model.as_ref().ok_or(RecordsError::NoModel)?;
            let model_id = model.id;
            let errors = validate_record_data(model, &state.create.data);
            if !errors.is_empty() {
                state.create.errors = errors.clone();
                return Err(RecordsError::Validation(errors));
            }
            (model_id, state.create.data.clone())
        };

        match self.api.create_record(model_id, &data).await {
            Ok(created) => {
                info!("Created record {} in model {}", created.id, model_id);
                {
                    let mut state = self.state.lock().await;
                    state.create = FormDraft::default();
                    state.create_open = false;
                    state.params.page = 0;
                }
                self.fetch_current().await
            }
            Err(err) => {
                warn!("Failed to create record in model {}: {}", model_id, err);
                let mut state = self.state.lock().await;
                state.create.errors.extend(issue_map(&err));
                state.fail(err.user_message(CREATE_FAILED));
                Err(err.into())
            }
        }
    }

    // ---- edit ----

    /// Starts editing a loaded row; any other edit in progress is discarded.
    pub async fn begin_edit(&self, record_id: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        let row = state
            .rows
            .iter()
            .find(|row| row.id == record_id)
            .ok_or(RecordsError::RecordNotLoaded(record_id))?;
        let draft = EditDraft {
            record_id,
            form: FormDraft {
                data: row.data.clone(),
                errors: BTreeMap::new(),
            },
        };
        if let Some(previous) = state.editing.replace(draft) {
            if previous.record_id != record_id {
                debug!("Discarded edit draft for record {}", previous.record_id);
            }
        }
        Ok(())
    }

    pub async fn cancel_edit(&self) {
        self.state.lock().await.editing = None;
    }

    /// Sends the whole edit draft and reloads the current page.
    pub async fn save_edit(&self) -> Result<()> {
        let (record_id, data) = {
            let mut state = self.state.lock().await;
            let model = state.model.clone().ok_or(RecordsError::NoModel)?;
            let editing = state.editing.as_mut().ok_or(RecordsError::NotEditing)?;
            let errors = validate_record_data(&model, &editing.form.data);
            if !errors.is_empty() {
                editing.form.errors = errors.clone();
                return Err(RecordsError::Validation(errors));
            }
            (editing.record_id, editing.form.data.clone())
        };

        match self.api.update_record(record_id, &data).await {
            Ok(_) => {
                info!("Updated record {}", record_id);
                {
                    let mut state = self.state.lock().await;
                    if state.editing.as_ref().map(|e| e.record_id) == Some(record_id) {
                        state.editing = None;
                    }
                }
                self.fetch_current().await
            }
            Err(err) => {
                warn!("Failed to update record {}: {}", record_id, err);
                let mut state = self.state.lock().await;
                let issues = issue_map(&err);
                if let Some(editing) = state.editing.as_mut() {
                    editing.form.errors.extend(issues);
                }
                state.fail(err.user_message(UPDATE_FAILED));
                Err(err.into())
            }
        }
    }

    // ---- delete ----

    pub async fn delete_record(&self, record_id: i64) -> Result<()> {
        match self.api.delete_record(record_id).await {
            Ok(()) => {
                info!("Deleted record {}", record_id);
                {
                    let mut state = self.state.lock().await;
                    if state.editing.as_ref().map(|e| e.record_id) == Some(record_id) {
                        state.editing = None;
                    }
                }
                self.fetch_current().await
            }
            Err(err) => {
                warn!("Failed to delete record {}: {}", record_id, err);
                self.state
                    .lock()
                    .await
                    .fail(err.user_message(DELETE_FAILED));
                Err(err.into())
            }
        }
    }
}

fn issue_map(err: &ApiError) -> BTreeMap<String, String> {
    match err {
        ApiError::Validation(issues) => issues
            .iter()
            .map(|issue| (issue.field.clone(), issue.error.clone()))
            .collect(),
        _ => BTreeMap::new(),
    }
}
