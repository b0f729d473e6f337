use std::sync::Arc;

use log::{info, warn};

use crate::{
    api::{ApiError, AtlasApi},
    context::ClientContext,
    schema::{
        normalize_slug, validate_model, DataType, FieldDraft, ModelDefinition, ModelDraft,
        ModelErrors,
    },
};

const CREATE_FAILED: &str = "Failed to create model";

#[derive(thiserror::Error, Debug)]
pub enum BuilderError {
    #[error("the model definition has errors")]
    Invalid(ModelErrors),
    #[error("{message}")]
    Api {
        message: String,
        #[source]
        source: ApiError,
    },
}

/// State behind the "new model" form. Every edit clears the last success or
/// server-error message; validation is recomputed on demand.
pub struct ModelBuilder<A: AtlasApi> {
    api: Arc<A>,
    context: ClientContext,
    draft: ModelDraft,
    success_message: Option<String>,
    server_error: Option<String>,
}

impl<A: AtlasApi> ModelBuilder<A> {
    pub fn new(api: Arc<A>, context: ClientContext) -> Self {
        let draft = ModelDraft {
            name: "Tickets".into(),
            slug: "tickets".into(),
            workspace_id: context.workspace.current_or_default(),
            fields: vec![FieldDraft {
                name: "Title".into(),
                slug: "title".into(),
                is_required: true,
                ..FieldDraft::default()
            }],
        };

        Self {
            api,
            context,
            draft,
            success_message: None,
            server_error: None,
        }
    }

    pub fn field_types() -> &'static [DataType] {
        &DataType::BUILTIN
    }

    pub fn draft(&self) -> &ModelDraft {
        &self.draft
    }

    pub fn success_message(&self) -> Option<&str> {
        self.success_message.as_deref()
    }

    pub fn server_error(&self) -> Option<&str> {
        self.server_error.as_deref()
    }

    fn touch(&mut self) {
        self.success_message = None;
        self.server_error = None;
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
        self.touch();
    }

    pub fn set_slug(&mut self, slug: &str) {
        self.draft.slug = normalize_slug(slug);
        self.touch();
    }

    pub fn set_workspace_id(&mut self, workspace_id: i64) {
        self.draft.workspace_id = workspace_id;
        self.touch();
    }

    pub fn add_field(&mut self) -> usize {
        self.draft.fields.push(FieldDraft::default());
        self.touch();
        self.draft.fields.len() - 1
    }

    /// Applies `edit` to the field at `index`; false when there is no such field.
    pub fn update_field<F>(&mut self, index: usize, edit: F) -> bool
    where
        F: FnOnce(&mut FieldDraft),
    {
        let Some(field) = self.draft.fields.get_mut(index) else {
            return false;
        };
        edit(field);
        self.touch();
        true
    }

    pub fn set_field_slug(&mut self, index: usize, slug: &str) -> bool {
        let slug = normalize_slug(slug);
        self.update_field(index, |field| field.slug = slug)
    }

    pub fn remove_field(&mut self, index: usize) -> Option<FieldDraft> {
        if index >= self.draft.fields.len() {
            return None;
        }
        let removed = self.draft.fields.remove(index);
        self.touch();
        Some(removed)
    }

    pub fn errors(&self) -> ModelErrors {
        validate_model(&self.draft)
    }

    pub fn is_valid(&self) -> bool {
        self.errors().is_valid()
    }

    /// Posts the draft when it validates. Nothing is sent otherwise.
    pub async fn submit(&mut self) -> Result<ModelDefinition, BuilderError> {
        let errors = self.errors();
        if !errors.is_valid() {
            return Err(BuilderError::Invalid(errors));
        }

        self.touch();
        let request = self.draft.to_request();
        match self.api.create_model(&request).await {
            Ok(model) => {
                info!(
                    "Created model '{}' with {} fields in workspace {}",
                    model.slug,
                    request.fields.len(),
                    request.workspace_id
                );
                self.success_message = Some(format!("Model created: {}", model.name));
                self.context.workspace.store(request.workspace_id);
                Ok(model)
            }
            Err(source) => {
                warn!("Failed to create model '{}': {}", request.slug, source);
                let message = source.user_message(CREATE_FAILED);
                self.server_error = Some(message.clone());
                Err(BuilderError::Api { message, source })
            }
        }
    }
}
