pub mod error;
pub mod gateway;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use error::{ApiError, FieldIssue};
pub use gateway::ApiGateway;
pub use types::{
    CreateFieldRequest, CreateModelRequest, FieldConfig, Membership, RecordPage, RecordQuery,
    SortOrder, TokenResponse, UserSummary, Workspace,
};

use crate::schema::models::{ModelDefinition, RecordRow};

/// Remote endpoints used by the controllers.
#[async_trait]
pub trait AtlasApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError>;

    async fn register(&self, email: &str, password: &str) -> Result<UserSummary, ApiError>;

    async fn list_memberships(&self) -> Result<Vec<Membership>, ApiError>;

    async fn create_workspace(&self, name: &str) -> Result<Workspace, ApiError>;

    async fn list_models(&self, workspace_id: i64) -> Result<Vec<ModelDefinition>, ApiError>;

    async fn create_model(&self, model: &CreateModelRequest) -> Result<ModelDefinition, ApiError>;

    async fn list_records(&self, model_id: i64, query: &RecordQuery) -> Result<RecordPage, ApiError>;

    async fn create_record(
        &self,
        model_id: i64,
        data: &Map<String, Value>,
    ) -> Result<RecordRow, ApiError>;

    /// Replaces the record's data with `data` as a whole.
    async fn update_record(
        &self,
        record_id: i64,
        data: &Map<String, Value>,
    ) -> Result<RecordRow, ApiError>;

    async fn delete_record(&self, record_id: i64) -> Result<(), ApiError>;
}
