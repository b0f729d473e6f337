use std::{sync::Arc, time::Duration, time::Instant};

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::{
    error::ApiError,
    types::{
        CreateModelRequest, CreateWorkspaceRequest, Membership, RecordPage, RecordPayload,
        RecordQuery, RegisterRequest, TokenResponse, UserSummary, Workspace,
    },
    AtlasApi,
};
use crate::{
    context::SessionStore,
    schema::models::{ModelDefinition, RecordRow},
    settings::ClientSettings,
};

/// The single HTTP client every controller talks through.
///
/// Attaches the session's bearer token when one is present and clears the
/// session on any 401 before handing the error back.
#[derive(Clone)]
pub struct ApiGateway {
    base_url: String,
    client: Client,
    session: Arc<SessionStore>,
}

impl ApiGateway {
    pub fn new(settings: &ClientSettings, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        let base_url = settings.api_base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidUrl(settings.api_base_url.clone()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            base_url,
            client,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Maps a failed response to an error, invalidating the session on 401.
    pub(crate) fn status_error(&self, status: StatusCode, body: &str) -> ApiError {
        if status == StatusCode::UNAUTHORIZED {
            warn!("Server rejected credentials; clearing session");
            self.session.clear();
        }
        ApiError::from_response(status.as_u16(), body)
    }

    async fn dispatch(&self, label: &str, request: RequestBuilder) -> Result<Response, ApiError> {
        let started = Instant::now();
        let response = self.authorize(request).send().await?;
        let status = response.status();
        debug!("{} -> {} in {:?}", label, status, started.elapsed());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.status_error(status, &body));
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        label: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.dispatch(label, request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl AtlasApi for ApiGateway {
    async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let request = self
            .client
            .post(self.url("/auth/token"))
            .form(&[("username", email), ("password", password)]);
        self.send_json("POST /auth/token", request).await
    }

    async fn register(&self, email: &str, password: &str) -> Result<UserSummary, ApiError> {
        let request = self
            .client
            .post(self.url("/auth/register"))
            .json(&RegisterRequest { email, password });
        self.send_json("POST /auth/register", request).await
    }

    async fn list_memberships(&self) -> Result<Vec<Membership>, ApiError> {
        let request = self.client.get(self.url("/workspaces/me"));
        self.send_json("GET /workspaces/me", request).await
    }

    async fn create_workspace(&self, name: &str) -> Result<Workspace, ApiError> {
        let request = self
            .client
            .post(self.url("/workspaces"))
            .json(&CreateWorkspaceRequest { name });
        self.send_json("POST /workspaces", request).await
    }

    async fn list_models(&self, workspace_id: i64) -> Result<Vec<ModelDefinition>, ApiError> {
        let request = self
            .client
            .get(self.url("/models"))
            .query(&[("workspace_id", workspace_id)]);
        self.send_json("GET /models", request).await
    }

    async fn create_model(&self, model: &CreateModelRequest) -> Result<ModelDefinition, ApiError> {
        let request = self.client.post(self.url("/models")).json(model);
        self.send_json("POST /models", request).await
    }

    async fn list_records(&self, model_id: i64, query: &RecordQuery) -> Result<RecordPage, ApiError> {
        let request = self
            .client
            .get(self.url(&format!("/models/{model_id}/records")))
            .query(&query.to_query_pairs());
        self.send_json("GET /models/{id}/records", request).await
    }

    async fn create_record(
        &self,
        model_id: i64,
        data: &Map<String, Value>,
    ) -> Result<RecordRow, ApiError> {
        let request = self
            .client
            .post(self.url(&format!("/models/{model_id}/records")))
            .json(&RecordPayload { data });
        self.send_json("POST /models/{id}/records", request).await
    }

    async fn update_record(
        &self,
        record_id: i64,
        data: &Map<String, Value>,
    ) -> Result<RecordRow, ApiError> {
        let request = self
            .client
            .put(self.url(&format!("/records/{record_id}")))
            .json(&RecordPayload { data });
        self.send_json("PUT /records/{id}", request).await
    }

    async fn delete_record(&self, record_id: i64) -> Result<(), ApiError> {
        let request = self.client.delete(self.url(&format!("/records/{record_id}")));
        self.dispatch("DELETE /records/{id}", request).await?;
        Ok(())
    }
}
