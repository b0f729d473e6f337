use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Map, Value};
use std::sync::{
    atomic::{AtomicBool, AtomicI64, Ordering},
    Mutex,
};
use tokio::sync::oneshot;

use super::{
    error::ApiError,
    types::{
        CreateModelRequest, Membership, RecordPage, RecordQuery, TokenResponse, UserSummary,
        Workspace,
    },
    AtlasApi,
};
use crate::schema::{
    models::{FieldDefinition, ModelDefinition, RecordRow},
    DataType,
};

type Failure = (u16, String);

/// In-memory stand-in for the remote API that records every call.
pub struct FakeApi {
    pub models: Mutex<Vec<ModelDefinition>>,
    pub records: Mutex<Vec<RecordRow>>,
    pub memberships: Mutex<Vec<Membership>>,
    pub record_queries: Mutex<Vec<(i64, RecordQuery)>>,
    pub model_queries: Mutex<Vec<i64>>,
    pub created_models: Mutex<Vec<CreateModelRequest>>,
    pub created: Mutex<Vec<(i64, Map<String, Value>)>>,
    pub updated: Mutex<Vec<(i64, Map<String, Value>)>>,
    pub deleted: Mutex<Vec<i64>>,
    pub created_workspaces: Mutex<Vec<String>>,
    pub fail_reads: Mutex<Option<Failure>>,
    pub fail_writes: Mutex<Option<Failure>>,
    pub paginated: AtomicBool,
    /// When set, the next `list_records` call waits for this signal before answering.
    pub hold_next_list: Mutex<Option<oneshot::Receiver<()>>>,
    next_id: AtomicI64,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            models: Mutex::new(Vec::new()),
            records: Mutex::new(Vec::new()),
            memberships: Mutex::new(Vec::new()),
            record_queries: Mutex::new(Vec::new()),
            model_queries: Mutex::new(Vec::new()),
            created_models: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            updated: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            created_workspaces: Mutex::new(Vec::new()),
            fail_reads: Mutex::new(None),
            fail_writes: Mutex::new(None),
            paginated: AtomicBool::new(false),
            hold_next_list: Mutex::new(None),
            next_id: AtomicI64::new(1000),
        }
    }
}

pub fn field(slug: &str, data_type: DataType) -> FieldDefinition {
    let mut name = slug.to_string();
    if let Some(first) = name.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    FieldDefinition {
        id: 0,
        name,
        slug: slug.to_string(),
        data_type,
        is_required: false,
        is_unique: false,
        options: Vec::new(),
    }
}

pub fn tickets_model() -> ModelDefinition {
    let mut title = field("title", DataType::String);
    title.id = 1;
    title.is_required = true;
    let mut status = field("status", DataType::Enum);
    status.id = 2;
    status.options = vec!["Open".into(), "Closed".into()];
    let mut done = field("done", DataType::Boolean);
    done.id = 3;

    ModelDefinition {
        id: 7,
        name: "Tickets".into(),
        slug: "tickets".into(),
        description: None,
        fields: vec![title, status, done],
        created_at: None,
    }
}

pub fn row(id: i64, data: Value) -> RecordRow {
    let stamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    RecordRow {
        id,
        data: data.as_object().cloned().unwrap_or_default(),
        created_at: stamp,
        updated_at: stamp,
    }
}

pub fn ticket_rows(count: i64) -> Vec<RecordRow> {
    (1..=count)
        .map(|id| row(id, json!({ "title": format!("Ticket {id}"), "status": "Open" })))
        .collect()
}

impl FakeApi {
    pub fn with_tickets(count: i64) -> Self {
        let api = Self::default();
        *api.models.lock().unwrap() = vec![tickets_model()];
        *api.records.lock().unwrap() = ticket_rows(count);
        api
    }

    pub fn last_query(&self) -> Option<RecordQuery> {
        self.record_queries
            .lock()
            .unwrap()
            .last()
            .map(|(_, query)| query.clone())
    }

    pub fn query_count(&self) -> usize {
        self.record_queries.lock().unwrap().len()
    }

    pub fn fail_reads_with(&self, status: u16, body: &str) {
        *self.fail_reads.lock().unwrap() = Some((status, body.to_string()));
    }

    pub fn fail_writes_with(&self, status: u16, body: &str) {
        *self.fail_writes.lock().unwrap() = Some((status, body.to_string()));
    }

    fn read_failure(&self) -> Result<(), ApiError> {
        match self.fail_reads.lock().unwrap().as_ref() {
            Some((status, body)) => Err(ApiError::from_response(*status, body)),
            None => Ok(()),
        }
    }

    fn write_failure(&self) -> Result<(), ApiError> {
        match self.fail_writes.lock().unwrap().as_ref() {
            Some((status, body)) => Err(ApiError::from_response(*status, body)),
            None => Ok(()),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl AtlasApi for FakeApi {
    async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        if password != "secret" {
            return Err(ApiError::from_response(
                401,
                r#"{"detail": "Incorrect username or password"}"#,
            ));
        }
        Ok(TokenResponse {
            access_token: format!("token-for-{email}"),
            token_type: Some("bearer".into()),
        })
    }

    async fn register(&self, email: &str, _password: &str) -> Result<UserSummary, ApiError> {
        self.write_failure()?;
        Ok(UserSummary {
            id: self.next_id(),
            email: email.to_string(),
            created_at: None,
        })
    }

    async fn list_memberships(&self) -> Result<Vec<Membership>, ApiError> {
        self.read_failure()?;
        Ok(self.memberships.lock().unwrap().clone())
    }

    async fn create_workspace(&self, name: &str) -> Result<Workspace, ApiError> {
        self.write_failure()?;
        let workspace = Workspace {
            id: self.next_id(),
            name: name.to_string(),
        };
        self.created_workspaces.lock().unwrap().push(name.to_string());
        self.memberships.lock().unwrap().push(Membership {
            workspace: workspace.clone(),
            role: "owner".into(),
        });
        Ok(workspace)
    }

    async fn list_models(&self, workspace_id: i64) -> Result<Vec<ModelDefinition>, ApiError> {
        self.model_queries.lock().unwrap().push(workspace_id);
        self.read_failure()?;
        Ok(self.models.lock().unwrap().clone())
    }

    async fn create_model(&self, model: &CreateModelRequest) -> Result<ModelDefinition, ApiError> {
        self.write_failure()?;
        self.created_models.lock().unwrap().push(model.clone());
        Ok(ModelDefinition {
            id: self.next_id(),
            name: model.name.clone(),
            slug: model.slug.clone(),
            description: None,
            fields: Vec::new(),
            created_at: None,
        })
    }

    async fn list_records(&self, model_id: i64, query: &RecordQuery) -> Result<RecordPage, ApiError> {
        self.record_queries
            .lock()
            .unwrap()
            .push((model_id, query.clone()));

        let hold = self.hold_next_list.lock().unwrap().take();
        if let Some(release) = hold {
            let _ = release.await;
        }

        self.read_failure()?;

        let all = self.records.lock().unwrap().clone();
        let total = all.len() as u64;
        let items: Vec<RecordRow> = all
            .into_iter()
            .skip(query.skip as usize)
            .take(query.limit as usize)
            .collect();

        if self.paginated.load(Ordering::Relaxed) {
            let has_more = query.skip + (items.len() as u64) < total;
            Ok(RecordPage {
                items,
                total: Some(total),
                has_more: Some(has_more),
            })
        } else {
            Ok(RecordPage::bare(items))
        }
    }

    async fn create_record(
        &self,
        model_id: i64,
        data: &Map<String, Value>,
    ) -> Result<RecordRow, ApiError> {
        self.write_failure()?;
        self.created.lock().unwrap().push((model_id, data.clone()));
        let created = row(self.next_id(), Value::Object(data.clone()));
        self.records.lock().unwrap().insert(0, created.clone());
        Ok(created)
    }

    async fn update_record(
        &self,
        record_id: i64,
        data: &Map<String, Value>,
    ) -> Result<RecordRow, ApiError> {
        self.write_failure()?;
        self.updated.lock().unwrap().push((record_id, data.clone()));
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|row| row.id == record_id) {
            Some(existing) => {
                existing.data = data.clone();
                Ok(existing.clone())
            }
            None => Err(ApiError::from_response(404, r#"{"detail": "Record not found"}"#)),
        }
    }

    async fn delete_record(&self, record_id: i64) -> Result<(), ApiError> {
        self.write_failure()?;
        self.deleted.lock().unwrap().push(record_id);
        self.records.lock().unwrap().retain(|row| row.id != record_id);
        Ok(())
    }
}
