//! Request and response bodies of the remote API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::{models::RecordRow, timestamps, DataType};

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    #[serde(default, deserialize_with = "timestamps::deserialize_option")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Membership {
    #[serde(alias = "organization")]
    pub workspace: Workspace,
    pub role: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateWorkspaceRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldConfig {
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateFieldRequest {
    pub name: String,
    pub slug: String,
    pub data_type: DataType,
    pub is_required: bool,
    pub is_unique: bool,
    pub position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<FieldConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateModelRequest {
    pub workspace_id: i64,
    pub name: String,
    pub slug: String,
    pub fields: Vec<CreateFieldRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordPayload<'a> {
    pub data: &'a Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Parameters of one `GET /models/{id}/records` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordQuery {
    pub skip: u64,
    pub limit: u32,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    pub filter_key: Option<String>,
    pub filter_value: Option<String>,
}

impl RecordQuery {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("skip", self.skip.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sort_by", sort_by.clone()));
            pairs.push(("sort_order", self.sort_order.as_str().to_string()));
        }
        if let (Some(key), Some(value)) = (&self.filter_key, &self.filter_value) {
            pairs.push(("filter_key", key.clone()));
            pairs.push(("filter_value", value.clone()));
        }
        pairs
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordPageBody {
    Paged {
        items: Vec<RecordRow>,
        #[serde(default)]
        total: Option<u64>,
        #[serde(default)]
        has_more: Option<bool>,
    },
    Bare(Vec<RecordRow>),
}

/// One page of records. `total` and `has_more` are only known when the API
/// returns the paginated envelope rather than a bare array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RecordPageBody")]
pub struct RecordPage {
    pub items: Vec<RecordRow>,
    pub total: Option<u64>,
    pub has_more: Option<bool>,
}

impl From<RecordPageBody> for RecordPage {
    fn from(body: RecordPageBody) -> Self {
        match body {
            RecordPageBody::Paged {
                items,
                total,
                has_more,
            } => Self {
                items,
                total,
                has_more,
            },
            RecordPageBody::Bare(items) => Self {
                items,
                total: None,
                has_more: None,
            },
        }
    }
}

impl RecordPage {
    pub fn bare(items: Vec<RecordRow>) -> Self {
        Self {
            items,
            total: None,
            has_more: None,
        }
    }
}
