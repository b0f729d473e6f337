//! Schema and record types as received from the remote API.
//!
//! Older API revisions name some keys differently (`key`, `field_type`,
//! `required`, `config.values`); those are folded into one canonical shape here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::timestamps;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    String,
    Text,
    Number,
    Boolean,
    Date,
    DateTime,
    Enum,
    Relation,
    /// Anything this client does not know; handled as plain text.
    Other(String),
}

impl DataType {
    pub const BUILTIN: [DataType; 8] = [
        DataType::String,
        DataType::Text,
        DataType::Number,
        DataType::Boolean,
        DataType::Date,
        DataType::DateTime,
        DataType::Enum,
        DataType::Relation,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            DataType::String => "string",
            DataType::Text => "text",
            DataType::Number => "number",
            DataType::Boolean => "boolean",
            DataType::Date => "date",
            DataType::DateTime => "datetime",
            DataType::Enum => "enum",
            DataType::Relation => "relation",
            DataType::Other(raw) => raw,
        }
    }
}

impl From<String> for DataType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "string" => DataType::String,
            "text" | "longtext" => DataType::Text,
            "number" => DataType::Number,
            "boolean" => DataType::Boolean,
            "date" => DataType::Date,
            "datetime" => DataType::DateTime,
            "enum" => DataType::Enum,
            "relation" => DataType::Relation,
            _ => DataType::Other(value),
        }
    }
}

impl From<&str> for DataType {
    fn from(value: &str) -> Self {
        DataType::from(value.to_string())
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawFieldDefinition")]
pub struct FieldDefinition {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub data_type: DataType,
    pub is_required: bool,
    pub is_unique: bool,
    /// Allowed values for `enum` fields, in display order.
    pub options: Vec<String>,
}

#[derive(Deserialize)]
struct RawFieldDefinition {
    #[serde(default)]
    id: i64,
    name: String,
    #[serde(alias = "key")]
    slug: String,
    #[serde(alias = "field_type")]
    data_type: String,
    #[serde(default, alias = "required")]
    is_required: bool,
    #[serde(default)]
    is_unique: bool,
    #[serde(default)]
    config: Option<Value>,
    #[serde(default)]
    options: Option<Value>,
}

fn options_from_config(config: Option<&Value>) -> Vec<String> {
    let list = config
        .and_then(|config| config.get("options").or_else(|| config.get("values")))
        .and_then(Value::as_array);

    match list {
        Some(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        None => Vec::new(),
    }
}

impl From<RawFieldDefinition> for FieldDefinition {
    fn from(raw: RawFieldDefinition) -> Self {
        let mut options = options_from_config(raw.config.as_ref());
        if options.is_empty() {
            options = options_from_config(raw.options.as_ref());
        }

        Self {
            id: raw.id,
            name: raw.name,
            slug: raw.slug,
            data_type: DataType::from(raw.data_type),
            is_required: raw.is_required,
            is_unique: raw.is_unique,
            options,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelDefinition {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default, deserialize_with = "timestamps::deserialize_option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ModelDefinition {
    pub fn field(&self, slug: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.slug == slug)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordRow {
    pub id: i64,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(deserialize_with = "timestamps::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamps::deserialize")]
    pub updated_at: DateTime<Utc>,
}
