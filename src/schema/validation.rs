//! Client-side checks for the model builder form.
//!
//! Everything here is pure and cheap enough to run on every keystroke.

use std::collections::HashMap;

use super::models::DataType;
use crate::api::types::{CreateFieldRequest, CreateModelRequest, FieldConfig};

/// One editable row of the model builder.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDraft {
    pub name: String,
    pub slug: String,
    pub data_type: DataType,
    pub is_required: bool,
    pub is_unique: bool,
    /// Comma-separated options, only meaningful for `enum` fields.
    pub options_text: String,
}

impl Default for FieldDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            slug: String::new(),
            data_type: DataType::String,
            is_required: false,
            is_unique: false,
            options_text: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelDraft {
    pub name: String,
    pub slug: String,
    pub workspace_id: i64,
    pub fields: Vec<FieldDraft>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub name: Option<String>,
    pub slug: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.slug.is_none()
    }
}

/// Error slots for the whole form; `field_errors` lines up with `ModelDraft::fields`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelErrors {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub workspace_id: Option<String>,
    pub field_errors: Vec<FieldErrors>,
}

impl ModelErrors {
    pub fn is_valid(&self) -> bool {
        self.name.is_none()
            && self.slug.is_none()
            && self.workspace_id.is_none()
            && self.field_errors.iter().all(FieldErrors::is_empty)
    }
}

fn count_keys<'a>(values: impl Iterator<Item = &'a str>) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for value in values {
        let key = value.trim().to_lowercase();
        if !key.is_empty() {
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    counts
}

pub fn validate_model(draft: &ModelDraft) -> ModelErrors {
    let mut errors = ModelErrors {
        field_errors: vec![FieldErrors::default(); draft.fields.len()],
        ..ModelErrors::default()
    };

    if draft.name.trim().is_empty() {
        errors.name = Some("Name is required".into());
    }
    if draft.slug.trim().is_empty() {
        errors.slug = Some("Slug is required".into());
    }
    if draft.workspace_id <= 0 {
        errors.workspace_id = Some("Workspace id is required".into());
    }

    let name_counts = count_keys(draft.fields.iter().map(|f| f.name.as_str()));
    let slug_counts = count_keys(draft.fields.iter().map(|f| f.slug.as_str()));

    for (field, slot) in draft.fields.iter().zip(errors.field_errors.iter_mut()) {
        let name = field.name.trim();
        let slug = field.slug.trim();

        if name.is_empty() {
            slot.name = Some("Field name is required".into());
        } else if name_counts.get(&name.to_lowercase()).copied().unwrap_or(0) > 1 {
            slot.name = Some("Duplicate field name".into());
        }

        if slug.is_empty() {
            slot.slug = Some("Field slug is required".into());
        } else if slug_counts.get(&slug.to_lowercase()).copied().unwrap_or(0) > 1 {
            slot.slug = Some("Duplicate field slug".into());
        }
    }

    errors
}

/// `"Open, Closed ,  Pending"` → `["Open", "Closed", "Pending"]`.
pub fn parse_enum_options(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|option| !option.is_empty())
        .map(str::to_string)
        .collect()
}

impl ModelDraft {
    /// Builds the `POST /models` body; positions follow the draft's field order.
    pub fn to_request(&self) -> CreateModelRequest {
        let fields = self
            .fields
            .iter()
            .enumerate()
            .map(|(position, field)| {
                let config = match field.data_type {
                    DataType::Enum => {
                        let options = parse_enum_options(&field.options_text);
                        (!options.is_empty()).then_some(FieldConfig { options })
                    }
                    _ => None,
                };
                CreateFieldRequest {
                    name: field.name.trim().to_string(),
                    slug: field.slug.trim().to_string(),
                    data_type: field.data_type.clone(),
                    is_required: field.is_required,
                    is_unique: field.is_unique,
                    position,
                    config,
                }
            })
            .collect();

        CreateModelRequest {
            workspace_id: self.workspace_id,
            name: self.name.trim().to_string(),
            slug: self.slug.trim().to_string(),
            fields,
        }
    }
}
