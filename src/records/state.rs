use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    api::{RecordPage, RecordQuery, SortOrder},
    fields::search_text,
    schema::{ModelDefinition, RecordRow},
};

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ListStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Errored,
}

/// Everything a records request depends on, apart from the model itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub workspace_id: i64,
    pub page: u64,
    pub page_size: u32,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    pub filter_key: Option<String>,
    pub filter_value: Option<Value>,
}

fn filter_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl ListParams {
    pub fn to_query(&self) -> RecordQuery {
        let filter_key = self.filter_key.clone().filter(|key| !key.is_empty());
        let filter_value = self.filter_value.as_ref().and_then(filter_text);
        let filter_active = filter_key.is_some() && filter_value.is_some();

        RecordQuery {
            skip: self.page.saturating_mul(u64::from(self.page_size)),
            limit: self.page_size,
            sort_by: self.sort_by.clone(),
            sort_order: self.sort_order,
            filter_key: if filter_active { filter_key } else { None },
            filter_value: if filter_active { filter_value } else { None },
        }
    }
}

/// Values typed into a create or edit form, keyed by field slug.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormDraft {
    pub data: Map<String, Value>,
    pub errors: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditDraft {
    pub record_id: i64,
    pub form: FormDraft,
}

#[derive(Debug, Clone)]
pub struct ListState {
    pub status: ListStatus,
    pub params: ListParams,
    pub model_slug: Option<String>,
    pub model: Option<ModelDefinition>,
    pub rows: Vec<RecordRow>,
    pub has_more: bool,
    pub total: Option<u64>,
    pub error: Option<String>,
    pub search: String,
    pub create_open: bool,
    pub create: FormDraft,
    pub editing: Option<EditDraft>,
    /// Bumped for every records request; only the latest may land.
    pub generation: u64,
    /// Same, for model-definition lookups.
    pub model_generation: u64,
}

impl ListState {
    pub fn new(params: ListParams) -> Self {
        Self {
            status: ListStatus::Idle,
            params,
            model_slug: None,
            model: None,
            rows: Vec::new(),
            has_more: false,
            total: None,
            error: None,
            search: String::new(),
            create_open: false,
            create: FormDraft::default(),
            editing: None,
            generation: 0,
            model_generation: 0,
        }
    }

    pub fn begin_fetch(&mut self) -> (u64, RecordQuery) {
        self.generation = self.generation.wrapping_add(1);
        self.status = ListStatus::Loading;
        self.error = None;
        (self.generation, self.params.to_query())
    }

    pub fn begin_model_lookup(&mut self) -> u64 {
        self.model_generation = self.model_generation.wrapping_add(1);
        // Any records request still in flight belongs to the previous model.
        self.generation = self.generation.wrapping_add(1);
        self.status = ListStatus::Loading;
        self.error = None;
        self.model_generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn apply_page(&mut self, page: RecordPage) {
        let requested = self.params.page_size as usize;
        self.has_more = page.has_more.unwrap_or(page.items.len() == requested);
        self.total = page.total;
        self.rows = page.items;
        self.status = ListStatus::Loaded;
        self.error = None;
    }

    /// Records a failure without touching the rows already on screen.
    pub fn fail(&mut self, message: String) {
        self.status = ListStatus::Errored;
        self.error = Some(message);
    }

    /// Rows of the loaded page whose values contain the search text.
    pub fn visible_rows(&self) -> Vec<&RecordRow> {
        if self.search.trim().is_empty() {
            return self.rows.iter().collect();
        }
        let needle = self.search.to_lowercase();
        self.rows
            .iter()
            .filter(|row| {
                row.data.values().any(|value| {
                    search_text(value)
                        .map(|text| text.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                })
            })
            .collect()
    }

    pub fn usage_used(&self) -> u64 {
        self.total.unwrap_or_else(|| {
            self.params
                .page
                .saturating_mul(u64::from(self.params.page_size))
                .saturating_add(self.rows.len() as u64)
        })
    }
}
