pub mod controller;
pub mod state;

use std::collections::BTreeMap;

pub use controller::{ListSnapshot, RecordListController, UsageEstimate};
pub use state::{EditDraft, FormDraft, ListParams, ListState, ListStatus};

use crate::{api::ApiError, fields::InputError};

#[derive(thiserror::Error, Debug)]
pub enum RecordsError {
    #[error("no model is loaded")]
    NoModel,
    #[error("{0}")]
    ModelNotFound(String),
    #[error("record {0} is not on the loaded page")]
    RecordNotLoaded(i64),
    #[error("no record is being edited")]
    NotEditing,
    #[error("the create form is closed")]
    FormClosed,
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("invalid value for '{slug}': {source}")]
    Input {
        slug: String,
        #[source]
        source: InputError,
    },
    #[error("{} field(s) need attention", .0.len())]
    Validation(BTreeMap<String, String>),
    #[error(transparent)]
    Api(#[from] ApiError),
}
