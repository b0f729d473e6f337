pub mod models;
pub mod slug;
pub mod timestamps;
pub mod validation;

pub use models::{DataType, FieldDefinition, ModelDefinition, RecordRow};
pub use slug::normalize_slug;
pub use validation::{
    parse_enum_options, validate_model, FieldDraft, FieldErrors, ModelDraft, ModelErrors,
};
