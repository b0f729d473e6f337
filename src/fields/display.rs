use chrono::{FixedOffset, Offset, Utc};
use serde_json::Value;

use crate::{
    schema::{timestamps::parse_timestamp, DataType, FieldDefinition},
    settings::DisplayOptions,
};

/// Shown for absent values; never confused with a real value.
pub const EMPTY_GLYPH: &str = "—";

/// Loose truthiness: `false`, `0`, `""` and `null` are false, everything else true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn canonical_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn format_timestamp(value: &Value, format: &str, options: &DisplayOptions) -> String {
    let raw = match value {
        Value::String(raw) => raw,
        other => return canonical_text(other),
    };
    let offset = FixedOffset::east_opt(options.utc_offset_minutes.saturating_mul(60))
        .unwrap_or_else(|| Utc.fix());

    match parse_timestamp(raw) {
        Ok(ts) => ts.with_timezone(&offset).format(format).to_string(),
        Err(_) => raw.clone(),
    }
}

pub fn format_display(value: Option<&Value>, field: &FieldDefinition, options: &DisplayOptions) -> String {
    if field.data_type == DataType::Boolean {
        let label = if value.map(is_truthy).unwrap_or(false) {
            "Yes"
        } else {
            "No"
        };
        return label.to_string();
    }

    let value = match value {
        None | Some(Value::Null) => return EMPTY_GLYPH.to_string(),
        Some(value) => value,
    };

    match &field.data_type {
        DataType::Date => format_timestamp(value, &options.date_format, options),
        DataType::DateTime => format_timestamp(value, &options.datetime_format, options),
        _ => canonical_text(value),
    }
}

/// Text a value contributes to free-text search; `None` for null.
pub fn search_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(canonical_text(other)),
    }
}
