use chrono::{NaiveDate, NaiveDateTime, SecondsFormat};
use serde_json::{Number, Value};

use crate::schema::{timestamps::parse_timestamp, DataType, FieldDefinition};

const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";
const DATETIME_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// What a form shows for one field, with the current value already encoded
/// for that control.
#[derive(Debug, Clone, PartialEq)]
pub enum InputControl {
    Toggle { label: String, checked: bool },
    TextArea { value: String },
    /// `selected == None` is the explicit "no selection" state.
    Select {
        placeholder: String,
        options: Vec<String>,
        selected: Option<String>,
    },
    Number { value: String },
    /// Calendar-only, `YYYY-MM-DD`.
    Date { value: String },
    /// `YYYY-MM-DDTHH:MM`, UTC.
    DateTime { value: String },
    Text { value: String },
}

/// A change coming back from a control.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Toggled(bool),
    Text(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("'{0}' is not one of the allowed options")]
    NotAnOption(String),
    #[error("'{0}' is not a valid date")]
    InvalidDate(String),
    #[error("this control does not accept that kind of input")]
    UnexpectedEvent,
}

fn plain_text(current: Option<&Value>) -> String {
    match current {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn timestamp_input(current: Option<&Value>, format: &str) -> String {
    match current {
        Some(Value::String(raw)) if !raw.trim().is_empty() => parse_timestamp(raw)
            .map(|ts| ts.format(format).to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn number_input(current: Option<&Value>) -> String {
    match current {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if s.trim().parse::<f64>().is_ok() => s.trim().to_string(),
        _ => String::new(),
    }
}

pub fn render_input(field: &FieldDefinition, current: Option<&Value>) -> InputControl {
    match &field.data_type {
        DataType::Boolean => InputControl::Toggle {
            label: field.name.clone(),
            checked: current.map(super::is_truthy).unwrap_or(false),
        },
        DataType::Text => InputControl::TextArea {
            value: plain_text(current),
        },
        DataType::Enum => {
            let selected = match current {
                Some(Value::String(s)) if field.options.contains(s) => Some(s.clone()),
                _ => None,
            };
            InputControl::Select {
                placeholder: format!("Select {}", field.name),
                options: field.options.clone(),
                selected,
            }
        }
        DataType::Number => InputControl::Number {
            value: number_input(current),
        },
        DataType::Date => InputControl::Date {
            value: timestamp_input(current, DATE_INPUT_FORMAT),
        },
        DataType::DateTime => InputControl::DateTime {
            value: timestamp_input(current, DATETIME_INPUT_FORMAT),
        },
        DataType::String | DataType::Relation | DataType::Other(_) => InputControl::Text {
            value: plain_text(current),
        },
    }
}

fn parse_number(raw: &str) -> Result<Value, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Ok(Value::Number(int.into()));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| InputError::NotANumber(raw.to_string()))
}

fn parse_date(raw: &str) -> Result<Value, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    NaiveDate::parse_from_str(trimmed, DATE_INPUT_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| {
            Value::String(
                midnight
                    .and_utc()
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
            )
        })
        .ok_or_else(|| InputError::InvalidDate(raw.to_string()))
}

fn parse_datetime(raw: &str) -> Result<Value, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    NaiveDateTime::parse_from_str(trimmed, DATETIME_INPUT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
        .map(|naive| {
            Value::String(naive.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true))
        })
        .map_err(|_| InputError::InvalidDate(raw.to_string()))
}

/// Turns a control event into the value stored under the field's slug.
/// Cleared number/enum/date inputs become `null`, never `0` or a default option.
pub fn decode_input(field: &FieldDefinition, event: InputEvent) -> Result<Value, InputError> {
    match (&field.data_type, event) {
        (DataType::Boolean, InputEvent::Toggled(checked)) => Ok(Value::Bool(checked)),
        (DataType::Boolean, InputEvent::Text(_)) => Err(InputError::UnexpectedEvent),
        (_, InputEvent::Toggled(_)) => Err(InputError::UnexpectedEvent),
        (DataType::Enum, InputEvent::Text(choice)) => {
            if choice.is_empty() {
                Ok(Value::Null)
            } else if field.options.contains(&choice) {
                Ok(Value::String(choice))
            } else {
                Err(InputError::NotAnOption(choice))
            }
        }
        (DataType::Number, InputEvent::Text(raw)) => parse_number(&raw),
        (DataType::Date, InputEvent::Text(raw)) => parse_date(&raw),
        (DataType::DateTime, InputEvent::Text(raw)) => parse_datetime(&raw),
        (
            DataType::String | DataType::Text | DataType::Relation | DataType::Other(_),
            InputEvent::Text(raw),
        ) => Ok(Value::String(raw)),
    }
}
