use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::schema::{timestamps::parse_timestamp, DataType, FieldDefinition, ModelDefinition};

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

fn type_error(field: &FieldDefinition, value: &Value) -> Option<&'static str> {
    match (&field.data_type, value) {
        (_, Value::Null) => None,
        (DataType::String | DataType::Text, Value::String(_)) => None,
        (DataType::String | DataType::Text, _) => Some("Must be a string"),
        (DataType::Number, Value::Number(_)) => None,
        (DataType::Number, _) => Some("Must be a number"),
        (DataType::Boolean, Value::Bool(_)) => None,
        (DataType::Boolean, _) => Some("Must be a boolean"),
        (DataType::Date | DataType::DateTime, Value::String(raw)) => {
            parse_timestamp(raw).err().map(|_| "Invalid date")
        }
        (DataType::Date | DataType::DateTime, _) => Some("Invalid date"),
        (DataType::Enum, Value::String(choice)) if field.options.contains(choice) => None,
        (DataType::Enum, _) => Some("Value not permitted"),
        (DataType::Relation | DataType::Other(_), _) => None,
    }
}

/// Required and type problems in `data`, keyed by field slug. An empty map
/// means the payload can be sent. Explicit `null`s are not reported here; the
/// record forms never put them in a draft, since clearing an input removes the key.
pub fn validate_record_data(
    model: &ModelDefinition,
    data: &Map<String, Value>,
) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();

    for field in &model.fields {
        let value = data.get(&field.slug);
        if field.is_required && is_blank(value) {
            errors.insert(field.slug.clone(), "Field is required".to_string());
            continue;
        }
        if let Some(message) = value.and_then(|value| type_error(field, value)) {
            errors.insert(field.slug.clone(), message.to_string());
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{field, tickets_model};
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn required_fields_must_be_present() {
        let model = tickets_model();
        let errors = validate_record_data(&model, &data(json!({ "status": "Open" })));
        assert_eq!(errors.get("title").map(String::as_str), Some("Field is required"));

        let errors = validate_record_data(&model, &data(json!({ "title": "  " })));
        assert!(errors.contains_key("title"));
    }

    #[test]
    fn enum_values_must_be_options() {
        let model = tickets_model();
        let errors =
            validate_record_data(&model, &data(json!({ "title": "A", "status": "Pending" })));
        assert_eq!(errors.get("status").map(String::as_str), Some("Value not permitted"));

        let errors = validate_record_data(&model, &data(json!({ "title": "A", "status": null })));
        assert!(errors.is_empty());
    }

    #[test]
    fn types_are_checked_and_unknown_keys_tolerated() {
        let mut model = tickets_model();
        model.fields.push(field("price", DataType::Number));
        model.fields.push(field("due", DataType::Date));

        let errors = validate_record_data(
            &model,
            &data(json!({
                "title": "A",
                "done": "yes",
                "price": "12",
                "due": "not a date",
                "legacy": { "anything": true }
            })),
        );
        assert_eq!(errors.get("done").map(String::as_str), Some("Must be a boolean"));
        assert_eq!(errors.get("price").map(String::as_str), Some("Must be a number"));
        assert_eq!(errors.get("due").map(String::as_str), Some("Invalid date"));
        assert!(!errors.contains_key("legacy"));
    }
}
