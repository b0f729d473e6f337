use serde::Deserialize;
use serde_json::Value;

/// One field-scoped problem reported by the server (HTTP 422).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub error: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Not authorized{}", detail_suffix(.detail))]
    Unauthorized { detail: Option<String> },
    #[error("Request failed with status {status}{}", detail_suffix(.detail))]
    Http { status: u16, detail: Option<String> },
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldIssue>),
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(": {detail}"),
        None => String::new(),
    }
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Validation(_) => Some(422),
            _ => None,
        }
    }

    /// The server's own reason when it gave a readable one, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Unauthorized { detail } | ApiError::Http { detail, .. } => {
                detail.clone().unwrap_or_else(|| fallback.to_string())
            }
            ApiError::Validation(issues) if !issues.is_empty() => issues
                .iter()
                .map(|issue| format!("{}: {}", issue.field, issue.error))
                .collect::<Vec<_>>()
                .join("; "),
            _ => fallback.to_string(),
        }
    }

    /// Maps a non-success status and its body to an error.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|body| body.detail);

        match (status, detail) {
            (401, Some(Value::String(detail))) => ApiError::Unauthorized {
                detail: readable(detail),
            },
            (401, _) => ApiError::Unauthorized { detail: None },
            (_, Some(Value::Array(entries))) => {
                let issues: Vec<FieldIssue> = entries.iter().filter_map(issue_from_value).collect();
                if issues.is_empty() {
                    ApiError::Http {
                        status,
                        detail: None,
                    }
                } else {
                    ApiError::Validation(issues)
                }
            }
            (_, Some(Value::String(detail))) => ApiError::Http {
                status,
                detail: readable(detail),
            },
            _ => ApiError::Http {
                status,
                detail: None,
            },
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
}

fn readable(detail: String) -> Option<String> {
    let trimmed = detail.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// Accepts both `{field, error}` and the framework's `{loc, msg}` entries.
fn issue_from_value(value: &Value) -> Option<FieldIssue> {
    let error = value
        .get("error")
        .or_else(|| value.get("msg"))
        .and_then(Value::as_str)?;
    let field = value
        .get("field")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            value
                .get("loc")
                .and_then(Value::as_array)
                .and_then(|loc| loc.last())
                .map(|last| match last {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
        })
        .unwrap_or_default();

    Some(FieldIssue {
        field,
        error: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_detail_becomes_user_message() {
        let err = ApiError::from_response(402, r#"{"detail": "Record limit reached. Upgrade plan"}"#);
        assert_eq!(err.status(), Some(402));
        assert_eq!(
            err.user_message("Unable to create record"),
            "Record limit reached. Upgrade plan"
        );
    }

    #[test]
    fn missing_detail_uses_fallback() {
        let err = ApiError::from_response(500, "<html>oops</html>");
        assert_eq!(err.user_message("Unable to load records"), "Unable to load records");
    }

    #[test]
    fn unauthorized_is_recognised() {
        let err = ApiError::from_response(401, r#"{"detail": "Incorrect username or password"}"#);
        assert!(err.is_unauthorized());
        assert_eq!(err.user_message("Login failed"), "Incorrect username or password");
    }

    #[test]
    fn field_issues_are_collected() {
        let body = r#"{"detail": [
            {"field": "title", "error": "Field is required"},
            {"loc": ["body", "data", "status"], "msg": "Value not permitted", "type": "value_error"}
        ]}"#;
        match ApiError::from_response(422, body) {
            ApiError::Validation(issues) => {
                assert_eq!(issues.len(), 2);
                assert_eq!(issues[0].field, "title");
                assert_eq!(issues[1].field, "status");
                assert_eq!(issues[1].error, "Value not permitted");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
