//! API error taxonomy.
//!
//! Every failure a request can produce collapses into one of these
//! variants; callers convert them to user-facing text at the command
//! boundary and nothing propagates further up.

use thiserror::Error;

/// Convenience alias for client call return types.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors from talking to the passport backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received at all (DNS, refused connection, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status and a detail message.
    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    /// A 4xx with structured per-field errors, flattened for display.
    #[error("Validation error: {0}")]
    Validation(String),

    /// 401 — treated uniformly as "not authenticated", never shown raw.
    #[error("Not authenticated")]
    Unauthorized,

    /// The response body could not be decoded.
    #[error("Response decode error: {0}")]
    Decode(String),

    /// The request was cancelled by its owner before completing.
    #[error("Request cancelled")]
    Cancelled,

    /// Local persistence (session or snapshot files) failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Classify a transport-level reqwest failure.
    ///
    /// Anything that never produced a response is a network error; a body
    /// that failed to parse is a decode error.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }

    /// Classify a non-2xx response from its status and raw body.
    pub fn from_response(status: u16, body: &str) -> Self {
        if status == 401 {
            return ApiError::Unauthorized;
        }
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        if let Some(serde_json::Value::Object(map)) = parsed {
            if let Some(detail) = map.get("detail").and_then(|v| v.as_str()) {
                return ApiError::Api {
                    status,
                    detail: detail.to_string(),
                };
            }
            if (400..500).contains(&status) && !map.is_empty() {
                return ApiError::Validation(flatten_field_errors(&map));
            }
        }
        ApiError::Api {
            status,
            detail: "Unknown API error".to_string(),
        }
    }

    /// Whether this error means the session is invalid.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Storage(err.to_string())
    }
}

/// Flatten structured field errors into per-field human-readable lines.
///
/// `{"name": ["This field is required."]}` becomes
/// `name: This field is required.`; multiple fields join with `"; "`.
fn flatten_field_errors(map: &serde_json::Map<String, serde_json::Value>) -> String {
    let mut lines = Vec::with_capacity(map.len());
    for (field, messages) in map {
        let text = match messages {
            serde_json::Value::Array(items) => items
                .iter()
                .map(|m| m.as_str().map(str::to_string).unwrap_or_else(|| m.to_string()))
                .collect::<Vec<_>>()
                .join(" "),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        lines.push(format!("{field}: {text}"));
    }
    lines.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_401_maps_to_unauthorized() {
        let err = ApiError::from_response(401, r#"{"detail": "Invalid token"}"#);
        assert!(err.is_unauthorized());
    }

    #[test]
    fn detail_body_maps_to_api_error() {
        let err = ApiError::from_response(404, r#"{"detail": "Not found."}"#);
        match err {
            ApiError::Api { status, detail } => {
                assert_eq!(status, 404);
                assert_eq!(detail, "Not found.");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn field_errors_flatten_per_field() {
        let err = ApiError::from_response(
            400,
            r#"{"name": ["This field is required."], "qr_code": ["Must be unique.", "Too short."]}"#,
        );
        match err {
            ApiError::Validation(msg) => {
                assert!(msg.contains("name: This field is required."));
                assert!(msg.contains("qr_code: Must be unique. Too short."));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unparsable_body_maps_to_generic_api_error() {
        let err = ApiError::from_response(500, "<html>boom</html>");
        match err {
            ApiError::Api { status, detail } => {
                assert_eq!(status, 500);
                assert_eq!(detail, "Unknown API error");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
