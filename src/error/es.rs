use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::kinds::ClientError;

/// Structured error information extracted from an Elasticsearch error body.
///
/// Elasticsearch reports failures as a JSON envelope of the form
/// `{"error": {"type": "...", "reason": "..."}, "status": 404}`. This type
/// captures the fields the client cares about; anything else is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsErrorBody {
    pub error: EsErrorCause,
    #[serde(default)]
    pub status: Option<u16>,
}

/// The root cause reported inside an Elasticsearch error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsErrorCause {
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl EsErrorBody {
    /// Parse an error envelope from a raw response body.
    ///
    /// Returns `None` when the body is not an Elasticsearch error envelope
    /// (e.g. an empty body from a proxy).
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

/// Classify an Elasticsearch error response into a [`ClientError`].
///
/// The mapping follows the failure modes the scroll protocol can surface:
/// a missing index at open time, a discarded scroll context mid-run, and
/// everything else as an unexpected response carrying the server's reason.
pub fn classify_response(status: StatusCode, body: &str, target: &str) -> ClientError {
    if let Some(envelope) = EsErrorBody::parse(body) {
        let cause = &envelope.error;
        match cause.error_type.as_str() {
            "index_not_found_exception" => {
                return ClientError::InvalidTarget(target.to_string());
            }
            "search_context_missing_exception" => {
                return ClientError::CursorExpired;
            }
            // A search executed against an already-discarded context reports
            // the missing context as the phase failure's cause.
            "search_phase_execution_exception" => {
                if cause
                    .reason
                    .as_deref()
                    .is_some_and(|r| r.contains("search context"))
                {
                    return ClientError::CursorExpired;
                }
            }
            _ => {}
        }

        let reason = cause.reason.clone().unwrap_or_else(|| cause.error_type.clone());
        return ClientError::UnexpectedResponse(format!("{status}: {reason}"));
    }

    ClientError::UnexpectedResponse(format!("{status}: {}", truncate_body(body)))
}

/// Keep raw bodies short enough for a log line.
fn truncate_body(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index_not_found() {
        let body = r#"{"error":{"root_cause":[{"type":"index_not_found_exception","reason":"no such index [missing-index]"}],"type":"index_not_found_exception","reason":"no such index [missing-index]"},"status":404}"#;
        let err = classify_response(StatusCode::NOT_FOUND, body, "missing-index");
        assert!(matches!(err, ClientError::InvalidTarget(index) if index == "missing-index"));
    }

    #[test]
    fn test_parse_search_context_missing() {
        let body = r#"{"error":{"type":"search_context_missing_exception","reason":"No search context found for id [42]"},"status":404}"#;
        let err = classify_response(StatusCode::NOT_FOUND, body, "orders");
        assert!(matches!(err, ClientError::CursorExpired));
    }

    #[test]
    fn test_parse_phase_failure_with_missing_context() {
        let body = r#"{"error":{"type":"search_phase_execution_exception","reason":"all shards failed; No search context found for id [42]"},"status":503}"#;
        let err = classify_response(StatusCode::SERVICE_UNAVAILABLE, body, "orders");
        assert!(matches!(err, ClientError::CursorExpired));
    }

    #[test]
    fn test_unknown_error_keeps_reason() {
        let body = r#"{"error":{"type":"circuit_breaking_exception","reason":"data too large"},"status":429}"#;
        let err = classify_response(StatusCode::TOO_MANY_REQUESTS, body, "orders");
        match err {
            ClientError::UnexpectedResponse(msg) => assert!(msg.contains("data too large")),
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn test_non_envelope_body() {
        let err = classify_response(StatusCode::BAD_GATEWAY, "<html>oops</html>", "orders");
        assert!(matches!(err, ClientError::UnexpectedResponse(_)));
    }
}
