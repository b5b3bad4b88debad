//! Error taxonomy for backend I/O.

use std::fmt;
use std::time::Duration;

use serde_json::Value;

use crate::session::Language;

/// Maximum number of validation lines kept from a 422 `detail` list.
const MAX_DETAIL_LINES: usize = 6;

/// Categories of request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The request never reached the server (DNS, refused, TLS, ...)
    NetworkUnreachable,
    /// The request exceeded the configured deadline
    Timeout,
    /// The server rejected the credential (HTTP 401)
    Unauthorized,
    /// Any other non-success status
    ServerError,
    /// A client-side precondition failed; no request was sent
    Validation,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::NetworkUnreachable => write!(f, "network_unreachable"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::Unauthorized => write!(f, "unauthorized"),
            ApiErrorKind::ServerError => write!(f, "server_error"),
            ApiErrorKind::Validation => write!(f, "validation"),
        }
    }
}

/// Structured request error with kind and optional server detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Error category
    pub kind: ApiErrorKind,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    /// Server-provided detail text, when present and non-empty
    pub detail: Option<String>,
    /// One-line summary suitable for logs
    pub message: String,
    /// Deadline that was exceeded (timeouts only)
    pub timeout: Option<Duration>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            detail: None,
            message: message.into(),
            timeout: None,
        }
    }

    /// Creates a client-side validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Validation, message)
    }

    /// Creates a timeout error for a request that ran past `limit`.
    pub fn timeout(limit: Duration) -> Self {
        Self {
            timeout: Some(limit),
            ..Self::new(
                ApiErrorKind::Timeout,
                format!("Request timed out after {}s", limit.as_secs()),
            )
        }
    }

    /// Creates an error for a request that never reached the server.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::NetworkUnreachable, message)
    }

    /// Creates an error from a non-success status and its body.
    ///
    /// 401 maps to [`ApiErrorKind::Unauthorized`]; everything else is a
    /// server error carrying whatever detail the body provides.
    pub fn http_status(status: u16, body: &str) -> Self {
        let kind = if status == 401 {
            ApiErrorKind::Unauthorized
        } else {
            ApiErrorKind::ServerError
        };
        let detail = extract_detail(body);
        let message = match &detail {
            Some(detail) => format!("HTTP {status}: {detail}"),
            None => format!("HTTP {status}"),
        };

        Self {
            kind,
            status: Some(status),
            detail,
            message,
            timeout: None,
        }
    }

    /// Creates a server error for a success response whose body did not decode.
    pub fn malformed(status: u16, reason: impl fmt::Display) -> Self {
        Self {
            status: Some(status),
            ..Self::new(
                ApiErrorKind::ServerError,
                format!("Malformed response body: {reason}"),
            )
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }

    /// Banner text for this error, or `None` when no banner should be shown.
    ///
    /// Unauthorized failures are handled by the session-ended signal, so
    /// call sites never repeat them as a generic error.
    pub fn user_message(&self, lang: Language) -> Option<String> {
        let text = match self.kind {
            ApiErrorKind::Unauthorized => return None,
            ApiErrorKind::Validation => self.message.clone(),
            ApiErrorKind::Timeout => {
                let secs = self.timeout.map_or(0, |t| t.as_secs());
                match lang {
                    Language::Es => format!(
                        "Tiempo de espera agotado ({secs}s). El servidor tardó demasiado en responder."
                    ),
                    Language::En => format!(
                        "Request timed out ({secs}s). The server took too long to respond."
                    ),
                }
            }
            ApiErrorKind::NetworkUnreachable => lang
                .pick(
                    "Error de red: no se pudo contactar con el servidor.",
                    "Network error: could not reach the server.",
                )
                .to_string(),
            ApiErrorKind::ServerError => {
                let status = self
                    .status
                    .map_or_else(|| "?".to_string(), |s| s.to_string());
                match (&self.detail, lang) {
                    (Some(detail), _) => format!("{detail} (HTTP {status})"),
                    (None, Language::Es) => format!("Error HTTP {status}"),
                    (None, Language::En) => format!("HTTP {status} error"),
                }
            }
        };
        Some(text)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for backend operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Classifies a transport failure: timeouts are distinct, everything else
/// means the server was not reached.
pub(crate) fn classify_reqwest_error(e: &reqwest::Error, limit: Duration) -> ApiError {
    if e.is_timeout() {
        ApiError::timeout(limit)
    } else if e.is_connect() {
        ApiError::unreachable(format!("Connection failed: {e}"))
    } else {
        ApiError::unreachable(format!("Network error: {e}"))
    }
}

/// Pulls a displayable detail out of an error body.
fn extract_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return Some(body.to_string());
    };

    match json.get("detail") {
        Some(Value::String(detail)) => {
            let detail = detail.trim();
            (!detail.is_empty()).then(|| detail.to_string())
        }
        Some(Value::Array(items)) => {
            let lines: Vec<String> = items
                .iter()
                .take(MAX_DETAIL_LINES)
                .filter_map(validation_line)
                .collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        }
        _ => None,
    }
}

/// Formats one `{loc, msg}` entry of a validation error list as `loc: msg`.
fn validation_line(item: &Value) -> Option<String> {
    let msg = item.get("msg").and_then(Value::as_str)?.trim();
    if msg.is_empty() {
        return None;
    }

    let loc = item
        .get("loc")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| match p {
                    Value::String(s) if s != "body" => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(".")
        })
        .unwrap_or_default();

    if loc.is_empty() {
        Some(msg.to_string())
    } else {
        Some(format!("{loc}: {msg}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_detail_is_kept() {
        let err = ApiError::http_status(409, r#"{"detail": "Email already registered"}"#);
        assert_eq!(err.kind, ApiErrorKind::ServerError);
        assert_eq!(err.detail.as_deref(), Some("Email already registered"));
        assert_eq!(
            err.user_message(Language::En).as_deref(),
            Some("Email already registered (HTTP 409)")
        );
    }

    #[test]
    fn blank_detail_falls_back_to_status() {
        let err = ApiError::http_status(500, r#"{"detail": "   "}"#);
        assert_eq!(err.detail, None);
        assert_eq!(err.user_message(Language::En).as_deref(), Some("HTTP 500 error"));
        assert_eq!(err.user_message(Language::Es).as_deref(), Some("Error HTTP 500"));
    }

    #[test]
    fn validation_list_is_condensed() {
        let body = r#"{"detail": [
            {"loc": ["body", "email"], "msg": "value is not a valid email address"},
            {"loc": ["body", "password"], "msg": "field required"}
        ]}"#;
        let err = ApiError::http_status(422, body);
        assert_eq!(
            err.detail.as_deref(),
            Some("email: value is not a valid email address\npassword: field required")
        );
    }

    #[test]
    fn validation_list_is_capped() {
        let items: Vec<String> = (0..10)
            .map(|i| format!(r#"{{"loc": ["body", "f{i}"], "msg": "bad"}}"#))
            .collect();
        let body = format!(r#"{{"detail": [{}]}}"#, items.join(","));
        let err = ApiError::http_status(422, &body);
        assert_eq!(err.detail.unwrap().lines().count(), MAX_DETAIL_LINES);
    }

    #[test]
    fn plain_text_body_is_detail() {
        let err = ApiError::http_status(502, "Bad Gateway");
        assert_eq!(err.detail.as_deref(), Some("Bad Gateway"));
    }

    #[test]
    fn unauthorized_has_no_banner() {
        let err = ApiError::http_status(401, r#"{"detail": "Could not validate credentials"}"#);
        assert!(err.is_unauthorized());
        assert_eq!(err.user_message(Language::Es), None);
    }

    #[test]
    fn timeout_and_network_are_distinct() {
        let timeout = ApiError::timeout(Duration::from_secs(15));
        let network = ApiError::unreachable("refused");

        assert_ne!(timeout.kind, network.kind);
        assert_eq!(
            timeout.user_message(Language::En).as_deref(),
            Some("Request timed out (15s). The server took too long to respond.")
        );
        assert_eq!(
            network.user_message(Language::En).as_deref(),
            Some("Network error: could not reach the server.")
        );
    }
}
