//! Wire DTOs shared by every endpoint.
//!
//! # Design
//! These types mirror the fixture server's schema but are defined
//! independently; integration tests catch any drift between the two crates.
//! `data` is opaque to the transport layer, so envelopes are generic.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Success envelope every endpoint returns: `{ data, message?, success }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub success: bool,
}

/// Failure body: `{ message, status?, errors? }`.
///
/// Every field is optional on the way in because a misbehaving server may
/// send any subset of them, and each one is read independently of the others.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ErrorPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Field name to ordered messages, in the order the server sent them, or
    /// a bare array of messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

impl ErrorPayload {
    /// Parse a failure body, tolerating empty or non-JSON bodies. A field of
    /// an unexpected type is skipped without discarding the rest.
    pub fn from_body(body: &[u8]) -> Self {
        let Ok(Value::Object(mut map)) = serde_json::from_slice::<Value>(body) else {
            return Self::default();
        };
        let message = match map.remove("message") {
            Some(Value::String(m)) => Some(m),
            _ => None,
        };
        let status = map
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok());
        let errors = map
            .remove("errors")
            .filter(|e| e.is_object() || e.is_array());
        Self {
            message,
            status,
            errors,
        }
    }

    /// Flatten `errors` into individual messages, field order first, then
    /// array order. A non-array field value counts as one message.
    pub fn field_messages(&self) -> Vec<String> {
        let entries: Vec<&Value> = match &self.errors {
            Some(Value::Object(fields)) => fields.values().collect(),
            Some(Value::Array(items)) => items.iter().collect(),
            _ => return Vec::new(),
        };
        let mut out = Vec::new();
        for value in entries {
            match value {
                Value::Array(items) => out.extend(items.iter().map(value_to_text)),
                other => out.push(value_to_text(other)),
            }
        }
        out
    }
}

/// Stringify a JSON value: strings verbatim, everything else as JSON text.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Pagination metadata returned by paginated endpoints.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    /// Build metadata with `total_pages = ceil(total / limit)`; zero when
    /// `limit` is zero.
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: total_pages(total, limit),
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn contains(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages
    }
}

pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX)
}

/// `{ data: [...], pagination: { page, limit, total, totalPages } }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_message_is_optional() {
        let env: ApiResponse<u32> = serde_json::from_str(r#"{"data":7,"success":true}"#).unwrap();
        assert_eq!(env.data, 7);
        assert!(env.message.is_none());
    }

    #[test]
    fn field_messages_follow_server_order() {
        let payload = ErrorPayload::from_body(
            br#"{"message":"Validation failed","errors":{"name":["x"],"email":["y","z"]}}"#,
        );
        assert_eq!(payload.field_messages(), vec!["x", "y", "z"]);
    }

    #[test]
    fn field_messages_stringify_scalars() {
        let payload = ErrorPayload::from_body(br#"{"errors":{"age":18,"name":"required"}}"#);
        assert_eq!(payload.field_messages(), vec!["18", "required"]);
    }

    #[test]
    fn mistyped_status_keeps_message() {
        let payload = ErrorPayload::from_body(
            br#"{"success":false,"status":"error","message":"Email already registered"}"#,
        );
        assert_eq!(payload.message.as_deref(), Some("Email already registered"));
        assert_eq!(payload.status, None);
    }

    #[test]
    fn errors_as_array_are_flattened() {
        let payload = ErrorPayload::from_body(br#"{"message":"Invalid input","errors":["a","b"]}"#);
        assert_eq!(payload.field_messages(), vec!["a", "b"]);
        assert_eq!(payload.message.as_deref(), Some("Invalid input"));
    }

    #[test]
    fn scalar_errors_are_ignored() {
        let payload = ErrorPayload::from_body(br#"{"message":7,"errors":"nope","status":422}"#);
        assert_eq!(payload.message, None);
        assert_eq!(payload.status, Some(422));
        assert!(payload.field_messages().is_empty());
    }

    #[test]
    fn error_payload_tolerates_garbage() {
        let payload = ErrorPayload::from_body(b"<html>bad gateway</html>");
        assert_eq!(payload, ErrorPayload::default());
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(42, 5), 9);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn pagination_uses_camel_case_on_the_wire() {
        let json = serde_json::to_value(Pagination::new(2, 10, 35)).unwrap();
        assert_eq!(json["totalPages"], 4);
        assert_eq!(json["page"], 2);
    }

    #[test]
    fn pagination_bounds() {
        let p = Pagination::new(1, 10, 25);
        assert!(p.has_next());
        assert!(!p.has_previous());
        assert!(p.contains(3));
        assert!(!p.contains(0));
        assert!(!p.contains(4));
    }
}
