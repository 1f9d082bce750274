#![forbid(unsafe_code)]

//! Mapping of non-success responses onto [`ClientError`].
//!
//! The service reports failures three ways: `404` with an empty body for a
//! missing id, `500` with a plain-text explanation, and framework-generated
//! JSON error objects. Only text bodies are worth showing to an operator, so
//! JSON objects collapse to [`ClientError::Unknown`].

use roster_core::ClientError;
use serde_json::Value;

use crate::transport::{HttpResponse, TransportError};

/// Classify a response that is not 2xx.
#[must_use]
pub fn classify_response(response: &HttpResponse) -> ClientError {
    if response.status == 404 {
        return ClientError::NotFound;
    }
    let text = response.body.trim();
    if text.is_empty() {
        return ClientError::Unknown;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::String(message)) if !message.trim().is_empty() => {
            ClientError::ServerMessage(message)
        }
        Ok(_) => ClientError::Unknown,
        Err(_) => ClientError::ServerMessage(text.to_string()),
    }
}

/// Every transport failure means the service was unreachable.
#[must_use]
pub fn classify_transport(_error: &TransportError) -> ClientError {
    ClientError::NetworkUnavailable
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_wins_over_body() {
        let resp = HttpResponse::new(404, "Customer not found with id: 9");
        assert_eq!(classify_response(&resp), ClientError::NotFound);
    }

    #[test]
    fn plain_text_body_is_server_message() {
        let resp = HttpResponse::new(500, "Error creating customer: constraint violated\n");
        assert_eq!(
            classify_response(&resp),
            ClientError::ServerMessage("Error creating customer: constraint violated".into())
        );
    }

    #[test]
    fn json_string_body_is_server_message() {
        let resp = HttpResponse::new(400, r#""name must not be blank""#);
        assert_eq!(
            classify_response(&resp),
            ClientError::ServerMessage("name must not be blank".into())
        );
    }

    #[test]
    fn json_object_body_is_unknown() {
        let resp = HttpResponse::new(
            500,
            r#"{"timestamp":"2024-01-01","status":500,"error":"Internal Server Error"}"#,
        );
        assert_eq!(classify_response(&resp), ClientError::Unknown);
    }

    #[test]
    fn empty_body_is_unknown() {
        assert_eq!(classify_response(&HttpResponse::new(503, "  ")), ClientError::Unknown);
    }

    #[test]
    fn transport_failure_is_network_unavailable() {
        assert_eq!(
            classify_transport(&TransportError::new("connection refused")),
            ClientError::NetworkUnavailable
        );
    }
}
