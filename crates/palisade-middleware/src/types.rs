//! Common types used throughout the request pipeline.

use bytes::Bytes;
use http_body_util::Full;
use palisade_core::Envelope;

/// The HTTP request type used in the pipeline.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// Extension trait for writing envelopes to the transport.
pub trait ResponseExt {
    /// Serializes an envelope as the response body.
    ///
    /// The transport status code always equals the envelope's `code`.
    fn from_envelope(envelope: &Envelope) -> Response;

    /// Builds an empty response with the given status (preflight, etc.).
    fn empty(status: http::StatusCode) -> Response;
}

impl ResponseExt for Response {
    fn from_envelope(envelope: &Envelope) -> Response {
        let status = http::StatusCode::from_u16(envelope.code())
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::to_string(envelope)
            .unwrap_or_else(|_| r#"{"code":500,"error":"INTERNAL_SERVER_ERROR","message":"Internal server error"}"#.to_string());

        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))
            .expect("failed to build envelope response")
    }

    fn empty(status: http::StatusCode) -> Response {
        http::Response::builder()
            .status(status)
            .body(Full::new(Bytes::new()))
            .expect("failed to build empty response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use palisade_core::{envelope, HttpError};

    #[test]
    fn test_status_matches_envelope_code() {
        let env = envelope::from_http_error(&HttpError::not_found("Account"));
        let response = Response::from_envelope(&env);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_success_envelope_written() {
        let env = envelope::success_default(200, serde_json::json!({"ok": true}));
        let response = Response::from_envelope(&env);
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_empty_response() {
        let response = Response::empty(StatusCode::NO_CONTENT);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
