//! JSON envelope helpers shared by every route handler:
//! a structured `{"error": "...", "kind": "..."}` body on failure, status
//! codes chosen per the error taxonomy's propagation policy.

use ::serde::Serialize;
use ::serde_derive::Serialize as DeriveSerialize;
use ::tiny_http::{Header, Response};

use ::config::Error as ConfigError;

pub type HttpResponse = Response<::std::io::Cursor<Vec<u8>>>;

fn json_header() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap()
}

fn text_header() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"text/plain; charset=utf-8"[..]).unwrap()
}

pub fn json_ok<T: Serialize>(body: &T) -> HttpResponse {
    let text = ::serde_json::to_string(body).unwrap_or_else(|_| "{}".to_owned());
    Response::from_string(text).with_header(json_header())
}

pub fn json_status<T: Serialize>(status: u16, body: &T) -> HttpResponse {
    let text = ::serde_json::to_string(body).unwrap_or_else(|_| "{}".to_owned());
    Response::from_string(text).with_header(json_header()).with_status_code(status)
}

pub fn text_ok(body: impl Into<String>) -> HttpResponse {
    Response::from_string(body.into()).with_header(text_header())
}

pub fn no_content() -> HttpResponse {
    Response::from_string(String::new()).with_status_code(204)
}

#[derive(DeriveSerialize)]
struct ErrorEnvelope {
    error: String,
    kind: &'static str,
}

/// Maps the shared `config::Error` taxonomy to an HTTP status + envelope:
/// `ValidationError` -> 400, `NotFound` -> 404, everything
/// else -> 500 with the error kind still surfaced for diagnostics.
pub fn error_response(err: &ConfigError) -> HttpResponse {
    let status = match err {
        ConfigError::Validation(_) => 400,
        ConfigError::NotFound(_) => 404,
        ConfigError::DeviceUnavailable(_) => 409,
        ConfigError::Network(_) | ConfigError::Persistence(_) => 502,
        ConfigError::Internal(_) => 500,
    };
    json_status(
        status,
        &ErrorEnvelope {
            error: err.to_string(),
            kind: err.kind(),
        },
    )
}

pub fn bad_request(message: impl Into<String>) -> HttpResponse {
    json_status(
        400,
        &ErrorEnvelope {
            error: message.into(),
            kind: "validation",
        },
    )
}

pub fn not_found(message: impl Into<String>) -> HttpResponse {
    json_status(
        404,
        &ErrorEnvelope {
            error: message.into(),
            kind: "not_found",
        },
    )
}
