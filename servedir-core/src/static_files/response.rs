use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode, header};
use thiserror::Error;
use tokio::fs;

/// Terminal pipeline failures. Each maps to one status and one JSON code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ServeError {
    #[error("Bad Request")]
    BadRequest,

    #[error("The requested path could not be found")]
    NotFound,

    #[error("The requested method is not allowed")]
    MethodNotAllowed,

    #[error("A server error has occurred")]
    Internal,
}

impl ServeError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServeError::BadRequest => StatusCode::BAD_REQUEST,
            ServeError::NotFound => StatusCode::NOT_FOUND,
            ServeError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ServeError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ServeError::BadRequest => "bad_request",
            ServeError::NotFound => "not_found",
            ServeError::MethodNotAllowed => "method_not_allowed",
            ServeError::Internal => "internal_server_error",
        }
    }
}

pub enum StaticBody {
    Empty,
    /// Useful for small files, listings and errors.
    Bytes(Bytes),
    /// Useful for large files that require streaming from disk.
    File(fs::File),

    /// Useful for serving range requests for large (media) files.
    RangedFile {
        file: fs::File,
        remaining: u64,
    },
}

impl std::fmt::Debug for StaticBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaticBody::Empty => f.write_str("Empty"),
            StaticBody::Bytes(bytes) => write!(f, "Bytes({})", bytes.len()),
            StaticBody::File(_) => f.write_str("File"),
            StaticBody::RangedFile { remaining, .. } => write!(f, "RangedFile({remaining})"),
        }
    }
}

#[derive(Debug)]
pub struct StaticResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: StaticBody,
}

impl StaticResponse {
    /// In-memory body with `Content-Type` and `Content-Length` set.
    pub fn bytes(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));

        Self {
            status,
            headers,
            body: StaticBody::Bytes(body),
        }
    }

    pub fn json(status: StatusCode, value: &serde_json::Value) -> Self {
        Self::bytes(
            status,
            "application/json; charset=utf-8",
            value.to_string(),
        )
    }

    pub fn html(status: StatusCode, body: String) -> Self {
        Self::bytes(status, "text/html; charset=utf-8", body)
    }

    /// Redirect with an empty body.
    pub fn redirect(status: StatusCode, location: &str) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(location) {
            headers.insert(header::LOCATION, value);
        }
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));

        Self {
            status,
            headers,
            body: StaticBody::Empty,
        }
    }

    /// Raw body bytes for in-memory responses; `None` for file bodies.
    pub fn body_bytes(&self) -> Option<&[u8]> {
        match &self.body {
            StaticBody::Empty => Some(&[]),
            StaticBody::Bytes(bytes) => Some(bytes),
            StaticBody::File(_) | StaticBody::RangedFile { .. } => None,
        }
    }
}

/// Conditional request headers for cache validation and range requests
#[derive(Debug, Default, Clone)]
pub struct ConditionalHeaders {
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub range: Option<String>,
}
