use std::time::Instant;

use http::{HeaderMap, HeaderName, Method, Uri, header};

use crate::ctx::RequestId;
use crate::static_files::ConditionalHeaders;

/// Request as seen by the serving pipeline.
#[derive(Debug)]
pub struct RequestCtx {
    pub id: RequestId,
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,

    /// When the gateway started handling the request.
    pub started: Instant,
}

impl Default for RequestCtx {
    fn default() -> Self {
        Self::new(Method::GET, Uri::from_static("/"), HeaderMap::new())
    }
}

impl RequestCtx {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            id: RequestId::from_headers(&headers),
            method,
            uri,
            headers,
            started: Instant::now(),
        }
    }

    /// Raw (still percent-encoded) request path.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    pub fn header(&self, name: HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn accepts_json(&self) -> bool {
        self.header(header::ACCEPT)
            .is_some_and(|accept| accept.contains("application/json"))
    }

    /// Validation and range headers consulted when a file is rendered.
    pub fn conditional(&self) -> ConditionalHeaders {
        ConditionalHeaders {
            if_none_match: self.header(header::IF_NONE_MATCH).map(str::to_string),
            if_modified_since: self.header(header::IF_MODIFIED_SINCE).map(str::to_string),
            range: self.header(header::RANGE).map(str::to_string),
        }
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }
}
