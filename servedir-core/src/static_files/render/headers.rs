use std::collections::BTreeMap;

use http::{HeaderMap, HeaderName, HeaderValue, header};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::static_files::render::range::ByteRange;

/// RFC 5987 `attr-char`: everything outside it is percent-encoded.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

#[derive(Debug, Default)]
pub(crate) struct HeaderBuilder {
    headers: HeaderMap,
}

impl HeaderBuilder {
    /// Inserts (or removes) a header from the header map.
    ///
    /// If the value cannot be converted or is empty, the header is removed
    /// instead.
    pub(crate) fn insert(&mut self, header_name: HeaderName, value: &str) {
        let header_value = HeaderValue::from_str(value).unwrap_or(HeaderValue::from_static(""));
        if header_value.is_empty() {
            self.headers.remove(header_name);
        } else {
            self.headers.insert(header_name, header_value);
        }
    }

    pub(crate) fn accept_ranges(&mut self) {
        self.insert(header::ACCEPT_RANGES, "bytes");
    }

    pub(crate) fn content_type(&mut self, value: &str) {
        self.insert(header::CONTENT_TYPE, value);
    }

    pub(crate) fn content_length(&mut self, value: u64) {
        self.insert(header::CONTENT_LENGTH, &value.to_string());
    }

    pub(crate) fn content_range(&mut self, range: ByteRange, len: u64) {
        self.insert(
            header::CONTENT_RANGE,
            &format!("bytes {}-{}/{}", range.start, range.end, len),
        );
    }

    pub(crate) fn unsatisfied_range(&mut self, len: u64) {
        self.insert(header::CONTENT_RANGE, &format!("bytes */{len}"));
    }

    pub(crate) fn content_disposition(&mut self, filename: &str) {
        self.insert(header::CONTENT_DISPOSITION, &inline_disposition(filename));
    }

    pub(crate) fn etag(&mut self, value: &str) {
        self.insert(header::ETAG, value);
    }

    pub(crate) fn last_modified(&mut self, value: &str) {
        self.insert(header::LAST_MODIFIED, value);
    }

    /// Applies configured headers on top of the defaults. Names that are not
    /// valid header names are skipped.
    pub(crate) fn custom(&mut self, headers: &BTreeMap<String, String>) {
        for (name, value) in headers {
            match HeaderName::from_bytes(name.as_bytes()) {
                Ok(header_name) => self.insert(header_name, value),
                Err(_) => tracing::warn!(header = %name, "ignoring invalid custom header name"),
            }
        }
    }

    pub(crate) fn build(self) -> HeaderMap {
        self.headers
    }
}

/// `inline; filename="…"`, with an RFC 5987 `filename*` for names that are
/// not plain printable ASCII.
fn inline_disposition(filename: &str) -> String {
    let plain = filename
        .chars()
        .all(|c| c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\');

    if plain {
        return format!("inline; filename=\"{filename}\"");
    }

    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '?'
            }
        })
        .collect();

    format!(
        "inline; filename=\"{fallback}\"; filename*=UTF-8''{}",
        utf8_percent_encode(filename, ATTR_CHAR)
    )
}
