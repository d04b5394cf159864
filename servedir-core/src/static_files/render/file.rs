use std::fs::Metadata;
use std::io::SeekFrom;
use std::path::Path;

use bytes::Bytes;
use http::StatusCode;
use httpdate::fmt_http_date;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::path::url_relative_to;
use crate::state::ServeState;
use crate::static_files::render::etag::{etag_matches, file_etag, modified_since};
use crate::static_files::render::headers::HeaderBuilder;
use crate::static_files::render::range::{RangeRequest, parse_range_header};
use crate::static_files::{ConditionalHeaders, ServeError, StaticBody, StaticResponse};

/// Files up to this size are read into memory; larger ones are streamed.
pub(crate) const SMALL_FILE_THRESHOLD: u64 = 64 * 1024;

/// Renders a located regular file: headers, then range or conditional
/// handling, then the body.
pub async fn render_file(
    path: &Path,
    metadata: &Metadata,
    conditional: &ConditionalHeaders,
    state: &ServeState,
) -> Result<StaticResponse, ServeError> {
    let size = metadata.len();
    let modified = metadata.modified().ok();
    let config = &state.config;

    let mut headers = HeaderBuilder::default();
    headers.content_length(size);
    if let Some(name) = path.file_name() {
        headers.content_disposition(&name.to_string_lossy());
    }
    headers.accept_ranges();
    if let Some(mime) = mime_guess::from_path(path).first() {
        headers.content_type(mime.as_ref());
    }

    let etag = match (config.etag, modified) {
        (true, Some(modified)) => Some(
            file_etag(path, modified, &state.etags)
                .await
                .map_err(|err| io_failure(path, err))?,
        ),
        _ => None,
    };
    match (&etag, modified) {
        (Some(etag), _) => headers.etag(etag),
        (None, Some(modified)) => headers.last_modified(&fmt_http_date(modified)),
        (None, None) => {}
    }

    // Configured headers are matched on the path relative to the root and win.
    if let Some(relative) = url_relative_to(&config.public, path) {
        for rule in &config.headers {
            if rule.source.matches(&relative, false).is_some() {
                headers.custom(&rule.headers);
            }
        }
    }

    let range = match conditional.range.as_deref() {
        Some(header) if size > 0 => Some(parse_range_header(header, size)),
        _ => None,
    };

    let range = match range {
        Some(RangeRequest::Unsatisfiable) => {
            headers.unsatisfied_range(size);
            headers.content_length(0);
            return Ok(StaticResponse {
                status: StatusCode::RANGE_NOT_SATISFIABLE,
                headers: headers.build(),
                body: StaticBody::Empty,
            });
        }
        Some(RangeRequest::Satisfiable(range)) => Some(range),
        None => None,
    };

    if conditional.range.is_none() && is_not_modified(conditional, etag.as_deref(), modified) {
        headers.content_length(0);
        return Ok(StaticResponse {
            status: StatusCode::NOT_MODIFIED,
            headers: headers.build(),
            body: StaticBody::Empty,
        });
    }

    let mut file = fs::File::open(path)
        .await
        .map_err(|err| io_failure(path, err))?;

    if size <= SMALL_FILE_THRESHOLD {
        let mut buf = Vec::with_capacity(size as usize);
        file.read_to_end(&mut buf)
            .await
            .map_err(|err| io_failure(path, err))?;

        if let Some(range) = range {
            let end = (range.end as usize).min(buf.len().saturating_sub(1));
            let slice = buf.get(range.start as usize..=end).unwrap_or_default();

            headers.content_range(range, size);
            headers.content_length(slice.len() as u64);

            return Ok(StaticResponse {
                status: StatusCode::PARTIAL_CONTENT,
                headers: headers.build(),
                body: StaticBody::Bytes(Bytes::copy_from_slice(slice)),
            });
        }

        headers.content_length(buf.len() as u64);
        return Ok(StaticResponse {
            status: StatusCode::OK,
            headers: headers.build(),
            body: StaticBody::Bytes(Bytes::from(buf)),
        });
    }

    if let Some(range) = range {
        file.seek(SeekFrom::Start(range.start))
            .await
            .map_err(|err| io_failure(path, err))?;

        headers.content_range(range, size);
        headers.content_length(range.len());

        return Ok(StaticResponse {
            status: StatusCode::PARTIAL_CONTENT,
            headers: headers.build(),
            body: StaticBody::RangedFile {
                file,
                remaining: range.len(),
            },
        });
    }

    Ok(StaticResponse {
        status: StatusCode::OK,
        headers: headers.build(),
        body: StaticBody::File(file),
    })
}

/// `If-None-Match` against the ETag, or `If-Modified-Since` when no ETag is
/// emitted.
fn is_not_modified(
    conditional: &ConditionalHeaders,
    etag: Option<&str>,
    modified: Option<std::time::SystemTime>,
) -> bool {
    match (etag, conditional.if_none_match.as_deref()) {
        (Some(etag), Some(inm)) => etag_matches(etag, inm),
        (Some(_), None) => false,
        (None, _) => conditional
            .if_modified_since
            .as_deref()
            .is_some_and(|ims| !modified_since(modified, ims)),
    }
}

fn io_failure(path: &Path, err: std::io::Error) -> ServeError {
    if err.kind() == std::io::ErrorKind::NotFound {
        return ServeError::NotFound;
    }
    tracing::error!(path = %path.display(), error = %err, "failed to read static file");
    ServeError::Internal
}
