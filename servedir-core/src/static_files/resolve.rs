use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use futures_util::future::join_all;
use tokio::fs;

use crate::conf::ServeConfig;
use crate::path::{extension, join_contained, last_segment};
use crate::rewrite::resolve_rewrites;
use crate::static_files::ServeError;

/// A filesystem entry the request resolved to. Symlinks are already
/// followed, so `metadata` describes the target.
#[derive(Debug)]
pub struct Located {
    pub path: PathBuf,
    pub metadata: Metadata,
}

/// Percent-decodes the raw request path once. A `%` not followed by two hex
/// digits, or a decoded path that is not UTF-8, is a bad request.
pub fn decode_request_path(raw: &str) -> Result<String, ServeError> {
    if !has_valid_escapes(raw) {
        return Err(ServeError::BadRequest);
    }

    percent_encoding::percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ServeError::BadRequest)
}

fn has_valid_escapes(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.iter().enumerate().all(|(idx, byte)| {
        *byte != b'%'
            || bytes
                .get(idx + 1..idx + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    })
}

/// Finds the entry on disk for the decoded request path.
///
/// Order: a direct stat when the path has an extension, then the rewritten
/// path or the implicit `index.html` / `.html` candidates, then the literal
/// path. `Ok(None)` means not found.
pub async fn locate(
    request_path: &str,
    config: &ServeConfig,
    clean_url: bool,
) -> Result<Option<Located>, ServeError> {
    let root = config.public.as_path();
    let literal = join_contained(root, request_path).ok_or(ServeError::BadRequest)?;

    let mut found = None;

    if !extension(request_path).is_empty() {
        found = stat(&literal).await?.map(|metadata| (literal.clone(), metadata));
    }

    let rewritten = resolve_rewrites(request_path, &config.rewrites);

    if found.is_none() && (clean_url || rewritten.is_some()) {
        found = find_related(root, request_path, rewritten.as_deref()).await?;
    }

    if found.is_none() {
        found = stat(&literal).await?.map(|metadata| (literal.clone(), metadata));
    }

    let Some((path, metadata)) = found else {
        return Ok(None);
    };

    if metadata.file_type().is_symlink() {
        if !config.symlinks {
            tracing::debug!(path = %path.display(), "symlink not followed");
            return Ok(None);
        }
        return resolve_symlink(root, &path).await;
    }

    Ok(Some(Located { path, metadata }))
}

/// Candidates tried instead of the literal path: the rewrite target alone, or
/// `{path}/index.html` then `{path}.html`. All are stat'ed concurrently; the
/// first hit in candidate order wins.
async fn find_related(
    root: &Path,
    request_path: &str,
    rewritten: Option<&str>,
) -> Result<Option<(PathBuf, Metadata)>, ServeError> {
    let candidates: Vec<PathBuf> = candidate_paths(request_path, rewritten)
        .iter()
        .filter_map(|candidate| join_contained(root, candidate))
        .collect();

    let probes = join_all(candidates.iter().map(|path| stat(path))).await;

    for (path, probe) in candidates.into_iter().zip(probes) {
        if let Some(metadata) = probe? {
            return Ok(Some((path, metadata)));
        }
    }

    Ok(None)
}

pub(crate) fn candidate_paths(request_path: &str, rewritten: Option<&str>) -> Vec<String> {
    if let Some(rewritten) = rewritten {
        return vec![rewritten.to_string()];
    }

    let index = format!("{}/index.html", request_path.trim_end_matches('/'));
    let sibling = match request_path.strip_suffix('/') {
        Some(trimmed) => format!("{trimmed}.html"),
        None => format!("{request_path}.html"),
    };

    [index, sibling]
        .into_iter()
        .filter(|candidate| last_segment(candidate) != ".html")
        .collect()
}

/// Follows a symlink to its real path. Targets outside the served root, or
/// missing targets, are not found.
async fn resolve_symlink(root: &Path, link: &Path) -> Result<Option<Located>, ServeError> {
    let real = match fs::canonicalize(link).await {
        Ok(real) => real,
        Err(err) if is_recoverable(&err) => return Ok(None),
        Err(err) => return Err(io_failure(link, err)),
    };

    if !real.starts_with(root) {
        tracing::warn!(link = %link.display(), target = %real.display(), "symlink escapes served root");
        return Ok(None);
    }

    Ok(stat(&real)
        .await?
        .map(|metadata| Located { path: real, metadata }))
}

/// `lstat` that maps not-found and not-a-directory to `None`.
async fn stat(path: &Path) -> Result<Option<Metadata>, ServeError> {
    match fs::symlink_metadata(path).await {
        Ok(metadata) => Ok(Some(metadata)),
        Err(err) if is_recoverable(&err) => Ok(None),
        Err(err) => Err(io_failure(path, err)),
    }
}

fn is_recoverable(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

fn io_failure(path: &Path, err: std::io::Error) -> ServeError {
    tracing::error!(path = %path.display(), error = %err, "stat failed");
    ServeError::Internal
}
