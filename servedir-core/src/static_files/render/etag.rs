use std::path::Path;
use std::time::SystemTime;

use httpdate::parse_http_date;
use tokio::fs;
use tokio::io::AsyncReadExt;

use crate::static_files::EtagCache;

const HASH_CHUNK: usize = 32 * 1024;

/// Quoted content-hash ETag for `path`, reusing the cached hash while the
/// mtime is unchanged.
pub(crate) async fn file_etag(
    path: &Path,
    modified: SystemTime,
    cache: &EtagCache,
) -> std::io::Result<String> {
    if let Some(hash) = cache.get(path, modified) {
        return Ok(format!("\"{hash}\""));
    }

    let hash = hash_file(path).await?;
    cache.insert(path.to_path_buf(), modified, hash.clone());

    Ok(format!("\"{hash}\""))
}

/// Streams the file through blake3, seeded with its extension so that equal
/// bytes served under different types get different tags.
async fn hash_file(path: &Path) -> std::io::Result<String> {
    let ext = path.extension().map(|e| e.to_string_lossy()).unwrap_or_default();

    let mut hasher = blake3::Hasher::new();
    hasher.update(ext.as_bytes());
    hasher.update(b"-");

    let mut file = fs::File::open(path).await?;
    let mut buf = vec![0u8; HASH_CHUNK];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// Check if the ETag matches the If-None-Match header value.
/// Handles both strong and weak comparison.
pub(crate) fn etag_matches(etag: &str, if_none_match: &str) -> bool {
    if if_none_match.trim() == "*" {
        return true;
    }

    let etag_value = etag.strip_prefix("W/").unwrap_or(etag);
    if_none_match.split(',').any(|candidate| {
        let candidate = candidate.trim();
        candidate.strip_prefix("W/").unwrap_or(candidate) == etag_value
    })
}

/// Check if the file has been modified since the given date.
pub(crate) fn modified_since(file_modified: Option<SystemTime>, if_modified_since: &str) -> bool {
    let Some(file_time) = file_modified else {
        return true; // Unknown mtime, assume modified
    };

    let Ok(since_time) = parse_http_date(if_modified_since) else {
        return true; // Invalid header, assume modified
    };

    // HTTP dates have 1-second resolution, so sub-second differences
    // count as NOT modified.
    match file_time.duration_since(since_time) {
        Ok(delta) => delta.as_secs() >= 1,
        Err(_) => false,
    }
}
