use std::path::Path;

use tokio::fs;

use crate::path::join_contained;
use crate::upload::UploadError;
use crate::upload::multipart::first_file_part;

/// Writes the first file part of `body` under `root` and returns its name.
///
/// The existence check and the write are separate steps, so two concurrent
/// uploads of one name can both pass the check.
pub async fn ingest(body: &[u8], boundary: &str, root: &Path) -> Result<String, UploadError> {
    let part = first_file_part(body, boundary).ok_or(UploadError::NoFile)?;

    let destination = join_contained(root, &part.filename)
        .filter(|dest| !part.filename.is_empty() && dest.as_path() != root)
        .ok_or_else(|| UploadError::InvalidFilename(part.filename.clone()))?;

    if fs::symlink_metadata(&destination).await.is_ok() {
        return Err(UploadError::AlreadyExists(part.filename));
    }

    fs::write(&destination, part.data).await?;

    tracing::info!(
        filename = %part.filename,
        bytes = part.data.len(),
        "upload stored"
    );

    Ok(part.filename)
}
