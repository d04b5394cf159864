use thiserror::Error;

/// Reasons an upload is refused. Always answered with a 400 JSON body.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Missing multipart boundary")]
    MissingBoundary,

    #[error("No file found in request")]
    NoFile,

    #[error("Invalid filename \"{0}\"")]
    InvalidFilename(String),

    #[error("File \"{0}\" already exists")]
    AlreadyExists(String),

    #[error("{0}")]
    Write(#[from] std::io::Error),
}
