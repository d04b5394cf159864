//! Reserved `POST /__upload` endpoint that stores one multipart file in the
//! served root.

mod error;
mod ingest;
mod multipart;

use http::{Method, StatusCode, header};
use serde_json::json;

use crate::conf::ServeConfig;
use crate::ctx::RequestCtx;
use crate::state::ServeState;
use crate::static_files::StaticResponse;

pub use error::UploadError;
pub use ingest::ingest;

pub const UPLOAD_PATH: &str = "/__upload";

/// True for requests the upload endpoint owns. Checked before the static
/// pipeline.
pub fn is_upload_request(ctx: &RequestCtx, config: &ServeConfig) -> bool {
    config.upload && ctx.method == Method::POST && ctx.path() == UPLOAD_PATH
}

/// Handles a buffered upload body. Rejections are 400 JSON, never errors.
pub async fn handle_upload(ctx: &RequestCtx, body: &[u8], state: &ServeState) -> StaticResponse {
    let outcome = match ctx
        .header(header::CONTENT_TYPE)
        .and_then(multipart::parse_boundary)
    {
        Some(boundary) => ingest(body, &boundary, state.root()).await,
        None => Err(UploadError::MissingBoundary),
    };

    match outcome {
        Ok(filename) => StaticResponse::json(
            StatusCode::OK,
            &json!({ "success": true, "filename": filename }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "upload rejected");
            StaticResponse::json(
                StatusCode::BAD_REQUEST,
                &json!({ "success": false, "error": err.to_string() }),
            )
        }
    }
}
