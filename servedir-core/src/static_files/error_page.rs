use http::{HeaderValue, header};
use serde_json::json;
use tokio::fs;

use crate::state::ServeState;
use crate::static_files::render::render_file;
use crate::static_files::{ConditionalHeaders, ServeError, StaticResponse};

/// Single rendering path for terminal errors.
///
/// JSON clients get `{"error":{"code","message"}}`. Everyone else gets
/// `{root}/{status}.html` when it exists, or the built-in page.
pub async fn render_error(err: ServeError, accepts_json: bool, state: &ServeState) -> StaticResponse {
    let status = err.status();

    let mut response = if accepts_json {
        StaticResponse::json(
            status,
            &json!({
                "error": {
                    "code": err.code(),
                    "message": err.to_string(),
                }
            }),
        )
    } else {
        match custom_page(err, state).await {
            Some(page) => page,
            None => StaticResponse::html(status, builtin_page(err)),
        }
    };

    if err == ServeError::MethodNotAllowed {
        response
            .headers
            .insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
    }

    response
}

async fn custom_page(err: ServeError, state: &ServeState) -> Option<StaticResponse> {
    let status = err.status();
    let path = state.root().join(format!("{}.html", status.as_u16()));

    let metadata = fs::symlink_metadata(&path).await.ok()?;
    if !metadata.is_file() {
        return None;
    }

    match render_file(&path, &metadata, &ConditionalHeaders::default(), state).await {
        Ok(mut page) => {
            page.status = status;
            Some(page)
        }
        Err(render_err) => {
            tracing::warn!(path = %path.display(), error = %render_err, "custom error page failed");
            None
        }
    }
}

fn builtin_page(err: ServeError) -> String {
    let status = err.status();
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{code} {reason}</title>\n</head>\n<body>\n<h1>{code}</h1>\n<p>{message}</p>\n</body>\n</html>\n",
        code = status.as_u16(),
        reason = status.canonical_reason().unwrap_or("Error"),
        message = err,
    )
}
