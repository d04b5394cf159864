use http::Method;

use crate::ctx::RequestCtx;
use crate::path::join_contained;
use crate::redirect::decide_redirect;
use crate::state::ServeState;
use crate::static_files::render::{DirectoryOutcome, render_directory, render_file};
use crate::static_files::resolve::{decode_request_path, locate};
use crate::static_files::{ServeError, StaticResponse, render_error};

/// Runs a `GET`/`HEAD` request through the serving pipeline. Every outcome,
/// errors included, becomes a response.
pub async fn handle_static_request(ctx: &RequestCtx, state: &ServeState) -> StaticResponse {
    match serve(ctx, state).await {
        Ok(response) => response,
        Err(err) => render_error(err, ctx.accepts_json(), state).await,
    }
}

async fn serve(ctx: &RequestCtx, state: &ServeState) -> Result<StaticResponse, ServeError> {
    if ctx.method != Method::GET && ctx.method != Method::HEAD {
        return Err(ServeError::MethodNotAllowed);
    }

    let config = &state.config;
    let request_path = decode_request_path(ctx.path())?;

    // Containment is checked before anything touches the filesystem.
    if join_contained(&config.public, &request_path).is_none() {
        return Err(ServeError::BadRequest);
    }

    let clean_url = config.clean_urls.applies_to(&request_path);

    if let Some(redirect) = decide_redirect(&request_path, ctx.query(), config, clean_url) {
        return Ok(StaticResponse::redirect(redirect.status, &redirect.location()));
    }

    let located = locate(&request_path, config, clean_url)
        .await?
        .ok_or(ServeError::NotFound)?;

    if located.metadata.is_dir() {
        return match render_directory(&located.path, &request_path, config).await? {
            DirectoryOutcome::Listing(listing) => Ok(listing.into_response(ctx.accepts_json())),
            DirectoryOutcome::Single { path, metadata } => {
                render_file(&path, &metadata, &ctx.conditional(), state).await
            }
            DirectoryOutcome::Hidden => Err(ServeError::NotFound),
        };
    }

    if !located.metadata.is_file() {
        return Err(ServeError::NotFound);
    }

    render_file(&located.path, &located.metadata, &ctx.conditional(), state).await
}
