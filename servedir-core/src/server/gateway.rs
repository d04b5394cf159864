use async_trait::async_trait;
use bytes::BytesMut;
use http::HeaderValue;
use pingora::prelude::*;
use pingora_http::ResponseHeader;
use tokio::io::AsyncReadExt;
use tracing::Instrument;

use crate::ctx::{REQUEST_ID_HEADER, RequestCtx};
use crate::state::ServeState;
use crate::static_files::{StaticBody, StaticResponse, handle_static_request};
use crate::upload::{handle_upload, is_upload_request};

const CHUNK_SIZE: usize = 32 * 1024;

/// Answers every request inside `request_filter`; nothing is ever proxied.
pub struct ServedirGateway {
    state: ServeState,
}

impl ServedirGateway {
    pub fn new(state: ServeState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl ProxyHttp for ServedirGateway {
    type CTX = RequestCtx;

    fn new_ctx(&self) -> Self::CTX {
        RequestCtx::default()
    }

    async fn upstream_peer(
        &self,
        _session: &mut Session,
        _ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        Err(Error::new(Custom("servedir has no upstream")))
    }

    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool> {
        let req = session.req_header();
        *ctx = RequestCtx::new(req.method.clone(), req.uri.clone(), req.headers.clone());

        let span = tracing::info_span!(
            "request",
            request_id = %ctx.id,
            method = %ctx.method,
            path = %ctx.path(),
        );

        async {
            let response = if is_upload_request(ctx, &self.state.config) {
                let body = read_body(session).await?;
                handle_upload(ctx, &body, &self.state).await
            } else {
                handle_static_request(ctx, &self.state).await
            };

            let status = response.status;
            write_static_response(session, response, ctx).await?;

            tracing::info!(
                method = %ctx.method,
                path = %ctx.path(),
                status = status.as_u16(),
                elapsed_ms = ctx.started.elapsed().as_millis() as u64,
                "request served"
            );

            Ok::<_, Box<Error>>(true)
        }
        .instrument(span)
        .await
    }
}

/// Buffers the whole request body.
async fn read_body(session: &mut Session) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    while let Some(chunk) = session.read_request_body().await? {
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

async fn write_static_response(
    session: &mut Session,
    response: StaticResponse,
    ctx: &RequestCtx,
) -> Result<()> {
    let mut resp = ResponseHeader::build(response.status, None)?;
    for (name, value) in response.headers.iter() {
        resp.insert_header(name, value)?;
    }
    if let Ok(id) = HeaderValue::from_str(&ctx.id.0) {
        resp.insert_header(REQUEST_ID_HEADER, id)?;
    }

    session.write_response_header(Box::new(resp), false).await?;

    if ctx.is_head() {
        // Short-circuit the body write step for HEAD requests.
        session.write_response_body(None, true).await?;
        return Ok(());
    }

    match response.body {
        StaticBody::Empty => {
            session.write_response_body(None, true).await?;
        }

        StaticBody::Bytes(bytes) => {
            session.write_response_body(Some(bytes), true).await?;
        }

        StaticBody::File(mut file) => {
            let mut buf = BytesMut::with_capacity(CHUNK_SIZE);

            loop {
                buf.resize(CHUNK_SIZE, 0);

                let n = file
                    .read(&mut buf[..])
                    .await
                    .map_err(|_| Error::new(Custom("static file read error")))?;

                if n == 0 {
                    break;
                }

                buf.truncate(n);
                session
                    .write_response_body(Some(buf.split().freeze()), false)
                    .await?;
            }

            session.write_response_body(None, true).await?;
        }

        StaticBody::RangedFile {
            mut file,
            mut remaining,
        } => {
            let mut buf = BytesMut::with_capacity(CHUNK_SIZE);

            while remaining > 0 {
                let to_read = std::cmp::min(CHUNK_SIZE as u64, remaining) as usize;
                buf.resize(to_read, 0);

                let n = file
                    .read(&mut buf[..])
                    .await
                    .map_err(|_| Error::new(Custom("static file read error")))?;

                if n == 0 {
                    break;
                }

                remaining -= n as u64;
                buf.truncate(n);
                session
                    .write_response_body(Some(buf.split().freeze()), false)
                    .await?;
            }

            session.write_response_body(None, true).await?;
        }
    }

    Ok(())
}
