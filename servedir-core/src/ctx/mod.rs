mod request_ctx;
mod request_id;

pub use request_ctx::RequestCtx;
pub use request_id::{REQUEST_ID_HEADER, RequestId};
