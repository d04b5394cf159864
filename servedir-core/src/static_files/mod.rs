mod cache;
mod error_page;
pub mod handler;
pub mod render;
mod resolve;
mod response;
#[cfg(test)]
mod tests;

pub use cache::EtagCache;
pub use error_page::render_error;
pub use handler::handle_static_request;
pub use resolve::{Located, decode_request_path, locate};
pub use response::{ConditionalHeaders, ServeError, StaticBody, StaticResponse};
