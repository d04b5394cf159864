pub mod conf;
pub mod ctx;
pub mod logging;
pub mod matcher;
pub mod path;
pub mod redirect;
pub mod rewrite;
pub mod server;
pub mod state;
pub mod static_files;
pub mod upload;

pub use state::ServeState;
