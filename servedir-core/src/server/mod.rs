mod gateway;
mod setup;

pub use gateway::ServedirGateway;
pub use setup::{build_server, run};
