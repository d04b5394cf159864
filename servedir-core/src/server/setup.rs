use anyhow::{Context, Result};
use pingora::prelude::*;
use pingora::server::Server;
use pingora::server::configuration::ServerConf;

use crate::conf::AppConfig;
use crate::server::ServedirGateway;
use crate::state::ServeState;

/// Run the Pingora server with the given configuration. Blocks forever.
pub fn run(config: AppConfig) -> Result<()> {
    let server = build_server(&config)?;

    tracing::info!(
        listen = %config.server.listen,
        public = %config.serve.public.display(),
        "servedir listening"
    );

    server.run_forever();
}

/// Build the Pingora server with a single gateway service.
pub fn build_server(config: &AppConfig) -> Result<Server> {
    let mut server = if let Some(threads) = config.server.threads {
        tracing::debug!(
            threads,
            "Creating Pingora server with overridden worker threads"
        );
        let mut conf =
            ServerConf::new().context("could not construct pingora server configuration")?;
        conf.threads = threads;
        Server::new_with_opt_and_conf(None, conf)
    } else {
        // "None" is required here to truly tell Pingora to use its default settings.
        Server::new(None)?
    };

    server.bootstrap();

    let state = ServeState::new(config.serve.clone())?;
    let gateway = ServedirGateway::new(state);

    let mut svc = http_proxy_service(&server.configuration, gateway);
    svc.add_tcp(&config.server.listen);

    server.add_service(svc);

    Ok(server)
}
