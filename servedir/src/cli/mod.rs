mod check;
mod dump;

use std::path::{Path, PathBuf};

use anyhow::Context;
use servedir_core::conf::load_config;
use servedir_core::server;

pub use check::check;
pub use dump::dump;

/// Loads the config, applies command-line overrides and runs the server.
pub fn run(path: &Path, listen: Option<String>, public: Option<PathBuf>) -> anyhow::Result<()> {
    let mut cfg = load_config(path)
        .with_context(|| format!("failed to load servedir config {}", path.display()))?;

    if let Some(listen) = listen {
        cfg.server.listen = listen;
    }
    if let Some(public) = public {
        cfg.serve.public = public;
        cfg.serve.validate()?;
    }

    server::run(cfg)
}
