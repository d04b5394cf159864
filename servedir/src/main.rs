mod cli;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use servedir_core::logging::{default_log_mode, init_logging};

const DEFAULT_CONFIG: &str = "config/servedir.toml";

#[derive(Parser, Debug)]
#[command(
    name = "servedir",
    version,
    about = "servedir: static file server with rewrites, redirects and uploads"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the server (default)
    Run {
        /// Path to the servedir config file
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Override `server.listen`
        #[arg(long)]
        listen: Option<String>,

        /// Override `serve.public`
        #[arg(long)]
        public: Option<PathBuf>,
    },

    /// Load and validate the config, then print a summary
    Check {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },

    /// Print the resolved config
    Dump {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Emit JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Check { config }) => cli::check(&config),

        Some(Command::Dump { config, json }) => cli::dump(&config, json),

        Some(Command::Run {
            config,
            listen,
            public,
        }) => {
            init_logging(default_log_mode());
            cli::run(&config, listen, public)
        }

        None => {
            init_logging(default_log_mode());
            cli::run(&PathBuf::from(DEFAULT_CONFIG), None, None)
        }
    }
}
