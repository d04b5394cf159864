use std::path::Path;

use servedir_core::conf::types::Applicability;
use servedir_core::conf::{ConfigError, load_config};

pub fn check(path: &Path) -> anyhow::Result<()> {
    match load_config(path) {
        Ok(cfg) => {
            let serve = &cfg.serve;
            println!("✔ Config loaded successfully");
            println!("✔ serving {}", serve.public.display());
            println!("✔ listening on {}", cfg.server.listen);
            println!("✔ {} rewrites", serve.rewrites.len());
            println!("✔ {} redirects", serve.redirects.len());
            println!("✔ {} header rules", serve.headers.len());
            println!("✔ clean urls: {}", describe(&serve.clean_urls));
            println!("✔ directory listing: {}", describe(&serve.directory_listing));
            println!(
                "✔ uploads {}",
                if serve.upload { "enabled" } else { "disabled" }
            );
            Ok(())
        }
        Err(err) => {
            eprintln!("{err}");
            if let Some(hint) = config_error_hint(&err) {
                eprintln!();
                eprintln!("{hint}");
            }
            std::process::exit(1);
        }
    }
}

fn describe(applicability: &Applicability) -> String {
    match applicability {
        Applicability::Toggle(true) => "everywhere".to_string(),
        Applicability::Toggle(false) => "off".to_string(),
        Applicability::Patterns(patterns) => format!("{} patterns", patterns.len()),
    }
}

fn config_error_hint(err: &ConfigError) -> Option<&'static str> {
    match err {
        ConfigError::MissingPublic { .. } => Some(
            "The served root must be an existing directory.\n\
             \n\
             Example:\n\
             \n\
             [serve]\n\
             public = \"public\"",
        ),

        ConfigError::InvalidRedirectStatus { .. } => Some(
            "Redirect rules need a 3xx status (301, 302, 307 or 308).\n\
             \n\
             Omit `status` to use 301.",
        ),

        ConfigError::ReadFile { .. } | ConfigError::Parse { .. } => None,
    }
}
