use std::path::Path;

use servedir_core::conf::load_config;

pub fn dump(path: &Path, json: bool) -> anyhow::Result<()> {
    let cfg = load_config(path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
    } else {
        println!("{}", toml::to_string_pretty(&cfg)?);
    }

    Ok(())
}
