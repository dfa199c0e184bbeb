//! Config command - show the settings this invocation would use

use anyhow::Result;
use strand_config::LoadedConfig;

pub fn run(loaded: &LoadedConfig) -> Result<()> {
    if let Some(root) = loaded.project_root() {
        println!("# project root: {}", root.display());
    }
    if loaded.sources.is_empty() {
        println!("# no configuration files found; defaults and environment only");
    }
    for source in &loaded.sources {
        println!("# from {}", source.display());
    }
    print!("{}", toml::to_string_pretty(&loaded.config)?);
    Ok(())
}
