use anyhow::{Context, Result};
use artindex::config::Config;
use std::path::PathBuf;

/// Write a starter configuration file with every default spelled out
pub fn init_config(path: PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    let content = format!(
        "# artindex configuration\n# Set OPENSEARCH_PASSWORD instead of a password entry when using basic auth.\n\n{}",
        Config::default().to_toml()?
    );

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Created configuration file: {}", path.display());
    Ok(())
}
