//! `gemrelay init`: write a default config file.

use std::path::Path;

use gemrelay_config::AppConfig;

pub fn run(config_path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if write_default(config_path, force)? {
        println!("Created {}", config_path.display());
        println!("Set GEMRELAY_API_KEY (or add api_key to the file) and run `gemrelay gateway`.");
    } else {
        println!(
            "{} already exists, leaving it alone (use --force to overwrite)",
            config_path.display()
        );
    }
    Ok(())
}

/// Write the default config to `path`. Returns `false` if the file existed
/// and `force` was not set.
fn write_default(path: &Path, force: bool) -> std::io::Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(true)
}
