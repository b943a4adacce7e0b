pub mod chat;
pub mod doctor;
pub mod gateway;
pub mod init;

use std::path::Path;

use gemrelay_config::AppConfig;

/// Load the config file at `path` with process environment overrides.
pub fn load_config(path: &Path) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = AppConfig::load_with_env(path, |key| std::env::var(key).ok())
        .map_err(|e| format!("Failed to load config: {e}"))?;
    Ok(config)
}

/// Print setup help for a missing credential and return the error.
pub fn missing_key_error(path: &Path) -> Box<dyn std::error::Error> {
    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables (or put it in .env):");
    eprintln!("    GEMRELAY_API_KEY=...");
    eprintln!("    GEMINI_API_KEY=...");
    eprintln!("    API_KEY=...");
    eprintln!();
    eprintln!("  Or add `api_key = \"...\"` to {}", path.display());
    eprintln!();
    gemrelay_config::ConfigError::MissingCredential.into()
}
