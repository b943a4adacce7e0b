//! `gemrelay gateway`: start the HTTP server.

use std::path::Path;

use super::{load_config, missing_key_error};

pub async fn run(config_path: &Path, port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    // Fail before binding a port
    if !config.has_api_key() {
        return Err(missing_key_error(config_path));
    }

    println!("GemRelay Gateway");
    println!("   Listening: {}", config.bind_addr());
    println!("   Model:     {}", config.model);
    println!("   Public:    {}", config.gateway.public_dir.display());

    gemrelay_gateway::start(config).await?;

    Ok(())
}
