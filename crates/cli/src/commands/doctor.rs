//! `gemrelay doctor`: diagnose configuration and connectivity.

use std::path::Path;

use gemrelay_config::AppConfig;
use gemrelay_core::Provider;

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("GemRelay Doctor: System Diagnostics");
    println!("===================================\n");

    let mut issues = 0;

    if config_path.exists() {
        println!("  [ok]   Config file found: {}", config_path.display());
    } else {
        println!(
            "  [warn] No config file at {}, using defaults (run `gemrelay init`)",
            config_path.display()
        );
    }

    let config = match AppConfig::load_with_env(config_path, |key| std::env::var(key).ok()) {
        Ok(config) => {
            println!("  [ok]   Configuration valid");
            config
        }
        Err(e) => {
            println!("  [fail] Configuration invalid: {e}");
            println!("\n  1 issue(s) found. Fix the config before continuing.");
            return Err(format!("Invalid configuration: {e}").into());
        }
    };

    if config.gateway.public_dir.is_dir() {
        println!("  [ok]   Public directory exists: {}", config.gateway.public_dir.display());
    } else {
        println!(
            "  [warn] Public directory missing: {} (only built-in pages will be served)",
            config.gateway.public_dir.display()
        );
        issues += 1;
    }

    match gemrelay_providers::build_from_config(&config) {
        Ok(provider) => {
            println!("  [ok]   API key configured");
            match provider.health_check().await {
                Ok(true) => println!("  [ok]   Remote service reachable ({})", config.model),
                Ok(false) => {
                    println!("  [fail] Remote service answered but rejected the request");
                    issues += 1;
                }
                Err(e) => {
                    println!("  [fail] Remote service unreachable: {e}");
                    issues += 1;
                }
            }
        }
        Err(e) => {
            println!("  [fail] {e}. Set GEMRELAY_API_KEY, GEMINI_API_KEY or API_KEY");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
