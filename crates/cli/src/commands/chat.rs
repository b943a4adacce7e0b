//! `gemrelay chat`: interactive or single-message chat mode.
//!
//! Goes through the same [`PromptManager`] as the HTTP gateway, so history
//! and response clean-up behave identically.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use gemrelay_chat::PromptManager;
use gemrelay_core::SessionId;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{load_config, missing_key_error};

pub async fn run(
    config_path: &Path,
    message: Option<String>,
    session: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    if !config.has_api_key() {
        return Err(missing_key_error(config_path));
    }

    let provider = gemrelay_providers::build_from_config(&config)?;
    let manager = Arc::new(PromptManager::from_config(provider, &config));
    let session = session.map(SessionId::from).unwrap_or_default();

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let result = manager.generate(&session, &msg).await;
        eprint!("\r              \r");
        println!("{}", result?);
        return Ok(());
    }

    println!();
    println!("  GemRelay Chat");
    println!();
    println!("  Provider:  {}", manager.provider_name());
    println!("  Model:     {}", manager.model());
    println!("  Session:   {session}");
    println!("  History:   {} entries", config.history.max_entries);
    println!();
    println!("  Type your message and press Enter.");
    println!("  /reset clears the conversation, /history shows it.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => {}
            "exit" | "quit" => break,
            "/reset" => {
                manager.reset(&session).await;
                println!("  (conversation cleared)");
            }
            "/history" => {
                for entry in manager.history(&session).await {
                    println!("  | {entry}");
                }
            }
            _ => {
                eprint!("  ...");
                match manager.generate(&session, input).await {
                    Ok(response) => {
                        eprint!("\r     \r");
                        println!();
                        for line in response.lines() {
                            println!("  Gemini > {line}");
                        }
                        println!();
                    }
                    Err(e) => {
                        eprint!("\r     \r");
                        eprintln!("  [Error] {e}");
                        println!();
                    }
                }
            }
        }
        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}
