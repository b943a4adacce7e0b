//! GemRelay CLI, the main entry point.
//!
//! Commands:
//! - `gateway`: start the HTTP server
//! - `chat`: one-shot or interactive chat in the terminal
//! - `doctor`: check configuration and reachability
//! - `init`: write a default `gemrelay.toml`

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "gemrelay",
    about = "GemRelay: a Gemini-backed chat relay",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to the config file
    #[arg(
        short,
        long,
        global = true,
        env = "GEMRELAY_CONFIG",
        default_value = gemrelay_config::DEFAULT_CONFIG_FILE
    )]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with the model from the terminal
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Conversation to continue (defaults to the shared session)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Diagnose configuration and connectivity
    Doctor,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Gateway { port } => commands::gateway::run(&cli.config, port).await?,
        Commands::Chat { message, session } => {
            commands::chat::run(&cli.config, message, session).await?
        }
        Commands::Doctor => commands::doctor::run(&cli.config).await?,
        Commands::Init { force } => commands::init::run(&cli.config, force)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
