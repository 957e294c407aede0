//! Termsheet CLI - Extract financial terms from PDF contracts.

use clap::Parser;
use termsheet_cli::commands;
use termsheet_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr; `-v`/`-vv` take precedence over `RUST_LOG`
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> termsheet_cli::Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::path()?,
    };

    let mut config = Config::load_from(&config_path)?;
    cli.apply_to(&mut config);

    let formatter = Formatter::new(config.output.format, config.output.color);

    match cli.command {
        Command::Extract(args) => {
            commands::execute_extract(args, &mut config, &formatter).await?;
        }
        Command::Config(args) => {
            commands::execute_config(args, &config, &config_path, &formatter)?;
        }
        cmd => {
            // Commands that only read or maintain the store
            let store = config.storage.open_store()?;

            match cmd {
                Command::Show(args) => commands::execute_show(args, &store, &formatter)?,
                Command::List(args) => commands::execute_list(args, &store, &formatter)?,
                Command::Stats => commands::execute_stats(&store, &formatter)?,
                Command::Delete(args) => commands::execute_delete(args, &store, &formatter)?,
                Command::Hash(args) => commands::execute_hash(args, &store, &formatter)?,
                Command::Extract(_) | Command::Config(_) => unreachable!(),
            }
        }
    }

    Ok(())
}
