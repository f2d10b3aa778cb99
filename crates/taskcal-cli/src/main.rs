mod cli;
mod commands;
mod config;
mod views;

use clap::Parser;
use owo_colors::OwoColorize;
use taskcal_core::db;
use taskcal_core::models::MaterializerConfig;
use taskcal_core::repository::SqliteRepository;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{} {}", "error:".red().bold(), err);
        for cause in err.chain().skip(1) {
            eprintln!("  {} {}", "caused by:".dimmed(), cause);
        }
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Preview is pure date arithmetic; it never touches the database.
    let command = match cli.command {
        cli::Commands::Preview(args) => return commands::preview::run(args),
        command => command,
    };

    let config = config::load()?;

    let pool = db::establish_connection(&config.database_path).await?;
    let repo = SqliteRepository::new(
        pool,
        MaterializerConfig {
            lookahead_days: config.lookahead_days,
            max_batch_size: config.max_batch_size,
        },
    );

    match command {
        cli::Commands::Preview(_) => unreachable!("handled above"),
        cli::Commands::Add(args) => commands::add::run(&repo, args).await,
        cli::Commands::View(args) => commands::view::run(&repo, args).await,
        cli::Commands::Edit(args) => commands::edit::run(&repo, args).await,
        cli::Commands::Delete(args) => commands::delete::run(&repo, args).await,
        cli::Commands::Move(args) => commands::move_task::run(&repo, args).await,
        cli::Commands::Done(args) => commands::done::run(&repo, args).await,
    }
}
