use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{AppContext, Endpoints, HttpAdminClient};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod terminal;

use commands::{Command, Console};
use terminal::{StdinConfirmer, TerminalNavigator};

#[derive(Parser, Debug)]
#[command(about = "Admin console for the link shortener")]
struct Cli {
    /// Configuration file (default: ./console.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Overrides `root_url` from the configuration.
    #[arg(long, global = true)]
    root_url: Option<String>,
    /// Answer yes to every confirmation prompt.
    #[arg(short = 'y', long, global = true)]
    yes: bool,
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = config::load_settings(cli.config.as_deref())?;
    if let Some(root_url) = cli.root_url {
        settings.root_url = root_url;
    }

    let endpoints = Endpoints::new(&settings.root_url, settings.short_link_base.clone())
        .with_context(|| format!("invalid root url '{}'", settings.root_url))?;
    let api = Arc::new(HttpAdminClient::with_timeout(
        endpoints.clone(),
        settings.session_token.as_deref(),
        settings.request_timeout(),
    )?);
    let ctx = AppContext::new(endpoints, Arc::new(TerminalNavigator));

    let mut console = Console::new(
        api,
        ctx,
        Arc::new(StdinConfirmer::new(cli.yes)),
        settings.page_size,
    );
    Ok(console.run(cli.command).await?.exit_code())
}
