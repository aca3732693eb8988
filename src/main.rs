use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::AsyncBufReadExt;

pub mod commands;
pub mod errors;
pub mod logging;
pub mod models;
pub mod progress;
pub mod providers;

use crate::commands::download_command::{self, DownloadCommand};
use crate::commands::notifier::{ConsoleNotifier, Notifier};
use crate::commands::router::CommandRouter;
use crate::models::configuration::{self, Configuration};
use crate::providers::executor::TaskHandle;
use crate::providers::history_store::HistoryStore;
use crate::providers::http_fetcher::HttpFetcher;
use crate::providers::path_guard::PathGuard;
use crate::providers::tokio_executor::TokioExecutor;
use crate::providers::yaml_history_store::YamlHistoryStore;

#[derive(Debug, Parser)]
#[command(
    name = "sandbox-dl",
    version,
    about = "Download files into a sandboxed directory and keep a history of them."
)]
struct Cli {
    /// Configuration file (YAML). Created with defaults when missing.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the configured sandbox root.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Overrides the configured data directory.
    #[arg(long = "data-dir", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// List downloaded files.
    Check,
    /// Download URL to PATH, relative to the sandbox root.
    At { path: String, url: String },
    /// Read download commands from stdin (the default).
    Console,
}

fn apply_overrides(mut configuration: Configuration, cli: &Cli) -> Configuration {
    if let Some(root) = &cli.root {
        configuration.sandbox_root = root.to_string_lossy().into_owned();
    }
    if let Some(data_dir) = &cli.data_dir {
        configuration.data_dir = data_dir.to_string_lossy().into_owned();
    }
    configuration
}

/// Dispatches one command per stdin line until EOF or `exit`. A line ending
/// in `?` prints completions instead.
async fn run_console(
    router: &CommandRouter,
    notifier: Arc<dyn Notifier>,
) -> anyhow::Result<Vec<TaskHandle>> {
    let mut pending = Vec::new();
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        match line {
            "" => continue,
            "exit" | "quit" => break,
            "help" => {
                for command in router.commands() {
                    println!(
                        "{} - {} (aliases: {})",
                        command.usage,
                        command.description,
                        command.aliases.join(", ")
                    );
                }
            }
            _ => {
                if let Some(partial) = line.strip_suffix('?') {
                    println!("{}", router.complete(partial).join(" "));
                } else if let Some(handle) = router.dispatch(line, notifier.clone()) {
                    pending.push(handle);
                }
            }
        }
    }
    Ok(pending)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging()?;

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(configuration::default_config_path);
    let configuration = apply_overrides(configuration::load_or_init(&config_path).await?, &cli);
    tracing::info!(
        sandbox_root = %configuration.sandbox_root_path().display(),
        data_dir = %configuration.data_dir_path().display(),
        "sandbox-dl starting"
    );

    let history = Arc::new(YamlHistoryStore::load(&configuration.data_dir_path()));
    tracing::info!(
        history = %history.path().display(),
        entries = history.list().len(),
        "download history loaded"
    );
    let fetcher =
        Arc::new(HttpFetcher::new(&configuration).context("Failed to build HTTP client")?);
    let command = DownloadCommand::new(
        PathGuard::new(configuration.sandbox_root_path()),
        fetcher,
        history.clone(),
        TokioExecutor::current(),
    );
    let mut router = CommandRouter::new();
    download_command::register(&mut router, command);

    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
    let pending = match cli.command {
        Some(CliCommand::Check) => {
            router.dispatch_args(download_command::NAME, &["check"], notifier);
            Vec::new()
        }
        Some(CliCommand::At { ref path, ref url }) => router
            .dispatch_args(
                download_command::NAME,
                &["at", path.as_str(), url.as_str()],
                notifier,
            )
            .into_iter()
            .collect(),
        Some(CliCommand::Console) | None => run_console(&router, notifier).await?,
    };

    for handle in pending {
        handle.wait().await;
    }

    if let Err(e) = history.flush() {
        tracing::error!("{}", e);
    }
    tracing::info!("sandbox-dl stopped");
    Ok(())
}
