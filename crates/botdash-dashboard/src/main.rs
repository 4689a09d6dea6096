use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use botdash_client::{ReportController, ViewState};
use botdash_dashboard::artifacts::write_export;
use botdash_dashboard::report_console::run_report_console;
use botdash_dashboard::{DashboardConfig, ReportProxy, WebServer};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "botdash",
    version,
    about = "Bot-fleet report dashboard",
    after_long_help = "Examples:\n  botdash serve --bind 0.0.0.0:9380\n  botdash view 12\n  botdash export 12 --search failed --out ./exports\n  botdash sources"
)]
struct Cli {
    /// Config file (default: $BOTDASH_CONFIG, then <config dir>/botdash/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the report proxy and web report view
    Serve {
        /// Override `server.bind_addr`
        #[arg(long)]
        bind: Option<String>,
    },
    /// Open a report in the terminal viewer
    View { source_id: String },
    /// Fetch a report, filter it and write the CSV export
    Export {
        source_id: String,
        #[arg(long, short = 's')]
        search: Option<String>,
        /// Override `client.export_dir`
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
        /// Print the CSV instead of writing a file
        #[arg(long, default_value_t = false, conflicts_with = "out")]
        stdout: bool,
    },
    /// List active report sources, grouped by bot
    Sources,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// The terminal viewer owns the screen, so its logs go to a file.
fn init_file_logging() -> anyhow::Result<PathBuf> {
    let path = std::env::temp_dir().join("botdash-view.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(path)
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Command::View { .. } => {
            let path = init_file_logging()?;
            tracing::info!(log = %path.display(), "Terminal viewer logging to file");
        }
        _ => init_stderr_logging(),
    }

    let config = DashboardConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { bind } => {
            let mut server_config = config.server;
            if let Some(bind) = bind {
                server_config.bind_addr = bind;
            }
            WebServer::new(&server_config)?.run().await
        }
        Command::View { source_id } => run_report_console(&config.client, &source_id).await,
        Command::Export {
            source_id,
            search,
            out,
            stdout,
        } => {
            let mut controller = ReportController::from_config(&config.client)?;
            controller.initialize(&source_id).await;
            match controller.state() {
                ViewState::Failed(e) => anyhow::bail!("{}", e),
                ViewState::NoData(panel) => anyhow::bail!("{}\n{}", panel.title, panel.raw),
                _ => {}
            }
            if let Some(term) = &search {
                controller.on_search_input(term);
            }

            let Some(export) = controller.on_export_request() else {
                let text = controller
                    .take_notice()
                    .map(|n| n.text)
                    .unwrap_or_default();
                anyhow::bail!("{}", text);
            };

            if stdout {
                print!("{}", export.content);
            } else {
                let dir = out.unwrap_or(config.client.export_dir);
                let path = write_export(&dir, &export)
                    .with_context(|| format!("writing export into {}", dir.display()))?;
                println!(
                    "Exported {} of {} rows to {}",
                    controller.displayed_len(),
                    controller.canonical_rows().len(),
                    path.display()
                );
            }
            Ok(())
        }
        Command::Sources => {
            let proxy = ReportProxy::new(&config.server)?;
            let sources = proxy.active_sources();
            if sources.is_empty() {
                println!("No active report sources.");
                return Ok(());
            }
            let mut by_bot: std::collections::BTreeMap<&str, Vec<_>> = Default::default();
            for s in &sources {
                by_bot.entry(s.bot_name.as_str()).or_default().push(s);
            }
            for (bot, entries) in by_bot {
                println!("{}", bot);
                for s in entries {
                    println!("  {:>6}  {}", s.id, s.display_name);
                }
            }
            Ok(())
        }
    }
}
