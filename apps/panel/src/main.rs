use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::domain::{BackendKind, FileLocation};
use tracing::info;

mod config;
mod context;
mod logging;
mod watch;

use context::PanelContext;
use watch::{format_status, StatusWatcher};

#[derive(Parser, Debug)]
#[command(about = "Headless control panel for a resin printer backend")]
struct Args {
    #[arg(long, default_value = "panel.toml")]
    config: PathBuf,
    #[arg(long)]
    backend: Option<BackendKind>,
    #[arg(long)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the backend once.
    Status,
    /// Keep polling and print every status.
    Watch {
        #[arg(long)]
        count: Option<usize>,
    },
    Files {
        #[arg(long, default_value = "local")]
        location: FileLocation,
        #[arg(long)]
        subdirectory: Option<String>,
        #[arg(long, default_value_t = 0)]
        page: usize,
        #[arg(long, default_value_t = 20)]
        page_size: usize,
    },
    Start {
        path: String,
        #[arg(long, default_value = "local")]
        location: FileLocation,
    },
    Pause,
    Resume,
    Cancel,
    Home,
    /// Move the build plate to an absolute height in millimetres.
    Move {
        z_mm: f64,
    },
    Capabilities,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = config::load_settings(&args.config)?;
    if let Some(backend) = args.backend {
        settings.backend = backend;
    }
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    logging::init_tracing(&settings)?;

    let context = PanelContext::from_settings(&settings)?;
    info!(backend = %settings.backend, base_url = %settings.base_url, "panel starting");
    run(&context, args.command).await
}

async fn run(context: &PanelContext, command: Command) -> Result<()> {
    let client = context.client.as_ref();
    match command {
        Command::Status => {
            let snapshot = client.status().await.context("status poll failed")?;
            let mut watcher = StatusWatcher::new();
            if let Some((snapshot, canonical)) = watcher.observe(Ok(snapshot)) {
                println!("{}", format_status(&snapshot, canonical));
            }
        }
        Command::Watch { count } => {
            let polls = client.status_stream(context.poll_interval);
            watch::watch(polls, count, |snapshot, canonical| {
                println!("{}", format_status(snapshot, canonical));
            })
            .await;
        }
        Command::Files {
            location,
            subdirectory,
            page,
            page_size,
        } => {
            let listing = client
                .list_files(location, subdirectory.as_deref(), page, page_size)
                .await
                .context("file listing failed")?;
            for dir in &listing.dirs {
                println!("{}/", dir.path);
            }
            for file in &listing.files {
                println!(
                    "{}  {} layers  {}",
                    file.file_data.path,
                    file.layer_count,
                    shared::print_time::format_print_time(file.print_time)
                );
            }
            if let Some(next) = listing.next_index {
                println!("more: --page {next}");
            }
        }
        Command::Start { path, location } => {
            client
                .start_print(location, &path)
                .await
                .with_context(|| format!("failed to start {path}"))?;
            println!("Started {path}");
        }
        Command::Pause => client.pause_print().await.context("pause failed")?,
        Command::Resume => client.resume_print().await.context("resume failed")?,
        Command::Cancel => client.cancel_print().await.context("cancel failed")?,
        Command::Home => client.home().await.context("homing failed")?,
        Command::Move { z_mm } => client
            .move_to(z_mm)
            .await
            .with_context(|| format!("move to {z_mm}mm failed"))?,
        Command::Capabilities => {
            println!("{} backend: {:?}", client.kind(), client.capabilities());
        }
    }
    Ok(())
}
