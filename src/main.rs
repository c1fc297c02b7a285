//! `studio` - headless front end for the tool controller.
//!
//! Commands:
//! - list / info / check: inspect the registry and bundle environments
//! - launch: start tools and follow them until they end (Ctrl-C asks to close)
//! - status: print the last record a tool's engine wrote
//! - emit-status: write a status record for script-based engines

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use studio_controller::events::Notification;
use studio_controller::observability::init_tracing;
use studio_controller::status::{PollOutcome, StatusKind, StatusMonitor, StatusRecord, StatusWriter};
use studio_controller::supervisor::TokioSpawner;
use studio_controller::tools::{self, ToolDescriptor, ToolRegistry};
use studio_controller::types::{ObservabilityConfig, ToolId};
use studio_controller::visibility::Presenter;
use studio_controller::{Controller, Error, Result, RunOutcome};

/// Launch and supervise registered tool bundles.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "studio")]
struct Cli {
    /// Path to the tool registry document
    #[arg(long, env = "STUDIO_CONFIG", default_value = "studio_config.json", global = true)]
    config: PathBuf,
    /// Status poll interval override, in milliseconds
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered tools
    List {
        /// Include disabled tools
        #[arg(long)]
        all: bool,
    },
    /// Show a tool's description, category and bundle path
    Info { id: String },
    /// Validate a tool's runtime and entry point without launching
    Check { id: String },
    /// Launch tools and follow them until they end
    Launch {
        #[arg(required = true)]
        ids: Vec<String>,
        /// Close without asking when interrupted while tools run
        #[arg(short, long)]
        yes: bool,
    },
    /// Print the last status record written for a tool
    Status { id: String },
    /// Write a status record (for engines without a native writer)
    EmitStatus {
        /// Tool whose registered status file receives the record
        #[arg(long, required_unless_present = "file", conflicts_with = "file")]
        tool: Option<String>,
        /// Explicit status file path
        #[arg(long)]
        file: Option<PathBuf>,
        /// ready, running, completed, error or stopped
        #[arg(long, value_parser = parse_status_kind)]
        status: StatusKind,
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=100))]
        progress: u8,
        #[arg(long, default_value = "")]
        message: String,
    },
}

fn parse_status_kind(raw: &str) -> std::result::Result<StatusKind, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_ascii_lowercase()))
        .map_err(|_| format!("unknown status '{}'", raw))
}

/// Console stand-in for the controller window.
#[derive(Debug)]
struct ConsolePresenter {
    assume_yes: bool,
}

impl Presenter for ConsolePresenter {
    fn suspend(&mut self) {
        tracing::info!("controller_hidden");
    }

    fn resume(&mut self) {
        tracing::info!("controller_shown");
    }

    fn confirm_close(&mut self, running: &[ToolId]) -> bool {
        if self.assume_yes {
            return true;
        }
        let names: Vec<&str> = running.iter().map(ToolId::as_str).collect();
        print!(
            "Tools are still running ({}). Close anyway? [y/N] ",
            names.join(", ")
        );
        let _ = std::io::stdout().flush();

        // Runs on the controller loop; hand the worker over while waiting.
        let mut answer = String::new();
        let read = tokio::task::block_in_place(|| std::io::stdin().lock().read_line(&mut answer));
        match read {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }

    fn notify(&mut self, notification: &Notification) {
        eprintln!("{}: {}", notification.title, notification.body);
    }

    fn show_progress(&mut self, tool_id: &ToolId, record: &StatusRecord) {
        println!("{} {}", tool_id, record.display_line());
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Command::EmitStatus {
        tool: None,
        file: Some(file),
        status,
        progress,
        message,
    } = &cli.command
    {
        init_tracing(&ObservabilityConfig::default());
        let written = StatusWriter::new(file).update(*status, *progress, message.clone());
        return report(written.map(|_| ExitCode::SUCCESS));
    }

    let registry = match ToolRegistry::load(&cli.config) {
        Ok(registry) => registry,
        Err(e) => {
            init_tracing(&ObservabilityConfig::default());
            tracing::error!(error = %e, "registry_load_failed");
            let notification = Notification::from(&e);
            eprintln!("{}: {}", notification.title, notification.body);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&registry.config().observability);
    tracing::debug!(title = %registry.title(), tools = registry.len(), "controller_ready");

    report(run(cli, registry).await)
}

fn report(result: Result<ExitCode>) -> ExitCode {
    match result {
        Ok(code) => code,
        Err(e) => {
            let notification = Notification::from(&e);
            eprintln!("{}: {}", notification.title, notification.body);
            ExitCode::FAILURE
        }
    }
}

fn lookup<'a>(registry: &'a ToolRegistry, id: &str) -> Result<&'a ToolDescriptor> {
    registry.lookup(id).ok_or_else(|| Error::not_registered(id))
}

async fn run(cli: Cli, registry: ToolRegistry) -> Result<ExitCode> {
    match cli.command {
        Command::List { all } => {
            println!("{}", registry.title());
            let listed: Vec<&ToolDescriptor> = if all {
                registry.iter().collect()
            } else {
                registry.list_enabled()
            };
            if registry.is_empty() {
                println!("No tools registered");
            }
            for tool in listed {
                let marker = if tool.enabled { "" } else { " (disabled)" };
                println!("{:<24} {}{}", tool.id.as_str(), tool.display_name, marker);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Info { id } => {
            println!("{}", lookup(&registry, &id)?.summary());
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { id } => {
            let tool = lookup(&registry, &id)?;
            tools::validate(tool).map_err(|issue| Error::EnvironmentMissing {
                tool_id: id.clone(),
                issue,
            })?;
            println!("{}: environment ready", tool.display_name);
            println!("  runtime:     {}", tool.runtime_path.display());
            println!("  entry point: {}", tool.entry_path().display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Status { id } => {
            let tool = lookup(&registry, &id)?;
            let mut monitor = StatusMonitor::new(tool.status_path.clone());
            match monitor.poll() {
                PollOutcome::Updated(record) => {
                    println!("{} {}", tool.id, record.display_line());
                    println!("  at {}", record.timestamp.to_rfc3339());
                }
                PollOutcome::NoFile => println!("{}: no status recorded", tool.id),
                _ => println!("{}: status unavailable", tool.id),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::EmitStatus {
            tool,
            file,
            status,
            progress,
            message,
        } => {
            let path = match (file, tool) {
                (Some(file), _) => file,
                (None, Some(id)) => lookup(&registry, &id)?.status_path.clone(),
                (None, None) => return Err(Error::internal("no status target")),
            };
            StatusWriter::new(path).update(status, progress, message)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Launch { ids, yes } => launch(registry, cli.poll_interval_ms, ids, yes).await,
    }
}

async fn launch(
    registry: ToolRegistry,
    poll_interval_ms: Option<u64>,
    ids: Vec<String>,
    assume_yes: bool,
) -> Result<ExitCode> {
    let presenter = ConsolePresenter { assume_yes };
    let mut controller = Controller::new(registry, Arc::new(TokioSpawner), presenter);
    if let Some(ms) = poll_interval_ms {
        controller = controller.with_poll_interval(Duration::from_millis(ms));
    }

    let mut rejected = 0usize;
    for id in &ids {
        // Failures are already reported through the presenter.
        if controller.launch(id).is_err() {
            rejected += 1;
        }
    }

    let (close_tx, close_rx) = mpsc::channel(1);
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if close_tx.send(()).await.is_err() {
                break;
            }
        }
    });

    match controller.run(close_rx).await {
        RunOutcome::Idle => tracing::info!("all_tools_ended"),
        RunOutcome::Closed => {
            let running = controller.active_ids();
            if !running.is_empty() {
                tracing::warn!(running = running.len(), "closed_with_tools_running");
            }
        }
    }

    Ok(if rejected == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
