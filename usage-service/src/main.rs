use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use energy_client::UserName;
use usage_service::{
    config::AppConfig, dashboard, metrics_server, observability, shell::Shell, views, UsageRecorder,
};

#[derive(Parser)]
#[command(name = "energy-dashboard", about = "Log and explore smart home energy usage")]
struct Cli {
    /// Usage store to read and append to (overrides `data_file` in the config).
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show the welcome page.
    Home,
    /// List known appliances and their ratings.
    Appliances,
    /// Log appliances that are currently on.
    Log {
        #[arg(long, default_value = "")]
        user: String,
        appliances: Vec<String>,
    },
    /// Show the usage dashboard for a user.
    Dashboard {
        #[arg(long, default_value = "")]
        user: String,
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Interactive session (default).
    Shell,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    observability::init_tracing();
    let cli = Cli::parse();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let store_path = cli.data_file.unwrap_or_else(|| cfg.data_file.clone());
    let catalog = Arc::new(cfg.catalog()?);
    let recorder = UsageRecorder::new(catalog.clone(), &store_path);

    match cli.command.unwrap_or(Command::Shell) {
        Command::Home => print!("{}", views::home()),
        Command::Appliances => print!("{}", views::appliances(&catalog)),
        Command::Log { user, appliances } => {
            let result = recorder.record(&user, &appliances).await;
            print!("{}", views::log_outcome(&result));
            if result.is_err() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Dashboard { user, json } => {
            let user = UserName::parse(&user);
            let view = dashboard::load(&store_path, user.as_ref(), cfg.recent_limit);
            if json {
                println!("{}", dashboard::render_json(&view)?);
            } else {
                print!("{}", dashboard::render(&view));
            }
            if view.is_failure() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Shell => {
            let mut shell = Shell::new(recorder, store_path, cfg.recent_limit);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            shell.run(stdin, tokio::io::stdout()).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
