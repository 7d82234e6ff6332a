use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use warden::command::ExecCommandRunner;
use warden::monitor::log_errors;
use warden::{logging, Alert, JobSupervisor, SupervisorConfig, SupervisorStatus};

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Supervise jobs as host OS services", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the supervisor config file (TOML)
    #[arg(short, long, default_value = "warden.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install every process listed in a job's process config as a service
    AddJob {
        /// Job name
        name: String,

        /// Path to the job's process config (JSON)
        config_path: PathBuf,

        /// Index of the job instance
        #[arg(long, default_value_t = 0)]
        index: usize,
    },

    /// Start all supervised services
    Start,

    /// Stop all supervised services
    Stop,

    /// Disable automatic restart of supervised services
    Unmonitor,

    /// Print the aggregate supervisor status
    Status,

    /// Delete every supervised service and wait until they are gone
    RemoveAll,

    /// Install jobs, start them, and print failure alerts until Ctrl-C
    Run {
        /// Jobs to install, as NAME=CONFIG_PATH
        #[arg(short, long = "job", value_parser = parse_job_arg)]
        jobs: Vec<(String, PathBuf)>,
    },
}

fn parse_job_arg(value: &str) -> Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=CONFIG_PATH, got '{value}'")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config = SupervisorConfig::load(&cli.config)?;
    ExecCommandRunner::check_available(&config.interpreter)?;
    let runner = Arc::new(ExecCommandRunner::new(config.command_timeout()));
    let supervisor = JobSupervisor::new(config, runner);

    match cli.command {
        Commands::AddJob {
            name,
            config_path,
            index,
        } => supervisor.add_job(&name, index, &config_path),
        Commands::Start => supervisor.start(),
        Commands::Stop => supervisor.stop(),
        Commands::Unmonitor => supervisor.unmonitor(),
        Commands::Status => {
            print_status(supervisor.status());
            Ok(())
        }
        Commands::RemoveAll => supervisor.remove_all_jobs(),
        Commands::Run { jobs } => run(supervisor, jobs),
    }
}

fn print_status(status: SupervisorStatus) {
    let label = match status {
        SupervisorStatus::Running => status.as_str().green(),
        SupervisorStatus::Failing => status.as_str().red(),
        SupervisorStatus::Stopped => status.as_str().yellow(),
    };
    println!("{label}");
}

fn run(supervisor: JobSupervisor, jobs: Vec<(String, PathBuf)>) -> Result<()> {
    for (index, (name, config_path)) in jobs.iter().enumerate() {
        supervisor
            .add_job(name, index, config_path)
            .with_context(|| format!("Failed to add job '{name}'"))?;
    }
    supervisor.start()?;

    let supervisor = Arc::new(supervisor);
    let dispatcher = Arc::clone(&supervisor);
    thread::spawn(move || {
        let handler = log_errors(Box::new(|alert: Alert| -> Result<()> {
            let line = serde_json::to_string(&alert)?;
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{line}")?;
            stdout.flush()?;
            Ok(())
        }));
        if let Err(e) = dispatcher.monitor_job_failures(handler) {
            eprintln!("Failure dispatch error: {e:#}");
        }
    });

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("Failed to install Ctrl-C handler")?;
    let _ = rx.recv();

    supervisor.stop()
}
