//! Codefluent CLI
//!
//! A command-line tool for running code submissions through a sandboxed runner.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codefluent::{
    Config, EXAMPLE_CONFIG, ErrorReport, Orchestrator, Submission, SubmissionError, SubmissionFile,
};
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "codefluent")]
#[command(about = "A tool for running code submissions through a sandboxed runner")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file
    Init {
        /// Output path (default: codefluent.toml)
        #[arg(short, long, default_value = "codefluent.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Run every file in a directory as one submission
    Run {
        /// Directory holding the submission's files
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Runner ID (default: the submission's Runner file, then default_runner)
        #[arg(short, long)]
        runner: Option<String>,

        /// Give up after this many seconds
        #[arg(short, long, value_parser = parse_timeout)]
        timeout: Option<Duration>,

        /// Keep the workspace on disk after the run
        #[arg(short, long)]
        keep: bool,
    },

    /// List available runners
    Runners,

    /// Show effective configuration
    ShowConfig,
}

/// How a `run` ended, reported as the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// The runner printed the sentinel
    Passed,
    /// The runner ran but the tests did not pass
    Failed,
    /// No verdict was produced
    Errored,
}

impl Outcome {
    fn code(self) -> u8 {
        match self {
            Outcome::Passed => 0,
            Outcome::Failed => 1,
            Outcome::Errored => 2,
        }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        ExitCode::from(outcome.code())
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = if let Some(ref path) = cli.config {
        info!(?path, "loading configuration");
        Config::from_file(path).context("failed to load configuration")?
    } else {
        debug!("using default configuration");
        Config::default()
    };

    match cli.command {
        Commands::Init { output, force } => {
            init_config(&output, force).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run {
            dir,
            runner,
            timeout,
            keep,
        } => {
            let outcome = run_submission(config, &dir, runner.as_deref(), timeout, keep).await?;
            Ok(outcome.into())
        }
        Commands::Runners => {
            list_runners(&config);
            Ok(ExitCode::SUCCESS)
        }
        Commands::ShowConfig => {
            show_config(&config);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .parse()
        .map_err(|e| format!("invalid number of seconds: {e}"))?;
    if seconds <= 0.0 {
        return Err(format!("timeout must be positive, got {value}"));
    }
    Duration::try_from_secs_f64(seconds).map_err(|e| format!("invalid timeout {value}: {e}"))
}

/// Run the submission in `dir` and print its verdict or error as JSON
///
/// Returns only after the run's workspace has been removed (unless kept).
async fn run_submission(
    mut config: Config,
    dir: &Path,
    runner_id: Option<&str>,
    timeout: Option<Duration>,
    keep: bool,
) -> Result<Outcome> {
    let files = read_submission_dir(dir)
        .await
        .with_context(|| format!("failed to read submission from '{}'", dir.display()))?;

    let submission = match Submission::new(files) {
        Ok(submission) => submission,
        Err(e) => {
            print_json(&ErrorReport::from(&SubmissionError::from(e)))?;
            return Ok(Outcome::Errored);
        }
    };

    let runner = match runner_id {
        Some(id) => config.get_runner(id),
        None => config.runner_for(&submission),
    }
    .context("failed to select runner")?
    .clone();

    config.keep_workspaces |= keep;

    info!(
        runner = %runner.name,
        files = submission.file_count(),
        "running submission"
    );

    let orchestrator = Orchestrator::from_config(&config, &runner);
    let run = orchestrator.run_submission(submission);

    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, run).await.map_err(|_| limit),
        None => Ok(run.await),
    };
    orchestrator.wait_for_cleanup().await;

    let outcome = match outcome {
        Ok(Ok(verdict)) => {
            print_json(&verdict)?;
            info!(did_pass = verdict.did_pass(), "submission finished");
            if verdict.did_pass() {
                Outcome::Passed
            } else {
                Outcome::Failed
            }
        }
        Ok(Err(e)) => {
            print_json(&ErrorReport::from(&e))?;
            info!(stage = %e.stage(), "submission failed");
            Outcome::Errored
        }
        Err(limit) => {
            let error = format!("runner did not finish within {}s", limit.as_secs_f64());
            print_json(&ErrorReport { error })?;
            info!(timeout = ?limit, "submission timed out");
            Outcome::Errored
        }
    };
    Ok(outcome)
}

/// Collect every regular file under `dir` as a submission file
///
/// Names are relative to `dir` with `/` separators and sorted. Dotfiles and
/// dot-directories (`.DS_Store`, `.git`) are skipped.
async fn read_submission_dir(dir: &Path) -> Result<Vec<SubmissionFile>> {
    let mut files = Vec::new();
    let mut pending = vec![PathBuf::new()];

    while let Some(relative) = pending.pop() {
        let mut entries = tokio::fs::read_dir(dir.join(&relative)).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') {
                continue;
            }

            let path = relative.join(&name);
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                let content = tokio::fs::read(entry.path()).await?;
                let name = path
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                files.push(SubmissionFile::new(name, content));
            }
        }
    }

    files.sort_by(|a, b| a.name().cmp(b.name()));
    Ok(files)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize result")?;
    println!("{json}");
    Ok(())
}

fn list_runners(config: &Config) {
    println!("Available runners:\n");

    let mut runners: Vec<_> = config.runners.iter().collect();
    runners.sort_by_key(|(id, _)| *id);

    for (id, runner) in runners {
        let marker = if config.default_runner.as_deref() == Some(id.as_str()) {
            " (default)"
        } else {
            ""
        };
        println!("  {:<15} {}{}", id, runner.name, marker);
    }
}

fn show_config(config: &Config) {
    println!("Workspace root: {}", config.workspace_root.display());
    println!("Keep workspaces: {}", config.keep_workspaces);
    println!("Sentinel: {}", config.sentinel);
    println!(
        "Default runner: {}",
        config.default_runner.as_deref().unwrap_or("(none)")
    );
    println!();
    println!("Runners configured: {}", config.runners.len());
}

async fn init_config(output: &PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at '{}'. Use --force to overwrite.",
            output.display()
        );
    }

    tokio::fs::write(output, EXAMPLE_CONFIG)
        .await
        .context("failed to write configuration file")?;

    println!("Created configuration file at '{}'", output.display());
    Ok(())
}
