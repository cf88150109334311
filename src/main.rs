// Kernel build probe
//
// Starts the kernel build server, runs one job description through the
// build lifecycle and prints what the server answered. Useful for checking
// an installation without running a full compilation pipeline.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use kernel_build_client::{BuildClient, ClientOptions, Payload, WaitStatus};

#[derive(Debug, Parser)]
#[command(
    name = "kernel-build-probe",
    about = "Probe the kernel build server",
    version,
    long_about = None
)]
struct Cli {
    /// JSON file with the job description
    job: PathBuf,

    /// Interpreter used to run the server (defaults to python3 on PATH)
    #[arg(long)]
    python: Option<PathBuf>,

    /// Server script; skips asking the interpreter where the module lives
    #[arg(long)]
    script: Option<PathBuf>,

    /// Seconds to wait for each response
    #[arg(long)]
    timeout: Option<u64>,

    /// Only query format and support, do not submit the job
    #[arg(long)]
    dry_run: bool,

    /// Give up polling after this many WAIT requests
    #[arg(long, default_value_t = 600)]
    max_polls: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut options = ClientOptions::from_env()?;
    if let Some(python) = cli.python {
        options.interpreter = Some(python);
    }
    if let Some(script) = cli.script {
        options.script_path = Some(script);
    }
    if let Some(secs) = cli.timeout {
        options.timeout = Duration::from_secs(secs);
    }

    let text = std::fs::read_to_string(&cli.job)
        .with_context(|| format!("cannot read job file {}", cli.job.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", cli.job.display()))?;
    let job = Payload::json(&value)?;

    let client = BuildClient::new(options);
    let outcome = probe(&client, &job, cli.dry_run, cli.max_polls).await;
    client.close().await?;
    outcome
}

async fn probe(client: &BuildClient, job: &Payload, dry_run: bool, max_polls: u32) -> Result<()> {
    let supported = client.check_supported(job).await?;
    println!("supported: {supported}");

    let format = client.select_format(job).await?;
    println!("format: {format}");

    if dry_run || !supported {
        return Ok(());
    }

    let task = client.start(job).await?;
    if task.is_failed() {
        anyhow::bail!("server refused to start the job");
    }
    println!("task: {task}");

    for _ in 0..max_polls {
        match client.wait().await? {
            WaitStatus::Finished(outcome) => {
                println!("task {}: {}", outcome.task, outcome.result);
                if !outcome.pre_build_result.is_empty() {
                    println!("pre-build: {}", outcome.pre_build_result);
                }
                client.reset().await?;
                return Ok(());
            }
            WaitStatus::Waiting | WaitStatus::Continue => {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }

    client.reset().await?;
    anyhow::bail!("task {task} did not finish after {max_polls} polls")
}
