//! `supersede` entrypoint: scan, verify, print the JSON report on stdout.

use std::io::Write;

use mimalloc::MiMalloc;

use supersede::config::Config;
use supersede::pipeline::{Pipeline, load_inputs};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the report; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!(
        candidate_dir = %config.candidate_dir.display(),
        baseline_dir = %config.baseline_dir.display(),
        cache_path = %config.cache_path.display(),
        workers = config.workers,
        "Supersede starting"
    );

    let inputs = load_inputs(&config)?;
    let pipeline = Pipeline::from_config(&config)?;
    let report = pipeline.run_inputs(inputs).await;

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &report)?;
    writeln!(stdout)?;

    Ok(())
}
