use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::error;

use glimpse_core::domain::JobLocator;
use glimpse_core::impls::{InMemoryJobLookup, LocalFsStore, LocalPodLogs};
use glimpse_core::ports::JobRecord;
use glimpse_core::{
    ArtifactService, Diagnostic, FallbackStatus, ResolverConfig, ServiceBuilder,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Resolve test-run references into build artifacts")]
struct GlimpseCli {
    /// Resolver configuration (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory standing in for object storage
    #[arg(long, global = true, default_value = "artifacts")]
    store: PathBuf,
    /// Job records: JSON object mapping "<job>/<build>" to a status URL
    #[arg(long, global = true)]
    jobs: Option<PathBuf>,
    /// Directory holding live pod logs as <job>/<build>/build-log.txt
    #[arg(long, global = true, default_value = "pod-logs")]
    pod_logs: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the artifact names available for a reference
    List {
        /// Reference, e.g. gcs/bucket/logs/job/42 or prowjob/job/42
        reference: String,
    },
    /// Fetch handles for artifacts of a reference and print their sizes
    Fetch {
        reference: String,
        /// Pod the job ran in
        #[arg(long, default_value = "")]
        pod: String,
        /// Per-artifact size limit in bytes
        #[arg(long, default_value_t = 100 * 1024 * 1024)]
        size_limit: u64,
        /// Artifact names to fetch (defaults to the listing)
        names: Vec<String>,
    },
}

#[derive(Debug, Serialize)]
struct ListReport {
    names: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Serialize)]
struct FetchedArtifact {
    name: String,
    link: String,
    size: Option<u64>,
}

#[derive(Debug, Serialize)]
struct FetchReport {
    artifacts: Vec<FetchedArtifact>,
    fallback: FallbackStatus,
    diagnostics: Vec<Diagnostic>,
    elapsed_ms: u128,
}

/// `RUST_LOG` が無いときのフィルタ（glimpse と glimpse_core は info）
const DEFAULT_LOG_FILTER: &str = "glimpse=info,warn";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    if let Err(e) = run(GlimpseCli::parse()).await {
        error!("glimpse failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: GlimpseCli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ResolverConfig::load(path)?,
        None => ResolverConfig::default(),
    };
    let jobs = match &cli.jobs {
        Some(path) => load_jobs(path)?,
        None => InMemoryJobLookup::new(),
    };

    let service = ServiceBuilder::from_config(&config)
        .storage(Arc::new(LocalFsStore::new(&cli.store)))
        .job_lookup(Arc::new(jobs))
        .pod_logs(Arc::new(LocalPodLogs::new(&cli.pod_logs)))
        .build()?;

    match cli.command {
        Command::List { reference } => {
            let outcome = service.list_artifacts(&reference).await?;
            print_json(&ListReport {
                names: outcome.names,
                diagnostics: outcome.diagnostics,
            })
        }
        Command::Fetch {
            reference,
            pod,
            size_limit,
            names,
        } => fetch(&service, &reference, &pod, size_limit, names).await,
    }
}

async fn fetch(
    service: &ArtifactService,
    reference: &str,
    pod: &str,
    size_limit: u64,
    names: Vec<String>,
) -> Result<()> {
    let names = if names.is_empty() {
        service.list_artifacts(reference).await?.names
    } else {
        names
    };
    let outcome = service
        .fetch_artifacts(reference, pod, size_limit, &names)
        .await?;

    let mut artifacts = Vec::with_capacity(outcome.artifacts.len());
    for artifact in &outcome.artifacts {
        artifacts.push(FetchedArtifact {
            name: artifact.name().to_string(),
            link: artifact.canonical_link(),
            size: artifact.size().await.ok(),
        });
    }
    print_json(&FetchReport {
        artifacts,
        fallback: outcome.fallback,
        diagnostics: outcome.diagnostics,
        elapsed_ms: outcome.elapsed.as_millis(),
    })
}

fn load_jobs(path: &Path) -> Result<InMemoryJobLookup> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read jobs file {}", path.display()))?;
    let urls: HashMap<String, String> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse jobs file {}", path.display()))?;

    let mut jobs = Vec::with_capacity(urls.len());
    for (key, url) in urls {
        let locator = JobLocator::parse(&key)
            .with_context(|| format!("bad job key in {}", path.display()))?;
        jobs.push((locator, JobRecord::new(url)));
    }
    Ok(InMemoryJobLookup::with_jobs(jobs))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
