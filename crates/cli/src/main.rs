//! Command-line driver for résumé match analysis.
//!
//! Usage:
//!     skillmatch analyze --manifest batch.json --taxonomy taxonomy.json
//!     skillmatch analyze --manifest batch.json --taxonomy taxonomy.json --offline
//!     skillmatch resolve --taxonomy taxonomy.json --kind skill "Node JS" figma
//!     skillmatch health

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use skillmatch_backend_remote::{HttpScorer, RemoteConfig, RemoteScorer};
use skillmatch_batch::{BatchConfig, BatchOrchestrator, BatchState};
use skillmatch_explain::summarize_fit;
use skillmatch_model::{JobRequirement, ParsedCandidateProfile, RegistryKind, TaxonomySnapshot};
use skillmatch_report::write_report;
use skillmatch_request::{AnalysisRequest, JobDescription, ResumeSubmission, UploadedFile};
use skillmatch_taxonomy::TaxonomyIndex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "skillmatch")]
#[command(about = "Score resumes against a job description")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Remote scoring service URL
    #[arg(long, env = "SKILLMATCH_SCORER_URL", default_value = "http://127.0.0.1:8000")]
    scorer_url: String,

    /// Remote request timeout in seconds
    #[arg(long, default_value = "60")]
    timeout_secs: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a batch of resumes against one job
    Analyze {
        /// Path to the batch manifest (JSON)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Path to the taxonomy snapshot (JSON)
        #[arg(short, long)]
        taxonomy: PathBuf,

        /// Skip the remote service and use local scores only
        #[arg(long)]
        offline: bool,

        /// Maximum resumes per batch
        #[arg(long)]
        max_resumes: Option<usize>,

        /// Directory the report is written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Resolve names against the taxonomy
    Resolve {
        /// Path to the taxonomy snapshot (JSON)
        #[arg(short, long)]
        taxonomy: PathBuf,

        /// Registry to search (skill, major-skill)
        #[arg(short, long, default_value = "skill")]
        kind: String,

        /// Names to resolve
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Check remote scoring service health
    Health,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Batch manifest. Relative paths are resolved against the manifest's directory.
#[derive(Debug, Deserialize)]
struct Manifest {
    job: ManifestJob,
    #[serde(default)]
    resumes: Vec<ManifestResume>,
}

#[derive(Debug, Deserialize)]
struct ManifestJob {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    file: Option<PathBuf>,
    #[serde(default)]
    requirement: JobRequirement,
}

#[derive(Debug, Deserialize)]
struct ManifestResume {
    file: PathBuf,
    #[serde(default)]
    profile: ParsedCandidateProfile,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("skillmatch=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = RemoteConfig {
        base_url: cli.scorer_url,
        timeout_secs: cli.timeout_secs,
        ..Default::default()
    };

    match cli.command {
        Commands::Analyze {
            manifest,
            taxonomy,
            offline,
            max_resumes,
            output_dir,
            format,
        } => {
            let scorer = if offline { None } else { Some(HttpScorer::new(config)?) };
            run_analyze(scorer, &manifest, &taxonomy, max_resumes, &output_dir, format).await?;
        }
        Commands::Resolve { taxonomy, kind, names } => {
            run_resolve(&taxonomy, &kind, &names)?;
        }
        Commands::Health => {
            run_health(&HttpScorer::new(config)?).await?;
        }
    }

    Ok(())
}

fn load_taxonomy(path: &Path) -> Result<TaxonomyIndex> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read taxonomy {}", path.display()))?;
    let snapshot: TaxonomySnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid taxonomy JSON in {}", path.display()))?;

    tracing::debug!(
        skills = snapshot.skills.len(),
        major_skills = snapshot.major_skills.len(),
        "Loaded taxonomy snapshot"
    );
    Ok(TaxonomyIndex::from_snapshot(&snapshot))
}

fn load_request(path: &Path) -> Result<AnalysisRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let manifest: Manifest = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid manifest JSON in {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let file = manifest
        .job
        .file
        .map(|file| {
            let full = base.join(file);
            UploadedFile::read(&full).with_context(|| format!("Failed to read job file {}", full.display()))
        })
        .transpose()?;

    let job = JobDescription {
        text: manifest.job.description,
        file,
    };

    let mut request = AnalysisRequest::new(job, manifest.job.requirement);
    for resume in manifest.resumes {
        let full = base.join(&resume.file);
        let file = UploadedFile::read(&full).with_context(|| format!("Failed to read resume {}", full.display()))?;
        request = request.with_resume(ResumeSubmission::new(file, resume.profile));
    }

    Ok(request)
}

async fn run_analyze(
    scorer: Option<HttpScorer>,
    manifest: &Path,
    taxonomy: &Path,
    max_resumes: Option<usize>,
    output_dir: &Path,
    format: OutputFormat,
) -> Result<()> {
    let index = Arc::new(load_taxonomy(taxonomy)?);
    let request = load_request(manifest)?;

    println!("Analyzing {} resume(s)", request.resumes.len());
    println!("---");

    let mut orchestrator = BatchOrchestrator::new(scorer, index, BatchConfig { max_resumes });

    match orchestrator.submit(request).await {
        BatchState::Completed => {}
        BatchState::Rejected(e) => bail!("Request rejected: {e}"),
        BatchState::Failed(e) => bail!("Analysis failed: {e}"),
        other => bail!("Analysis ended in unexpected state: {other}"),
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(orchestrator.results())?);
        }
        OutputFormat::Text => {
            for item in orchestrator.results() {
                println!("\n{}. {}", item.index + 1, item.filename);
                println!("   {}", summarize_fit(&item.score));
                if !item.score.missing_skills.is_empty() {
                    println!("   Missing skills: {}", item.score.missing_skills.join(", "));
                }
            }
        }
    }

    let now = Local::now();
    let report = orchestrator
        .report(&now)
        .context("Completed batch produced no report")?;
    let path = write_report(output_dir, &report, now.date_naive())?;

    let summary = orchestrator.summary();
    println!("\n---");
    println!(
        "Average {:.1}% | Highest {:.0}% | Lowest {:.0}% | Remote failures {}",
        summary.average, summary.highest, summary.lowest, summary.failed_items
    );
    println!("Report written to {}", path.display());

    Ok(())
}

fn run_resolve(taxonomy: &Path, kind: &str, names: &[String]) -> Result<()> {
    let index = load_taxonomy(taxonomy)?;
    let kind: RegistryKind = kind.parse()?;

    for name in names {
        match index.lookup(name, kind) {
            Some(id) => {
                let canonical = index.name_of(id, kind).unwrap_or_default();
                println!("{name:?} -> {id} ({canonical})");
            }
            None => {
                let suggestions = index.suggest(name, kind, 3);
                if suggestions.is_empty() {
                    println!("{name:?} -> no match");
                } else {
                    let names: Vec<_> = suggestions.iter().map(|s| s.name.as_str()).collect();
                    println!("{name:?} -> no match (did you mean: {})", names.join(", "));
                }
            }
        }
    }

    Ok(())
}

async fn run_health(scorer: &HttpScorer) -> Result<()> {
    print!("Checking {} scoring backend... ", scorer.name());

    match scorer.health_check().await {
        Ok(()) => {
            println!("OK");
            Ok(())
        }
        Err(e) => {
            println!("FAILED: {}", e);
            std::process::exit(1);
        }
    }
}
