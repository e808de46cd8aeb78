//! Batch normalization runs: source registry, parallel record processing and run reports.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::task::JoinSet;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;
use wob_adapters::{
    adapter_for_source, load_record_bundle, AdapterContext, NormalizeError, Normalized,
    RawRecord, WobAdapter,
};
use wob_core::{CanonicalItem, SourceDefinition};

pub const CRATE_NAME: &str = "wob-sync";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceRegistry {
    pub sources: Vec<SourceDefinition>,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub workspace_root: PathBuf,
    pub sources_file: PathBuf,
    pub output_dir: PathBuf,
    pub workers: usize,
}

impl SyncConfig {
    pub fn from_env() -> Self {
        let workspace_root = std::env::var("WOB_WORKSPACE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        Self {
            sources_file: std::env::var("WOB_SOURCES_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| workspace_root.join("sources.yaml")),
            output_dir: std::env::var("WOB_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| workspace_root.join("output")),
            workers: std::env::var("WOB_WORKERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or_else(default_workers),
            workspace_root,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

pub fn load_source_registry(path: impl AsRef<Path>) -> Result<SourceRegistry> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Outcome for one record, keyed by its position in the bundle.
#[derive(Debug, Clone)]
pub struct RecordOutcome {
    pub record_index: usize,
    pub kind: &'static str,
    pub result: Result<Normalized, NormalizeError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub source_id: String,
    pub record_index: usize,
    pub kind: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: usize,
    pub records: usize,
    pub items: usize,
    pub degraded: usize,
    pub failures: usize,
    pub items_sha256: String,
    pub output_dir: String,
}

/// Normalizes `records` on `workers` blocking tasks. Outcomes come back in input order.
pub async fn normalize_records(
    adapter: Arc<WobAdapter>,
    records: Vec<RawRecord>,
    ctx: &AdapterContext,
    workers: usize,
) -> Result<Vec<RecordOutcome>> {
    let total = records.len();
    let chunk_size = total.div_ceil(workers.max(1)).max(1);

    let mut chunks: Vec<Vec<(usize, RawRecord)>> = Vec::new();
    let mut indexed = records.into_iter().enumerate().peekable();
    while indexed.peek().is_some() {
        chunks.push(indexed.by_ref().take(chunk_size).collect());
    }

    let mut tasks = JoinSet::new();
    for chunk in chunks {
        let adapter = Arc::clone(&adapter);
        let ctx = ctx.clone();
        tasks.spawn_blocking(move || {
            chunk
                .into_iter()
                .map(|(record_index, record)| RecordOutcome {
                    record_index,
                    kind: record.kind(),
                    result: adapter.normalize(&record, &ctx),
                })
                .collect::<Vec<_>>()
        });
    }

    let mut outcomes = Vec::with_capacity(total);
    while let Some(joined) = tasks.join_next().await {
        outcomes.extend(joined.context("normalization worker panicked")?);
    }
    outcomes.sort_by_key(|o| o.record_index);
    Ok(outcomes)
}

#[derive(Debug, Default)]
struct SourceBatch {
    records: usize,
    degraded: usize,
    items: Vec<CanonicalItem>,
    failures: Vec<FailureReport>,
}

pub struct NormalizePipeline {
    config: SyncConfig,
}

impl NormalizePipeline {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Runs every enabled source, or only `only_source` when given.
    pub async fn run_once(&self, only_source: Option<&str>) -> Result<RunSummary> {
        let started_at = Utc::now();
        let ctx = AdapterContext::new(started_at);
        let registry = load_source_registry(&self.config.sources_file)?;
        let sources: Vec<_> = registry
            .sources
            .into_iter()
            .filter(|s| s.enabled)
            .filter(|s| only_source.map_or(true, |id| s.source_id == id))
            .collect();
        if let Some(id) = only_source {
            anyhow::ensure!(!sources.is_empty(), "no enabled source named {id}");
        }

        let mut batch = SourceBatch::default();
        for source in &sources {
            let span = info_span!("source", source_id = %source.source_id, run_id = %ctx.run_id);
            self.normalize_source(source, &ctx, &mut batch)
                .instrument(span)
                .await?;
        }
        let SourceBatch {
            records,
            degraded,
            items,
            failures,
        } = batch;

        let run_dir = self.config.output_dir.join(ctx.run_id.to_string());
        let items_sha256 = write_outputs(&run_dir, &items, &failures).await?;

        let summary = RunSummary {
            run_id: ctx.run_id,
            started_at,
            finished_at: Utc::now(),
            sources: sources.len(),
            records,
            items: items.len(),
            degraded,
            failures: failures.len(),
            items_sha256,
            output_dir: run_dir.display().to_string(),
        };
        write_summary(&run_dir, &summary).await?;
        info!(
            run_id = %summary.run_id,
            items = summary.items,
            failures = summary.failures,
            degraded = summary.degraded,
            "normalization run complete"
        );
        Ok(summary)
    }

    async fn normalize_source(
        &self,
        source: &SourceDefinition,
        ctx: &AdapterContext,
        batch: &mut SourceBatch,
    ) -> Result<()> {
        let adapter = adapter_for_source(source)
            .with_context(|| format!("no adapter registered for {}", source.source_id))?;
        let bundle_path = self.config.workspace_root.join(&source.bundle);
        let bundle = load_record_bundle(&bundle_path)?;
        anyhow::ensure!(
            bundle.source_id == source.source_id,
            "bundle source_id={} does not match source_id={}",
            bundle.source_id,
            source.source_id
        );
        batch.records += bundle.records.len();

        let outcomes =
            normalize_records(Arc::new(adapter), bundle.records, ctx, self.config.workers).await?;
        for outcome in outcomes {
            match outcome.result {
                Ok(normalized) => {
                    if !normalized.diagnostics.is_empty() {
                        batch.degraded += 1;
                    }
                    batch.items.push(normalized.item);
                }
                Err(err) => {
                    warn!(record_index = outcome.record_index, kind = outcome.kind, error = %err, "record dropped");
                    batch.failures.push(FailureReport {
                        source_id: source.source_id.clone(),
                        record_index: outcome.record_index,
                        kind: outcome.kind.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Serializes items as JSON lines.
pub fn items_to_jsonl(items: &[CanonicalItem]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for item in items {
        serde_json::to_writer(&mut out, item).context("serializing canonical item")?;
        out.push(b'\n');
    }
    Ok(out)
}

async fn write_outputs(
    run_dir: &Path,
    items: &[CanonicalItem],
    failures: &[FailureReport],
) -> Result<String> {
    fs::create_dir_all(run_dir)
        .await
        .with_context(|| format!("creating {}", run_dir.display()))?;

    let jsonl = items_to_jsonl(items)?;
    let digest = sha256_hex(&jsonl);
    fs::write(run_dir.join("items.jsonl"), jsonl)
        .await
        .context("writing items.jsonl")?;

    let failures_json = serde_json::to_vec_pretty(failures).context("serializing failures")?;
    fs::write(run_dir.join("failures.json"), failures_json)
        .await
        .context("writing failures.json")?;
    Ok(digest)
}

async fn write_summary(run_dir: &Path, summary: &RunSummary) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(summary).context("serializing run summary")?;
    fs::write(run_dir.join("summary.json"), bytes)
        .await
        .context("writing summary.json")
}

/// Markdown overview of the most recent runs under `output_dir`.
pub fn report_recent_runs(output_dir: &Path, runs: usize) -> Result<String> {
    let mut summaries = std::fs::read_dir(output_dir)
        .with_context(|| format!("reading {}", output_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path().join("summary.json"))
        .filter(|path| path.exists())
        .map(|path| {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<RunSummary>(&text)
                .with_context(|| format!("parsing {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    summaries.sort_by_key(|s| std::cmp::Reverse(s.started_at));

    let mut lines = vec!["# Wob normalization runs".to_string(), String::new()];
    for summary in summaries.into_iter().take(runs.max(1)) {
        lines.push(format!("## Run `{}`", summary.run_id));
        lines.push(format!("- started: {}", summary.started_at.to_rfc3339()));
        lines.push(format!("- sources: {}", summary.sources));
        lines.push(format!(
            "- items: {} of {} records ({} degraded)",
            summary.items, summary.records, summary.degraded
        ));
        lines.push(format!("- failures: {}", summary.failures));
        lines.push(format!("- items sha256: `{}`", summary.items_sha256));
        lines.push(String::new());
    }
    Ok(lines.join("\n"))
}
