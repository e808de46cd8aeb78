use std::path::{Path, PathBuf};

use wob_core::CanonicalItem;
use wob_sync::{report_recent_runs, FailureReport, NormalizePipeline, SyncConfig};

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .canonicalize()
        .expect("workspace root")
}

fn config(output_dir: &Path, sources_file: PathBuf, workers: usize) -> SyncConfig {
    SyncConfig {
        workspace_root: workspace_root(),
        sources_file,
        output_dir: output_dir.to_path_buf(),
        workers,
    }
}

#[tokio::test]
async fn sample_run_writes_items_failures_and_summary() {
    let out = tempfile::tempdir().unwrap();
    let pipeline = NormalizePipeline::new(config(out.path(), workspace_root().join("sources.yaml"), 3));
    let summary = pipeline.run_once(None).await.unwrap();

    assert_eq!(summary.sources, 1);
    assert_eq!(summary.records, 8);
    assert_eq!(summary.items, 6);
    assert_eq!(summary.failures, 2);
    // slug page (malformed identifier)
    assert_eq!(summary.degraded, 1);

    let run_dir = PathBuf::from(&summary.output_dir);
    let jsonl = std::fs::read(run_dir.join("items.jsonl")).unwrap();
    assert_eq!(wob_sync::sha256_hex(&jsonl), summary.items_sha256);

    let items: Vec<CanonicalItem> = String::from_utf8(jsonl)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let original_ids: Vec<_> = items.iter().map(|i| i.original_id.as_deref()).collect();
    assert_eq!(
        original_ids,
        vec![
            Some("2015-0142"),
            Some("2014-0310"),
            Some("subsidies-wijkraden"),
            Some("2015-0142"),
            Some("2016-017"),
            Some("2016-018"),
        ]
    );

    let failures: Vec<FailureReport> =
        serde_json::from_slice(&std::fs::read(run_dir.join("failures.json")).unwrap()).unwrap();
    let failed: Vec<_> = failures.iter().map(|f| (f.record_index, f.kind.as_str())).collect();
    assert_eq!(failed, vec![(3, "rendered_page"), (4, "rendered_page")]);
    assert!(run_dir.join("summary.json").exists());

    let report = report_recent_runs(out.path(), 5).unwrap();
    assert!(report.contains(&summary.run_id.to_string()));
    assert!(report.contains("- items: 6 of 8 records (1 degraded)"));
}

#[tokio::test]
async fn worker_count_does_not_change_output() {
    let out = tempfile::tempdir().unwrap();
    let sources = workspace_root().join("sources.yaml");
    let single = NormalizePipeline::new(config(out.path(), sources.clone(), 1))
        .run_once(Some("utrecht"))
        .await
        .unwrap();
    let many = NormalizePipeline::new(config(out.path(), sources, 16))
        .run_once(Some("utrecht"))
        .await
        .unwrap();
    assert_eq!(single.items, many.items);
    assert_eq!(single.failures, many.failures);
}

#[tokio::test]
async fn unknown_source_filter_is_an_error() {
    let out = tempfile::tempdir().unwrap();
    let pipeline = NormalizePipeline::new(config(out.path(), workspace_root().join("sources.yaml"), 2));
    let err = pipeline.run_once(Some("amsterdam")).await.unwrap_err();
    assert!(err.to_string().contains("no enabled source named amsterdam"));
}

#[tokio::test]
async fn disabled_sources_are_skipped() {
    let out = tempfile::tempdir().unwrap();
    let sources = out.path().join("sources.yaml");
    std::fs::write(
        &sources,
        "sources:\n  - source_id: utrecht\n    index_name: utrecht\n    enabled: false\n    bundle: fixtures/utrecht/sample/bundle.json\n",
    )
    .unwrap();
    let summary = NormalizePipeline::new(config(&out.path().join("runs"), sources, 2))
        .run_once(None)
        .await
        .unwrap();
    assert_eq!(summary.sources, 0);
    assert_eq!(summary.items, 0);
}
