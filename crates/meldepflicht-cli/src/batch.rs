//! Batch evaluation: reads every incident file in a directory and evaluates
//! them concurrently.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use meldepflicht_core::{Determination, IncidentRecord, evaluate};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    pub file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub determination: Option<Determination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    pub total_files: usize,
    pub mandatory: usize,
    pub immediate: usize,
    pub failed: usize,
    pub elapsed_secs: f64,
}

/// Evaluate every `*.json` file in `dir`, at most `jobs` at a time. Entries
/// come back sorted by file name; unreadable files are reported, not fatal.
pub async fn run_batch(dir: &Path, jobs: usize) -> anyhow::Result<(Vec<BatchEntry>, BatchStats)> {
    let start = Instant::now();

    // 1. Collect incident files.
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("reading directory {}", dir.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    eprintln!("  Found {} incident files in {}", files.len(), dir.display());

    // 2. Evaluate, bounded by the semaphore.
    let permits = Arc::new(Semaphore::new(jobs.max(1)));
    let mut tasks = JoinSet::new();
    for path in files {
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await?;
            Ok::<_, anyhow::Error>(evaluate_file(path).await)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        results.push(joined.context("evaluation task panicked")??);
    }
    results.sort_by(|a, b| a.file.cmp(&b.file));

    // 3. Tally.
    let mut stats = BatchStats {
        total_files: results.len(),
        ..Default::default()
    };
    for entry in &results {
        match &entry.determination {
            Some(d) => {
                stats.mandatory += usize::from(d.is_mandatory);
                stats.immediate += usize::from(d.immediate_notification_required);
            }
            None => stats.failed += 1,
        }
    }
    stats.elapsed_secs = start.elapsed().as_secs_f64();
    tracing::info!(
        files = stats.total_files,
        mandatory = stats.mandatory,
        failed = stats.failed,
        "batch evaluation finished"
    );

    Ok((results, stats))
}

async fn evaluate_file(file: PathBuf) -> BatchEntry {
    let parsed = match tokio::fs::read_to_string(&file).await {
        Ok(json) => serde_json::from_str::<IncidentRecord>(&json).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    match parsed {
        Ok(incident) => BatchEntry {
            reference: incident.id.clone(),
            determination: Some(evaluate(&incident)),
            error: None,
            file,
        },
        Err(error) => {
            tracing::warn!(file = %file.display(), %error, "skipping incident file");
            BatchEntry {
                file,
                reference: None,
                determination: None,
                error: Some(error),
            }
        }
    }
}

pub fn print_batch(entries: &[BatchEntry], stats: &BatchStats) {
    for entry in entries {
        let name = entry
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match (&entry.determination, &entry.error) {
            (Some(d), _) => {
                let authorities: Vec<&str> =
                    d.authority_results.iter().map(|r| r.authority.id).collect();
                let flag = if d.immediate_notification_required {
                    "SOFORT"
                } else if d.is_mandatory {
                    "MELDEN"
                } else {
                    "-"
                };
                println!("  {:<26} {:<7} {}", name, flag, authorities.join(", "));
            }
            (None, Some(error)) => println!("  {:<26} FEHLER  {}", name, error),
            (None, None) => {}
        }
    }
    println!();
    println!(
        "{} Dateien, {} meldepflichtig, {} sofort, {} fehlerhaft ({:.2}s)",
        stats.total_files, stats.mandatory, stats.immediate, stats.failed, stats.elapsed_secs
    );
}
