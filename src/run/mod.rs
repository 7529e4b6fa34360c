//! Evaluation run orchestration.
//!
//! Builds the worklist of (sample, model) pairs from the reference map
//! and the hypothesis collector, fans the pairs out over a bounded pool
//! of worker threads, and collects one summary row per evaluated pair.
//! Pairs share no mutable state; the only synchronization point is the
//! result channel. Rows are buffered, sorted by (basename, model), and
//! written once after all pairs complete, so the summary is identical
//! run to run regardless of completion order.
//!
//! Failure policy: missing directories and an empty reference map are
//! fatal and abort before any pair work; everything after that degrades
//! per pair with a warning and never changes the exit status.

pub mod worker;

use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::discover::{build_reference_map, collect_hypotheses};
use crate::report::{self, ReportError, SummaryRow};

/// Inputs for one evaluation run, resolved from config and CLI flags.
#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// Directory holding hypothesis files; reports are written here too
    pub out_dir: PathBuf,
    /// Directory holding reference token files
    pub samples_dir: PathBuf,
    /// Worker threads; 0 selects the number of available CPU cores
    pub workers: usize,
}

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Output directory does not exist: {0}")]
    MissingOutDir(PathBuf),

    #[error("Samples directory not found: {0}")]
    MissingSamplesDir(PathBuf),

    #[error("No reference files found in samples dir: {0}")]
    NoReferences(PathBuf),

    #[error("Failed to scan input directory: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// One unit of work: a (sample, model) pair with resolved input paths.
#[derive(Debug, Clone)]
pub struct EvalJob {
    pub basename: String,
    pub model: String,
    pub reference: PathBuf,
    pub hypothesis: PathBuf,
    /// Where the per-pair reports go
    pub out_dir: PathBuf,
}

/// Result of one pair, reported back by a worker.
#[derive(Debug)]
pub enum PairOutcome {
    /// The pair was scored and its reports written
    Evaluated(SummaryRow),
    /// The pair was skipped after a recoverable failure (already logged)
    Skipped { basename: String, model: String },
}

/// What an evaluation run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub evaluated: usize,
    pub skipped: usize,
    pub summary_path: PathBuf,
}

/// Run a full evaluation over the configured directories.
///
/// # Errors
/// Fails on fatal configuration problems only: missing directories, no
/// references, or an unwritable summary. Per-pair failures are logged
/// and counted in [`RunSummary::skipped`].
pub async fn run(options: &EvalOptions) -> Result<RunSummary, EvalError> {
    if !options.out_dir.is_dir() {
        return Err(EvalError::MissingOutDir(options.out_dir.clone()));
    }
    if !options.samples_dir.is_dir() {
        return Err(EvalError::MissingSamplesDir(options.samples_dir.clone()));
    }

    let ref_map = build_reference_map(&options.samples_dir)?;
    if ref_map.is_empty() {
        return Err(EvalError::NoReferences(options.samples_dir.clone()));
    }
    info!(
        "Resolved {} reference(s) in {}",
        ref_map.len(),
        options.samples_dir.display()
    );

    let mut jobs = Vec::new();
    for (basename, ref_path) in &ref_map {
        let hypotheses = match collect_hypotheses(&options.out_dir, basename) {
            Ok(map) => map,
            Err(e) => {
                warn!("Skipping basename {}: failed to scan hypotheses: {}", basename, e);
                continue;
            }
        };
        if hypotheses.is_empty() {
            warn!(
                "No hypothesis files found for basename {} in {}",
                basename,
                options.out_dir.display()
            );
            continue;
        }
        for (model, hyp_path) in hypotheses {
            jobs.push(EvalJob {
                basename: basename.clone(),
                model,
                reference: ref_path.clone(),
                hypothesis: hyp_path,
                out_dir: options.out_dir.clone(),
            });
        }
    }

    let (mut rows, skipped) = dispatch(jobs, options.workers).await;

    let summary_path = report::write_summary(&options.out_dir, &mut rows)?;
    info!("Summary written to {}", summary_path.display());

    Ok(RunSummary {
        evaluated: rows.len(),
        skipped,
        summary_path,
    })
}

/// Fan the jobs out over worker threads and collect the outcomes.
async fn dispatch(jobs: Vec<EvalJob>, workers: usize) -> (Vec<SummaryRow>, usize) {
    if jobs.is_empty() {
        return (Vec::new(), 0);
    }

    let worker_count = effective_workers(workers, jobs.len());
    info!("Evaluating {} pair(s) on {} worker(s)", jobs.len(), worker_count);

    let (result_tx, mut result_rx) = mpsc::channel::<PairOutcome>(jobs.len());
    let mut job_txs = Vec::with_capacity(worker_count);
    let mut handles = Vec::with_capacity(worker_count);
    for index in 0..worker_count {
        let (job_tx, job_rx) = mpsc::channel::<EvalJob>(jobs.len());
        match worker::spawn_worker(index, job_rx, result_tx.clone()) {
            Ok(handle) => {
                job_txs.push(job_tx);
                handles.push(handle);
            }
            Err(e) => warn!("Failed to spawn eval worker {}: {}", index, e),
        }
    }
    drop(result_tx);

    if job_txs.is_empty() {
        // Thread spawning failed outright; nothing will produce results.
        return (Vec::new(), jobs.len());
    }

    for (index, job) in jobs.into_iter().enumerate() {
        let target = &job_txs[index % job_txs.len()];
        if target.send(job).await.is_err() {
            warn!("Eval worker {} exited early", index % job_txs.len());
        }
    }
    drop(job_txs);

    let mut rows = Vec::new();
    let mut skipped = 0;
    while let Some(outcome) = result_rx.recv().await {
        match outcome {
            PairOutcome::Evaluated(row) => rows.push(row),
            PairOutcome::Skipped { .. } => skipped += 1,
        }
    }

    for handle in handles {
        let _ = handle.join();
    }

    (rows, skipped)
}

/// Resolve the worker count: explicit setting, else available CPU
/// cores, clamped to the number of jobs.
fn effective_workers(configured: usize, jobs: usize) -> usize {
    let base = if configured > 0 {
        configured
    } else {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    };
    base.min(jobs).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn options(out: &TempDir, samples: &TempDir, workers: usize) -> EvalOptions {
        EvalOptions {
            out_dir: out.path().to_path_buf(),
            samples_dir: samples.path().to_path_buf(),
            workers,
        }
    }

    // ===================
    // Fatal Configuration
    // ===================

    #[tokio::test]
    async fn test_missing_out_dir_is_fatal() {
        let samples = TempDir::new().unwrap();
        let opts = EvalOptions {
            out_dir: PathBuf::from("/nonexistent/out"),
            samples_dir: samples.path().to_path_buf(),
            workers: 1,
        };
        assert!(matches!(run(&opts).await, Err(EvalError::MissingOutDir(_))));
    }

    #[tokio::test]
    async fn test_missing_samples_dir_is_fatal() {
        let out = TempDir::new().unwrap();
        let opts = EvalOptions {
            out_dir: out.path().to_path_buf(),
            samples_dir: PathBuf::from("/nonexistent/samples"),
            workers: 1,
        };
        assert!(matches!(
            run(&opts).await,
            Err(EvalError::MissingSamplesDir(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_reference_map_is_fatal() {
        let out = TempDir::new().unwrap();
        let samples = TempDir::new().unwrap();
        write(samples.path(), "unrelated.wav", "");
        assert!(matches!(
            run(&options(&out, &samples, 1)).await,
            Err(EvalError::NoReferences(_))
        ));
    }

    // ===================
    // End-to-end Run
    // ===================

    #[tokio::test]
    async fn test_full_run_single_pair() {
        let out = TempDir::new().unwrap();
        let samples = TempDir::new().unwrap();
        write(samples.path(), "x_ref.token.txt", "a b c\n");
        write(out.path(), "x_m1.token.txt", "a x c\n");

        let summary = run(&options(&out, &samples, 1)).await.unwrap();
        assert_eq!(summary.evaluated, 1);
        assert_eq!(summary.skipped, 0);

        let csv = std::fs::read_to_string(&summary.summary_path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("x,m1,0.3333333333333333,3,1,1,0,0,"));

        assert!(out.path().join("x_m1.token_eval.txt").is_file());
        assert!(out.path().join("x_m1.token_alignment.csv").is_file());
    }

    #[tokio::test]
    async fn test_run_skips_basename_without_hypotheses() {
        let out = TempDir::new().unwrap();
        let samples = TempDir::new().unwrap();
        write(samples.path(), "x_ref.token.txt", "a b\n");
        write(samples.path(), "y_ref.token.txt", "c d\n");
        write(out.path(), "x_m1.txt", "a b\n");

        let summary = run(&options(&out, &samples, 1)).await.unwrap();
        assert_eq!(summary.evaluated, 1);
        let csv = std::fs::read_to_string(&summary.summary_path).unwrap();
        assert!(!csv.contains("\ny,"));
    }

    #[tokio::test]
    async fn test_run_excludes_timing_artifacts() {
        let out = TempDir::new().unwrap();
        let samples = TempDir::new().unwrap();
        write(samples.path(), "x_ref.token.txt", "a b\n");
        write(out.path(), "x_m1.txt", "a b\n");
        write(out.path(), "x_times.txt", "model, status, 1.0\n");

        let summary = run(&options(&out, &samples, 1)).await.unwrap();
        assert_eq!(summary.evaluated, 1);
        let csv = std::fs::read_to_string(&summary.summary_path).unwrap();
        assert!(!csv.contains("times"));
    }

    #[tokio::test]
    async fn test_run_is_deterministic_across_worker_counts() {
        let out1 = TempDir::new().unwrap();
        let out2 = TempDir::new().unwrap();
        let samples = TempDir::new().unwrap();
        write(samples.path(), "a_ref.token.txt", "x y z\n");
        write(samples.path(), "b_ref.token.txt", "p q\n");
        for out in [&out1, &out2] {
            write(out.path(), "a_m1.token.txt", "x z\n");
            write(out.path(), "a_m2.token.txt", "x y z w\n");
            write(out.path(), "b_m1.token.txt", "p p\n");
        }

        let s1 = run(&options(&out1, &samples, 1)).await.unwrap();
        let s4 = run(&options(&out2, &samples, 4)).await.unwrap();
        assert_eq!(s1.evaluated, 3);
        assert_eq!(s4.evaluated, 3);

        let strip = |dir: &TempDir, s: String| s.replace(dir.path().to_str().unwrap(), "");
        let csv1 = strip(&out1, std::fs::read_to_string(&s1.summary_path).unwrap());
        let csv4 = strip(&out2, std::fs::read_to_string(&s4.summary_path).unwrap());
        assert_eq!(csv1, csv4);
    }

    #[tokio::test]
    async fn test_unreadable_pair_is_skipped_not_fatal() {
        let out = TempDir::new().unwrap();
        let samples = TempDir::new().unwrap();
        write(samples.path(), "x_ref.token.txt", "a b\n");
        write(out.path(), "x_m1.txt", "a b\n");
        // Invalid UTF-8 makes read_to_string fail for this pair.
        std::fs::write(out.path().join("x_m2.txt"), [0xff, 0xfe, 0xfd]).unwrap();

        let summary = run(&options(&out, &samples, 2)).await.unwrap();
        assert_eq!(summary.evaluated, 1);
        assert_eq!(summary.skipped, 1);
    }

    // ===================
    // Worker Sizing
    // ===================

    #[test]
    fn test_effective_workers_explicit() {
        assert_eq!(effective_workers(3, 10), 3);
    }

    #[test]
    fn test_effective_workers_clamped_to_jobs() {
        assert_eq!(effective_workers(8, 2), 2);
    }

    #[test]
    fn test_effective_workers_auto_is_positive() {
        assert!(effective_workers(0, 100) >= 1);
    }
}
