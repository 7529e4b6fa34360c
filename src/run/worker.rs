//! Pair evaluation worker.
//!
//! Runs in a dedicated thread with blocking receives; alignment is pure
//! CPU work and each pair touches only its own files, so workers need
//! no shared state. Receives jobs from a channel and sends one outcome
//! per job back for aggregation.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::align;
use crate::report::{self, SummaryRow};
use crate::score;
use crate::tokens::read_tokens;

use super::{EvalJob, PairOutcome};

/// Background pair evaluation worker.
pub struct EvalWorker {
    /// Channel to receive jobs
    job_rx: mpsc::Receiver<EvalJob>,
    /// Channel to send outcomes
    result_tx: mpsc::Sender<PairOutcome>,
}

impl EvalWorker {
    pub fn new(job_rx: mpsc::Receiver<EvalJob>, result_tx: mpsc::Sender<PairOutcome>) -> Self {
        Self { job_rx, result_tx }
    }

    /// Run the worker loop (blocking, runs in a dedicated thread).
    ///
    /// Processes jobs until the job channel closes. Every received job
    /// produces exactly one outcome message.
    pub fn run(mut self) {
        debug!("Eval worker started");

        while let Some(job) = self.job_rx.blocking_recv() {
            let outcome = Self::process_job(job);
            if self.result_tx.blocking_send(outcome).is_err() {
                debug!("Result channel closed, worker shutting down");
                return;
            }
        }

        debug!("Eval worker stopped");
    }

    /// Evaluate a single pair.
    ///
    /// Any failure here is recoverable: it is logged as a warning and
    /// reported as a skip, never propagated.
    fn process_job(job: EvalJob) -> PairOutcome {
        let ref_tokens = match read_tokens(&job.reference) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(
                    "Skipping {} / {}: failed to read reference {}: {}",
                    job.basename,
                    job.model,
                    job.reference.display(),
                    e
                );
                return PairOutcome::Skipped {
                    basename: job.basename,
                    model: job.model,
                };
            }
        };
        let hyp_tokens = match read_tokens(&job.hypothesis) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(
                    "Skipping {} / {}: failed to read hypothesis {}: {}",
                    job.basename,
                    job.model,
                    job.hypothesis.display(),
                    e
                );
                return PairOutcome::Skipped {
                    basename: job.basename,
                    model: job.model,
                };
            }
        };

        let result = align::align(&ref_tokens, &hyp_tokens);

        let pair_report = match report::write_pair_reports(
            &job.reference,
            &job.hypothesis,
            &ref_tokens,
            &hyp_tokens,
            &result,
            &job.out_dir,
        ) {
            Ok(pair_report) => pair_report,
            Err(e) => {
                warn!(
                    "Skipping {} / {}: failed to write reports: {}",
                    job.basename, job.model, e
                );
                return PairOutcome::Skipped {
                    basename: job.basename,
                    model: job.model,
                };
            }
        };

        let wer = score::wer(&result);
        info!("Evaluated: {} / {} -> WER {:.6}", job.basename, job.model, wer);

        PairOutcome::Evaluated(SummaryRow {
            basename: job.basename,
            model: job.model,
            wer,
            truth_length: result.truth_length,
            total_errors: score::total_errors(&result),
            substitutions: result.substitutions,
            insertions: result.insertions,
            deletions: result.deletions,
            reference: job.reference.display().to_string(),
            hypothesis: job.hypothesis.display().to_string(),
            eval_file: pair_report.eval_path.display().to_string(),
            alignment_csv: pair_report.alignment_path.display().to_string(),
        })
    }
}

/// Spawn an evaluation worker in a dedicated thread.
///
/// # Errors
/// Returns an error if the thread cannot be spawned (rare, usually
/// resource exhaustion).
pub fn spawn_worker(
    index: usize,
    job_rx: mpsc::Receiver<EvalJob>,
    result_tx: mpsc::Sender<PairOutcome>,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name(format!("eval-worker-{index}"))
        .spawn(move || {
            let worker = EvalWorker::new(job_rx, result_tx);
            worker.run();
        })
}
