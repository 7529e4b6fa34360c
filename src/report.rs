//! Evaluation reports: per-pair text report, per-pair alignment trace,
//! and the run-wide summary table.
//!
//! Per-pair artifacts are written next to the hypothesis they describe,
//! named after its stem: `<stem>_eval.txt` and `<stem>_alignment.csv`.
//! Those suffixes carry the reserved `_eval` / `_alignment` markers, so
//! a later evaluation run never mistakes them for hypotheses.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::align::{AlignOp, AlignmentResult};
use crate::score;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Paths of the two per-pair artifacts.
#[derive(Debug, Clone)]
pub struct PairReport {
    pub eval_path: PathBuf,
    pub alignment_path: PathBuf,
}

/// One summary line per evaluated (basename, model) pair.
///
/// Field order is the summary CSV column order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummaryRow {
    pub basename: String,
    pub model: String,
    pub wer: f64,
    pub truth_length: usize,
    pub total_errors: usize,
    pub substitutions: usize,
    pub insertions: usize,
    pub deletions: usize,
    pub reference: String,
    pub hypothesis: String,
    pub eval_file: String,
    pub alignment_csv: String,
}

/// Render the human-readable evaluation report for one pair.
pub fn render_eval_report(
    ref_path: &Path,
    hyp_path: &Path,
    ref_tokens: &[String],
    hyp_tokens: &[String],
    result: &AlignmentResult,
) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "Reference: {}", ref_path.display());
    let _ = writeln!(out, "Hypothesis: {}", hyp_path.display());
    let _ = writeln!(out, "WER: {:.6}", score::wer(result));
    let _ = writeln!(out, "Substitutions: {}", result.substitutions);
    let _ = writeln!(out, "Insertions: {}", result.insertions);
    let _ = writeln!(out, "Deletions: {}", result.deletions);
    let _ = writeln!(out, "Hits: {}", result.hits);
    let _ = writeln!(out, "Truth length (tokens): {}\n", result.truth_length);
    let _ = writeln!(out, "=== Reference Tokens ===");
    let _ = writeln!(out, "{}\n", ref_tokens.join(" "));
    let _ = writeln!(out, "=== Hypothesis Tokens ===");
    let _ = writeln!(out, "{}\n", hyp_tokens.join(" "));
    out
}

/// Write the per-pair evaluation report and alignment trace.
///
/// # Errors
/// Fails if either artifact cannot be written; the caller treats this as
/// a recoverable per-pair failure.
pub fn write_pair_reports(
    ref_path: &Path,
    hyp_path: &Path,
    ref_tokens: &[String],
    hyp_tokens: &[String],
    result: &AlignmentResult,
    out_dir: &Path,
) -> Result<PairReport, ReportError> {
    let hyp_name = hyp_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let stem = hyp_name.strip_suffix(".txt").unwrap_or(hyp_name);
    let eval_path = out_dir.join(format!("{stem}_eval.txt"));
    let alignment_path = out_dir.join(format!("{stem}_alignment.csv"));

    let report = render_eval_report(ref_path, hyp_path, ref_tokens, hyp_tokens, result);
    std::fs::write(&eval_path, report)?;

    write_alignment_csv(&alignment_path, &result.trace)?;

    Ok(PairReport {
        eval_path,
        alignment_path,
    })
}

/// Write the 3-column alignment trace: `ref_token, hyp_token, op`.
fn write_alignment_csv(path: &Path, trace: &[AlignOp]) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["ref_token", "hyp_token", "op"])?;
    for op in trace {
        writer.write_record([
            op.reference().unwrap_or(""),
            op.hypothesis().unwrap_or(""),
            op.tag(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Sort the rows by (basename, model) and write the run summary CSV.
///
/// Returns the path of the written file. Called exactly once per run,
/// after all pairs have completed.
pub fn write_summary(out_dir: &Path, rows: &mut [SummaryRow]) -> Result<PathBuf, ReportError> {
    rows.sort_by(|a, b| {
        (a.basename.as_str(), a.model.as_str()).cmp(&(b.basename.as_str(), b.model.as_str()))
    });

    let path = out_dir.join("evaluation_summary.csv");
    let mut writer = csv::Writer::from_path(&path)?;
    for row in rows.iter() {
        writer.serialize(row)?;
    }
    if rows.is_empty() {
        // serialize() derives the header from the first row; write it
        // explicitly when there are none.
        writer.write_record([
            "basename",
            "model",
            "wer",
            "truth_length",
            "total_errors",
            "substitutions",
            "insertions",
            "deletions",
            "reference",
            "hypothesis",
            "eval_file",
            "alignment_csv",
        ])?;
    }
    writer.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::align;
    use tempfile::TempDir;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_owned).collect()
    }

    fn sample_row(basename: &str, model: &str) -> SummaryRow {
        SummaryRow {
            basename: basename.to_owned(),
            model: model.to_owned(),
            wer: 0.5,
            truth_length: 2,
            total_errors: 1,
            substitutions: 0,
            insertions: 1,
            deletions: 0,
            reference: "samples/x_ref.token.txt".to_owned(),
            hypothesis: "out/x_m1.token.txt".to_owned(),
            eval_file: "out/x_m1.token_eval.txt".to_owned(),
            alignment_csv: "out/x_m1.token_alignment.csv".to_owned(),
        }
    }

    // ===================
    // Per-pair Report
    // ===================

    #[test]
    fn test_render_eval_report_fields() {
        let r = toks("a b c");
        let h = toks("a x c");
        let result = align(&r, &h);
        let report = render_eval_report(
            Path::new("samples/x_ref.token.txt"),
            Path::new("out/x_m1.token.txt"),
            &r,
            &h,
            &result,
        );
        assert!(report.contains("Reference: samples/x_ref.token.txt"));
        assert!(report.contains("Hypothesis: out/x_m1.token.txt"));
        assert!(report.contains("WER: 0.333333"));
        assert!(report.contains("Substitutions: 1"));
        assert!(report.contains("Insertions: 0"));
        assert!(report.contains("Deletions: 0"));
        assert!(report.contains("Hits: 2"));
        assert!(report.contains("Truth length (tokens): 3"));
        assert!(report.contains("=== Reference Tokens ===\na b c"));
        assert!(report.contains("=== Hypothesis Tokens ===\na x c"));
    }

    #[test]
    fn test_write_pair_reports_names_artifacts_after_hypothesis() {
        let dir = TempDir::new().unwrap();
        let r = toks("a b");
        let h = toks("a b");
        let result = align(&r, &h);
        let hyp_path = dir.path().join("x_m1.token.txt");
        let report =
            write_pair_reports(Path::new("x_ref.token.txt"), &hyp_path, &r, &h, &result, dir.path())
                .unwrap();
        assert_eq!(report.eval_path, dir.path().join("x_m1.token_eval.txt"));
        assert_eq!(
            report.alignment_path,
            dir.path().join("x_m1.token_alignment.csv")
        );
        assert!(report.eval_path.is_file());
        assert!(report.alignment_path.is_file());
    }

    #[test]
    fn test_alignment_csv_contents() {
        let dir = TempDir::new().unwrap();
        let r = toks("a b");
        let h = toks("a x c");
        let result = align(&r, &h);
        let hyp_path = dir.path().join("x_m1.txt");
        let report =
            write_pair_reports(Path::new("x_ref.txt"), &hyp_path, &r, &h, &result, dir.path())
                .unwrap();
        let csv = std::fs::read_to_string(&report.alignment_path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "ref_token,hyp_token,op");
        assert_eq!(lines[1], "a,a,OK");
        // One row per trace operation, plus the header.
        assert_eq!(lines.len(), result.trace.len() + 1);
        for op in &result.trace {
            match op.tag() {
                "I" => assert!(lines.iter().any(|l| l.starts_with(','))),
                "D" => assert!(lines.iter().any(|l| l.ends_with(",D"))),
                _ => {}
            }
        }
    }

    // ===================
    // Run Summary
    // ===================

    #[test]
    fn test_summary_sorted_by_basename_then_model() {
        let dir = TempDir::new().unwrap();
        let mut rows = vec![
            sample_row("b", "m1"),
            sample_row("a", "m2"),
            sample_row("a", "m1"),
        ];
        let path = write_summary(dir.path(), &mut rows).unwrap();
        assert_eq!(path, dir.path().join("evaluation_summary.csv"));
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines[0].starts_with("basename,model,wer,truth_length,total_errors"));
        assert!(lines[1].starts_with("a,m1,"));
        assert!(lines[2].starts_with("a,m2,"));
        assert!(lines[3].starts_with("b,m1,"));
    }

    #[test]
    fn test_empty_summary_still_writes_header() {
        let dir = TempDir::new().unwrap();
        let mut rows = Vec::new();
        let path = write_summary(dir.path(), &mut rows).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("basename,model,wer"));
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_summary_row_columns() {
        let dir = TempDir::new().unwrap();
        let mut rows = vec![sample_row("x", "ja-JP")];
        let path = write_summary(dir.path(), &mut rows).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "basename,model,wer,truth_length,total_errors,substitutions,insertions,\
             deletions,reference,hypothesis,eval_file,alignment_csv"
        );
        assert!(lines[1].contains("samples/x_ref.token.txt"));
        assert!(lines[1].contains("out/x_m1.token_alignment.csv"));
    }
}
