//! Hypothesis collection: one hypothesis file per model for a basename.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::references::sorted_filenames;
use super::{REF_SUFFIXES, TEXT_SUFFIX, TOKEN_SUFFIX};

/// Collect hypothesis files for one sample basename.
///
/// Candidates are text files in `out_dir` named `<basename>_<model>.txt`
/// or `<basename>_<model>.token.txt`. Reference files and reserved
/// timing/eval artifacts are excluded. Per model, a tokenized file
/// always overrides a raw one; a raw file is only accepted while no file
/// has been recorded for that model. Entries are processed in sorted
/// order, so when only raw variants exist the lexicographically first
/// filename wins.
///
/// A missing directory yields an empty map.
///
/// # Errors
/// Returns an I/O error only if an existing directory cannot be read.
pub fn collect_hypotheses(
    out_dir: &Path,
    basename: &str,
) -> io::Result<BTreeMap<String, PathBuf>> {
    let mut candidates: BTreeMap<String, PathBuf> = BTreeMap::new();
    if !out_dir.is_dir() {
        return Ok(candidates);
    }

    let prefix = format!("{basename}_");
    for filename in sorted_filenames(out_dir)? {
        if !filename.to_lowercase().ends_with(TEXT_SUFFIX) {
            continue;
        }
        if !filename.starts_with(&prefix) {
            continue;
        }
        // Never score a reference against itself.
        if REF_SUFFIXES.iter().any(|suffix| filename.ends_with(suffix)) {
            continue;
        }

        let model_part = &filename[prefix.len()..];
        let (model, tokenized) = if let Some(model) = model_part.strip_suffix(TOKEN_SUFFIX) {
            (model, true)
        } else if let Some(model) = model_part.strip_suffix(TEXT_SUFFIX) {
            (model, false)
        } else {
            continue;
        };

        if is_reserved_model(model) {
            debug!("Excluding timing/eval artifact {}", filename);
            continue;
        }

        if tokenized {
            candidates.insert(model.to_owned(), out_dir.join(&filename));
        } else if !candidates.contains_key(model) {
            candidates.insert(model.to_owned(), out_dir.join(&filename));
        }
    }

    Ok(candidates)
}

/// True for model parts that name timing or evaluation artifacts rather
/// than STT models, matched case-insensitively.
fn is_reserved_model(model: &str) -> bool {
    let lower = model.to_lowercase();
    lower == "time"
        || lower.starts_with("times")
        || lower.contains("_times")
        || lower.contains("_eval")
}
