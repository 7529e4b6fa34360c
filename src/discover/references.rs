//! Reference resolution: one reference file per sample basename.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{basename_from_ref_filename, REF_SUFFIXES};

/// Build a map from sample basename to its chosen reference file.
///
/// Every file in `samples_dir` whose name carries one of the
/// [`REF_SUFFIXES`] is a candidate; for each basename the
/// highest-priority variant wins, and among equal-priority variants the
/// lexicographically first filename wins. A chosen entry is never
/// displaced by a lower-priority variant seen later.
///
/// A missing directory yields an empty map rather than an error; the
/// caller decides whether an empty map is fatal.
///
/// # Errors
/// Returns an I/O error only if an existing directory cannot be read.
pub fn build_reference_map(samples_dir: &Path) -> io::Result<BTreeMap<String, PathBuf>> {
    let mut chosen: BTreeMap<String, (usize, PathBuf)> = BTreeMap::new();
    if !samples_dir.is_dir() {
        return Ok(BTreeMap::new());
    }

    for filename in sorted_filenames(samples_dir)? {
        let Some(rank) = REF_SUFFIXES
            .iter()
            .position(|suffix| filename.ends_with(suffix))
        else {
            continue;
        };
        let basename = basename_from_ref_filename(&filename).to_owned();
        let path = samples_dir.join(&filename);

        // Sorted traversal means an equal-rank entry already present is
        // the lexicographically first one; keep it.
        let better = match chosen.get(&basename) {
            Some((existing_rank, _)) => rank < *existing_rank,
            None => true,
        };
        if better {
            chosen.insert(basename, (rank, path));
        } else {
            debug!(
                "Skipping lower-priority reference {} for basename {}",
                filename, basename
            );
        }
    }

    Ok(chosen
        .into_iter()
        .map(|(basename, (_, path))| (basename, path))
        .collect())
}

/// Sorted list of plain-file names in a directory.
pub(crate) fn sorted_filenames(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
