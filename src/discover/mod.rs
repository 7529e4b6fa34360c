//! Input discovery: pairing reference files with hypothesis files.
//!
//! Both sides of an evaluation are plain text files joined by a filename
//! convention. References live in the samples directory as
//! `<basename>_ref.token.txt` (or lower-priority variants); hypotheses
//! live in the output directory as `<basename>_<model>.txt` or
//! `<basename>_<model>.token.txt`, alongside timing and report artifacts
//! that must never be scored.
//!
//! Selection is deterministic: suffix priorities are an explicit ranked
//! table, directory entries are processed in sorted order, and ties keep
//! the lexicographically first filename.

pub mod hypotheses;
pub mod references;

pub use hypotheses::collect_hypotheses;
pub use references::build_reference_map;

/// Reference filename suffixes, highest priority first.
///
/// The rank (index) decides which variant wins when several exist for
/// the same basename; the hypothesis collector uses the same table to
/// keep reference files out of the hypothesis pool.
pub const REF_SUFFIXES: [&str; 3] = ["_ref.token.txt", "_reference.token.txt", "_ref.txt"];

/// Suffix marking an already-tokenized artifact.
pub const TOKEN_SUFFIX: &str = ".token.txt";

/// Generic text suffix for raw artifacts.
pub const TEXT_SUFFIX: &str = ".txt";

/// Extract the sample basename from a reference filename.
///
/// Strips the first matching suffix from [`REF_SUFFIXES`], falling back
/// to the filename without its last extension when none matches.
pub fn basename_from_ref_filename(filename: &str) -> &str {
    for suffix in REF_SUFFIXES {
        if let Some(base) = filename.strip_suffix(suffix) {
            return base;
        }
    }
    match filename.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => filename,
    }
}
