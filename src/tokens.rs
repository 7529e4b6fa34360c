//! Token sequence loading.
//!
//! References and hypotheses arrive as pre-tokenized UTF-8 text files:
//! whitespace-delimited tokens produced by the upstream tokenizer. This
//! module only splits; it never normalizes or case-folds. Token equality
//! everywhere downstream is exact string equality.

use std::path::Path;

/// Read a pre-tokenized text file into an ordered token sequence.
///
/// The whole file is read, surrounding whitespace is trimmed, and the
/// remainder is split on runs of whitespace. An empty or whitespace-only
/// file yields an empty sequence.
///
/// # Errors
/// Returns the underlying I/O error if the file cannot be read.
pub fn read_tokens(path: &Path) -> std::io::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text.split_whitespace().map(str::to_owned).collect())
}
