//! Transcript extraction from STT provider JSON responses.
//!
//! Cloud STT engines return a JSON document per recognition request;
//! the transcript text lives in `results[].alternatives[].transcript`.
//! This module flattens each JSON file in an output directory into a
//! plain `.txt` hypothesis file with the same stem, taking the top
//! alternative of every result segment and joining them with spaces.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::discover::references::sorted_filenames;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Output directory not found: {0}")]
    MissingDir(PathBuf),

    #[error("Failed to read recognition JSON: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse recognition JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Top-level recognition response.
///
/// Only the fields needed for transcript extraction are modeled; the
/// provider response carries much more (timings, confidences) that this
/// tool never reads.
#[derive(Debug, Deserialize)]
pub struct RecognitionResponse {
    #[serde(default)]
    pub results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
pub struct RecognitionResult {
    #[serde(default)]
    pub alternatives: Vec<RecognitionAlternative>,
}

#[derive(Debug, Deserialize)]
pub struct RecognitionAlternative {
    #[serde(default)]
    pub transcript: String,
}

/// Join the top alternative of every result segment with single spaces.
pub fn transcript_from_response(response: &RecognitionResponse) -> String {
    response
        .results
        .iter()
        .filter_map(|result| result.alternatives.first())
        .map(|alt| alt.transcript.trim())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract one JSON file into transcript text.
pub fn extract_file(json_path: &Path) -> Result<String, ExtractError> {
    let contents = std::fs::read_to_string(json_path)?;
    let response: RecognitionResponse = serde_json::from_str(&contents)?;
    Ok(transcript_from_response(&response))
}

/// Convert every `.json` recognition response in `out_dir` into a
/// sibling `.txt` hypothesis file. Returns the number of files written.
///
/// A file that cannot be read or parsed is skipped with a warning; the
/// remaining files are still processed.
///
/// # Errors
/// Fails only when the directory itself is missing or unreadable.
pub fn extract_dir(out_dir: &Path) -> Result<usize, ExtractError> {
    if !out_dir.is_dir() {
        return Err(ExtractError::MissingDir(out_dir.to_path_buf()));
    }

    let mut written = 0;
    for filename in sorted_filenames(out_dir)? {
        if !filename.to_lowercase().ends_with(".json") {
            continue;
        }
        let json_path = out_dir.join(&filename);
        let text = match extract_file(&json_path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping {}: {}", json_path.display(), e);
                continue;
            }
        };
        // The suffix match above is case-insensitive and ASCII, so the
        // last five bytes are safe to cut.
        let stem = &filename[..filename.len() - ".json".len()];
        let txt_path = out_dir.join(format!("{stem}.txt"));
        std::fs::write(&txt_path, format!("{text}\n"))?;
        info!("Extracted transcript: {}", txt_path.display());
        written += 1;
    }

    Ok(written)
}
