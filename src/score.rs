//! WER scoring derived from an alignment.
//!
//! Both values are pure functions of the alignment counts; nothing here
//! touches the filesystem.

use crate::align::AlignmentResult;

/// Total token-level errors: substitutions + insertions + deletions.
pub fn total_errors(result: &AlignmentResult) -> usize {
    result.substitutions + result.insertions + result.deletions
}

/// Word error rate: `total_errors / truth_length`.
///
/// An empty reference yields 0.0 by convention rather than dividing by
/// zero. This understates the error when the hypothesis still carries
/// insertions; callers comparing very short or empty references should
/// treat the value with care.
pub fn wer(result: &AlignmentResult) -> f64 {
    if result.truth_length == 0 {
        return 0.0;
    }
    total_errors(result) as f64 / result.truth_length as f64
}
