//! Fuzz target for the alignment engine.
//!
//! Checks the counting and replay invariants on arbitrary token
//! sequences: the trace must account for every reference and
//! hypothesis token exactly once.

#![no_main]

use libfuzzer_sys::fuzz_target;
use werbench::align;

fuzz_target!(|input: (Vec<String>, Vec<String>)| {
    let (reference, hypothesis) = input;

    // The cost table is O(n*m); keep the product bounded.
    if reference.len() > 64 || hypothesis.len() > 64 {
        return;
    }

    let result = align(&reference, &hypothesis);

    assert_eq!(
        result.hits + result.substitutions + result.deletions,
        reference.len()
    );
    assert_eq!(
        result.hits + result.substitutions + result.insertions,
        hypothesis.len()
    );
    assert_eq!(result.truth_length, reference.len());

    let ref_replay: Vec<&str> = result.trace.iter().filter_map(|op| op.reference()).collect();
    let hyp_replay: Vec<&str> = result.trace.iter().filter_map(|op| op.hypothesis()).collect();
    assert!(ref_replay.iter().eq(reference.iter().map(|t| t.as_str())));
    assert!(hyp_replay.iter().eq(hypothesis.iter().map(|t| t.as_str())));
});
