//! Merge samples that share a timestamp
//!
//! Some devices emit several samples with the same timestamp, e.g. when the pause button is
//! pressed. Each run of equal timestamps is replaced by its first sample holding the average
//! of every channel across the run, ignoring members without a value for that channel.
use crate::sample::{Channel, Sample};
use log::debug;

/// Collapse consecutive samples with identical timestamps, returns the number removed.
///
/// Samples are expected to be time ordered, only adjacent duplicates are merged.
pub fn collapse_duplicate_timestamps(samples: &mut Vec<Sample>) -> usize {
    if samples.len() < 2 {
        return 0;
    }

    let original_len = samples.len();
    let mut collapsed: Vec<Sample> = Vec::with_capacity(original_len);
    let mut run_start = 0;
    for idx in 1..=original_len {
        // reaching the end acts like a sample with a later timestamp and flushes the last run
        let run_ended = idx == original_len
            || samples[idx].timestamp() != samples[run_start].timestamp();
        if run_ended {
            collapsed.push(merge_run(&samples[run_start..idx]));
            run_start = idx;
        }
    }

    let removed = original_len - collapsed.len();
    if removed > 0 {
        debug!(
            "merged {} samples with duplicate timestamps, {} samples remain",
            removed,
            collapsed.len()
        );
    }
    *samples = collapsed;
    removed
}

/// Average each channel over the run members that carry a value
fn merge_run(run: &[Sample]) -> Sample {
    let mut merged = run[0].clone();
    if run.len() == 1 {
        return merged;
    }
    for channel in Channel::ALL.iter() {
        let (sum, count) = run
            .iter()
            .filter_map(|s| s.get(*channel))
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        if count > 0 {
            merged.set(*channel, Some(sum / count as f64));
        }
    }
    merged
}
