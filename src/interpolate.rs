//! Spread sparse channel data across every sample of a log
//!
//! Watches record position, heart rate, altitude, etc. in separate samples, each carrying
//! only a subset of the channels. Filling the gaps gives every sample a value for every
//! channel that was recorded at least once, linearly interpolated over elapsed time between
//! the nearest samples with real data. Leading and trailing gaps take the nearest value.
use crate::sample::{elapsed_seconds, Channel, Sample};
use log::trace;
use std::ops::Range;

/// Fill the missing values of a single channel in place.
///
/// A channel without a single value in the whole sequence is left untouched.
pub fn fill_missing_data(samples: &mut [Sample], channel: Channel) {
    let mut pending_start = 0;
    let mut last_known: Option<usize> = None;

    for idx in 0..samples.len() {
        let value = match samples[idx].get(channel) {
            Some(value) => value,
            None => continue,
        };
        let pending = pending_start..idx;
        match last_known {
            // first real value, flat extrapolation backwards
            None => fill_flat(samples, pending, channel, value),
            Some(anchor) => interpolate_between(samples, anchor, idx, pending, channel),
        }
        last_known = Some(idx);
        pending_start = idx + 1;
    }

    match last_known {
        Some(anchor) => {
            if let Some(value) = samples[anchor].get(channel) {
                fill_flat(samples, pending_start..samples.len(), channel, value);
            }
        }
        None => trace!("no {} data found in {} samples", channel, samples.len()),
    }
}

/// Fill every channel, each channel is treated independently of the others
pub fn fill_all_channels(samples: &mut [Sample]) {
    for channel in Channel::ALL.iter() {
        fill_missing_data(samples, *channel);
    }
}

fn fill_flat(samples: &mut [Sample], range: Range<usize>, channel: Channel, value: f64) {
    for sample in &mut samples[range] {
        sample.set(channel, Some(value));
    }
}

/// Assign values on the line through the two anchor samples to the pending range
fn interpolate_between(
    samples: &mut [Sample],
    first: usize,
    second: usize,
    pending: Range<usize>,
    channel: Channel,
) {
    if pending.is_empty() {
        return;
    }
    let (y1, y2) = match (samples[first].get(channel), samples[second].get(channel)) {
        (Some(y1), Some(y2)) => (y1, y2),
        _ => return,
    };
    let dt = samples[second].seconds_since(&samples[first]);
    if dt == 0.0 {
        // identical anchor timestamps, there is no slope to follow
        fill_flat(samples, pending, channel, y2);
        return;
    }
    let slope = (y2 - y1) / dt;
    let t1 = samples[first].timestamp();
    for sample in &mut samples[pending] {
        let elapsed = elapsed_seconds(t1, sample.timestamp());
        sample.set(channel, Some(y1 + slope * elapsed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_500_000_000 + secs, 0).unwrap()
    }

    fn sample(secs: i64, value: Option<f64>) -> Sample {
        let mut s = Sample::new(at(secs));
        s.set(Channel::HeartRate, value);
        s
    }

    fn values(samples: &[Sample], channel: Channel) -> Vec<Option<f64>> {
        samples.iter().map(|s| s.get(channel)).collect()
    }

    #[test]
    fn test_interpolates_on_line_between_anchors() {
        let mut samples = vec![
            sample(0, Some(0.0)),
            sample(1, None),
            sample(3, None),
            sample(4, None),
            sample(10, Some(20.0)),
        ];
        fill_missing_data(&mut samples, Channel::HeartRate);
        assert_eq!(
            values(&samples, Channel::HeartRate),
            vec![Some(0.0), Some(2.0), Some(6.0), Some(8.0), Some(20.0)]
        );
    }

    #[test]
    fn test_interpolation_uses_sub_second_precision() {
        let t0 = at(0);
        let mut samples = vec![
            Sample::new(t0).with(Channel::Altitude, 100.0),
            Sample::new(t0 + Duration::milliseconds(500)),
            Sample::new(t0 + Duration::milliseconds(2000)).with(Channel::Altitude, 104.0),
        ];
        fill_missing_data(&mut samples, Channel::Altitude);
        let mid = samples[1].get(Channel::Altitude).unwrap();
        assert!((mid - 101.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_extrapolation_at_edges() {
        let mut samples = vec![
            sample(-2, None),
            sample(-1, None),
            sample(0, Some(10.0)),
            sample(1, None),
        ];
        fill_missing_data(&mut samples, Channel::HeartRate);
        assert_eq!(values(&samples, Channel::HeartRate), vec![Some(10.0); 4]);
    }

    #[test]
    fn test_trailing_gap_uses_last_value() {
        let mut samples = vec![
            sample(0, Some(1.0)),
            sample(1, Some(3.0)),
            sample(2, None),
            sample(3, None),
        ];
        fill_missing_data(&mut samples, Channel::HeartRate);
        assert_eq!(
            values(&samples, Channel::HeartRate),
            vec![Some(1.0), Some(3.0), Some(3.0), Some(3.0)]
        );
    }

    #[test]
    fn test_channel_without_data_stays_missing() {
        let mut samples = vec![
            sample(0, Some(1.0)).with(Channel::Speed, 4.0),
            sample(1, None),
            sample(2, Some(2.0)),
        ];
        fill_all_channels(&mut samples);
        assert_eq!(values(&samples, Channel::Temperature), vec![None; 3]);
        assert_eq!(values(&samples, Channel::Speed), vec![Some(4.0); 3]);
        assert_eq!(
            values(&samples, Channel::HeartRate),
            vec![Some(1.0), Some(1.5), Some(2.0)]
        );
    }

    #[test]
    fn test_identical_anchor_timestamps_take_later_value() {
        let mut samples = vec![sample(5, Some(1.0)), sample(5, None), sample(5, Some(7.0))];
        fill_missing_data(&mut samples, Channel::HeartRate);
        assert_eq!(samples[1].get(Channel::HeartRate), Some(7.0));
    }

    #[test]
    fn test_short_sequences() {
        let mut empty: Vec<Sample> = Vec::new();
        fill_all_channels(&mut empty);
        assert!(empty.is_empty());

        let mut single = vec![sample(0, Some(60.0))];
        fill_missing_data(&mut single, Channel::HeartRate);
        assert_eq!(single[0].get(Channel::HeartRate), Some(60.0));

        let mut single = vec![sample(0, None)];
        fill_missing_data(&mut single, Channel::HeartRate);
        assert_eq!(single[0].get(Channel::HeartRate), None);
    }
}
