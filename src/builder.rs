//! Run the full reconstruction pipeline on an extracted sample log
use crate::dedup::collapse_duplicate_timestamps;
use crate::extract::SampleLog;
use crate::interpolate::fill_all_channels;
use crate::segment::{segment_samples, ChannelTable};
use crate::track::Track;
use crate::Error;
use log::{debug, info};

/// Result of building a track, a log without usable samples is not an error
#[derive(Clone, Debug, PartialEq)]
pub enum TrackOutcome {
    Track(Track),
    NoUsableData,
}

impl TrackOutcome {
    /// Return the track if one was built
    pub fn into_track(self) -> Option<Track> {
        match self {
            TrackOutcome::Track(track) => Some(track),
            TrackOutcome::NoUsableData => None,
        }
    }
}

/// Turns sparse samples into a gap filled, deduplicated and lap segmented track
#[derive(Clone, Debug)]
pub struct TrackBuilder {
    table: ChannelTable,
}

impl TrackBuilder {
    pub fn new(table: ChannelTable) -> Self {
        TrackBuilder { table }
    }

    /// Consume the sample log and build a track from it
    pub fn build(&self, log: SampleLog) -> Result<TrackOutcome, Error> {
        let SampleLog {
            mut samples,
            laps,
            info,
        } = log;
        if let Some(pos) = samples
            .windows(2)
            .position(|w| w[1].timestamp() < w[0].timestamp())
        {
            return Err(Error::UnorderedSamples(pos + 1));
        }

        debug!(
            "building track from {} samples and {} lap markers",
            samples.len(),
            laps.len()
        );
        fill_all_channels(&mut samples);
        collapse_duplicate_timestamps(&mut samples);
        if samples.is_empty() {
            info!("no usable samples found, skipping track creation");
            return Ok(TrackOutcome::NoUsableData);
        }

        let segments = segment_samples(&samples, laps, &self.table);
        let track = Track::new(info, segments);
        debug!(
            "built track with {} segments and {} points",
            track.segments().len(),
            track.point_count()
        );
        Ok(TrackOutcome::Track(track))
    }
}
