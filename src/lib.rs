//! Rebuild clean, lap segmented tracks from the sparse sample logs recorded by sports watches
use log::trace;
use std::fs::read;
use std::path::Path;

mod builder;
pub mod cli;
pub mod config;
pub mod dedup;
mod error;
pub mod extract;
pub mod interpolate;
pub mod sample;
pub mod segment;
pub mod track;

pub use builder::{TrackBuilder, TrackOutcome};
pub use config::Config;
pub use error::Error;
pub use extract::{new_extractor_for_path, SampleExtractor, SampleLog};
pub use sample::{Channel, Sample};
pub use segment::{ChannelTable, FieldMapping, LapMarkers, PointField};
pub use track::{Segment, Track, TrackInfo, TrackPoint};

/// Read an activity log from disk and build a track from it using the configured channel table
pub fn build_track_from_file(path: &Path, config: &Config) -> Result<TrackOutcome, Error> {
    trace!("Reading activity log: {:?}", path);
    let content = read(path)?;
    let digest = extract::source_digest(&content);
    build_track(path, &content, digest, config)
}

/// Build a track from activity log content already read from `path`, the path selects the format
pub fn build_track(
    path: &Path,
    content: &[u8],
    digest: String,
    config: &Config,
) -> Result<TrackOutcome, Error> {
    let extractor = new_extractor_for_path(path)?;
    let mut log = extractor.extract(content)?;
    log.info.source_digest = Some(digest);
    let table = config.channel_table(extractor.channel_table())?;
    TrackBuilder::new(table).build(log)
}
