//! Read raw activity logs into the uniform sample representation used by the pipeline
use crate::sample::Sample;
use crate::segment::{ChannelTable, LapMarkers};
use crate::track::TrackInfo;
use crate::Error;
use sha2::{Digest, Sha256};
use std::path::Path;

mod fit;
pub use fit::FitExtractor;
mod sml;
pub use sml::SmlExtractor;

/// Time ordered samples, lap markers and descriptive data read from one file
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleLog {
    pub samples: Vec<Sample>,
    pub laps: LapMarkers,
    pub info: TrackInfo,
}

/// trait that defines how a file format is turned into a sample log
pub trait SampleExtractor {
    /// Parse file content into samples holding raw device units
    fn extract(&self, content: &[u8]) -> Result<SampleLog, Error>;

    /// Conversion from the raw units this format stores into track point units
    fn channel_table(&self) -> ChannelTable;
}

/// Return the extractor for a file based on its extension
pub fn new_extractor_for_path(path: &Path) -> Result<Box<dyn SampleExtractor>, Error> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "sml" => Ok(Box::new(SmlExtractor::default())),
        "fit" => Ok(Box::new(FitExtractor::default())),
        _ => Err(Error::UnsupportedFormat(format!("{:?}", path))),
    }
}

/// True if a path has an extension we have an extractor for
pub fn is_supported_path(path: &Path) -> bool {
    path.extension().map_or(false, |e| {
        let ext = e.to_string_lossy().to_ascii_lowercase();
        ext == "sml" || ext == "fit"
    })
}

/// Hex encoded SHA-256 digest of a file's content, identifies the source of a track
pub fn source_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Drop repeated lap timestamps, some devices log a lap event more than once
fn dedup_laps(mut laps: Vec<chrono::DateTime<chrono::Utc>>) -> Result<LapMarkers, Error> {
    laps.dedup();
    LapMarkers::new(laps)
}
