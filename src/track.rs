//! Output structures produced by the track building pipeline
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Single point of a finished track, fields are only set where data was recovered
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// elevation in meters if available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, f64>,
}

impl TrackPoint {
    pub fn new(time: DateTime<Utc>) -> Self {
        TrackPoint {
            time,
            latitude: None,
            longitude: None,
            elevation: None,
            extensions: BTreeMap::new(),
        }
    }

    /// Return an extension value by name
    pub fn extension(&self, name: &str) -> Option<f64> {
        self.extensions.get(name).copied()
    }
}

/// Points recorded between two lap markers
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    points: Vec<TrackPoint>,
}

impl Segment {
    pub fn new() -> Self {
        Segment { points: Vec::new() }
    }

    pub fn push(&mut self, point: TrackPoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Time of the first and last point, None for an empty segment
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Some((first.time, last.time)),
            _ => None,
        }
    }
}

/// Descriptive data about the recording a track was built from
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub name: Option<String>,
    pub description: Option<String>,
    pub comment: Option<String>,
    /// hex encoded SHA-256 digest of the source file
    pub source_digest: Option<String>,
}

/// A finished track, owns its segments
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    info: TrackInfo,
    segments: Vec<Segment>,
}

impl Track {
    pub fn new(info: TrackInfo, segments: Vec<Segment>) -> Self {
        Track { info, segments }
    }

    pub fn info(&self) -> &TrackInfo {
        &self.info
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Total number of points across all segments
    pub fn point_count(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }
}
