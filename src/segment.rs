//! Split cleaned samples into lap segments and convert them into track points
use crate::sample::{Channel, Sample};
use crate::track::{Segment, TrackPoint};
use crate::Error;
use chrono::{DateTime, Duration, Utc};
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;

/// Timestamps where the lap button was pressed, strictly increasing
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LapMarkers(Vec<DateTime<Utc>>);

impl LapMarkers {
    /// Validate marker ordering, every marker must be later than the one before it
    pub fn new(markers: Vec<DateTime<Utc>>) -> Result<Self, Error> {
        if let Some(pos) = markers.windows(2).position(|w| w[0] >= w[1]) {
            return Err(Error::MalformedMarkerOrdering(format!(
                "marker {} ({}) is not after marker {} ({})",
                pos + 1,
                markers[pos + 1].to_rfc3339(),
                pos,
                markers[pos].to_rfc3339()
            )));
        }
        Ok(LapMarkers(markers))
    }

    /// Append a final marker one second after both the last sample and the last lap so
    /// every sample falls into a segment
    pub fn close_after(mut self, last_sample: DateTime<Utc>) -> Self {
        let latest = match self.0.last() {
            Some(last_lap) if *last_lap > last_sample => *last_lap,
            _ => last_sample,
        };
        self.0.push(latest + Duration::seconds(1));
        self
    }

    pub fn as_slice(&self) -> &[DateTime<Utc>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Where a channel ends up in a track point
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PointField {
    Latitude,
    Longitude,
    Elevation,
    /// named extension value, e.g. "gpxdata:cadence"
    Extension(String),
}

impl From<String> for PointField {
    fn from(name: String) -> Self {
        match name.as_str() {
            "latitude" => PointField::Latitude,
            "longitude" => PointField::Longitude,
            "elevation" => PointField::Elevation,
            _ => PointField::Extension(name),
        }
    }
}

impl From<PointField> for String {
    fn from(field: PointField) -> Self {
        field.to_string()
    }
}

impl fmt::Display for PointField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointField::Latitude => write!(f, "latitude"),
            PointField::Longitude => write!(f, "longitude"),
            PointField::Elevation => write!(f, "elevation"),
            PointField::Extension(name) => write!(f, "{}", name),
        }
    }
}

/// Conversion applied to a channel value when it is written into a track point
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub field: PointField,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub offset: f64,
    /// truncate the converted value toward zero
    #[serde(default)]
    pub integral: bool,
}

fn default_scale() -> f64 {
    1.0
}

impl FieldMapping {
    pub fn new(field: PointField, scale: f64, offset: f64) -> Self {
        FieldMapping {
            field,
            scale,
            offset,
            integral: false,
        }
    }

    pub fn extension(name: &str, scale: f64, offset: f64) -> Self {
        FieldMapping::new(PointField::Extension(name.to_string()), scale, offset)
    }

    pub fn convert(&self, value: f64) -> f64 {
        let value = value * self.scale + self.offset;
        if self.integral {
            value.trunc()
        } else {
            value
        }
    }
}

pub const RAD_TO_DEG: f64 = 180.0 / PI;
/// degrees per FIT semicircle unit
pub const SEMICIRCLES_TO_DEG: f64 = 180.0 / 2147483648.0;

/// Declarative mapping of channels to track point fields, unmapped channels are dropped
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelTable(BTreeMap<Channel, FieldMapping>);

impl ChannelTable {
    pub fn new() -> Self {
        ChannelTable(BTreeMap::new())
    }

    /// Table for values already in output units
    pub fn identity() -> Self {
        ChannelTable::new().with_scaled(&[])
    }

    /// SML devices report radians, Hz, Kelvin, Pa and Watts
    pub fn sml() -> Self {
        ChannelTable::new().with_scaled(&[
            (Channel::Latitude, RAD_TO_DEG, 0.0),
            (Channel::Longitude, RAD_TO_DEG, 0.0),
            (Channel::HeartRate, 60.0, 0.0),
            (Channel::Cadence, 60.0, 0.0),
            (Channel::Temperature, 1.0, -273.15),
            (Channel::SeaLevelPressure, 0.01, 0.0),
            (Channel::EnergyConsumption, 60.0 / 4184.0, 0.0),
        ])
    }

    /// FIT files store positions in semicircles, other record fields are already scaled
    pub fn fit() -> Self {
        ChannelTable::new().with_scaled(&[
            (Channel::Latitude, SEMICIRCLES_TO_DEG, 0.0),
            (Channel::Longitude, SEMICIRCLES_TO_DEG, 0.0),
        ])
    }

    /// Fill in the standard output field of every channel, using the given scale and
    /// offset for the listed channels and no conversion for the rest
    fn with_scaled(mut self, conversions: &[(Channel, f64, f64)]) -> Self {
        for channel in Channel::ALL.iter() {
            let (scale, offset) = conversions
                .iter()
                .find(|(c, _, _)| c == channel)
                .map_or((1.0, 0.0), |(_, s, o)| (*s, *o));
            let mut mapping = FieldMapping::new(standard_field(*channel), scale, offset);
            mapping.integral = *channel == Channel::HeartRate;
            self.0.insert(*channel, mapping);
        }
        self
    }

    pub fn get(&self, channel: Channel) -> Option<&FieldMapping> {
        self.0.get(&channel)
    }

    pub fn insert(&mut self, channel: Channel, mapping: FieldMapping) -> Option<FieldMapping> {
        self.0.insert(channel, mapping)
    }

    pub fn remove(&mut self, channel: Channel) -> Option<FieldMapping> {
        self.0.remove(&channel)
    }

    /// Convert a cleaned sample into a track point, missing channels leave fields unset
    pub fn to_track_point(&self, sample: &Sample) -> TrackPoint {
        let mut point = TrackPoint::new(sample.timestamp());
        for (channel, mapping) in self.0.iter() {
            let value = match sample.get(*channel) {
                Some(value) => mapping.convert(value),
                None => continue,
            };
            match &mapping.field {
                PointField::Latitude => point.latitude = Some(value),
                PointField::Longitude => point.longitude = Some(value),
                PointField::Elevation => point.elevation = Some(value),
                PointField::Extension(name) => {
                    point.extensions.insert(name.clone(), value);
                }
            }
        }
        point
    }
}

/// GPX style output field for each channel
pub fn standard_field(channel: Channel) -> PointField {
    match channel {
        Channel::Latitude => PointField::Latitude,
        Channel::Longitude => PointField::Longitude,
        Channel::Altitude => PointField::Elevation,
        Channel::VerticalSpeed => PointField::Extension("gpxdata:verticalSpeed".to_string()),
        Channel::HeartRate => {
            PointField::Extension("gpxtpx:TrackPointExtension|gpxtpx:hr".to_string())
        }
        Channel::Cadence => PointField::Extension("gpxdata:cadence".to_string()),
        Channel::Temperature => PointField::Extension("gpxdata:temp".to_string()),
        Channel::SeaLevelPressure => {
            PointField::Extension("gpxdata:seaLevelPressure".to_string())
        }
        Channel::Speed => PointField::Extension("gpxdata:speed".to_string()),
        Channel::EnergyConsumption => PointField::Extension("gpxdata:energy".to_string()),
    }
}

/// Partition time ordered, deduplicated samples into one segment per lap marker.
///
/// A trailing marker is added after the last sample, so the result always holds one more
/// segment than `laps` and every sample lands in exactly one segment. No samples, no segments.
pub fn segment_samples(
    samples: &[Sample],
    laps: LapMarkers,
    table: &ChannelTable,
) -> Vec<Segment> {
    let last = match samples.last() {
        Some(sample) => sample.timestamp(),
        None => return Vec::new(),
    };
    let laps = laps.close_after(last);
    let markers = laps.as_slice();
    let mut segments = vec![Segment::new(); markers.len()];

    let mut lap = 0;
    for sample in samples {
        while lap + 1 < markers.len() && sample.timestamp() > markers[lap] {
            lap += 1;
        }
        segments[lap].push(table.to_track_point(sample));
    }
    trace!(
        "split {} samples into {} segments",
        samples.len(),
        segments.len()
    );
    segments
}
