//! Raw observations handed to the track building pipeline
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Measurement axes a sample can carry a value for
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Latitude,
    Longitude,
    Altitude,
    VerticalSpeed,
    HeartRate,
    Cadence,
    Temperature,
    SeaLevelPressure,
    Speed,
    EnergyConsumption,
}

impl Channel {
    /// Number of channels, sizes the per sample value storage
    pub const COUNT: usize = 10;

    /// Every channel in a fixed order
    pub const ALL: [Channel; Channel::COUNT] = [
        Channel::Latitude,
        Channel::Longitude,
        Channel::Altitude,
        Channel::VerticalSpeed,
        Channel::HeartRate,
        Channel::Cadence,
        Channel::Temperature,
        Channel::SeaLevelPressure,
        Channel::Speed,
        Channel::EnergyConsumption,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Latitude => "latitude",
            Channel::Longitude => "longitude",
            Channel::Altitude => "altitude",
            Channel::VerticalSpeed => "vertical_speed",
            Channel::HeartRate => "heart_rate",
            Channel::Cadence => "cadence",
            Channel::Temperature => "temperature",
            Channel::SeaLevelPressure => "sea_level_pressure",
            Channel::Speed => "speed",
            Channel::EnergyConsumption => "energy_consumption",
        };
        write!(f, "{}", name)
    }
}

/// A single observation instant, any channel may be missing
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    timestamp: DateTime<Utc>,
    values: [Option<f64>; Channel::COUNT],
}

impl Sample {
    /// Create a sample without any channel data
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Sample {
            timestamp,
            values: [None; Channel::COUNT],
        }
    }

    /// Builder style setter used by extractors and tests
    pub fn with(mut self, channel: Channel, value: f64) -> Self {
        self.set(channel, Some(value));
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Return the value of a channel, None if it holds no data
    pub fn get(&self, channel: Channel) -> Option<f64> {
        self.values[channel.index()]
    }

    /// Set or clear the value of a channel, NaN is stored as missing data
    pub fn set(&mut self, channel: Channel, value: Option<f64>) {
        self.values[channel.index()] = value.filter(|v| !v.is_nan());
    }

    /// True if no channel holds data
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Seconds elapsed from `earlier` to this sample, millisecond resolution
    pub fn seconds_since(&self, earlier: &Sample) -> f64 {
        elapsed_seconds(earlier.timestamp, self.timestamp)
    }
}

/// Seconds between two instants with millisecond resolution
pub fn elapsed_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    to.signed_duration_since(from).num_milliseconds() as f64 / 1000.0
}
