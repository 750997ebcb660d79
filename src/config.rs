//! Store application configuration that gets read from disk
use crate::sample::Channel;
use crate::segment::{standard_field, ChannelTable, FieldMapping, PointField};
use crate::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use simplelog::LevelFilter;
use std::collections::BTreeMap;
use std::io::prelude::*;
use std::path::PathBuf;
use std::str::FromStr;

static CONFIG_DIR_NAME: &str = "activity-track";
static CONFIG_FILE_NAME: &str = "config.yml";

/// Changes to the default conversion of a single channel, unset keys keep the default
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelOverride {
    field: Option<PointField>,
    scale: Option<f64>,
    offset: Option<f64>,
    integral: Option<bool>,
    enabled: Option<bool>,
}

impl ChannelOverride {
    /// Apply the override on top of an existing mapping (if any)
    fn apply(&self, channel: Channel, base: Option<FieldMapping>) -> Option<FieldMapping> {
        if self.enabled == Some(false) {
            return None;
        }
        let mut mapping =
            base.unwrap_or_else(|| FieldMapping::new(standard_field(channel), 1.0, 0.0));
        if let Some(field) = &self.field {
            mapping.field = field.clone();
        }
        if let Some(scale) = self.scale {
            mapping.scale = scale;
        }
        if let Some(offset) = self.offset {
            mapping.offset = offset;
        }
        if let Some(integral) = self.integral {
            mapping.integral = integral;
        }
        Some(mapping)
    }
}

/// Configuration struct that we can create from the config file used
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    input_paths: Vec<String>,
    #[serde(default)]
    output_dir: Option<String>,
    #[serde(
        deserialize_with = "deserialize_level_filter",
        serialize_with = "serialize_level_filter",
        default = "default_level_filter"
    )]
    log_level: LevelFilter,
    #[serde(default)]
    channels: BTreeMap<Channel, ChannelOverride>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input_paths: Vec::new(),
            output_dir: None,
            log_level: default_level_filter(),
            channels: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load<T: Read>(source: &mut T) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(source)
    }

    pub fn input_paths(&self) -> &[String] {
        &self.input_paths
    }

    pub fn output_dir(&self) -> Option<PathBuf> {
        self.output_dir.as_ref().map(PathBuf::from)
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    /// Apply the configured channel overrides to a format's default table
    pub fn channel_table(&self, mut table: ChannelTable) -> Result<ChannelTable, Error> {
        for (channel, channel_override) in self.channels.iter() {
            for (key, value) in &[
                ("scale", channel_override.scale),
                ("offset", channel_override.offset),
            ] {
                match value {
                    Some(value) if !value.is_finite() => {
                        return Err(Error::InvalidConfigurationValue(format!(
                            "invalid value for channels.{}.{}, expected a finite number: {}",
                            channel, key, value
                        )))
                    }
                    _ => {}
                }
            }
            let base = table.remove(*channel);
            if let Some(mapping) = channel_override.apply(*channel, base) {
                table.insert(*channel, mapping);
            }
        }
        Ok(table)
    }
}

/// Default location of the configuration file
pub fn config_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_default()
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

fn deserialize_level_filter<'de, D>(deserializer: D) -> Result<LevelFilter, D::Error>
where
    D: Deserializer<'de>,
{
    let buf = String::deserialize(deserializer)?;
    LevelFilter::from_str(&buf)
        .map_err(|_| serde::de::Error::custom(format!("invalid level value: {}", buf)))
}

fn serialize_level_filter<S>(level: &LevelFilter, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&level.to_string())
}

fn default_level_filter() -> LevelFilter {
    LevelFilter::Info
}
