//! Read Suunto SML device logs
//!
//! An SML file stores every measurement as a separate `Sample` element holding a subset of
//! the channels, with the time as seconds since the first sample. Samples carrying an
//! `Events` element are not measurements, a `Lap` event marks the end of a lap.
use super::{dedup_laps, SampleExtractor, SampleLog};
use crate::sample::{Channel, Sample};
use crate::segment::ChannelTable;
use crate::track::TrackInfo;
use crate::Error;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use log::{debug, warn};
use quick_xml::de::from_str;
use serde::de::IgnoredAny;
use serde::Deserialize;

/// Extractor for the XML based SML format
#[derive(Clone, Copy, Debug, Default)]
pub struct SmlExtractor;

impl SampleExtractor for SmlExtractor {
    fn extract(&self, content: &[u8]) -> Result<SampleLog, Error> {
        let content = std::str::from_utf8(content)
            .map_err(|e| Error::SmlParse(format!("invalid UTF-8: {}", e)))?;
        let sml: Sml = from_str(content)?;
        let device_log = match sml.device_log {
            Some(log) => log,
            None => return Ok(SampleLog::default()),
        };

        let info = track_info(device_log.header.as_ref(), device_log.device.as_ref());
        let raw_samples = device_log.samples.map(|s| s.sample).unwrap_or_default();
        let time0 = match raw_samples.first() {
            Some(first) => match &first.utc {
                Some(utc) => parse_utc(utc)?,
                None => {
                    return Err(Error::SmlParse(
                        "first sample has no UTC timestamp".to_string(),
                    ))
                }
            },
            None => {
                return Ok(SampleLog {
                    info,
                    ..SampleLog::default()
                })
            }
        };

        let mut samples = Vec::with_capacity(raw_samples.len());
        let mut laps = Vec::new();
        for (idx, raw) in raw_samples.iter().enumerate() {
            let time = match raw.time {
                Some(secs) => sample_time(time0, secs)?,
                None => {
                    warn!("skipping SML sample {} without a Time element", idx);
                    continue;
                }
            };
            match &raw.events {
                Some(events) => {
                    if events.lap.is_some() {
                        laps.push(time);
                    }
                }
                None => samples.push(raw.to_sample(time)),
            }
        }
        debug!(
            "read {} samples and {} lap events from SML data",
            samples.len(),
            laps.len()
        );

        Ok(SampleLog {
            samples,
            laps: dedup_laps(laps)?,
            info,
        })
    }

    fn channel_table(&self) -> ChannelTable {
        ChannelTable::sml()
    }
}

/// Offset the first sample's time by `secs`, rounded to whole milliseconds
fn sample_time(time0: DateTime<Utc>, secs: f64) -> Result<DateTime<Utc>, Error> {
    let millis = (secs * 1000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return Err(Error::SmlParse(format!("invalid sample time: {}", secs)));
    }
    time0
        .checked_add_signed(Duration::milliseconds(millis as i64))
        .ok_or_else(|| Error::SmlParse(format!("sample time out of range: {}", secs)))
}

/// Parse the UTC element, some devices omit the zone designator
fn parse_utc(value: &str) -> Result<DateTime<Utc>, Error> {
    let value = value.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Ok(time.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| Error::SmlParse(format!("invalid UTC time '{}': {}", value, e)))
}

/// Summarise the header and device elements
fn track_info(header: Option<&Header>, device: Option<&Device>) -> TrackInfo {
    let mut info = TrackInfo::default();
    let mut comment = Vec::new();
    if let Some(name) = device.and_then(|d| d.name.as_ref()) {
        comment.push(format!("Device: {}", name));
    }
    if let Some(header) = header {
        // recording start time names the track
        info.name = header.date_time.clone();
        info.description = header.activity.clone();
        if let Some(secs) = header.recovery_time {
            comment.push(format!("Recovery time: {} h", secs as i64 / 3600));
        }
        if let Some(effect) = header.peak_training_effect {
            comment.push(format!("Peak Training Effect: {}", effect));
        }
        if let Some(joules) = header.energy {
            comment.push(format!("Energy: {} kCal", joules as i64 / 4184));
        }
        if let (Some(start), Some(end), Some(duration)) = (
            header.battery_charge_at_start,
            header.battery_charge,
            header.duration,
        ) {
            if duration > 0.0 {
                comment.push(format!(
                    "Battery usage: {:.1} %/hour",
                    100.0 * (start - end) / (duration / 3600.0)
                ));
            }
        }
    }
    if !comment.is_empty() {
        info.comment = Some(comment.join("\n"));
    }
    info
}

// SML XML structures

#[derive(Debug, Deserialize)]
#[serde(rename = "sml")]
struct Sml {
    #[serde(rename = "DeviceLog")]
    device_log: Option<DeviceLog>,
}

#[derive(Debug, Deserialize)]
struct DeviceLog {
    #[serde(rename = "Header")]
    header: Option<Header>,
    #[serde(rename = "Device")]
    device: Option<Device>,
    #[serde(rename = "Samples")]
    samples: Option<Samples>,
}

#[derive(Debug, Deserialize)]
struct Header {
    #[serde(rename = "DateTime")]
    date_time: Option<String>,
    #[serde(rename = "Activity")]
    activity: Option<String>,
    #[serde(rename = "RecoveryTime")]
    recovery_time: Option<f64>,
    #[serde(rename = "PeakTrainingEffect")]
    peak_training_effect: Option<f64>,
    #[serde(rename = "Energy")]
    energy: Option<f64>,
    #[serde(rename = "BatteryChargeAtStart")]
    battery_charge_at_start: Option<f64>,
    #[serde(rename = "BatteryCharge")]
    battery_charge: Option<f64>,
    #[serde(rename = "Duration")]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Device {
    #[serde(rename = "Name")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Samples {
    #[serde(rename = "Sample", default)]
    sample: Vec<RawSample>,
}

#[derive(Debug, Deserialize)]
struct Events {
    #[serde(rename = "Lap")]
    lap: Option<IgnoredAny>,
}

#[derive(Debug, Deserialize)]
struct RawSample {
    #[serde(rename = "UTC")]
    utc: Option<String>,
    #[serde(rename = "Time")]
    time: Option<f64>,
    #[serde(rename = "Events")]
    events: Option<Events>,
    #[serde(rename = "Latitude")]
    latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    longitude: Option<f64>,
    #[serde(rename = "Altitude")]
    altitude: Option<f64>,
    #[serde(rename = "VerticalSpeed")]
    vertical_speed: Option<f64>,
    #[serde(rename = "HR")]
    heart_rate: Option<f64>,
    #[serde(rename = "Cadence")]
    cadence: Option<f64>,
    #[serde(rename = "Temperature")]
    temperature: Option<f64>,
    #[serde(rename = "SeaLevelPressure")]
    sea_level_pressure: Option<f64>,
    #[serde(rename = "Speed")]
    speed: Option<f64>,
    #[serde(rename = "EnergyConsumption")]
    energy_consumption: Option<f64>,
}

impl RawSample {
    fn to_sample(&self, time: DateTime<Utc>) -> Sample {
        let mut sample = Sample::new(time);
        sample.set(Channel::Latitude, self.latitude);
        sample.set(Channel::Longitude, self.longitude);
        sample.set(Channel::Altitude, self.altitude);
        sample.set(Channel::VerticalSpeed, self.vertical_speed);
        sample.set(Channel::HeartRate, self.heart_rate);
        sample.set(Channel::Cadence, self.cadence);
        sample.set(Channel::Temperature, self.temperature);
        sample.set(Channel::SeaLevelPressure, self.sea_level_pressure);
        sample.set(Channel::Speed, self.speed);
        sample.set(Channel::EnergyConsumption, self.energy_consumption);
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_SML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<sml>
  <DeviceLog>
    <Header>
      <DateTime>2017-06-28T08:41:08</DateTime>
      <Activity>Running</Activity>
      <RecoveryTime>36000</RecoveryTime>
      <PeakTrainingEffect>2.5</PeakTrainingEffect>
      <Energy>2092000</Energy>
      <BatteryChargeAtStart>1</BatteryChargeAtStart>
      <BatteryCharge>0.9</BatteryCharge>
      <Duration>3600</Duration>
    </Header>
    <Device>
      <Name>Ambit3 Peak</Name>
    </Device>
    <Samples>
      <Sample>
        <UTC>2017-06-28T08:41:08.000Z</UTC>
        <Time>0</Time>
        <HR>2</HR>
        <Temperature>293.15</Temperature>
      </Sample>
      <Sample>
        <UTC>2017-06-28T08:41:09.500Z</UTC>
        <Time>1.5</Time>
        <Latitude>0.5</Latitude>
        <Longitude>0.1</Longitude>
      </Sample>
      <Sample>
        <UTC>2017-06-28T08:41:10.000Z</UTC>
        <Time>2</Time>
        <Events>
          <Lap>
            <Type>Manual</Type>
          </Lap>
        </Events>
      </Sample>
      <Sample>
        <UTC>2017-06-28T08:41:11.000Z</UTC>
        <Time>3</Time>
        <Events>
          <Pause>
            <State>True</State>
          </Pause>
        </Events>
      </Sample>
      <Sample>
        <UTC>2017-06-28T08:41:12.000Z</UTC>
        <Time>4</Time>
        <Altitude>120</Altitude>
      </Sample>
    </Samples>
  </DeviceLog>
</sml>"#;

    #[test]
    fn test_parse_sml_samples_and_laps() {
        let log = SmlExtractor.extract(SAMPLE_SML.as_bytes()).unwrap();
        let t0 = Utc.ymd(2017, 6, 28).and_hms(8, 41, 8);
        assert_eq!(log.samples.len(), 3);
        assert_eq!(log.samples[0].timestamp(), t0);
        assert_eq!(log.samples[0].get(Channel::HeartRate), Some(2.0));
        assert_eq!(log.samples[0].get(Channel::Temperature), Some(293.15));
        assert_eq!(log.samples[0].get(Channel::Latitude), None);
        assert_eq!(
            log.samples[1].timestamp(),
            t0 + Duration::milliseconds(1500)
        );
        assert_eq!(log.samples[1].get(Channel::Latitude), Some(0.5));
        assert_eq!(log.samples[2].get(Channel::Altitude), Some(120.0));
        assert_eq!(log.laps.as_slice(), &[t0 + Duration::seconds(2)]);
    }

    #[test]
    fn test_parse_sml_header() {
        let log = SmlExtractor.extract(SAMPLE_SML.as_bytes()).unwrap();
        assert_eq!(log.info.name.as_deref(), Some("2017-06-28T08:41:08"));
        assert_eq!(log.info.description.as_deref(), Some("Running"));
        assert_eq!(
            log.info.comment.as_deref(),
            Some(
                "Device: Ambit3 Peak\nRecovery time: 10 h\nPeak Training Effect: 2.5\n\
                 Energy: 500 kCal\nBattery usage: 10.0 %/hour"
            )
        );
    }

    #[test]
    fn test_sml_without_samples() {
        let log = SmlExtractor
            .extract(b"<sml><DeviceLog><Samples></Samples></DeviceLog></sml>")
            .unwrap();
        assert!(log.samples.is_empty());
        assert!(log.laps.is_empty());
    }

    #[test]
    fn test_first_sample_requires_utc() {
        let content = "<sml><DeviceLog><Samples><Sample><Time>0</Time></Sample>\
                       </Samples></DeviceLog></sml>";
        assert!(matches!(
            SmlExtractor.extract(content.as_bytes()),
            Err(Error::SmlParse(_))
        ));
    }

    fn samples_doc(samples: &str) -> String {
        format!(
            "<sml><DeviceLog><Samples>\
             <Sample><UTC>2017-06-28T08:41:08Z</UTC><Time>0</Time><HR>2</HR></Sample>\
             {}</Samples></DeviceLog></sml>",
            samples
        )
    }

    fn lap_at(time: &str) -> String {
        format!(
            "<Sample><Time>{}</Time><Events><Lap><Type>Manual</Type></Lap></Events></Sample>",
            time
        )
    }

    #[test]
    fn test_out_of_range_time_is_an_error() {
        for time in &["1e13", "inf", "-1e300"] {
            let content = samples_doc(&format!("<Sample><Time>{}</Time><HR>2</HR></Sample>", time));
            assert!(matches!(
                SmlExtractor.extract(content.as_bytes()),
                Err(Error::SmlParse(_))
            ));
        }
    }

    #[test]
    fn test_repeated_lap_events_merge() {
        let content = samples_doc(&format!("{}{}{}", lap_at("5"), lap_at("5"), lap_at("9")));
        let log = SmlExtractor.extract(content.as_bytes()).unwrap();
        let t0 = Utc.ymd(2017, 6, 28).and_hms(8, 41, 8);
        assert_eq!(
            log.laps.as_slice(),
            &[t0 + Duration::seconds(5), t0 + Duration::seconds(9)]
        );
    }

    #[test]
    fn test_backwards_lap_events_are_malformed() {
        let content = samples_doc(&format!("{}{}", lap_at("9"), lap_at("5")));
        assert!(matches!(
            SmlExtractor.extract(content.as_bytes()),
            Err(Error::MalformedMarkerOrdering(_))
        ));
    }

    #[test]
    fn test_utc_without_zone() {
        let time = parse_utc("2017-06-28T08:41:08.250").unwrap();
        assert_eq!(
            time,
            Utc.ymd(2017, 6, 28).and_hms_milli(8, 41, 8, 250)
        );
    }
}
