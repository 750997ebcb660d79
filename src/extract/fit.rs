//! Read FIT activity files
use super::{dedup_laps, SampleExtractor, SampleLog};
use crate::sample::{Channel, Sample};
use crate::segment::ChannelTable;
use crate::track::TrackInfo;
use crate::Error;
use chrono::Utc;
use fitparser::profile::MesgNum;
use fitparser::{FitDataRecord, Value};
use log::{debug, trace};

/// Extractor for binary FIT files, uses record and lap messages
#[derive(Clone, Copy, Debug, Default)]
pub struct FitExtractor;

impl SampleExtractor for FitExtractor {
    fn extract(&self, content: &[u8]) -> Result<SampleLog, Error> {
        let mut reader = content;
        let messages = fitparser::from_reader(&mut reader)?;
        trace!("parsed {} FIT messages", messages.len());
        sample_log(&messages)
    }

    fn channel_table(&self) -> ChannelTable {
        ChannelTable::fit()
    }
}

/// Collect samples, laps and track info from decoded FIT messages
fn sample_log(messages: &[FitDataRecord]) -> Result<SampleLog, Error> {
    let mut info = TrackInfo::default();
    let mut samples = Vec::new();
    let mut laps = Vec::new();
    for mesg in messages {
        match mesg.kind() {
            MesgNum::FileId => {
                if let Some(Value::Timestamp(ts)) = field_value(mesg, "time_created") {
                    info.name = Some(ts.with_timezone(&Utc).to_rfc3339());
                }
            }
            MesgNum::Session => {
                if let Some(Value::String(sport)) = field_value(mesg, "sport") {
                    info.description = Some(sport.clone());
                }
            }
            MesgNum::Lap => {
                // a lap message is written when the lap ends
                if let Some(Value::Timestamp(ts)) = field_value(mesg, "timestamp") {
                    laps.push(ts.with_timezone(&Utc));
                }
            }
            MesgNum::Record => {
                if let Some(sample) = record_to_sample(mesg) {
                    samples.push(sample);
                }
            }
            _ => {}
        }
    }
    debug!(
        "read {} samples and {} laps from FIT data",
        samples.len(),
        laps.len()
    );

    Ok(SampleLog {
        samples,
        laps: dedup_laps(laps)?,
        info,
    })
}

fn field_value<'a>(mesg: &'a FitDataRecord, name: &str) -> Option<&'a Value> {
    mesg.fields()
        .iter()
        .find(|f| f.name() == name)
        .map(|f| f.value())
}

/// Convert a record message into a sample, records without a timestamp are dropped
fn record_to_sample(mesg: &FitDataRecord) -> Option<Sample> {
    let timestamp = match field_value(mesg, "timestamp") {
        Some(Value::Timestamp(ts)) => ts.with_timezone(&Utc),
        _ => return None,
    };
    let mut sample = Sample::new(timestamp);
    for field in mesg.fields() {
        let channel = match field.name() {
            "position_lat" => Channel::Latitude,
            "position_long" => Channel::Longitude,
            "altitude" | "enhanced_altitude" => Channel::Altitude,
            "vertical_speed" => Channel::VerticalSpeed,
            "heart_rate" => Channel::HeartRate,
            "cadence" => Channel::Cadence,
            "temperature" => Channel::Temperature,
            "speed" | "enhanced_speed" => Channel::Speed,
            _ => continue,
        };
        if let Some(value) = value_to_f64(field.value()) {
            sample.set(channel, Some(value));
        }
    }
    Some(sample)
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Byte(v) => Some(*v as f64),
        Value::SInt8(v) => Some(*v as f64),
        Value::UInt8(v) => Some(*v as f64),
        Value::UInt8z(v) => Some(*v as f64),
        Value::SInt16(v) => Some(*v as f64),
        Value::UInt16(v) => Some(*v as f64),
        Value::UInt16z(v) => Some(*v as f64),
        Value::SInt32(v) => Some(*v as f64),
        Value::UInt32(v) => Some(*v as f64),
        Value::UInt32z(v) => Some(*v as f64),
        Value::SInt64(v) => Some(*v as f64),
        Value::UInt64(v) => Some(*v as f64),
        Value::UInt64z(v) => Some(*v as f64),
        Value::Float32(v) => Some(*v as f64),
        Value::Float64(v) => Some(*v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Local, TimeZone};
    use fitparser::FitDataField;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_498_639_268 + secs, 0).unwrap()
    }

    fn timestamp(secs: i64) -> Value {
        Value::Timestamp(at(secs).with_timezone(&Local))
    }

    fn message(kind: MesgNum, fields: Vec<(&str, Value)>) -> FitDataRecord {
        let mut mesg = FitDataRecord::new(kind);
        for (number, (name, value)) in fields.into_iter().enumerate() {
            mesg.push(FitDataField::new(
                name.to_string(),
                number as u8,
                value,
                String::new(),
            ));
        }
        mesg
    }

    #[test]
    fn test_record_fields_become_channels() {
        let record = message(
            MesgNum::Record,
            vec![
                ("timestamp", timestamp(0)),
                ("position_lat", Value::SInt32(536870912)),
                ("position_long", Value::SInt32(-268435456)),
                ("enhanced_altitude", Value::Float64(120.5)),
                ("heart_rate", Value::UInt8(150)),
                ("enhanced_speed", Value::Float64(3.2)),
                ("temperature", Value::SInt8(-4)),
                ("distance", Value::Float64(1000.0)),
            ],
        );
        let sample = record_to_sample(&record).unwrap();
        assert_eq!(sample.timestamp(), at(0));
        assert_eq!(sample.get(Channel::Latitude), Some(536870912.0));
        assert_eq!(sample.get(Channel::Longitude), Some(-268435456.0));
        assert_eq!(sample.get(Channel::Altitude), Some(120.5));
        assert_eq!(sample.get(Channel::HeartRate), Some(150.0));
        assert_eq!(sample.get(Channel::Speed), Some(3.2));
        assert_eq!(sample.get(Channel::Temperature), Some(-4.0));
        assert_eq!(sample.get(Channel::Cadence), None);
    }

    #[test]
    fn test_record_without_timestamp_dropped() {
        let record = message(MesgNum::Record, vec![("heart_rate", Value::UInt8(150))]);
        assert!(record_to_sample(&record).is_none());
    }

    #[test]
    fn test_sample_log_from_messages() {
        let messages = vec![
            message(MesgNum::FileId, vec![("time_created", timestamp(0))]),
            message(
                MesgNum::Record,
                vec![("timestamp", timestamp(0)), ("heart_rate", Value::UInt8(120))],
            ),
            message(
                MesgNum::Record,
                vec![("timestamp", timestamp(5)), ("cadence", Value::UInt8(80))],
            ),
            message(MesgNum::Record, vec![("heart_rate", Value::UInt8(130))]),
            message(MesgNum::Lap, vec![("timestamp", timestamp(5))]),
            message(MesgNum::Lap, vec![("timestamp", timestamp(5))]),
            message(MesgNum::Lap, vec![("timestamp", timestamp(9))]),
            message(
                MesgNum::Session,
                vec![("sport", Value::String("running".to_string()))],
            ),
        ];
        let log = sample_log(&messages).unwrap();

        assert_eq!(log.info.name.as_deref(), Some("2017-06-28T08:41:08+00:00"));
        assert_eq!(log.info.description.as_deref(), Some("running"));
        assert_eq!(log.samples.len(), 2);
        assert_eq!(log.samples[1].timestamp(), at(0) + Duration::seconds(5));
        assert_eq!(log.samples[1].get(Channel::Cadence), Some(80.0));
        assert_eq!(log.laps.as_slice(), &[at(5), at(9)]);
    }

    #[test]
    fn test_backwards_laps_are_malformed() {
        let messages = vec![
            message(MesgNum::Lap, vec![("timestamp", timestamp(9))]),
            message(MesgNum::Lap, vec![("timestamp", timestamp(5))]),
        ];
        assert!(matches!(
            sample_log(&messages),
            Err(Error::MalformedMarkerOrdering(_))
        ));
    }

    #[test]
    fn test_value_to_f64() {
        assert_eq!(value_to_f64(&Value::UInt8(150)), Some(150.0));
        assert_eq!(value_to_f64(&Value::SInt32(-1073741824)), Some(-1073741824.0));
        assert_eq!(value_to_f64(&Value::String("run".to_string())), None);
    }
}
