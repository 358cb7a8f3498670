//! Telemetry payload assembly

use fieldnode_core::Payload;
use fieldnode_sensors::SensorSet;

/// Value reported for a declared field with no reading yet
pub const NO_READING: f64 = -99.0;

/// Build a flat telemetry payload from the current samples
///
/// Every declared field of every tracked source is present: the last known
/// value, stale or not, or [`NO_READING`] before the first valid sample.
/// Extra fields a driver reported are carried as well.
pub fn telemetry_payload(samples: &SensorSet) -> Payload {
    let mut payload = Payload::new();
    for sample in samples.iter() {
        for &field in sample.source.fields() {
            payload.insert(field, sample.field(field).unwrap_or(NO_READING));
        }
        for (name, &value) in &sample.fields {
            if !payload.contains_key(name) {
                payload.insert(name.clone(), value);
            }
        }
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldnode_core::MonotonicTime;
    use fieldnode_sensors::{
        Reading, SensorSample, SourceTag, LATITUDE, LONGITUDE, PRESSURE, SPEED, TEMPERATURE,
    };

    #[test]
    fn test_sentinel_before_first_sample() {
        let samples = SensorSet::with_sources([SourceTag::Position, SourceTag::Atmosphere]);
        let payload = telemetry_payload(&samples);

        assert_eq!(payload.len(), 9);
        assert_eq!(payload.get_f64(LATITUDE), Some(NO_READING));
        assert_eq!(payload.get_f64(PRESSURE), Some(NO_READING));
    }

    #[test]
    fn test_known_values_and_partial_readings() {
        let mut samples = SensorSet::with_sources([SourceTag::Position, SourceTag::Atmosphere]);
        samples.store(SensorSample::from_reading(
            SourceTag::Position,
            Reading::new()
                .with(LATITUDE, 47.61)
                .with(LONGITUDE, -122.33)
                .with("fix_quality", 1.0),
            MonotonicTime::from_millis(250),
        ));
        samples.store(SensorSample::from_reading(
            SourceTag::Atmosphere,
            Reading::new().with(TEMPERATURE, 18.5),
            MonotonicTime::from_millis(250),
        ));

        let payload = telemetry_payload(&samples);
        assert_eq!(payload.get_f64(LATITUDE), Some(47.61));
        assert_eq!(payload.get_f64(LONGITUDE), Some(-122.33));
        assert_eq!(payload.get_f64(SPEED), Some(NO_READING));
        assert_eq!(payload.get_f64(TEMPERATURE), Some(18.5));
        assert_eq!(payload.get_f64(PRESSURE), Some(NO_READING));
        assert_eq!(payload.get_f64("fix_quality"), Some(1.0));
    }

    #[test]
    fn test_untracked_sources_absent() {
        let samples = SensorSet::with_sources([SourceTag::Atmosphere]);
        let payload = telemetry_payload(&samples);
        assert!(!payload.contains_key(LATITUDE));
        assert_eq!(payload.len(), 2);
    }
}
