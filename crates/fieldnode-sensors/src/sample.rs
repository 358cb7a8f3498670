//! Sensor samples - the latest known reading per source

use std::collections::BTreeMap;

use fieldnode_core::MonotonicTime;

pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const SATELLITES: &str = "satellites";
pub const HDOP: &str = "hdop";
pub const ALTITUDE: &str = "altitude";
pub const HEADING: &str = "heading";
pub const SPEED: &str = "speed";
pub const TEMPERATURE: &str = "temperature";
pub const PRESSURE: &str = "pressure";

const POSITION_FIELDS: &[&str] = &[LATITUDE, LONGITUDE, SATELLITES, HDOP, ALTITUDE, HEADING, SPEED];
const ATMOSPHERE_FIELDS: &[&str] = &[TEMPERATURE, PRESSURE];

/// Sensor source
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceTag {
    /// GNSS receiver: fix, satellites, dilution, course
    Position,
    /// Barometric transducer: temperature, pressure
    Atmosphere,
}

impl SourceTag {
    /// Telemetry fields this source reports
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            SourceTag::Position => POSITION_FIELDS,
            SourceTag::Atmosphere => ATMOSPHERE_FIELDS,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SourceTag::Position => "position",
            SourceTag::Atmosphere => "atmosphere",
        }
    }
}

/// One reading as reported by a driver
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reading {
    /// Named numeric fields
    pub fields: BTreeMap<String, f64>,
    /// UTC wall-clock time, if the source has one (GNSS)
    pub utc: Option<String>,
}

impl Reading {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: f64) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn with_utc(mut self, utc: impl Into<String>) -> Self {
        self.utc = Some(utc.into());
        self
    }
}

/// Latest reading of one source
///
/// Created empty and invalid at startup; replaced whenever the source
/// reports a new valid reading; never removed while the node runs.
#[derive(Clone, Debug, PartialEq)]
pub struct SensorSample {
    pub source: SourceTag,
    pub fields: BTreeMap<String, f64>,
    pub valid: bool,
    /// Monotonic time of the last update, `None` until the first one
    pub updated_at: Option<MonotonicTime>,
    pub utc: Option<String>,
}

impl SensorSample {
    /// Empty, invalid sample
    pub fn empty(source: SourceTag) -> Self {
        SensorSample {
            source,
            fields: BTreeMap::new(),
            valid: false,
            updated_at: None,
            utc: None,
        }
    }

    /// Snapshot of a valid reading taken at `now`
    pub fn from_reading(source: SourceTag, reading: Reading, now: MonotonicTime) -> Self {
        SensorSample {
            source,
            fields: reading.fields,
            valid: true,
            updated_at: Some(now),
            utc: reading.utc,
        }
    }

    pub fn field(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied()
    }
}

/// The node's set of samples, one per registered source
#[derive(Clone, Debug, Default)]
pub struct SensorSet {
    samples: BTreeMap<SourceTag, SensorSample>,
}

impl SensorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding an empty sample for each source
    pub fn with_sources(sources: impl IntoIterator<Item = SourceTag>) -> Self {
        let samples = sources
            .into_iter()
            .map(|s| (s, SensorSample::empty(s)))
            .collect();
        SensorSet { samples }
    }

    /// Add an empty sample for a source if it has none
    pub fn track(&mut self, source: SourceTag) {
        self.samples
            .entry(source)
            .or_insert_with(|| SensorSample::empty(source));
    }

    /// Replace the sample of its source
    pub fn store(&mut self, sample: SensorSample) {
        self.samples.insert(sample.source, sample);
    }

    pub fn get(&self, source: SourceTag) -> Option<&SensorSample> {
        self.samples.get(&source)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SensorSample> {
        self.samples.values()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// UTC string of the most recently updated sample that carries one
    pub fn latest_utc(&self) -> Option<&str> {
        self.samples
            .values()
            .filter(|s| s.utc.is_some())
            .max_by_key(|s| s.updated_at)
            .and_then(|s| s.utc.as_deref())
    }
}
