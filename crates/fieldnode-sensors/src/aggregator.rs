//! Sensor aggregator
//!
//! Owns the registered drivers and turns their readings into
//! [`SensorSample`]s. Samples are only produced from valid, updated
//! readings; an invalid or idle driver leaves the stored sample alone.

use std::collections::BTreeMap;

use fieldnode_core::MonotonicTime;

use crate::{SensorDriver, SensorSample, SourceTag};

/// Registered drivers, one per source
#[derive(Default)]
pub struct SensorAggregator {
    drivers: BTreeMap<SourceTag, Box<dyn SensorDriver>>,
}

impl SensorAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver under its source tag, replacing any previous one
    pub fn register(&mut self, driver: Box<dyn SensorDriver>) {
        let source = driver.source();
        if self.drivers.insert(source, driver).is_some() {
            tracing::warn!(source = source.name(), "replaced sensor driver");
        }
    }

    /// Registered sources, in tag order
    pub fn sources(&self) -> impl Iterator<Item = SourceTag> + '_ {
        self.drivers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Let a driver pull pending raw input. Unknown sources ingest nothing.
    pub fn ingest(&mut self, source: SourceTag) -> usize {
        match self.drivers.get_mut(&source) {
            Some(driver) => driver.ingest(),
            None => 0,
        }
    }

    /// Snapshot the driver's reading if it is valid and changed since the
    /// last snapshot
    pub fn sample_if_updated(
        &mut self,
        source: SourceTag,
        now: MonotonicTime,
    ) -> Option<SensorSample> {
        let driver = self.drivers.get_mut(&source)?;
        if !driver.is_valid() {
            tracing::trace!(source = source.name(), "no valid reading");
            return None;
        }
        if !driver.is_updated() {
            return None;
        }
        let reading = driver.take_reading();
        Some(SensorSample::from_reading(source, reading, now))
    }
}

impl std::fmt::Debug for SensorAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorAggregator")
            .field("sources", &self.drivers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{QueuedDriver, Reading, HDOP, LATITUDE, TEMPERATURE};

    fn aggregator() -> (SensorAggregator, crate::ReadingSender, crate::ReadingSender) {
        let (pos, pos_tx) = QueuedDriver::new(SourceTag::Position);
        let (atm, atm_tx) = QueuedDriver::new(SourceTag::Atmosphere);
        let mut agg = SensorAggregator::new();
        agg.register(Box::new(atm));
        agg.register(Box::new(pos));
        (agg, pos_tx, atm_tx)
    }

    #[test]
    fn test_sources_in_tag_order() {
        let (agg, _p, _a) = aggregator();
        let sources: Vec<_> = agg.sources().collect();
        assert_eq!(sources, vec![SourceTag::Position, SourceTag::Atmosphere]);
        assert_eq!(agg.len(), 2);
    }

    #[test]
    fn test_sample_requires_valid_and_updated() {
        let (mut agg, pos_tx, _a) = aggregator();
        let now = MonotonicTime::from_millis(250);

        assert!(agg.sample_if_updated(SourceTag::Position, now).is_none());

        pos_tx.report(Reading::new().with(LATITUDE, 10.0).with(HDOP, 0.9));
        assert_eq!(agg.ingest(SourceTag::Position), 1);

        let sample = agg.sample_if_updated(SourceTag::Position, now).unwrap();
        assert!(sample.valid);
        assert_eq!(sample.updated_at, Some(now));
        assert_eq!(sample.field(HDOP), Some(0.9));

        // Nothing new since the last snapshot
        assert!(agg.sample_if_updated(SourceTag::Position, now).is_none());
    }

    #[test]
    fn test_invalid_driver_yields_nothing() {
        let (mut agg, _p, atm_tx) = aggregator();
        atm_tx.report(Reading::new().with(TEMPERATURE, 21.5));
        atm_tx.invalidate();
        agg.ingest(SourceTag::Atmosphere);

        assert!(agg
            .sample_if_updated(SourceTag::Atmosphere, MonotonicTime::ZERO)
            .is_none());
    }

    #[test]
    fn test_unregistered_source() {
        let mut agg = SensorAggregator::new();
        assert!(agg.is_empty());
        assert_eq!(agg.ingest(SourceTag::Position), 0);
        assert!(agg
            .sample_if_updated(SourceTag::Position, MonotonicTime::ZERO)
            .is_none());
    }
}
