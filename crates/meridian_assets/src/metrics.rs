//! Asset outcome metrics.
//!
//! The coordinator reports every store outcome and every download
//! completion to an optional [`MetricsSink`].

use std::sync::Arc;

use meridian_shared::{AssetId, AssetType};
use parking_lot::Mutex;

/// Outcome category reported to a metrics sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricResult {
    /// Transfer succeeded.
    Okay,
    /// Refused an empty payload.
    ZeroSize,
    /// No upstream host configured.
    NoUpstream,
    /// Local cache disagreed about the stored size.
    StorageCorruption,
    /// Any other failure; the event carries the status code.
    Failed,
}

/// One reported outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricEvent {
    /// Asset id.
    pub id: AssetId,
    /// Asset type.
    pub asset_type: AssetType,
    /// Payload size in bytes, zero when unknown.
    pub size: usize,
    /// Outcome category.
    pub result: MetricResult,
    /// Integer status code, `0` on success.
    pub status: i32,
    /// Short free-form context.
    pub message: &'static str,
}

/// Receiver of asset outcome events.
pub trait MetricsSink {
    /// Records one event.
    fn report(&self, event: MetricEvent);
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingMetrics {
    events: Arc<Mutex<Vec<MetricEvent>>>,
}

impl RecordingMetrics {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events so far.
    #[must_use]
    pub fn events(&self) -> Vec<MetricEvent> {
        self.events.lock().clone()
    }

    /// Number of events with the given result.
    #[must_use]
    pub fn count(&self, result: MetricResult) -> usize {
        self.events.lock().iter().filter(|e| e.result == result).count()
    }
}

impl MetricsSink for RecordingMetrics {
    fn report(&self, event: MetricEvent) {
        self.events.lock().push(event);
    }
}
