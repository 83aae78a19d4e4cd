//! Shared metric snapshot type definitions
//!
//! This crate contains the point-in-time metric readings exchanged between
//! a metrics registry and the document encoder: counter/histogram/meter/
//! timer snapshots, fallible gauge readings, the `Metric` sum type over all
//! five kinds, and the `Timestamped` wrapper that fixes a capture time and
//! name per reporting cycle.

use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Time granularity used to express rates and durations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Lowercase plural name, e.g. `"milliseconds"`
    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "nanoseconds",
            TimeUnit::Microseconds => "microseconds",
            TimeUnit::Milliseconds => "milliseconds",
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
        }
    }

    /// Nanoseconds in one unit
    pub fn nanos_per_unit(self) -> f64 {
        match self {
            TimeUnit::Nanoseconds => 1.0,
            TimeUnit::Microseconds => 1e3,
            TimeUnit::Milliseconds => 1e6,
            TimeUnit::Seconds => 1e9,
            TimeUnit::Minutes => 60.0 * 1e9,
            TimeUnit::Hours => 3_600.0 * 1e9,
            TimeUnit::Days => 86_400.0 * 1e9,
        }
    }

    /// Seconds in one unit
    pub fn seconds_per_unit(self) -> f64 {
        self.nanos_per_unit() / 1e9
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Statistical summary of a distribution at a single point in time
///
/// Values are whatever the producing reservoir computed; no interpolation
/// or scaling happens here. For timers, `min`/`max` and the percentiles are
/// raw nanosecond readings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    pub stddev: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
    pub p98: f64,
    pub p99: f64,
    pub p999: f64,
}

/// Counter reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub count: i64,
}

/// Histogram reading: event count plus distribution summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramSnapshot {
    pub count: i64,
    pub snapshot: Snapshot,
}

/// Meter reading; rates are events per second
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeterSnapshot {
    pub count: i64,
    pub m1_rate: f64,
    pub m5_rate: f64,
    pub m15_rate: f64,
    pub mean_rate: f64,
}

/// Timer reading: call count, nanosecond duration distribution, and
/// per-second call rates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub count: i64,
    pub snapshot: Snapshot,
    pub m1_rate: f64,
    pub m5_rate: f64,
    pub m15_rate: f64,
    pub mean_rate: f64,
}

/// Failure raised by caller-supplied gauge code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct GaugeError {
    message: String,
}

impl GaugeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

type GaugeRead = Box<dyn Fn() -> Result<serde_json::Value, GaugeError> + Send + Sync>;

/// A gauge reading
///
/// Gauges run caller-supplied code, so reading one may fail; the failure is
/// carried as a value rather than a panic, and one bad gauge does not abort
/// the reporting cycle consuming it.
pub struct GaugeSnapshot {
    read: GaugeRead,
}

impl GaugeSnapshot {
    /// Gauge backed by a read closure, invoked on every [`value`](Self::value) call
    pub fn new<F>(read: F) -> Self
    where
        F: Fn() -> Result<serde_json::Value, GaugeError> + Send + Sync + 'static,
    {
        Self {
            read: Box::new(read),
        }
    }

    /// Gauge over a value captured eagerly
    pub fn of(value: impl Into<serde_json::Value>) -> Self {
        let value = value.into();
        Self::new(move || Ok(value.clone()))
    }

    pub fn value(&self) -> Result<serde_json::Value, GaugeError> {
        (self.read)()
    }
}

impl fmt::Debug for GaugeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Ok(value) => write!(f, "GaugeSnapshot({value})"),
            Err(err) => write!(f, "GaugeSnapshot(<{err}>)"),
        }
    }
}

/// A reading of any metric kind
#[derive(Debug)]
pub enum Metric {
    Gauge(GaugeSnapshot),
    Counter(CounterSnapshot),
    Histogram(HistogramSnapshot),
    Meter(MeterSnapshot),
    Timer(TimerSnapshot),
}

impl From<GaugeSnapshot> for Metric {
    fn from(value: GaugeSnapshot) -> Self {
        Metric::Gauge(value)
    }
}

impl From<CounterSnapshot> for Metric {
    fn from(value: CounterSnapshot) -> Self {
        Metric::Counter(value)
    }
}

impl From<HistogramSnapshot> for Metric {
    fn from(value: HistogramSnapshot) -> Self {
        Metric::Histogram(value)
    }
}

impl From<MeterSnapshot> for Metric {
    fn from(value: MeterSnapshot) -> Self {
        Metric::Meter(value)
    }
}

impl From<TimerSnapshot> for Metric {
    fn from(value: TimerSnapshot) -> Self {
        Metric::Timer(value)
    }
}

/// A metric reading paired with its name and capture time
///
/// The timestamp is fixed when the wrapper is created; later mutation of
/// the live metric does not move it.
#[derive(Debug, Clone)]
pub struct Timestamped<T> {
    name: String,
    timestamp: DateTime<Utc>,
    value: T,
}

impl<T> Timestamped<T> {
    pub fn new(name: impl Into<String>, timestamp: DateTime<Utc>, value: T) -> Self {
        Self {
            name: name.into(),
            timestamp,
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn value(&self) -> &T {
        &self.value
    }
}
