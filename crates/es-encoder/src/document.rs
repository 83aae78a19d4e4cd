//! Per-kind document serialization
//!
//! Every metric document carries the same envelope (metric name, capture
//! time under the configured field name), then the fields of its kind,
//! then the configured static fields, then whatever the name-parts
//! extractors contribute. The kind dispatch is a single `match` over
//! [`Metric`]; the envelope and merge steps are shared.

use std::io;
use std::sync::Arc;

use metric_types::GaugeSnapshot;
use metric_types::HistogramSnapshot;
use metric_types::MeterSnapshot;
use metric_types::Metric;
use metric_types::Timestamped;
use metric_types::TimerSnapshot;
use serde::ser::SerializeMap;
use serde::Serialize;
use serde::Serializer;
use tracing::warn;

use crate::config::EncoderConfig;
use crate::units;
use crate::EncodeError;

/// One-time wiring of the per-kind serializers
///
/// Construction precomputes the unit factors and labels every serialize
/// call needs; the configuration is shared read-only from then on. One
/// instance serves all metrics for the process lifetime.
pub struct DocumentEncoder {
    config: Arc<EncoderConfig>,
    rate_factor: f64,
    duration_factor: f64,
    event_rate_units: String,
    call_rate_units: String,
    duration_units: &'static str,
}

impl DocumentEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        let rate_unit = config.rate_unit;
        let duration_unit = config.duration_unit;
        Self {
            rate_factor: units::rate_factor(rate_unit),
            duration_factor: units::duration_factor(duration_unit),
            event_rate_units: units::rate_unit_label(rate_unit, "events"),
            call_rate_units: units::rate_unit_label(rate_unit, "calls"),
            duration_units: units::duration_unit_label(duration_unit),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Serializable view of one metric; render it with any serde JSON
    /// serializer
    pub fn document<'a>(&'a self, metric: &'a Timestamped<Metric>) -> Document<'a> {
        Document {
            encoder: self,
            metric,
        }
    }

    /// Renders one metric as a compact JSON object
    pub fn encode(&self, metric: &Timestamped<Metric>) -> Result<String, EncodeError> {
        Ok(serde_json::to_string(&self.document(metric))?)
    }

    /// Streams one metric document into `writer` without buffering it
    pub fn encode_to<W: io::Write>(
        &self,
        writer: W,
        metric: &Timestamped<Metric>,
    ) -> Result<(), EncodeError> {
        Ok(serde_json::to_writer(writer, &self.document(metric))?)
    }

    fn write_meter<M: SerializeMap>(
        &self,
        map: &mut M,
        meter: &MeterSnapshot,
    ) -> Result<(), M::Error> {
        map.serialize_entry("count", &meter.count)?;
        map.serialize_entry("m1_rate", &(meter.m1_rate * self.rate_factor))?;
        map.serialize_entry("m5_rate", &(meter.m5_rate * self.rate_factor))?;
        map.serialize_entry("m15_rate", &(meter.m15_rate * self.rate_factor))?;
        map.serialize_entry("mean_rate", &(meter.mean_rate * self.rate_factor))?;
        map.serialize_entry("units", &self.event_rate_units)
    }

    fn write_timer<M: SerializeMap>(
        &self,
        map: &mut M,
        timer: &TimerSnapshot,
    ) -> Result<(), M::Error> {
        let snapshot = &timer.snapshot;
        let factor = self.duration_factor;
        map.serialize_entry("count", &timer.count)?;
        map.serialize_entry("max", &(snapshot.max as f64 * factor))?;
        map.serialize_entry("mean", &(snapshot.mean * factor))?;
        map.serialize_entry("min", &(snapshot.min as f64 * factor))?;
        map.serialize_entry("p50", &(snapshot.p50 * factor))?;
        map.serialize_entry("p75", &(snapshot.p75 * factor))?;
        map.serialize_entry("p95", &(snapshot.p95 * factor))?;
        map.serialize_entry("p98", &(snapshot.p98 * factor))?;
        map.serialize_entry("p99", &(snapshot.p99 * factor))?;
        map.serialize_entry("p999", &(snapshot.p999 * factor))?;
        map.serialize_entry("stddev", &(snapshot.stddev * factor))?;
        map.serialize_entry("m1_rate", &(timer.m1_rate * self.rate_factor))?;
        map.serialize_entry("m5_rate", &(timer.m5_rate * self.rate_factor))?;
        map.serialize_entry("m15_rate", &(timer.m15_rate * self.rate_factor))?;
        map.serialize_entry("mean_rate", &(timer.mean_rate * self.rate_factor))?;
        map.serialize_entry("duration_units", self.duration_units)?;
        map.serialize_entry("rate_units", &self.call_rate_units)
    }
}

/// Borrowing adapter that serializes one metric as its document
pub struct Document<'a> {
    encoder: &'a DocumentEncoder,
    metric: &'a Timestamped<Metric>,
}

impl Serialize for Document<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let encoder = self.encoder;
        let config = encoder.config.as_ref();
        let metric = self.metric;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", metric.name())?;
        map.serialize_entry(config.timestamp_field.as_str(), &metric.timestamp())?;

        match metric.value() {
            Metric::Gauge(gauge) => write_gauge(&mut map, metric.name(), gauge)?,
            Metric::Counter(counter) => map.serialize_entry("count", &counter.count)?,
            Metric::Histogram(histogram) => write_histogram(&mut map, histogram)?,
            Metric::Meter(meter) => encoder.write_meter(&mut map, meter)?,
            Metric::Timer(timer) => encoder.write_timer(&mut map, timer)?,
        }

        for (key, value) in &config.additional_fields {
            map.serialize_entry(key, value)?;
        }
        for extractor in &config.extractors {
            if let Some(parts) = extractor.extract(metric.name()) {
                for (key, value) in &parts {
                    map.serialize_entry(key, value)?;
                }
            }
        }

        map.end()
    }
}

fn write_gauge<M: SerializeMap>(
    map: &mut M,
    name: &str,
    gauge: &GaugeSnapshot,
) -> Result<(), M::Error> {
    match gauge.value() {
        Ok(value) => map.serialize_entry("value", &value),
        Err(err) => {
            // one bad gauge must not abort the whole reporting cycle
            warn!(metric = name, error = %err, "gauge read failed");
            map.serialize_entry("error", &err.to_string())
        }
    }
}

fn write_histogram<M: SerializeMap>(
    map: &mut M,
    histogram: &HistogramSnapshot,
) -> Result<(), M::Error> {
    let snapshot = &histogram.snapshot;
    map.serialize_entry("count", &histogram.count)?;
    map.serialize_entry("max", &snapshot.max)?;
    map.serialize_entry("mean", &snapshot.mean)?;
    map.serialize_entry("min", &snapshot.min)?;
    map.serialize_entry("p50", &snapshot.p50)?;
    map.serialize_entry("p75", &snapshot.p75)?;
    map.serialize_entry("p95", &snapshot.p95)?;
    map.serialize_entry("p98", &snapshot.p98)?;
    map.serialize_entry("p99", &snapshot.p99)?;
    map.serialize_entry("p999", &snapshot.p999)?;
    map.serialize_entry("stddev", &snapshot.stddev)
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use chrono::Utc;
    use metric_types::CounterSnapshot;
    use metric_types::GaugeError;
    use metric_types::Snapshot;
    use metric_types::TimeUnit;
    use serde_json::json;
    use serde_json::Value;
    use similar_asserts::assert_eq;
    use test_log::test;

    use super::*;
    use crate::extract::DottedNameExtractor;
    use crate::extract::Memoized;
    use crate::extract::NamePartsExtractor;

    fn capture_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn encoder() -> DocumentEncoder {
        DocumentEncoder::new(EncoderConfig::default())
    }

    fn wrap(name: &str, metric: impl Into<Metric>) -> Timestamped<Metric> {
        Timestamped::new(name, capture_time(), metric.into())
    }

    fn parse(doc: &str) -> Value {
        serde_json::from_str(doc).expect("encoder must emit valid JSON")
    }

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            min: 1_000_000,
            max: 5_000_000,
            mean: 2_500_000.0,
            stddev: 500_000.0,
            p50: 2_000_000.0,
            p75: 3_000_000.0,
            p95: 4_000_000.0,
            p98: 4_500_000.0,
            p99: 4_800_000.0,
            p999: 4_990_000.0,
        }
    }

    fn sample_timer() -> TimerSnapshot {
        TimerSnapshot {
            count: 3,
            snapshot: sample_snapshot(),
            m1_rate: 0.5,
            m5_rate: 0.4,
            m15_rate: 0.3,
            mean_rate: 0.45,
        }
    }

    #[test]
    fn counter_document_renders_exactly() {
        let doc = encoder()
            .encode(&wrap("api.requests", CounterSnapshot { count: 7 }))
            .unwrap();
        assert_eq!(
            doc,
            r#"{"name":"api.requests","@timestamp":"2024-05-01T12:00:00Z","count":7}"#,
        );
    }

    #[test]
    fn envelope_fields_lead_every_document() {
        let metrics: Vec<Metric> = vec![
            GaugeSnapshot::of(1).into(),
            CounterSnapshot { count: 1 }.into(),
            HistogramSnapshot {
                count: 1,
                snapshot: sample_snapshot(),
            }
            .into(),
            MeterSnapshot::default().into(),
            sample_timer().into(),
        ];

        let encoder = DocumentEncoder::new(
            EncoderConfig::builder().timestamp_field("reported_at").build(),
        );
        for metric in metrics {
            let doc = encoder
                .encode(&Timestamped::new("m", capture_time(), metric))
                .unwrap();
            let parsed = parse(&doc);
            let keys: Vec<_> = parsed.as_object().unwrap().keys().cloned().collect();
            assert_eq!(keys[0], "name");
            assert_eq!(keys[1], "reported_at");
        }
    }

    #[test]
    fn gauge_value_written_when_read_succeeds() {
        let doc = encoder()
            .encode(&wrap("queue.depth", GaugeSnapshot::of(42)))
            .unwrap();
        let parsed = parse(&doc);
        assert_eq!(parsed["value"], json!(42));
        assert!(parsed.get("error").is_none());
    }

    #[test]
    fn failing_gauge_becomes_an_error_field() {
        let gauge = GaugeSnapshot::new(|| Err(GaugeError::new("connection pool exhausted")));
        let doc = encoder().encode(&wrap("pool.free", gauge)).unwrap();
        let parsed = parse(&doc);
        assert_eq!(parsed["error"], json!("connection pool exhausted"));
        assert!(parsed.get("value").is_none());
        // the rest of the document is intact
        assert_eq!(parsed["name"], json!("pool.free"));
    }

    #[test]
    fn histogram_fields_are_unscaled() {
        let doc = encoder()
            .encode(&wrap(
                "payload.size",
                HistogramSnapshot {
                    count: 11,
                    snapshot: sample_snapshot(),
                },
            ))
            .unwrap();
        let parsed = parse(&doc);
        assert_eq!(parsed["count"], json!(11));
        // min/max stay raw integer readings
        assert_eq!(parsed["max"], json!(5_000_000));
        assert_eq!(parsed["min"], json!(1_000_000));
        assert_eq!(parsed["mean"], json!(2_500_000.0));
        assert_eq!(parsed["p50"], json!(2_000_000.0));
        assert_eq!(parsed["p999"], json!(4_990_000.0));
        assert_eq!(parsed["stddev"], json!(500_000.0));
    }

    #[test]
    fn meter_rates_scale_with_the_rate_unit() {
        let meter = MeterSnapshot {
            count: 100,
            m1_rate: 2.0,
            m5_rate: 1.5,
            m15_rate: 1.0,
            mean_rate: 1.75,
        };

        let per_second = parse(
            &encoder().encode(&wrap("events", meter)).unwrap(),
        );
        assert_eq!(per_second["m1_rate"], json!(2.0));
        assert_eq!(per_second["units"], json!("events/second"));

        let per_minute_encoder = DocumentEncoder::new(
            EncoderConfig::builder().rate_unit(TimeUnit::Minutes).build(),
        );
        let per_minute = parse(
            &per_minute_encoder.encode(&wrap("events", meter)).unwrap(),
        );
        assert_eq!(per_minute["m1_rate"], json!(120.0));
        assert_eq!(per_minute["m5_rate"], json!(90.0));
        assert_eq!(per_minute["m15_rate"], json!(60.0));
        assert_eq!(per_minute["mean_rate"], json!(105.0));
        assert_eq!(per_minute["units"], json!("events/minute"));
        assert_eq!(per_minute["count"], json!(100));
    }

    #[test]
    fn timer_durations_scale_with_the_duration_unit() {
        let in_nanos_encoder = DocumentEncoder::new(
            EncoderConfig::builder()
                .duration_unit(TimeUnit::Nanoseconds)
                .build(),
        );
        let in_nanos = parse(
            &in_nanos_encoder.encode(&wrap("db.query", sample_timer())).unwrap(),
        );
        assert_eq!(in_nanos["max"], json!(5_000_000.0));
        assert_eq!(in_nanos["duration_units"], json!("nanoseconds"));

        // default duration unit is milliseconds: everything divides by 1e6
        let in_millis = parse(
            &encoder().encode(&wrap("db.query", sample_timer())).unwrap(),
        );
        assert_eq!(in_millis["max"], json!(5.0));
        assert_eq!(in_millis["mean"], json!(2.5));
        assert_eq!(in_millis["min"], json!(1.0));
        assert_eq!(in_millis["p50"], json!(2.0));
        assert_eq!(in_millis["p75"], json!(3.0));
        assert_eq!(in_millis["p95"], json!(4.0));
        assert_eq!(in_millis["p98"], json!(4.5));
        assert_eq!(in_millis["p99"], json!(4.8));
        assert_eq!(in_millis["p999"], json!(4.99));
        assert_eq!(in_millis["stddev"], json!(0.5));
        assert_eq!(in_millis["duration_units"], json!("milliseconds"));
        assert_eq!(in_millis["rate_units"], json!("calls/second"));
        // rates are untouched by the duration unit
        assert_eq!(in_millis["m1_rate"], json!(0.5));
        assert_eq!(in_millis["count"], json!(3));
    }

    #[test]
    fn additional_fields_override_kind_fields() {
        let encoder = DocumentEncoder::new(
            EncoderConfig::builder()
                .additional_field("host", "node-1")
                .additional_field("count", -1)
                .build(),
        );
        let doc = encoder
            .encode(&wrap("api.requests", CounterSnapshot { count: 7 }))
            .unwrap();

        // both occurrences are written; consumers keep the last one
        assert_eq!(doc.matches("\"count\":").count(), 2);
        let parsed = parse(&doc);
        assert_eq!(parsed["count"], json!(-1));
        assert_eq!(parsed["host"], json!("node-1"));
    }

    #[test]
    fn extractors_run_after_additional_fields() {
        let encoder = DocumentEncoder::new(
            EncoderConfig::builder()
                .additional_field("env", "static")
                .extractor(DottedNameExtractor::new(["env"]))
                .build(),
        );
        let doc = encoder
            .encode(&wrap("prod.api.requests", CounterSnapshot { count: 1 }))
            .unwrap();
        let parsed = parse(&doc);
        assert_eq!(parsed["env"], json!("prod"));
    }

    #[test]
    fn extractor_fields_enrich_documents() {
        let encoder = DocumentEncoder::new(
            EncoderConfig::builder()
                .extractor(Memoized::new(|name: &str| {
                    DottedNameExtractor::new(["env", "component"]).extract(name)
                }))
                .build(),
        );
        let doc = encoder
            .encode(&wrap("prod.api.requests", CounterSnapshot { count: 1 }))
            .unwrap();
        let parsed = parse(&doc);
        assert_eq!(parsed["env"], json!("prod"));
        assert_eq!(parsed["component"], json!("api"));
    }

    #[test]
    fn encode_to_streams_the_same_bytes() {
        let encoder = encoder();
        let metric = wrap("api.requests", CounterSnapshot { count: 7 });

        let mut streamed = Vec::new();
        encoder.encode_to(&mut streamed, &metric).unwrap();

        assert_eq!(String::from_utf8(streamed).unwrap(), encoder.encode(&metric).unwrap());
    }
}
