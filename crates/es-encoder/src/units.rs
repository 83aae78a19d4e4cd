//! Rate and duration unit arithmetic
//!
//! Meter and timer snapshots carry per-second rates and nanosecond
//! durations; these helpers produce the factor and label pair that
//! re-expresses them in a configured [`TimeUnit`].

use metric_types::TimeUnit;

/// Label for a per-unit rate, e.g. `("events", Seconds)` -> `"events/second"`
///
/// The unit name keeps its lowercase spelling with the trailing plural `s`
/// stripped.
pub fn rate_unit_label(unit: TimeUnit, event_noun: &str) -> String {
    let name = unit.as_str();
    let singular = name.strip_suffix('s').unwrap_or(name);
    format!("{event_noun}/{singular}")
}

/// Factor turning a per-second rate into a per-`unit` rate
pub fn rate_factor(unit: TimeUnit) -> f64 {
    unit.seconds_per_unit()
}

/// Factor turning a nanosecond duration into a duration in `unit`
pub fn duration_factor(unit: TimeUnit) -> f64 {
    1.0 / unit.nanos_per_unit()
}

/// Label for durations expressed in `unit`, e.g. `"milliseconds"`
pub fn duration_unit_label(unit: TimeUnit) -> &'static str {
    unit.as_str()
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn rate_labels_strip_the_plural() {
        assert_eq!(rate_unit_label(TimeUnit::Seconds, "events"), "events/second");
        assert_eq!(rate_unit_label(TimeUnit::Minutes, "calls"), "calls/minute");
        assert_eq!(rate_unit_label(TimeUnit::Hours, "events"), "events/hour");
    }

    #[test]
    fn duration_labels_keep_the_plural() {
        assert_eq!(duration_unit_label(TimeUnit::Milliseconds), "milliseconds");
        assert_eq!(duration_unit_label(TimeUnit::Nanoseconds), "nanoseconds");
    }

    #[test]
    fn rate_factor_is_seconds_per_unit() {
        assert_eq!(rate_factor(TimeUnit::Seconds), 1.0);
        assert_eq!(rate_factor(TimeUnit::Minutes), 60.0);
        assert_eq!(rate_factor(TimeUnit::Hours), 3_600.0);
        // sub-second units scale rates down, not to zero
        assert_eq!(rate_factor(TimeUnit::Milliseconds), 0.001);
    }

    #[test]
    fn duration_factor_inverts_nanos_per_unit() {
        assert_eq!(duration_factor(TimeUnit::Nanoseconds), 1.0);
        assert_eq!(duration_factor(TimeUnit::Milliseconds), 1e-6);
        assert_eq!(duration_factor(TimeUnit::Seconds), 1e-9);
    }

    #[test]
    fn a_per_second_rate_times_the_minute_factor_is_per_minute() {
        let per_second = 2.5;
        assert_eq!(per_second * rate_factor(TimeUnit::Minutes), 150.0);
    }
}
