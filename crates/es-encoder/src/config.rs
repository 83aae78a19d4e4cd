//! Encoder configuration
//!
//! One [`EncoderConfig`] is built at setup time and shared read-only by
//! every serializer for the process lifetime.

use std::fmt;

use metric_types::TimeUnit;

use crate::extract::NamePartsExtractor;

/// Shared serialization settings
///
/// Field order matters twice: `additional_fields` are written into every
/// document in insertion order, and `extractors` run in list order. Later
/// writers win when keys collide.
pub struct EncoderConfig {
    pub(crate) rate_unit: TimeUnit,
    pub(crate) duration_unit: TimeUnit,
    pub(crate) timestamp_field: String,
    pub(crate) additional_fields: serde_json::Map<String, serde_json::Value>,
    pub(crate) extractors: Vec<Box<dyn NamePartsExtractor>>,
}

impl EncoderConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn rate_unit(&self) -> TimeUnit {
        self.rate_unit
    }

    pub fn duration_unit(&self) -> TimeUnit {
        self.duration_unit
    }

    pub fn timestamp_field(&self) -> &str {
        &self.timestamp_field
    }

    pub fn additional_fields(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.additional_fields
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for EncoderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderConfig")
            .field("rate_unit", &self.rate_unit)
            .field("duration_unit", &self.duration_unit)
            .field("timestamp_field", &self.timestamp_field)
            .field("additional_fields", &self.additional_fields)
            .field("extractors", &self.extractors.len())
            .finish()
    }
}

/// Builder for [`EncoderConfig`]
pub struct ConfigBuilder {
    rate_unit: TimeUnit,
    duration_unit: TimeUnit,
    timestamp_field: String,
    additional_fields: serde_json::Map<String, serde_json::Value>,
    extractors: Vec<Box<dyn NamePartsExtractor>>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            rate_unit: TimeUnit::Seconds,
            duration_unit: TimeUnit::Milliseconds,
            timestamp_field: "@timestamp".to_owned(),
            additional_fields: serde_json::Map::new(),
            extractors: Vec::new(),
        }
    }
}

impl ConfigBuilder {
    /// Unit for meter and timer rates, default seconds
    pub fn rate_unit(mut self, unit: TimeUnit) -> Self {
        self.rate_unit = unit;
        self
    }

    /// Unit for timer durations, default milliseconds
    pub fn duration_unit(mut self, unit: TimeUnit) -> Self {
        self.duration_unit = unit;
        self
    }

    /// Name of the capture-time field, default `@timestamp`
    pub fn timestamp_field(mut self, name: impl Into<String>) -> Self {
        self.timestamp_field = name.into();
        self
    }

    /// Static field written verbatim into every document
    pub fn additional_field(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.additional_fields.insert(key.into(), value.into());
        self
    }

    /// Appends a name-parts extractor; extractors run in insertion order
    pub fn extractor(mut self, extractor: impl NamePartsExtractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }

    pub fn build(self) -> EncoderConfig {
        EncoderConfig {
            rate_unit: self.rate_unit,
            duration_unit: self.duration_unit,
            timestamp_field: self.timestamp_field,
            additional_fields: self.additional_fields,
            extractors: self.extractors,
        }
    }
}
