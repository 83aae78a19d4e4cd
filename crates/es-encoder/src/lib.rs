//! Metric-to-document serialization for bulk ingestion
//!
//! Turns [`metric_types`] snapshots into flat JSON documents shaped for an
//! Elasticsearch-style bulk API. Each metric kind maps to a fixed field
//! set; meter and timer values are re-expressed in configured rate and
//! duration units; static fields and name-derived fields are merged into
//! every document; a separate header object frames documents for bulk
//! request bodies.
//!
//! The registry producing snapshots and the transport submitting bulk
//! bodies live outside this crate. Serialization is synchronous and writes
//! through serde's streaming primitives, so no document is buffered beyond
//! the caller's writer.
//!
//! ```
//! use chrono::Utc;
//! use es_encoder::DocumentEncoder;
//! use es_encoder::EncoderConfig;
//! use metric_types::CounterSnapshot;
//! use metric_types::Timestamped;
//!
//! let encoder = DocumentEncoder::new(EncoderConfig::default());
//! let metric = Timestamped::new(
//!     "api.requests",
//!     Utc::now(),
//!     CounterSnapshot { count: 7 }.into(),
//! );
//! let doc = encoder.encode(&metric).unwrap();
//! assert!(doc.starts_with("{\"name\":\"api.requests\""));
//! ```

pub mod bulk;
pub mod config;
pub mod document;
pub mod extract;
pub mod units;

pub use bulk::BulkIndexHeader;
pub use config::ConfigBuilder;
pub use config::EncoderConfig;
pub use document::Document;
pub use document::DocumentEncoder;
pub use extract::DottedNameExtractor;
pub use extract::ExtractedFields;
pub use extract::Memoized;
pub use extract::NamePartsExtractor;

use thiserror::Error;

/// Failure while rendering a document or bulk header
///
/// Not recovered locally; the in-progress document is abandoned and the
/// caller decides what to do with the cycle.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("JSON rendering failed: {0}")]
    Json(#[from] serde_json::Error),
}
