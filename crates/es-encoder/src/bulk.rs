//! Bulk index operation framing
//!
//! A bulk request body alternates header lines and document lines; the
//! header names the target index and document type for the document that
//! follows it. This module renders the header object and the two-line
//! framing for one metric. Assembling whole batches stays with the
//! external reporter.

use metric_types::Metric;
use metric_types::Timestamped;
use serde::Deserialize;
use serde::Serialize;

use crate::document::DocumentEncoder;
use crate::EncodeError;

/// Header line preceding one document in a bulk request body
///
/// Renders as `{"index":{"_index":...,"_type":...}}`; absent parts are
/// omitted entirely rather than written as null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkIndexHeader {
    #[serde(rename = "index")]
    action: IndexAction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct IndexAction {
    #[serde(rename = "_index", skip_serializing_if = "Option::is_none")]
    index: Option<String>,
    #[serde(rename = "_type", skip_serializing_if = "Option::is_none")]
    doc_type: Option<String>,
}

impl BulkIndexHeader {
    pub fn new(index: Option<String>, doc_type: Option<String>) -> Self {
        Self {
            action: IndexAction { index, doc_type },
        }
    }

    /// Header targeting an index, with no document type
    pub fn for_index(index: impl Into<String>) -> Self {
        Self::new(Some(index.into()), None)
    }

    pub fn index(&self) -> Option<&str> {
        self.action.index.as_deref()
    }

    pub fn doc_type(&self) -> Option<&str> {
        self.action.doc_type.as_deref()
    }
}

impl DocumentEncoder {
    /// Renders the two-line bulk framing for one metric: header, newline,
    /// document, newline
    pub fn bulk_line(
        &self,
        header: &BulkIndexHeader,
        metric: &Timestamped<Metric>,
    ) -> Result<String, EncodeError> {
        let mut line = serde_json::to_string(header)?;
        line.push('\n');
        line.push_str(&self.encode(metric)?);
        line.push('\n');
        Ok(line)
    }
}
