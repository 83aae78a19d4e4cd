//! Structured field extraction from metric names
//!
//! Most metric names carry structure (`"prod.api.requests"`), and the
//! fields derived from that structure make the resulting documents
//! searchable by more than the raw name. Extractors plug into the encoder
//! configuration and run against every document's metric name.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

/// Fields contributed by one extractor, merged into the output document
pub type ExtractedFields = serde_json::Map<String, serde_json::Value>;

/// Derives additional document fields from a metric name
///
/// Must be pure with respect to `name`; `None` means the extractor has
/// nothing to contribute for this metric. Implementations may cache
/// internally and are shared across reporter threads.
pub trait NamePartsExtractor: Send + Sync {
    fn extract(&self, name: &str) -> Option<ExtractedFields>;
}

/// Memoizing adapter over a compute closure
///
/// The first call for a given name runs the closure and stores the result
/// keyed by the exact name string; later calls return the stored mapping
/// without recomputation. A `None` result is cached like any other. The
/// cache never evicts — metric name cardinality is assumed bounded and
/// stable for the process lifetime.
pub struct Memoized<F> {
    compute: F,
    cache: RwLock<HashMap<String, Option<ExtractedFields>>>,
}

impl<F> Memoized<F>
where
    F: Fn(&str) -> Option<ExtractedFields> + Send + Sync,
{
    pub fn new(compute: F) -> Self {
        Self {
            compute,
            cache: RwLock::new(HashMap::new()),
        }
    }
}

impl<F> NamePartsExtractor for Memoized<F>
where
    F: Fn(&str) -> Option<ExtractedFields> + Send + Sync,
{
    fn extract(&self, name: &str) -> Option<ExtractedFields> {
        if let Some(cached) = self.cache.read().expect("poisoned").get(name) {
            return cached.clone();
        }

        let mut cache = self.cache.write().expect("poisoned");
        // another thread may have filled the entry between the locks
        cache
            .entry(name.to_owned())
            .or_insert_with(|| {
                debug!(name, "caching extracted name parts");
                (self.compute)(name)
            })
            .clone()
    }
}

/// Maps dot-separated name segments to configured field names positionally
///
/// `DottedNameExtractor::new(["env", "component"])` turns
/// `"prod.api.requests"` into `{"env": "prod", "component": "api"}`.
/// Segments beyond the configured fields are ignored; a name with fewer
/// segments contributes only the fields it can fill.
#[derive(Debug, Clone)]
pub struct DottedNameExtractor {
    fields: Vec<String>,
}

impl DottedNameExtractor {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl NamePartsExtractor for DottedNameExtractor {
    fn extract(&self, name: &str) -> Option<ExtractedFields> {
        let mut parts = ExtractedFields::new();
        let segments = name.split('.').filter(|segment| !segment.is_empty());
        for (field, segment) in self.fields.iter().zip(segments) {
            parts.insert(field.clone(), segment.into());
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts)
        }
    }
}
