use serde_json::Value;
use std::fmt;

/// Hierarchical cache key.
///
/// Segments are plain strings; structured parameters are stored as canonical
/// JSON (object keys sorted), so equal parameters always produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    /// Append a JSON value in canonical form
    pub fn params(self, params: &Value) -> Self {
        self.segment(params.to_string())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// True when `prefix` is this key or one of its ancestors
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}
