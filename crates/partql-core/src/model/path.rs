use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// PropertyPath
///
/// Ordered logical property segments, outermost first.
/// `address.city` is `["address", "city"]`; segments are never empty.
///

#[derive(
    Clone, Debug, Deref, Deserialize, Eq, Hash, IntoIterator, Ord, PartialEq, PartialOrd, Serialize,
)]
#[into_iterator(owned, ref)]
pub struct PropertyPath(Vec<String>);

impl PropertyPath {
    #[must_use]
    pub const fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Parse a dotted path (`address.city`).
    #[must_use]
    pub fn dotted(path: &str) -> Self {
        Self(path.split('.').map(ToString::to_string).collect())
    }

    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self(vec![segment.into()])
    }

    /// Return a new path with `segment` appended.
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());

        Self(segments)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<&str> for PropertyPath {
    fn from(path: &str) -> Self {
        Self::dotted(path)
    }
}
