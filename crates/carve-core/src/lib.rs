//! Core shared types for Carve.
//!
//! This crate is intentionally small: text primitives, names, document
//! versions, and the cancellation plumbing every analysis loop threads through.

mod cancel;
mod text;

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

pub use crate::cancel::{CancellationToken, Cancelled};
pub use crate::text::{LineIndex, TextRange, TextSize};

/// An identifier as written in source (local, parameter, type parameter, ...).
///
/// Cheap to clone; short names are stored inline.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(SmolStr);

impl Name {
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(SmolStr::new(text))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name::new(value)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Monotonic version of a document snapshot.
///
/// Analysis results are only valid for the version they were computed on, so
/// callers caching them key by `(DocumentVersion, TextRange)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentVersion(pub u32);

impl DocumentVersion {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Returns `true` if `inner` lies completely within `outer` (bounds inclusive).
#[inline]
pub fn range_contains_range(outer: TextRange, inner: TextRange) -> bool {
    outer.start() <= inner.start() && inner.end() <= outer.end()
}

/// Returns `true` if the two ranges share at least one byte.
#[inline]
pub fn ranges_intersect(a: TextRange, b: TextRange) -> bool {
    a.start() < b.end() && b.start() < a.end()
}
