//! Field references.
//!
//! A [`Field`] is the wire name of a document field as a canonical dotted
//! path. Typed entities map their logical fields to wire names through
//! [`DocumentField`], which is an explicit table rather than inference:
//!
//! ```rust
//! use quarry_client::{DocumentField, Field};
//!
//! #[derive(Clone, Copy)]
//! enum ProjectField {
//!     State,
//!     LeadDeveloper,
//! }
//!
//! impl DocumentField for ProjectField {
//!     fn path(self) -> &'static str {
//!         match self {
//!             ProjectField::State => "state",
//!             ProjectField::LeadDeveloper => "leadDeveloper",
//!         }
//!     }
//! }
//!
//! assert_eq!(Field::of(ProjectField::LeadDeveloper).as_str(), "leadDeveloper");
//! assert_eq!(Field::of(ProjectField::State).child("code").as_str(), "state.code");
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Logical field of a typed entity.
pub trait DocumentField: Copy {
    /// Wire path of this field.
    fn path(self) -> &'static str;
}

/// Canonical dotted path of a document field.
///
/// Fields built in code are canonicalized: segments are trimmed and empty
/// segments dropped, so `Field::new(" a..b ")` equals `Field::new("a.b")`.
/// A field decoded from a reply is kept exactly as the service sent it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Field(String);

impl Field {
    /// Create a field from a dotted path.
    pub fn new(path: impl AsRef<str>) -> Self {
        Self::from_segments(path.as_ref().split('.'))
    }

    /// Create a field from path segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = String::new();
        for segment in segments {
            let segment = segment.as_ref().trim();
            if segment.is_empty() {
                continue;
            }
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(segment);
        }
        Self(path)
    }

    /// Resolve a typed entity field.
    pub fn of<F: DocumentField>(field: F) -> Self {
        Self::new(field.path())
    }

    /// Append a nested segment.
    pub fn child(&self, segment: impl AsRef<str>) -> Self {
        Self::from_segments(self.segments().chain(std::iter::once(segment.as_ref())))
    }

    /// The canonical path.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|s| !s.is_empty())
    }

    /// Whether the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Field {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Field {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<&Field> for Field {
    fn from(field: &Field) -> Self {
        field.clone()
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self)
    }
}
