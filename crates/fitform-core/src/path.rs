#![forbid(unsafe_code)]

//! Typed locations inside a hierarchical form tree.
//!
//! A [`CollectionPath`] is an ordered list of [`PathSegment`]s, each either an
//! object key or an array index. Every collection, panel instance and field in
//! the editor is addressed by one of these values; there is no string
//! concatenation or reflective lookup anywhere else in the stack.
//!
//! # Invariants
//!
//! 1. Two paths are equal iff their segment sequences are equal.
//! 2. The display form joins segments with `.` and is only used for logs and
//!    diagnostics, never parsed back on a hot path.
//! 3. `p.starts_with(&p)` holds for every path, including the root.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One step into the form tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Object key.
    Key(String),
    /// Array index.
    Index(usize),
}

impl PathSegment {
    /// The key, if this segment is a key.
    #[inline]
    #[must_use]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(k) => Some(k),
            Self::Index(_) => None,
        }
    }

    /// The index, if this segment is an index.
    #[inline]
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Key(_) => None,
            Self::Index(i) => Some(*i),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => f.write_str(k),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Ordered location of a collection (or field) inside the form tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionPath(Vec<PathSegment>);

impl CollectionPath {
    /// The empty path, addressing the form root.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from anything that yields segments.
    ///
    /// ```
    /// use fitform_core::path::{CollectionPath, PathSegment};
    ///
    /// let path = CollectionPath::new([
    ///     PathSegment::from("groups"),
    ///     PathSegment::from(1),
    ///     PathSegment::from("exercises"),
    /// ]);
    /// assert_eq!(path.to_string(), "groups.1.exercises");
    /// ```
    #[must_use]
    pub fn new(segments: impl IntoIterator<Item = PathSegment>) -> Self {
        Self(segments.into_iter().collect())
    }

    /// Single-key path, the common case for top-level collections.
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self(vec![PathSegment::Key(key.into())])
    }

    /// Segments in order.
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Number of segments.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this is the root path.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Extend with an object key.
    #[must_use]
    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.0.push(PathSegment::Key(key.into()));
        next
    }

    /// Extend with an array index.
    #[must_use]
    pub fn child_index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.0.push(PathSegment::Index(index));
        next
    }

    /// Path without its last segment, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }

    /// Last segment, or `None` for the root.
    #[must_use]
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Whether `prefix` is a (non-strict) prefix of this path.
    #[must_use]
    pub fn starts_with(&self, prefix: &CollectionPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Index segment at `depth`, if there is one.
    #[must_use]
    pub fn index_at(&self, depth: usize) -> Option<usize> {
        self.0.get(depth).and_then(PathSegment::as_index)
    }

    /// Copy of this path with the index segment at `depth` replaced.
    ///
    /// Returns `None` when `depth` is out of range or does not hold an index.
    #[must_use]
    pub fn with_index_at(&self, depth: usize, index: usize) -> Option<Self> {
        match self.0.get(depth)? {
            PathSegment::Index(_) => {
                let mut next = self.clone();
                next.0[depth] = PathSegment::Index(index);
                Some(next)
            }
            PathSegment::Key(_) => None,
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromIterator<PathSegment> for CollectionPath {
    fn from_iter<T: IntoIterator<Item = PathSegment>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// Build a [`CollectionPath`] from a mixed list of keys and indices.
///
/// ```
/// use fitform_core::cpath;
///
/// let path = cpath!["groups", 0usize, "exercises"];
/// assert_eq!(path.len(), 3);
/// ```
#[macro_export]
macro_rules! cpath {
    () => { $crate::path::CollectionPath::root() };
    ($($seg:expr),+ $(,)?) => {
        $crate::path::CollectionPath::new([$($crate::path::PathSegment::from($seg)),+])
    };
}
