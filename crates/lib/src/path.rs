//! Textual paths into nested values.
//!
//! A [`Path`] is a slash-delimited sequence of components such as `/servers/0/host`.
//! Paths are normalized once on construction and then reused: the schema turns a
//! `Path` into an [`Address`](crate::address::Address), which knows whether each
//! component is a map key or a list index.
//!
//! # Usage
//!
//! ```rust
//! use ensemble::path::Path;
//! use std::str::FromStr;
//!
//! // Construct from string (automatically normalized)
//! let path = Path::from_str("/servers//0/host/")?;
//! assert_eq!(path.as_str(), "/servers/0/host");
//!
//! // Build incrementally
//! let path = Path::root().push("servers").push("0").push("host");
//! assert_eq!(path.len(), 3);
//! # Ok::<(), std::convert::Infallible>(())
//! ```

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Component used in schema paths to stand for any list item or any key of a
/// uniform map.
pub const WILDCARD: &str = "*";

/// Error type for component validation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// Invalid component: components cannot contain slashes.
    #[error("Invalid component '{component}': {reason}")]
    InvalidComponent { component: String, reason: String },
}

/// Normalizes a path string by cleaning up slashes and empty components.
///
/// - Empty string `""` and `"/"` → `""` (the root)
/// - Missing leading slash `"a/b"` → `"/a/b"`
/// - Trailing slashes `"/a/"` → `"/a"`
/// - Repeated slashes `"/a//b"` → `"/a/b"`
///
/// # Examples
///
/// ```rust
/// # use ensemble::path::normalize_path;
/// assert_eq!(normalize_path(""), "");
/// assert_eq!(normalize_path("/"), "");
/// assert_eq!(normalize_path("a/b"), "/a/b");
/// assert_eq!(normalize_path("/a//b/"), "/a/b");
/// ```
pub fn normalize_path(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 1);
    for component in input.split('/').filter(|c| !c.is_empty()) {
        out.push('/');
        out.push_str(component);
    }
    out
}

/// A single validated component of a path.
///
/// Components cannot contain slashes. Whether a component is a key or an index
/// is only decided against the schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Component {
    inner: String,
}

impl Component {
    /// Creates a new component from a string.
    ///
    /// # Errors
    /// Returns an error if the component contains a slash or is empty.
    pub fn new(s: impl Into<String>) -> Result<Self, PathError> {
        let s = s.into();

        if s.contains('/') {
            return Err(PathError::InvalidComponent {
                component: s,
                reason: "components cannot contain slashes".to_string(),
            });
        }
        if s.is_empty() {
            return Err(PathError::InvalidComponent {
                component: s,
                reason: "components cannot be empty".to_string(),
            });
        }

        Ok(Component { inner: s })
    }

    /// Returns the component as a string slice.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Returns `true` for the schema wildcard component `*`.
    pub fn is_wildcard(&self) -> bool {
        self.inner == WILDCARD
    }
}

impl AsRef<str> for Component {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl FromStr for Component {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Component::new(s)
    }
}

/// An owned, normalized path.
///
/// The inner representation is always either empty (the root) or a string of the
/// form `/c1/c2/...` with no empty components.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path {
    inner: String,
}

impl Path {
    /// The root path, addressing a whole value.
    pub fn root() -> Self {
        Self {
            inner: String::new(),
        }
    }

    /// Creates a path by normalizing the input string. Always succeeds.
    pub fn normalize(path: &str) -> Self {
        Self {
            inner: normalize_path(path),
        }
    }

    /// Builds a path from individual components.
    pub fn from_components<I, S>(components: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut path = Self::root();
        for component in components {
            path = path.push_component(Component::new(component)?);
        }
        Ok(path)
    }

    /// Appends a (possibly multi-component) path string, normalizing the input.
    pub fn push(mut self, path: impl AsRef<str>) -> Self {
        self.inner.push_str(&normalize_path(path.as_ref()));
        self
    }

    /// Appends a validated component.
    pub fn push_component(mut self, component: Component) -> Self {
        self.inner.push('/');
        self.inner.push_str(&component.inner);
        self
    }

    /// Joins this path with another path.
    pub fn join(mut self, other: &Path) -> Self {
        self.inner.push_str(&other.inner);
        self
    }

    /// Returns an iterator over the path components as string slices.
    pub fn components(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.inner.split('/').filter(|s| !s.is_empty())
    }

    /// Returns the number of components in the path.
    pub fn len(&self) -> usize {
        self.components().count()
    }

    /// Returns `true` if this is the root path.
    pub fn is_root(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        if self.inner.is_empty() {
            return None;
        }
        self.inner.rfind('/').map(|last| Path {
            inner: self.inner[..last].to_string(),
        })
    }

    /// Returns the last component of the path, or `None` for the root.
    pub fn last(&self) -> Option<&str> {
        self.components().next_back()
    }

    /// Returns the path as a string slice (`""` for the root).
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl AsRef<Path> for Path {
    fn as_ref(&self) -> &Path {
        self
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl FromStr for Path {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Self::normalize(s)
    }
}

impl From<String> for Path {
    fn from(s: String) -> Self {
        Self::normalize(&s)
    }
}

impl From<&Path> for Path {
    fn from(path: &Path) -> Self {
        path.clone()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.is_empty() {
            f.write_str("/")
        } else {
            f.write_str(&self.inner)
        }
    }
}

impl serde::Serialize for Path {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Path {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Path::normalize(&s))
    }
}

/// Constructs a [`Path`] from a literal or from components.
///
/// - `path!()` - the root path
/// - `path!("/a/b")` - parse and normalize a string
/// - `path!("a", 0, "b")` - join components, each rendered with `Display`
///
/// ```rust
/// # use ensemble::path;
/// let base = "servers";
/// assert_eq!(path!(base, 0, "host").as_str(), "/servers/0/host");
/// assert_eq!(path!("/servers/0/host"), path!("servers", "0", "host"));
/// assert!(path!().is_root());
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::path::Path::root()
    };

    ($single:literal) => {
        $crate::path::Path::normalize($single)
    };

    ($first:expr $(, $rest:expr)* $(,)?) => {{
        let path = $crate::path::Path::root().push($first.to_string());
        $(
            let path = path.push($rest.to_string());
        )*
        path
    }};
}
