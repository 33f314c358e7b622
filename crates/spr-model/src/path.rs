//! Resource paths
//!
//! Provides [`ResourcePath`], the relative, `/`-separated location of a
//! registry artifact (for example `META-INF/services/org.acme.Codec`).

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

/// Relative location of a registry artifact
///
/// # Invariants
/// - at least one segment
/// - no empty, `.` or `..` segments
/// - no backslashes (segments are joined with `/` on every platform)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourcePath(Vec<String>);

impl ResourcePath {
    /// Create path from segments
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidResourcePath`] if any segment is invalid.
    pub fn new<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Result<Self, ModelError> {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(ModelError::invalid_resource_path("", "empty path"));
        }
        for segment in &segments {
            Self::check_segment(&segments, segment)?;
        }
        Ok(Self(segments))
    }

    fn check_segment(all: &[String], segment: &str) -> Result<(), ModelError> {
        let reason = if segment.is_empty() {
            "empty segment"
        } else if segment == "." || segment == ".." {
            "relative segment"
        } else if segment.contains('\\') {
            "backslash in segment"
        } else {
            return Ok(());
        };
        Err(ModelError::invalid_resource_path(all.join("/"), reason))
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// File name (last segment)
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    /// Append a segment, returning new path
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidResourcePath`] if the segment is invalid.
    pub fn child(&self, segment: impl Into<String>) -> Result<Self, ModelError> {
        let mut new = self.0.clone();
        new.push(segment.into());
        Self::new(new)
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0 == other.0[..self.0.len()]
    }

    /// Resolve below a filesystem root
    #[must_use]
    pub fn to_path_under(&self, root: &std::path::Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.0);
        path
    }
}

impl Display for ResourcePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

impl FromStr for ResourcePath {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with('/') {
            return Err(ModelError::invalid_resource_path(s, "absolute path"));
        }
        Self::new(s.split('/'))
    }
}

impl TryFrom<String> for ResourcePath {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourcePath> for String {
    fn from(path: ResourcePath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn parse_and_display() {
        let path: ResourcePath = "META-INF/services/org.acme.Codec".parse().unwrap();
        assert_eq!(path.segments().len(), 3);
        assert_eq!(path.file_name(), "org.acme.Codec");
        assert_eq!(path.to_string(), "META-INF/services/org.acme.Codec");
    }

    #[test]
    fn rejects_bad_paths() {
        assert!("".parse::<ResourcePath>().is_err());
        assert!("/abs/path".parse::<ResourcePath>().is_err());
        assert!("a//b".parse::<ResourcePath>().is_err());
        assert!("a/../b".parse::<ResourcePath>().is_err());
        assert!("a/./b".parse::<ResourcePath>().is_err());
        assert!("a\\b".parse::<ResourcePath>().is_err());
        assert!("trailing/".parse::<ResourcePath>().is_err());
    }

    #[test]
    fn child_and_prefix() {
        let base: ResourcePath = "META-INF/namedservices".parse().unwrap();
        let full = base.child("codecs").unwrap().child("org.acme.Codec").unwrap();
        assert!(base.is_prefix_of(&full));
        assert!(!full.is_prefix_of(&base));
        assert!(base.child("..").is_err());
    }

    #[test]
    fn resolves_under_root() {
        let path: ResourcePath = "META-INF/services/X".parse().unwrap();
        let resolved = path.to_path_under(Path::new("/out"));
        assert_eq!(resolved, Path::new("/out/META-INF/services/X"));
    }
}
