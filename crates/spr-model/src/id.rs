//! Implementation identifiers
//!
//! Provides [`ImplementationId`], the globally unique dotted binary name of a
//! registered implementation (for example `org.acme.impl.FastCodec$Factory`).

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Dotted binary name of an implementation or capability type
///
/// Segments are separated by `.`; nested declarations use `$` inside the
/// last segment. Ordering is plain lexicographic on the full string, which is
/// the secondary key of the entry total order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImplementationId(String);

impl ImplementationId {
    /// Parse and validate an identifier
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidIdentifier`] for empty names, empty
    /// segments, or characters outside `[A-Za-z0-9_$]`.
    pub fn new(name: impl Into<String>) -> Result<Self, ModelError> {
        let name = name.into();
        Self::check(&name)?;
        Ok(Self(name))
    }

    fn check(name: &str) -> Result<(), ModelError> {
        if name.is_empty() {
            return Err(ModelError::invalid_identifier(name, "empty name"));
        }
        for segment in name.split('.') {
            if segment.is_empty() {
                return Err(ModelError::invalid_identifier(name, "empty segment"));
            }
            if let Some(c) = segment
                .chars()
                .find(|c| !(c.is_alphanumeric() || *c == '_' || *c == '$'))
            {
                return Err(ModelError::invalid_identifier(
                    name,
                    format!("invalid character {c:?}"),
                ));
            }
        }
        Ok(())
    }

    /// Full binary name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last dotted segment (simple name, including any `$` nesting)
    #[inline]
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Package part (everything before the last `.`), empty for the default package
    #[inline]
    #[must_use]
    pub fn package(&self) -> &str {
        self.0.rsplit_once('.').map_or("", |(pkg, _)| pkg)
    }
}

impl Display for ImplementationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ImplementationId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ImplementationId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ImplementationId> for String {
    fn from(id: ImplementationId) -> Self {
        id.0
    }
}

impl AsRef<str> for ImplementationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ImplementationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_binary_names() {
        let id = ImplementationId::new("org.acme.Codec$Factory").unwrap();
        assert_eq!(id.as_str(), "org.acme.Codec$Factory");
        assert_eq!(id.simple_name(), "Codec$Factory");
        assert_eq!(id.package(), "org.acme");
    }

    #[test]
    fn default_package() {
        let id = ImplementationId::new("Plain").unwrap();
        assert_eq!(id.package(), "");
        assert_eq!(id.simple_name(), "Plain");
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            ImplementationId::new(""),
            Err(ModelError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn rejects_empty_segment() {
        assert!(ImplementationId::new("org..Codec").is_err());
        assert!(ImplementationId::new(".Codec").is_err());
        assert!(ImplementationId::new("Codec.").is_err());
    }

    #[test]
    fn rejects_whitespace_and_punctuation() {
        assert!(ImplementationId::new("org.acme Codec").is_err());
        assert!(ImplementationId::new("org/acme/Codec").is_err());
        assert!(ImplementationId::new("#position=1").is_err());
    }

    #[test]
    fn orders_lexicographically() {
        let a = ImplementationId::new("a.A").unwrap();
        let b = ImplementationId::new("a.B").unwrap();
        assert!(a < b);
    }

    #[test]
    fn serde_validates() {
        let ok: ImplementationId = serde_json::from_str("\"x.Y\"").unwrap();
        assert_eq!(ok.as_str(), "x.Y");
        assert!(serde_json::from_str::<ImplementationId>("\"x..Y\"").is_err());
    }
}
