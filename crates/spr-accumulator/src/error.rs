//! Error types for resource accumulation
//!
//! Three scopes of failure:
//! - **Conflict**: a hand-authored artifact exists at the resource path
//! - **Malformed / Io**: the prior-pass artifact cannot be read, or the final
//!   artifact cannot be written
//! - **Finalized**: the channel scope no longer accepts registrations

use crate::scope::ChannelId;
use spr_model::{LineFormatError, ResourcePath};
use std::path::PathBuf;
use std::sync::Arc;

/// Errors raised by an [`ArtifactStore`](crate::ArtifactStore)
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Filesystem error
    #[error("io error on {path}: {source}")]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Artifact is not UTF-8
    #[error("{path} is not valid UTF-8")]
    Encoding {
        /// Path involved
        path: PathBuf,
    },

    /// Store refused the operation
    #[error("store rejected {operation} of {resource}")]
    Rejected {
        /// Operation name
        operation: &'static str,
        /// Resource path
        resource: ResourcePath,
    },
}

impl StoreError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}

/// Errors merging into or flushing a channel scope
#[derive(Debug, Clone, thiserror::Error)]
pub enum AccumulateError {
    /// A hand-authored artifact already exists at the resource path
    #[error("cannot generate {path} because it already exists in sources: {location}")]
    Conflict {
        /// Resource path
        path: ResourcePath,
        /// Location of the hand-authored file
        location: String,
    },

    /// Prior-pass artifact could not be parsed
    #[error("malformed prior artifact {path}: {source}")]
    Malformed {
        /// Resource path
        path: ResourcePath,
        /// Parse failure
        #[source]
        source: LineFormatError,
    },

    /// Reading or writing the artifact failed
    #[error("failed to access {path}: {source}")]
    Io {
        /// Resource path
        path: ResourcePath,
        /// Store failure
        #[source]
        source: StoreError,
    },

    /// Scope was already finalized
    #[error("channel {channel} is finalized")]
    Finalized {
        /// Channel
        channel: ChannelId,
    },
}

impl AccumulateError {
    /// Resource path the error is scoped to, if any
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&ResourcePath> {
        match self {
            Self::Conflict { path, .. } | Self::Malformed { path, .. } | Self::Io { path, .. } => {
                Some(path)
            }
            Self::Finalized { .. } => None,
        }
    }

    /// Check if this is a read/write/parse failure
    #[inline]
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Malformed { .. } | Self::Io { .. })
    }

    /// Check if this is a hand-authored conflict
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> ResourcePath {
        "META-INF/services/x.Y".parse().unwrap()
    }

    #[test]
    fn conflict_display() {
        let err = AccumulateError::Conflict {
            path: path(),
            location: "src/META-INF/services/x.Y".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot generate META-INF/services/x.Y because it already exists in sources: src/META-INF/services/x.Y"
        );
        assert!(err.is_conflict());
        assert!(!err.is_io());
    }

    #[test]
    fn io_classification() {
        let err = AccumulateError::Io {
            path: path(),
            source: StoreError::io("/out/x", std::io::Error::other("disk full")),
        };
        assert!(err.is_io());
        assert_eq!(err.path(), Some(&path()));
    }
}
