//! Artifact store interface
//!
//! The store is the only component that touches artifact locations. It
//! exposes the three operations the accumulator needs: probing for a
//! hand-authored file, reading the prior-pass artifact, and writing the final
//! artifact together with its provenance.

use crate::error::StoreError;
use spr_model::{ImplementationId, ResourcePath};
use std::fmt::Debug;
use std::sync::Arc;

/// Location of artifacts for one output channel
pub trait ArtifactStore: Send + Sync + Debug {
    /// Look for a hand-authored file at `path`
    ///
    /// Returns a human-readable location of the file if one exists.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the probe itself fails.
    fn probe_source(&self, path: &ResourcePath) -> Result<Option<String>, StoreError>;

    /// Read the artifact written at `path` by an earlier pass of this build
    ///
    /// # Errors
    /// Returns [`StoreError`] if the artifact exists but cannot be read.
    fn read_output(&self, path: &ResourcePath) -> Result<Option<String>, StoreError>;

    /// Write the final artifact
    ///
    /// `provenance` lists the declarations that contributed entries, for
    /// incremental-build dependency tracking.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the write fails.
    fn write_output(
        &self,
        path: &ResourcePath,
        contents: &str,
        provenance: &[ImplementationId],
    ) -> Result<(), StoreError>;
}

impl<S: ArtifactStore + ?Sized> ArtifactStore for Arc<S> {
    fn probe_source(&self, path: &ResourcePath) -> Result<Option<String>, StoreError> {
        (**self).probe_source(path)
    }

    fn read_output(&self, path: &ResourcePath) -> Result<Option<String>, StoreError> {
        (**self).read_output(path)
    }

    fn write_output(
        &self,
        path: &ResourcePath,
        contents: &str,
        provenance: &[ImplementationId],
    ) -> Result<(), StoreError> {
        (**self).write_output(path, contents, provenance)
    }
}
