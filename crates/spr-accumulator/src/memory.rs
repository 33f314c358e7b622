//! In-memory artifact store
//!
//! Used for dry runs and tests. Records provenance and access counts, and can
//! be told to fail writes for selected resources.

use crate::error::StoreError;
use crate::store::ArtifactStore;
use dashmap::{DashMap, DashSet};
use spr_model::{ImplementationId, ResourcePath};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters of store accesses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// `probe_source` calls
    pub probes: usize,
    /// `read_output` calls
    pub reads: usize,
    /// Successful `write_output` calls
    pub writes: usize,
}

/// Artifact store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    sources: DashMap<ResourcePath, String>,
    outputs: DashMap<ResourcePath, String>,
    provenance: DashMap<ResourcePath, Vec<ImplementationId>>,
    failing_writes: DashSet<ResourcePath>,
    probes: AtomicUsize,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryArtifactStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hand-authored file
    pub fn add_source(&self, path: ResourcePath, contents: impl Into<String>) {
        self.sources.insert(path, contents.into());
    }

    /// Place an artifact as if written by an earlier pass
    pub fn put_output(&self, path: ResourcePath, contents: impl Into<String>) {
        self.outputs.insert(path, contents.into());
    }

    /// Make every write to `path` fail
    pub fn fail_writes_to(&self, path: ResourcePath) {
        self.failing_writes.insert(path);
    }

    /// Current artifact contents
    #[must_use]
    pub fn output(&self, path: &ResourcePath) -> Option<String> {
        self.outputs.get(path).map(|v| v.value().clone())
    }

    /// Hand-authored file contents
    #[must_use]
    pub fn source(&self, path: &ResourcePath) -> Option<String> {
        self.sources.get(path).map(|v| v.value().clone())
    }

    /// Provenance recorded by the last write
    #[must_use]
    pub fn provenance(&self, path: &ResourcePath) -> Option<Vec<ImplementationId>> {
        self.provenance.get(path).map(|v| v.value().clone())
    }

    /// Paths with artifacts, sorted
    #[must_use]
    pub fn output_paths(&self) -> Vec<ResourcePath> {
        let mut paths: Vec<_> = self.outputs.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    /// Access counters
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            probes: self.probes.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn probe_source(&self, path: &ResourcePath) -> Result<Option<String>, StoreError> {
        self.probes.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .sources
            .contains_key(path)
            .then(|| format!("memory:sources/{path}")))
    }

    fn read_output(&self, path: &ResourcePath) -> Result<Option<String>, StoreError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.output(path))
    }

    fn write_output(
        &self,
        path: &ResourcePath,
        contents: &str,
        provenance: &[ImplementationId],
    ) -> Result<(), StoreError> {
        if self.failing_writes.contains(path) {
            return Err(StoreError::Rejected {
                operation: "write",
                resource: path.clone(),
            });
        }
        self.outputs.insert(path.clone(), contents.to_string());
        self.provenance.insert(path.clone(), provenance.to_vec());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spr_test_utils::id;

    fn path() -> ResourcePath {
        "META-INF/services/x.Y".parse().unwrap()
    }

    #[test]
    fn probe_reports_sources() {
        let store = MemoryArtifactStore::new();
        assert_eq!(store.probe_source(&path()).unwrap(), None);
        store.add_source(path(), "x.Manual\n");
        assert!(store.probe_source(&path()).unwrap().is_some());
        assert_eq!(store.stats().probes, 2);
    }

    #[test]
    fn write_records_provenance() {
        let store = MemoryArtifactStore::new();
        store.write_output(&path(), "a.A\n", &[id("a.A")]).unwrap();
        assert_eq!(store.output(&path()).as_deref(), Some("a.A\n"));
        assert_eq!(store.provenance(&path()), Some(vec![id("a.A")]));
        assert_eq!(store.stats().writes, 1);
    }

    #[test]
    fn injected_write_failure() {
        let store = MemoryArtifactStore::new();
        store.fail_writes_to(path());
        assert!(store.write_output(&path(), "a.A\n", &[]).is_err());
        assert_eq!(store.output(&path()), None);
    }
}
