//! Build-wide memo of hand-authored file probes
//!
//! Each [`ChannelScope`](crate::ChannelScope) probes a resource once. Channels
//! that share a store share this memo, so a resource found to be hand-authored
//! by one channel fails fast in every other channel of the build too.

use crate::error::StoreError;
use crate::store::ArtifactStore;
use moka::sync::Cache;
use spr_model::{ImplementationId, ResourcePath};
use std::fmt;
use std::sync::Arc;

/// Store wrapper that probes each resource path at most once
///
/// Failed probes are not remembered. Reads and writes pass straight through.
pub struct ProbeCachingStore {
    inner: Arc<dyn ArtifactStore>,
    probes: Cache<ResourcePath, Option<String>>,
}

impl ProbeCachingStore {
    /// Wrap `inner`
    #[must_use]
    pub fn new(inner: Arc<dyn ArtifactStore>) -> Self {
        Self {
            inner,
            probes: Cache::builder().name("spr-source-probes").build(),
        }
    }

    /// Wrapped store
    #[inline]
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn ArtifactStore> {
        &self.inner
    }

    /// Forget every probe result (end of a build)
    pub fn clear(&self) {
        self.probes.invalidate_all();
    }
}

impl fmt::Debug for ProbeCachingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeCachingStore")
            .field("inner", &self.inner)
            .field("probes", &self.probes.entry_count())
            .finish()
    }
}

impl ArtifactStore for ProbeCachingStore {
    fn probe_source(&self, path: &ResourcePath) -> Result<Option<String>, StoreError> {
        self.probes
            .try_get_with(path.clone(), || self.inner.probe_source(path))
            .map_err(|err| (*err).clone())
    }

    fn read_output(&self, path: &ResourcePath) -> Result<Option<String>, StoreError> {
        self.inner.read_output(path)
    }

    fn write_output(
        &self,
        path: &ResourcePath,
        contents: &str,
        provenance: &[ImplementationId],
    ) -> Result<(), StoreError> {
        self.inner.write_output(path, contents, provenance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryArtifactStore;
    use crate::scope::ChannelScope;
    use spr_test_utils::{entry, id};

    fn path() -> ResourcePath {
        "META-INF/services/x.Cap".parse().unwrap()
    }

    #[test]
    fn conflict_is_shared_across_channels() {
        let inner = Arc::new(MemoryArtifactStore::new());
        inner.add_source(path(), "x.Manual\n");
        let store = Arc::new(ProbeCachingStore::new(inner.clone()));

        let first = ChannelScope::new(store.clone());
        let second = ChannelScope::new(store.clone());
        assert!(first.merge(&path(), entry("x.A"), &id("x.A")).unwrap_err().is_conflict());
        assert!(second.merge(&path(), entry("x.B"), &id("x.B")).unwrap_err().is_conflict());

        assert_eq!(inner.stats().probes, 1);
    }

    #[test]
    fn clear_probes_again() {
        let inner = Arc::new(MemoryArtifactStore::new());
        let store = ProbeCachingStore::new(inner.clone());

        assert_eq!(store.probe_source(&path()).unwrap(), None);
        assert_eq!(store.probe_source(&path()).unwrap(), None);
        assert_eq!(inner.stats().probes, 1);

        store.clear();
        inner.add_source(path(), "x.Manual\n");
        assert!(store.probe_source(&path()).unwrap().is_some());
        assert_eq!(inner.stats().probes, 2);
    }
}
