//! Channel scopes and per-resource state
//!
//! A [`ChannelScope`] owns every [`ResourceState`] accumulated for one output
//! channel during a build. It is a two-state machine:
//!
//! ```text
//! Accumulating --finalize()--> Finalized
//! ```
//!
//! Merges are serialized per resource: each resource slot sits behind its own
//! mutex, so merges into different resources (or different scopes) run in
//! parallel while the remove-then-upsert of one merge never interleaves with
//! another merge into the same resource.

use crate::error::AccumulateError;
use crate::store::ArtifactStore;
use dashmap::DashMap;
use indexmap::IndexSet;
use parking_lot::{Mutex, RwLock};
use spr_model::{codec, Entry, EntrySet, ImplementationId, MergeOutcome, ResourcePath};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Identity of an output channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(Uuid);

impl ChannelId {
    /// Create fresh random channel id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID
    #[inline]
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ChannelId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl Display for ChannelId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Accumulated entries and provenance of one resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceState {
    entries: EntrySet,
    provenance: IndexSet<ImplementationId>,
}

impl ResourceState {
    /// State seeded from a prior-pass entry set
    #[inline]
    #[must_use]
    pub fn seeded(entries: EntrySet) -> Self {
        Self {
            entries,
            provenance: IndexSet::new(),
        }
    }

    /// Merge one entry and record its contributing declaration
    pub fn merge(&mut self, entry: Entry, contributing: &ImplementationId) -> MergeOutcome {
        let outcome = self.entries.merge(entry);
        self.provenance.insert(contributing.clone());
        outcome
    }

    /// Current entries
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &EntrySet {
        &self.entries
    }

    /// Contributing declarations, in first-contribution order
    #[inline]
    #[must_use]
    pub fn provenance(&self) -> &IndexSet<ImplementationId> {
        &self.provenance
    }
}

/// One resource within a scope: `None` until first touch, then either live
/// state or the sticky failure that disabled it
type Slot = Option<Result<ResourceState, AccumulateError>>;

/// Scope lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopePhase {
    /// Accepting merges
    Accumulating,
    /// Flushed; rejects merges
    Finalized,
}

/// Outcome of finalizing a scope
#[derive(Debug, Default)]
pub struct FinalizeOutcome {
    /// Artifacts written, in path order
    pub written: Vec<ResourcePath>,
    /// Resources skipped because of an earlier conflict or read failure
    pub skipped: Vec<ResourcePath>,
    /// Write failures, one per resource
    pub errors: Vec<AccumulateError>,
}

impl FinalizeOutcome {
    /// Check if every live resource was written
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// All resource state for one output channel
pub struct ChannelScope {
    id: ChannelId,
    store: Arc<dyn ArtifactStore>,
    phase: RwLock<ScopePhase>,
    resources: DashMap<ResourcePath, Arc<Mutex<Slot>>>,
}

impl fmt::Debug for ChannelScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelScope")
            .field("id", &self.id)
            .field("phase", &*self.phase.read())
            .field("resources", &self.resources.len())
            .finish_non_exhaustive()
    }
}

impl ChannelScope {
    /// Create scope with a fresh channel id
    #[must_use]
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self::with_id(ChannelId::new(), store)
    }

    /// Create scope for a known channel
    #[must_use]
    pub fn with_id(id: ChannelId, store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            id,
            store,
            phase: RwLock::new(ScopePhase::Accumulating),
            resources: DashMap::new(),
        }
    }

    /// Channel id
    #[inline]
    #[must_use]
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Artifact store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    /// Current phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> ScopePhase {
        *self.phase.read()
    }

    /// Check if finalized
    #[inline]
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.phase() == ScopePhase::Finalized
    }

    /// Merge one entry into the resource at `path`
    ///
    /// On first touch the resource is probed for a hand-authored file
    /// (conflict) and seeded from the prior-pass artifact. Conflicts and
    /// unreadable prior artifacts are sticky: every later merge into the same
    /// resource fails with the same error without touching the store again.
    ///
    /// # Errors
    /// - [`AccumulateError::Finalized`] after [`finalize`](Self::finalize)
    /// - [`AccumulateError::Conflict`] if a hand-authored artifact exists
    /// - [`AccumulateError::Malformed`] / [`AccumulateError::Io`] if the prior
    ///   artifact cannot be read
    pub fn merge(
        &self,
        path: &ResourcePath,
        entry: Entry,
        contributing: &ImplementationId,
    ) -> Result<MergeOutcome, AccumulateError> {
        let phase = self.phase.read();
        if *phase == ScopePhase::Finalized {
            return Err(AccumulateError::Finalized { channel: self.id });
        }

        let slot = Arc::clone(
            self.resources
                .entry(path.clone())
                .or_insert_with(|| Arc::new(Mutex::new(None)))
                .value(),
        );
        let mut slot = slot.lock();

        match slot.get_or_insert_with(|| self.seed(path)) {
            Ok(state) => {
                let id = entry.id().clone();
                let outcome = state.merge(entry, contributing);
                tracing::debug!(
                    "Merged {} into {} on channel {} ({} superseded)",
                    id,
                    path,
                    self.id,
                    outcome.superseded.len()
                );
                Ok(outcome)
            }
            Err(err) => Err(err.clone()),
        }
    }

    fn seed(&self, path: &ResourcePath) -> Result<ResourceState, AccumulateError> {
        let seeded = self.load_initial(path);
        if let Err(err) = &seeded {
            tracing::warn!("Resource {} disabled on channel {}: {}", path, self.id, err);
        }
        seeded
    }

    fn load_initial(&self, path: &ResourcePath) -> Result<ResourceState, AccumulateError> {
        let io = |source| AccumulateError::Io {
            path: path.clone(),
            source,
        };

        if let Some(location) = self.store.probe_source(path).map_err(io)? {
            return Err(AccumulateError::Conflict {
                path: path.clone(),
                location,
            });
        }

        let Some(text) = self.store.read_output(path).map_err(io)? else {
            return Ok(ResourceState::default());
        };

        let entries = codec::parse(&text).map_err(|source| AccumulateError::Malformed {
            path: path.clone(),
            source,
        })?;
        tracing::debug!("Seeded {} with {} entries from prior output", path, entries.len());
        Ok(ResourceState::seeded(entries))
    }

    /// Entries of a resource in the total order, if the resource is live
    #[must_use]
    pub fn entries(&self, path: &ResourcePath) -> Option<Vec<Entry>> {
        self.with_state(path, |state| {
            state.entries().sorted().into_iter().cloned().collect()
        })
    }

    /// Contributing declarations of a resource, if the resource is live
    #[must_use]
    pub fn provenance(&self, path: &ResourcePath) -> Option<Vec<ImplementationId>> {
        self.with_state(path, |state| state.provenance().iter().cloned().collect())
    }

    /// Sticky failure recorded for a resource, if any
    #[must_use]
    pub fn failure(&self, path: &ResourcePath) -> Option<AccumulateError> {
        let slot = Arc::clone(self.resources.get(path)?.value());
        let guard = slot.lock();
        (*guard).as_ref()?.as_ref().err().cloned()
    }

    fn with_state<R>(&self, path: &ResourcePath, f: impl FnOnce(&ResourceState) -> R) -> Option<R> {
        let slot = Arc::clone(self.resources.get(path)?.value());
        let guard = slot.lock();
        (*guard).as_ref()?.as_ref().ok().map(f)
    }

    /// Resource paths touched so far, sorted
    #[must_use]
    pub fn resource_paths(&self) -> Vec<ResourcePath> {
        let mut paths: Vec<_> = self.resources.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    /// Write every live resource and clear all state
    ///
    /// Resources are written in path order; a failed write is collected and
    /// the remaining resources are still attempted. The scope moves to
    /// [`ScopePhase::Finalized`] and its state is cleared regardless of
    /// failures. Calling this again is a no-op.
    pub fn finalize(&self) -> FinalizeOutcome {
        let mut phase = self.phase.write();
        if *phase == ScopePhase::Finalized {
            return FinalizeOutcome::default();
        }
        *phase = ScopePhase::Finalized;

        let mut slots: Vec<(ResourcePath, Arc<Mutex<Slot>>)> = self
            .resources
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();
        self.resources.clear();
        slots.sort_by(|a, b| a.0.cmp(&b.0));

        let mut outcome = FinalizeOutcome::default();
        for (path, slot) in slots {
            let taken = slot.lock().take();
            match taken {
                Some(Ok(state)) => match self.flush(&path, &state) {
                    Ok(()) => outcome.written.push(path),
                    Err(err) => {
                        tracing::error!("Failed to write {}: {}", path, err);
                        outcome.errors.push(err);
                    }
                },
                Some(Err(_)) => outcome.skipped.push(path),
                None => {}
            }
        }

        tracing::debug!(
            "Flushed channel {}: {} written, {} skipped, {} failed",
            self.id,
            outcome.written.len(),
            outcome.skipped.len(),
            outcome.errors.len()
        );
        outcome
    }

    fn flush(&self, path: &ResourcePath, state: &ResourceState) -> Result<(), AccumulateError> {
        let contents = codec::render(state.entries());
        let provenance: Vec<_> = state.provenance().iter().cloned().collect();
        self.store
            .write_output(path, &contents, &provenance)
            .map_err(|source| AccumulateError::Io {
                path: path.clone(),
                source,
            })
    }
}
