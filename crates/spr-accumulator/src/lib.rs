//! SPR Resource Accumulator
//!
//! Gathers registry entries per output channel and per resource path, seeds
//! each resource from the artifact an earlier pass wrote, and flushes
//! everything on finalization.
//!
//! # Architecture
//!
//! ```text
//! ChannelScope ──merge──▶ slot (per ResourcePath, own mutex)
//!      │                        │ first touch
//!      │                        ▼
//!      │               ArtifactStore::probe_source / read_output
//!      │
//!      └──finalize──▶ codec::render ──▶ ArtifactStore::write_output
//! ```
//!
//! # Example
//!
//! ```rust
//! use spr_accumulator::{ChannelScope, MemoryArtifactStore};
//! use spr_model::{Entry, ImplementationId, ResourcePath};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryArtifactStore::new());
//! let scope = ChannelScope::new(store.clone());
//! let path: ResourcePath = "META-INF/services/org.acme.Codec".parse()?;
//! let id = ImplementationId::new("org.acme.Fast")?;
//!
//! scope.merge(&path, Entry::new(id.clone()), &id)?;
//! scope.finalize();
//!
//! assert_eq!(store.output(&path).as_deref(), Some("org.acme.Fast\n"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod fs;
pub mod memory;
pub mod probe;
pub mod scope;
pub mod store;

pub use error::{AccumulateError, StoreError};
pub use fs::{FsArtifactStore, DEPINFO_SUFFIX};
pub use memory::{MemoryArtifactStore, StoreStats};
pub use probe::ProbeCachingStore;
pub use scope::{ChannelId, ChannelScope, FinalizeOutcome, ResourceState, ScopePhase};
pub use store::ArtifactStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
