//! SPR Core - Service Provider Registration engine
//!
//! Collects "register implementation X under capability C" requests across
//! the passes of a build, validates each candidate, merges entries with the
//! registrations earlier passes produced, and writes one consolidated registry
//! artifact per resource path when the build's terminal pass arrives.
//!
//! # Architecture
//!
//! ```text
//! BuildSession
//!   ├── channels: ChannelId -> ChannelScope   (spr-accumulator)
//!   └── RegistrationEngine
//!         ├── resource path derivation        (EngineConfig.layout)
//!         ├── EligibilityValidator            (spr-eligibility)
//!         └── DiagnosticsSink                 (spr-model)
//! ```
//!
//! # Example
//!
//! ```rust
//! use spr_accumulator::MemoryArtifactStore;
//! use spr_core::{BuildSession, EngineConfig, Pass, RegistrationEngine, RegistrationRequest};
//! use spr_model::{Capability, CollectingSink, Declaration, ImplementationId};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(CollectingSink::new());
//! let store = Arc::new(MemoryArtifactStore::new());
//! let engine = RegistrationEngine::new(&EngineConfig::default(), sink.clone())?;
//! let session = BuildSession::new(engine, store.clone());
//!
//! let codec = Capability::new(ImplementationId::new("org.acme.Codec")?);
//! let fast = Declaration::class(ImplementationId::new("org.acme.Fast")?).implementing(&codec);
//!
//! let channel = session.open_channel();
//! session.process(channel, &Pass::new().with_request(RegistrationRequest::new(fast, codec)))?;
//! session.process(channel, &Pass::terminal())?;
//!
//! let path = "META-INF/services/org.acme.Codec".parse()?;
//! assert_eq!(store.output(&path).as_deref(), Some("org.acme.Fast\n"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod engine;
pub mod error;
pub mod request;
pub mod session;

// Re-exports
pub use config::{EngineConfig, LayoutConfig, StoreConfig};
pub use engine::{FinalizeReport, RegistrationEngine, RegistrationOutcome};
pub use error::{ConfigError, SessionError};
pub use request::{Pass, RegistrationRequest, DEFAULT_ANNOTATION};
pub use session::{BuildSession, PassReport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
