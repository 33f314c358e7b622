//! SPR Registration Model
//!
//! Value types shared by every stage of service-registration aggregation.
//!
//! # Overview
//!
//! - [`ImplementationId`]: dotted binary name of an implementation
//! - [`Position`]: explicit rank, or unranked (after all ranked entries)
//! - [`Entry`] / [`EntrySet`]: one registry line and the per-resource merge structure
//! - [`ResourcePath`]: location of a registry artifact
//! - [`Declaration`] / [`Capability`]: explicit description of a candidate implementation
//! - [`DiagnosticsSink`]: where validation, conflict and I/O failures are reported
//! - [`codec`]: the registry line format
//!
//! # Example
//!
//! ```rust
//! use spr_model::{codec, Entry, EntrySet, ImplementationId, Position};
//!
//! let mut set = EntrySet::new();
//! set.merge(Entry::new(ImplementationId::new("org.acme.Default")?));
//! set.merge(
//!     Entry::new(ImplementationId::new("org.acme.Fast")?)
//!         .with_position(Position::Ranked(10))
//!         .superseding(ImplementationId::new("org.acme.Default")?),
//! );
//!
//! assert_eq!(codec::render(&set), "org.acme.Fast\n#position=10\n#-org.acme.Default\n");
//! # Ok::<(), spr_model::ModelError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod codec;
pub mod declaration;
pub mod diagnostics;
pub mod entry;
pub mod error;
pub mod id;
pub mod path;
pub mod position;

// Re-exports
pub use declaration::{
    AnnotationRef, Capability, Constructor, Declaration, DeclarationKind, Nesting, SourceLocation,
    Visibility,
};
pub use diagnostics::{
    CollectingSink, Diagnostic, DiagnosticLocation, DiagnosticsSink, FanoutSink, Severity,
    TracingSink,
};
pub use entry::{Entry, EntrySet, MergeOutcome};
pub use error::{LineFormatError, ModelError};
pub use id::ImplementationId;
pub use path::ResourcePath;
pub use position::Position;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with registration values
    pub use crate::{
        Capability, Declaration, Diagnostic, DiagnosticsSink, Entry, EntrySet, ImplementationId,
        Position, ResourcePath,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
