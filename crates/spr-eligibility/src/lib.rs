//! SPR Eligibility
//!
//! Decides whether a candidate implementation may be registered.
//!
//! # Core Concepts
//!
//! - [`EligibilityRule`]: structural predicate over a [`Declaration`](spr_model::Declaration)
//! - [`default_rules`]: concrete class, standalone, public, not abstract, public no-arg constructor
//! - [`EligibilityValidator`]: runs the rules plus assignability, memoized per candidate
//!
//! # Example
//!
//! ```rust
//! use spr_eligibility::EligibilityValidator;
//! use spr_model::{AnnotationRef, Capability, CollectingSink, Declaration, ImplementationId};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(CollectingSink::new());
//! let validator = EligibilityValidator::new(sink.clone());
//!
//! let codec = Capability::new(ImplementationId::new("org.acme.Codec")?);
//! let candidate = Declaration::class(ImplementationId::new("org.acme.FastCodec")?).implementing(&codec);
//!
//! assert!(validator.validate(&candidate, &codec, &AnnotationRef::new("ServiceProvider")));
//! assert_eq!(sink.error_count(), 0);
//! # Ok::<(), spr_model::ModelError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod rule;
mod validator;

// Re-exports
pub use rule::{
    check_assignable, default_rules, ConcreteKind, EligibilityRule, Ineligible, NotAbstract,
    PublicNoArgConstructor, PublicVisibility, Standalone,
};
pub use validator::{EligibilityValidator, ValidatorStats, Verdict};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
