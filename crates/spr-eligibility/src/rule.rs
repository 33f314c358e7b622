//! Structural eligibility rules
//!
//! Each rule is an independent predicate over a [`Declaration`]. The default
//! rule set checks, in order: concrete class kind, no enclosing instance,
//! public visibility, not abstract, public zero-argument constructor.

use spr_model::{
    AnnotationRef, Capability, Declaration, DeclarationKind, Diagnostic, DiagnosticLocation,
    ImplementationId,
};
use std::fmt::Debug;
use std::sync::Arc;

/// Predicate a candidate must satisfy to be registered
pub trait EligibilityRule: Send + Sync + Debug {
    /// Rule name (for logging)
    fn name(&self) -> &'static str;

    /// Check one declaration
    ///
    /// # Errors
    /// Returns the reason the declaration is not eligible.
    fn check(&self, declaration: &Declaration) -> Result<(), Ineligible>;
}

/// Why a candidate was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Ineligible {
    /// Not a class
    #[error("{id} is not applicable to a {kind}")]
    NotApplicable {
        /// Candidate
        id: ImplementationId,
        /// Actual kind
        kind: DeclarationKind,
    },

    /// Nested declaration that needs an enclosing instance
    #[error("{id} must be static")]
    RequiresEnclosingInstance {
        /// Candidate
        id: ImplementationId,
    },

    /// Not publicly visible
    #[error("{id} must be public")]
    NotPublic {
        /// Candidate
        id: ImplementationId,
    },

    /// Declared abstract
    #[error("{id} must not be abstract")]
    Abstract {
        /// Candidate
        id: ImplementationId,
    },

    /// No public zero-argument constructor
    #[error("{id} must have a public no-argument constructor")]
    MissingNoArgConstructor {
        /// Candidate
        id: ImplementationId,
    },

    /// Not assignable to the capability type
    #[error("{id} is not assignable to {capability}")]
    NotAssignable {
        /// Candidate
        id: ImplementationId,
        /// Declared capability
        capability: Capability,
    },
}

impl Ineligible {
    /// Build the diagnostic reported for this rejection
    ///
    /// Assignability failures point at the `service` attribute of the
    /// registering annotation; every other failure points at the candidate.
    #[must_use]
    pub fn to_diagnostic(&self, declaration: &Declaration, annotation: &AnnotationRef) -> Diagnostic {
        match self {
            Self::NotApplicable { kind, .. } => {
                Diagnostic::error(format!("@{annotation} is not applicable to a {kind}"))
                    .at(declaration_location(declaration))
            }
            Self::NotAssignable { .. } => Diagnostic::error(self.to_string()).at(
                DiagnosticLocation::Attribute {
                    declaration: declaration.id.clone(),
                    source: declaration.location.clone(),
                    annotation: annotation.clone(),
                    attribute: "service".to_string(),
                },
            ),
            _ => Diagnostic::error(self.to_string()).at(declaration_location(declaration)),
        }
    }
}

fn declaration_location(declaration: &Declaration) -> DiagnosticLocation {
    DiagnosticLocation::Declaration {
        declaration: declaration.id.clone(),
        source: declaration.location.clone(),
    }
}

/// Candidate must be a class
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcreteKind;

impl EligibilityRule for ConcreteKind {
    fn name(&self) -> &'static str {
        "concrete-kind"
    }

    fn check(&self, declaration: &Declaration) -> Result<(), Ineligible> {
        match declaration.kind {
            DeclarationKind::Class => Ok(()),
            kind => Err(Ineligible::NotApplicable {
                id: declaration.id.clone(),
                kind,
            }),
        }
    }
}

/// Nested candidates must not need an enclosing instance
#[derive(Debug, Clone, Copy, Default)]
pub struct Standalone;

impl EligibilityRule for Standalone {
    fn name(&self) -> &'static str {
        "standalone"
    }

    fn check(&self, declaration: &Declaration) -> Result<(), Ineligible> {
        if declaration.nesting.requires_enclosing_instance() {
            return Err(Ineligible::RequiresEnclosingInstance {
                id: declaration.id.clone(),
            });
        }
        Ok(())
    }
}

/// Candidate must be public
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicVisibility;

impl EligibilityRule for PublicVisibility {
    fn name(&self) -> &'static str {
        "public"
    }

    fn check(&self, declaration: &Declaration) -> Result<(), Ineligible> {
        if !declaration.visibility.is_public() {
            return Err(Ineligible::NotPublic {
                id: declaration.id.clone(),
            });
        }
        Ok(())
    }
}

/// Candidate must not be abstract
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAbstract;

impl EligibilityRule for NotAbstract {
    fn name(&self) -> &'static str {
        "not-abstract"
    }

    fn check(&self, declaration: &Declaration) -> Result<(), Ineligible> {
        if declaration.is_abstract {
            return Err(Ineligible::Abstract {
                id: declaration.id.clone(),
            });
        }
        Ok(())
    }
}

/// Candidate must expose a public zero-argument constructor
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicNoArgConstructor;

impl EligibilityRule for PublicNoArgConstructor {
    fn name(&self) -> &'static str {
        "public-no-arg-constructor"
    }

    fn check(&self, declaration: &Declaration) -> Result<(), Ineligible> {
        if declaration
            .effective_constructors()
            .iter()
            .any(|c| c.is_public_no_arg())
        {
            Ok(())
        } else {
            Err(Ineligible::MissingNoArgConstructor {
                id: declaration.id.clone(),
            })
        }
    }
}

/// Check assignability to a capability type
///
/// # Errors
/// Returns [`Ineligible::NotAssignable`] when the declaration does not list
/// the capability among its supertypes.
pub fn check_assignable(declaration: &Declaration, capability: &Capability) -> Result<(), Ineligible> {
    if declaration.is_assignable_to(capability) {
        Ok(())
    } else {
        Err(Ineligible::NotAssignable {
            id: declaration.id.clone(),
            capability: capability.clone(),
        })
    }
}

/// Default rule set, in evaluation order
#[must_use]
pub fn default_rules() -> Vec<Arc<dyn EligibilityRule>> {
    vec![
        Arc::new(ConcreteKind),
        Arc::new(Standalone),
        Arc::new(PublicVisibility),
        Arc::new(NotAbstract),
        Arc::new(PublicNoArgConstructor),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use spr_model::{Constructor, Nesting, Visibility};

    fn id(s: &str) -> ImplementationId {
        ImplementationId::new(s).unwrap()
    }

    fn decl() -> Declaration {
        Declaration::class(id("org.acme.Impl")).at("org/acme/Impl.java", 12)
    }

    #[test]
    fn default_rules_accept_plain_class() {
        let d = decl();
        for rule in default_rules() {
            assert!(rule.check(&d).is_ok(), "rule {} rejected", rule.name());
        }
    }

    #[test]
    fn concrete_kind_rejects_interface() {
        let mut d = decl();
        d.kind = DeclarationKind::Interface;
        assert!(matches!(
            ConcreteKind.check(&d),
            Err(Ineligible::NotApplicable { kind: DeclarationKind::Interface, .. })
        ));
    }

    #[test]
    fn standalone_rejects_inner_class() {
        let mut d = decl();
        d.nesting = Nesting::Nested {
            enclosing: id("org.acme.Outer"),
            is_static: false,
        };
        assert!(Standalone.check(&d).is_err());

        d.nesting = Nesting::Nested {
            enclosing: id("org.acme.Outer"),
            is_static: true,
        };
        assert!(Standalone.check(&d).is_ok());
    }

    #[test]
    fn public_rule() {
        let mut d = decl();
        d.visibility = Visibility::Package;
        assert_eq!(
            PublicVisibility.check(&d).unwrap_err().to_string(),
            "org.acme.Impl must be public"
        );
    }

    #[test]
    fn abstract_rule() {
        let mut d = decl();
        d.is_abstract = true;
        assert!(matches!(NotAbstract.check(&d), Err(Ineligible::Abstract { .. })));
    }

    #[test]
    fn constructor_rule() {
        let mut d = decl();
        d.constructors = vec![Constructor {
            visibility: Visibility::Public,
            arity: 2,
        }];
        assert!(PublicNoArgConstructor.check(&d).is_err());

        d.constructors.push(Constructor {
            visibility: Visibility::Private,
            arity: 0,
        });
        assert!(PublicNoArgConstructor.check(&d).is_err());

        d.constructors.push(Constructor::public_no_arg());
        assert!(PublicNoArgConstructor.check(&d).is_ok());
    }

    #[test]
    fn assignability_diagnostic_points_at_service_attribute() {
        let d = decl();
        let cap = Capability::new(id("org.acme.Codec"));
        let err = check_assignable(&d, &cap).unwrap_err();
        let diag = err.to_diagnostic(&d, &AnnotationRef::new("ServiceProvider"));

        assert_eq!(diag.message, "org.acme.Impl is not assignable to org.acme.Codec");
        assert!(matches!(
            diag.location,
            Some(DiagnosticLocation::Attribute { ref attribute, .. }) if attribute == "service"
        ));
    }

    #[test]
    fn not_applicable_diagnostic_names_annotation() {
        let mut d = decl();
        d.kind = DeclarationKind::Enum;
        let err = ConcreteKind.check(&d).unwrap_err();
        let diag = err.to_diagnostic(&d, &AnnotationRef::new("ServiceProvider"));
        assert_eq!(diag.message, "@ServiceProvider is not applicable to a enum");
    }
}
