//! Memoized eligibility validation
//!
//! [`EligibilityValidator`] runs the structural rules once per candidate and
//! the assignability check once per `(candidate, capability)` pair for the
//! lifetime of a build session. Both caches are single-flight: concurrent
//! first lookups of the same key evaluate (and report) exactly once.

use crate::rule::{check_assignable, default_rules, EligibilityRule, Ineligible};
use moka::sync::Cache;
use spr_model::{AnnotationRef, Capability, Declaration, DiagnosticsSink, ImplementationId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cached outcome of a check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Candidate passed
    Eligible,
    /// Candidate was rejected (already reported)
    Rejected(Ineligible),
}

impl Verdict {
    /// Check if the candidate passed
    #[inline]
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }

    fn from_result(result: Result<(), Ineligible>) -> Self {
        match result {
            Ok(()) => Self::Eligible,
            Err(reason) => Self::Rejected(reason),
        }
    }
}

/// Statistics for validator monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidatorStats {
    /// Structural rule evaluations actually run
    pub structural_evaluations: u64,
    /// Assignability evaluations actually run
    pub assignability_evaluations: u64,
}

/// Eligibility validator with per-build memoization
pub struct EligibilityValidator {
    rules: Vec<Arc<dyn EligibilityRule>>,
    structural: Cache<ImplementationId, Verdict>,
    assignable: Cache<(ImplementationId, ImplementationId), Verdict>,
    sink: Arc<dyn DiagnosticsSink>,
    structural_evaluations: AtomicU64,
    assignability_evaluations: AtomicU64,
}

impl fmt::Debug for EligibilityValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EligibilityValidator")
            .field("rules", &self.rules)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl EligibilityValidator {
    /// Create validator with the default rule set
    #[must_use]
    pub fn new(sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self::with_rules(default_rules(), sink)
    }

    /// Create validator with a custom rule set (evaluated in order)
    #[must_use]
    pub fn with_rules(rules: Vec<Arc<dyn EligibilityRule>>, sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            rules,
            structural: Cache::builder().name("spr-structural-verdicts").build(),
            assignable: Cache::builder().name("spr-assignability-verdicts").build(),
            sink,
            structural_evaluations: AtomicU64::new(0),
            assignability_evaluations: AtomicU64::new(0),
        }
    }

    /// Validate a candidate for registration under `capability`
    ///
    /// Returns `true` if the candidate may be registered. A rejection is
    /// reported to the diagnostics sink the first time it is computed;
    /// repeated calls return the cached verdict silently.
    pub fn validate(
        &self,
        declaration: &Declaration,
        capability: &Capability,
        annotation: &AnnotationRef,
    ) -> bool {
        self.verdict(declaration, capability, annotation).is_eligible()
    }

    /// Validate and return the full verdict
    pub fn verdict(
        &self,
        declaration: &Declaration,
        capability: &Capability,
        annotation: &AnnotationRef,
    ) -> Verdict {
        let structural = self.structural.get_with(declaration.id.clone(), || {
            self.structural_evaluations.fetch_add(1, Ordering::Relaxed);
            let verdict = Verdict::from_result(self.run_rules(declaration));
            self.report(&verdict, declaration, annotation);
            verdict
        });
        if !structural.is_eligible() {
            return structural;
        }

        let key = (declaration.id.clone(), capability.name().clone());
        self.assignable.get_with(key, || {
            self.assignability_evaluations.fetch_add(1, Ordering::Relaxed);
            let verdict = Verdict::from_result(check_assignable(declaration, capability));
            self.report(&verdict, declaration, annotation);
            verdict
        })
    }

    fn run_rules(&self, declaration: &Declaration) -> Result<(), Ineligible> {
        for rule in &self.rules {
            if let Err(reason) = rule.check(declaration) {
                tracing::debug!("Rule {} rejected {}", rule.name(), declaration.id);
                return Err(reason);
            }
        }
        Ok(())
    }

    fn report(&self, verdict: &Verdict, declaration: &Declaration, annotation: &AnnotationRef) {
        if let Verdict::Rejected(reason) = verdict {
            self.sink.report(reason.to_diagnostic(declaration, annotation));
        }
    }

    /// Evaluation counters
    #[must_use]
    pub fn stats(&self) -> ValidatorStats {
        ValidatorStats {
            structural_evaluations: self.structural_evaluations.load(Ordering::Relaxed),
            assignability_evaluations: self.assignability_evaluations.load(Ordering::Relaxed),
        }
    }

    /// Forget every cached verdict (end of a build session)
    pub fn clear(&self) {
        self.structural.invalidate_all();
        self.assignable.invalidate_all();
    }
}
