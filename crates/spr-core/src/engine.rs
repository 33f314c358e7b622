//! Registration engine
//!
//! Routes a [`RegistrationRequest`] through the three stages of a
//! registration:
//!
//! 1. derive the resource path from capability and group
//! 2. validate the candidate (memoized, reported once)
//! 3. merge the entry into the channel scope
//!
//! Every failure becomes a diagnostic; nothing here panics or aborts a build.

use crate::config::EngineConfig;
use crate::error::ConfigError;
use crate::request::RegistrationRequest;
use dashmap::DashSet;
use spr_accumulator::{AccumulateError, ChannelId, ChannelScope};
use spr_eligibility::{EligibilityValidator, Ineligible, Verdict};
use spr_model::{
    Capability, Declaration, Diagnostic, DiagnosticLocation, DiagnosticsSink, Entry, MergeOutcome,
    ModelError, ResourcePath,
};
use std::fmt;
use std::sync::Arc;

/// What happened to one registration
#[derive(Debug, Clone)]
pub enum RegistrationOutcome {
    /// Entry merged into the resource
    Registered {
        /// Resource the entry landed in
        path: ResourcePath,
        /// Superseded and replaced entries
        merge: MergeOutcome,
    },
    /// Candidate failed eligibility
    Rejected(Ineligible),
    /// Resource path could not be derived from the group
    InvalidPath(ModelError),
    /// Resource is conflicted or unreadable, or the scope is finalized
    Failed(AccumulateError),
}

impl RegistrationOutcome {
    /// Check if the entry was merged
    #[inline]
    #[must_use]
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered { .. })
    }

    /// Check if the candidate was rejected by validation
    #[inline]
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Summary of finalizing one channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizeReport {
    /// Channel finalized
    pub channel: Option<ChannelId>,
    /// Artifacts written, in path order
    pub written: Vec<ResourcePath>,
    /// Resources never written because of a conflict or unreadable prior artifact
    pub skipped: Vec<ResourcePath>,
    /// Resources whose write failed
    pub failed: Vec<ResourcePath>,
}

impl FinalizeReport {
    /// Check if every live resource was written
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Registration engine
pub struct RegistrationEngine {
    services_root: ResourcePath,
    named_services_root: ResourcePath,
    validator: EligibilityValidator,
    sink: Arc<dyn DiagnosticsSink>,
    /// Resource failures already reported, so a sticky failure is reported
    /// once per channel rather than once per dropped registration
    reported: DashSet<(ChannelId, ResourcePath)>,
    /// Hand-authored files already reported; a conflict is reported once per
    /// build however many channels hit it
    conflicts: DashSet<(ResourcePath, String)>,
}

impl fmt::Debug for RegistrationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationEngine")
            .field("services_root", &self.services_root)
            .field("named_services_root", &self.named_services_root)
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}

impl RegistrationEngine {
    /// Create engine with the default rule set
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidLayout`] if a layout directory is not a
    /// valid resource path.
    pub fn new(config: &EngineConfig, sink: Arc<dyn DiagnosticsSink>) -> Result<Self, ConfigError> {
        let validator = EligibilityValidator::new(Arc::clone(&sink));
        Self::with_validator(config, validator, sink)
    }

    /// Create engine around a preconfigured validator
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidLayout`] if a layout directory is not a
    /// valid resource path.
    pub fn with_validator(
        config: &EngineConfig,
        validator: EligibilityValidator,
        sink: Arc<dyn DiagnosticsSink>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            services_root: config.layout.services_root()?,
            named_services_root: config.layout.named_services_root()?,
            validator,
            sink,
            reported: DashSet::new(),
            conflicts: DashSet::new(),
        })
    }

    /// Eligibility validator
    #[inline]
    #[must_use]
    pub fn validator(&self) -> &EligibilityValidator {
        &self.validator
    }

    /// Diagnostics sink
    #[inline]
    #[must_use]
    pub fn sink(&self) -> &Arc<dyn DiagnosticsSink> {
        &self.sink
    }

    /// Resource path for a capability in a group
    ///
    /// The default group (`""`) maps to `<services_dir>/<capability>`; any
    /// other group to `<named_services_dir>/<group>/<capability>`. A group may
    /// span several `/`-separated segments.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidResourcePath`] if the group contains an
    /// empty, `.` or `..` segment.
    pub fn resource_path_for(&self, capability: &Capability, group: &str) -> Result<ResourcePath, ModelError> {
        if group.is_empty() {
            return self.services_root.child(capability.name().as_str());
        }
        group
            .split('/')
            .try_fold(self.named_services_root.clone(), |path, segment| path.child(segment))?
            .child(capability.name().as_str())
    }

    /// Register one request into `scope`
    pub fn register(&self, scope: &ChannelScope, request: &RegistrationRequest) -> RegistrationOutcome {
        let declaration = &request.declaration;

        let path = match self.resource_path_for(&request.capability, &request.group) {
            Ok(path) => path,
            Err(err) => {
                self.sink.report(
                    Diagnostic::error(format!("invalid group {:?}: {err}", request.group)).at(
                        DiagnosticLocation::Attribute {
                            declaration: declaration.id.clone(),
                            source: declaration.location.clone(),
                            annotation: request.annotation.clone(),
                            attribute: "group".to_string(),
                        },
                    ),
                );
                return RegistrationOutcome::InvalidPath(err);
            }
        };

        if let Verdict::Rejected(reason) =
            self.validator.verdict(declaration, &request.capability, &request.annotation)
        {
            tracing::debug!("Registration of {} rejected: {}", declaration.id, reason);
            return RegistrationOutcome::Rejected(reason);
        }

        self.merge(scope, path, request.entry(), declaration)
    }

    /// Register `declaration` at an explicit resource path
    ///
    /// The entry is unranked and no eligibility checks run. Used for
    /// registrations whose path is not derived from a capability.
    pub fn register_at(
        &self,
        scope: &ChannelScope,
        declaration: &Declaration,
        path: &ResourcePath,
    ) -> RegistrationOutcome {
        self.merge(scope, path.clone(), Entry::new(declaration.id.clone()), declaration)
    }

    fn merge(
        &self,
        scope: &ChannelScope,
        path: ResourcePath,
        entry: Entry,
        declaration: &Declaration,
    ) -> RegistrationOutcome {
        match scope.merge(&path, entry, &declaration.id) {
            Ok(merge) => RegistrationOutcome::Registered { path, merge },
            Err(err) => {
                self.report_failure(scope.id(), &err, declaration);
                RegistrationOutcome::Failed(err)
            }
        }
    }

    fn report_failure(&self, channel: ChannelId, err: &AccumulateError, declaration: &Declaration) {
        match err.path() {
            Some(path) => {
                let first = match err {
                    AccumulateError::Conflict { location, .. } => {
                        self.conflicts.insert((path.clone(), location.clone()))
                    }
                    _ => self.reported.insert((channel, path.clone())),
                };
                if first {
                    self.sink.report(
                        Diagnostic::error(err.to_string())
                            .at(DiagnosticLocation::Resource { path: path.clone() }),
                    );
                }
            }
            None => self.sink.report(Diagnostic::error(err.to_string()).at(
                DiagnosticLocation::Declaration {
                    declaration: declaration.id.clone(),
                    source: declaration.location.clone(),
                },
            )),
        }
    }

    /// Finalize `scope`, reporting every failed write
    ///
    /// A second call on the same scope writes nothing and reports nothing.
    pub fn finalize(&self, scope: &ChannelScope) -> FinalizeReport {
        let already = scope.is_finalized();
        let outcome = scope.finalize();
        self.reported.retain(|(channel, _)| *channel != scope.id());

        let mut failed = Vec::with_capacity(outcome.errors.len());
        for err in &outcome.errors {
            let location = err
                .path()
                .map(|path| DiagnosticLocation::Resource { path: path.clone() });
            let mut diagnostic = Diagnostic::error(err.to_string());
            if let Some(location) = location {
                diagnostic = diagnostic.at(location);
            }
            self.sink.report(diagnostic);
            failed.extend(err.path().cloned());
        }

        if !already {
            tracing::info!(
                "Finalized channel {}: {} written, {} skipped, {} failed",
                scope.id(),
                outcome.written.len(),
                outcome.skipped.len(),
                failed.len()
            );
        }

        FinalizeReport {
            channel: Some(scope.id()),
            written: outcome.written,
            skipped: outcome.skipped,
            failed,
        }
    }

    /// Forget memoized verdicts and reported failures (end of a session)
    pub fn reset(&self) {
        self.validator.clear();
        self.reported.clear();
        self.conflicts.clear();
    }
}
