//! Build sessions
//!
//! A [`BuildSession`] drives the pass protocol for any number of output
//! channels. Each channel owns one [`ChannelScope`]; channels never see each
//! other's registrations.
//!
//! ```text
//! open_channel ──▶ process(pass 1) ──▶ process(pass 2) ... ──▶ process(terminal)
//!                                                                  │
//!                                                      finalize + release scope
//! ```
//!
//! Channels opened on the default store share one memo of hand-authored file
//! probes, so a conflicted resource is probed once per build whichever
//! channel touches it first. [`finish`](BuildSession::finish) finalizes
//! whatever channels are still open and resets the engine's memoization and
//! the probe memo, so the next session starts from empty state.

use crate::config::EngineConfig;
use crate::engine::{FinalizeReport, RegistrationEngine, RegistrationOutcome};
use crate::error::{ConfigError, SessionError};
use crate::request::{Pass, RegistrationRequest};
use dashmap::DashMap;
use spr_accumulator::{ArtifactStore, ChannelId, ChannelScope, ProbeCachingStore};
use spr_model::DiagnosticsSink;
use std::sync::Arc;

/// Summary of one processed pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Whether the pass was processed (`false` when the host raised errors)
    pub handled: bool,
    /// Registrations merged
    pub accepted: usize,
    /// Registrations rejected by validation
    pub rejected: usize,
    /// Registrations dropped for a bad path, conflict or unreadable resource
    pub failed: usize,
    /// Finalization summary, for the terminal pass
    pub finalized: Option<FinalizeReport>,
}

impl PassReport {
    fn record(&mut self, outcome: &RegistrationOutcome) {
        match outcome {
            RegistrationOutcome::Registered { .. } => self.accepted += 1,
            RegistrationOutcome::Rejected(_) => self.rejected += 1,
            RegistrationOutcome::InvalidPath(_) | RegistrationOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Multi-pass, multi-channel build session
#[derive(Debug)]
pub struct BuildSession {
    engine: RegistrationEngine,
    default_store: Arc<ProbeCachingStore>,
    scopes: DashMap<ChannelId, Arc<ChannelScope>>,
}

impl BuildSession {
    /// Create session; channels opened without a store use `default_store`
    #[must_use]
    pub fn new(engine: RegistrationEngine, default_store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            engine,
            default_store: Arc::new(ProbeCachingStore::new(default_store)),
            scopes: DashMap::new(),
        }
    }

    /// Create session backed by the filesystem store described in `config`
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidLayout`] if the layout is invalid.
    pub fn from_config(config: &EngineConfig, sink: Arc<dyn DiagnosticsSink>) -> Result<Self, ConfigError> {
        let engine = RegistrationEngine::new(config, sink)?;
        Ok(Self::new(engine, Arc::new(config.fs_store())))
    }

    /// Registration engine
    #[inline]
    #[must_use]
    pub fn engine(&self) -> &RegistrationEngine {
        &self.engine
    }

    /// Open a channel on the default store
    pub fn open_channel(&self) -> ChannelId {
        self.open_channel_with(Arc::clone(&self.default_store) as Arc<dyn ArtifactStore>)
    }

    /// Open a channel on its own store
    ///
    /// The store is used as given; its probes are not shared with other
    /// channels.
    pub fn open_channel_with(&self, store: Arc<dyn ArtifactStore>) -> ChannelId {
        let scope = Arc::new(ChannelScope::new(store));
        let id = scope.id();
        self.scopes.insert(id, scope);
        tracing::debug!("Opened channel {}", id);
        id
    }

    /// Scope of an open channel
    #[must_use]
    pub fn scope(&self, channel: ChannelId) -> Option<Arc<ChannelScope>> {
        self.scopes.get(&channel).map(|s| Arc::clone(s.value()))
    }

    /// Open channels, sorted
    #[must_use]
    pub fn channels(&self) -> Vec<ChannelId> {
        let mut ids: Vec<_> = self.scopes.iter().map(|e| *e.key()).collect();
        ids.sort();
        ids
    }

    fn require(&self, channel: ChannelId) -> Result<Arc<ChannelScope>, SessionError> {
        self.scope(channel).ok_or(SessionError::UnknownChannel(channel))
    }

    /// Register one request on an open channel
    ///
    /// Safe to call from several threads at once, including for the same
    /// channel.
    ///
    /// # Errors
    /// Returns [`SessionError::UnknownChannel`] if the channel is not open.
    pub fn register(
        &self,
        channel: ChannelId,
        request: &RegistrationRequest,
    ) -> Result<RegistrationOutcome, SessionError> {
        let scope = self.require(channel)?;
        Ok(self.engine.register(&scope, request))
    }

    /// Process one pass on an open channel
    ///
    /// A pass with host errors is skipped entirely. Requests of any other pass
    /// are registered in order; a terminal pass then finalizes the channel and
    /// releases it.
    ///
    /// # Errors
    /// Returns [`SessionError::UnknownChannel`] if the channel is not open.
    pub fn process(&self, channel: ChannelId, pass: &Pass) -> Result<PassReport, SessionError> {
        let scope = self.require(channel)?;
        let mut report = PassReport::default();

        if pass.error_raised {
            tracing::warn!("Skipping pass on channel {}: host reported errors", channel);
            return Ok(report);
        }
        report.handled = true;

        for request in &pass.requests {
            let outcome = self.engine.register(&scope, request);
            report.record(&outcome);
        }
        tracing::debug!(
            "Pass on channel {}: {} accepted, {} rejected, {} failed",
            channel,
            report.accepted,
            report.rejected,
            report.failed
        );

        if pass.processing_over {
            report.finalized = Some(self.finalize_channel(channel)?);
        }
        Ok(report)
    }

    /// Finalize an open channel and release it
    ///
    /// # Errors
    /// Returns [`SessionError::UnknownChannel`] if the channel is not open.
    pub fn finalize_channel(&self, channel: ChannelId) -> Result<FinalizeReport, SessionError> {
        let (_, scope) = self
            .scopes
            .remove(&channel)
            .ok_or(SessionError::UnknownChannel(channel))?;
        Ok(self.engine.finalize(&scope))
    }

    /// Finalize every open channel and reset for the next session
    pub fn finish(&self) -> Vec<FinalizeReport> {
        let reports: Vec<_> = self
            .channels()
            .into_iter()
            .filter_map(|channel| self.finalize_channel(channel).ok())
            .collect();
        self.scopes.clear();
        self.engine.reset();
        self.default_store.clear();
        tracing::info!("Build session finished: {} channels finalized", reports.len());
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use spr_accumulator::MemoryArtifactStore;
    use spr_model::{CollectingSink, ResourcePath};
    use spr_test_utils::{capability, non_public_provider, provider};

    fn setup() -> (Arc<CollectingSink>, Arc<MemoryArtifactStore>, BuildSession) {
        let sink = Arc::new(CollectingSink::new());
        let store = Arc::new(MemoryArtifactStore::new());
        let engine = RegistrationEngine::new(&EngineConfig::default(), sink.clone()).unwrap();
        (sink, store.clone(), BuildSession::new(engine, store))
    }

    fn codec_path() -> ResourcePath {
        "META-INF/services/org.acme.Codec".parse().unwrap()
    }

    fn request(name: &str) -> RegistrationRequest {
        let cap = capability("org.acme.Codec");
        RegistrationRequest::new(provider(name, &cap), cap)
    }

    #[test]
    fn pass_report_counts() {
        let (_sink, _store, session) = setup();
        let channel = session.open_channel();
        let cap = capability("org.acme.Codec");

        let pass = Pass::new()
            .with_request(request("org.acme.A"))
            .with_request(RegistrationRequest::new(non_public_provider("org.acme.B", &cap), cap))
            .with_request(request("org.acme.C").in_group("a//b"));

        let report = session.process(channel, &pass).unwrap();
        assert!(report.handled);
        assert_eq!((report.accepted, report.rejected, report.failed), (1, 1, 1));
        assert!(report.finalized.is_none());
    }

    #[test]
    fn errored_pass_is_skipped() {
        let (_sink, store, session) = setup();
        let channel = session.open_channel();

        let report = session
            .process(channel, &Pass::new().with_request(request("org.acme.A")).with_error_raised())
            .unwrap();
        assert!(!report.handled);
        assert_eq!(report.accepted, 0);

        session.process(channel, &Pass::terminal()).unwrap();
        assert_eq!(store.output(&codec_path()), None);
    }

    #[test]
    fn terminal_pass_finalizes_and_releases() {
        let (_sink, store, session) = setup();
        let channel = session.open_channel();

        session
            .process(channel, &Pass::new().with_request(request("org.acme.A")))
            .unwrap();
        let report = session.process(channel, &Pass::terminal()).unwrap();

        let finalized = report.finalized.unwrap();
        assert_eq!(finalized.written, vec![codec_path()]);
        assert_eq!(store.output(&codec_path()).as_deref(), Some("org.acme.A\n"));
        assert!(session.channels().is_empty());
        assert!(matches!(
            session.process(channel, &Pass::new()),
            Err(SessionError::UnknownChannel(_))
        ));
    }

    #[test]
    fn channels_are_isolated() {
        let (_sink, _store, session) = setup();
        let first_store = Arc::new(MemoryArtifactStore::new());
        let second_store = Arc::new(MemoryArtifactStore::new());
        let first = session.open_channel_with(first_store.clone());
        let second = session.open_channel_with(second_store.clone());

        session.register(first, &request("org.acme.A")).unwrap();
        session.register(second, &request("org.acme.B")).unwrap();
        session.finish();

        assert_eq!(first_store.output(&codec_path()).as_deref(), Some("org.acme.A\n"));
        assert_eq!(second_store.output(&codec_path()).as_deref(), Some("org.acme.B\n"));
    }

    #[test]
    fn finish_finalizes_open_channels_and_resets_validator() {
        let (sink, _store, session) = setup();
        let channel = session.open_channel();
        let cap = capability("org.acme.Codec");
        let bad = RegistrationRequest::new(non_public_provider("org.acme.Bad", &cap), cap);

        session.register(channel, &bad).unwrap();
        let reports = session.finish();
        assert_eq!(reports.len(), 1);
        assert_eq!(session.engine().validator().stats().structural_evaluations, 1);

        let next = session.open_channel();
        session.register(next, &bad).unwrap();
        assert_eq!(sink.error_count(), 2);
        assert_eq!(session.engine().validator().stats().structural_evaluations, 2);
    }

    #[test]
    fn conflict_probed_once_across_channels() {
        let (sink, store, session) = setup();
        store.add_source(codec_path(), "org.acme.Manual\n");

        let first = session.open_channel();
        let second = session.open_channel();
        session.register(first, &request("org.acme.A")).unwrap();
        session.register(second, &request("org.acme.B")).unwrap();
        session.register(second, &request("org.acme.C")).unwrap();

        assert_eq!(store.stats().probes, 1);
        assert_eq!(sink.error_count(), 1);

        session.finish();
        assert_eq!(store.output(&codec_path()), None);

        // The next session probes again.
        let next = session.open_channel();
        session.register(next, &request("org.acme.A")).unwrap();
        assert_eq!(store.stats().probes, 2);
    }

    #[test]
    fn concurrent_producers_on_one_channel() {
        let (_sink, store, session) = setup();
        let channel = session.open_channel();

        std::thread::scope(|s| {
            for t in 0..4 {
                let session = &session;
                s.spawn(move || {
                    for n in 0..10 {
                        let outcome = session.register(channel, &request(&format!("org.acme.T{t}N{n}")));
                        assert!(outcome.unwrap().is_registered());
                    }
                });
            }
        });

        session.finalize_channel(channel).unwrap();
        let text = store.output(&codec_path()).unwrap();
        assert_eq!(text.lines().count(), 40);
    }
}
