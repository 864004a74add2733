//! Session lifecycle: visit, activity, heartbeat, end and inactivity sweep.

use chrono::{DateTime, Utc};
use ledger::Ledger;
use providers::{Completion, CompletionRequest, GeoLocator};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use telemetry::metrics;
use tracing::{debug, info, warn};
use tracker_core::{
    parse_client_ip, ActivityUpdate, EndReason, ExcludedNetworks, GeoLocation, Origin, Result,
    Session, SessionRegistry, VisitRequest,
};

use crate::config::TrackerConfig;
use crate::enrichment::DeviceEnricher;
use crate::notifications::{Notification, Notifier};
use crate::prompts::{analysis_prompt, analysis_system_prompt, fallback_analysis};

/// Result of an explicit end call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOutcome {
    pub ok: bool,
    pub analysis: Option<String>,
}

impl EndOutcome {
    fn not_found() -> Self {
        Self {
            ok: false,
            analysis: None,
        }
    }
}

/// Produces the end-of-session analysis.
pub struct Summarizer {
    completion: Arc<dyn Completion>,
    max_tokens: u32,
}

impl Summarizer {
    pub fn new(completion: Arc<dyn Completion>, max_tokens: u32) -> Self {
        Self {
            completion,
            max_tokens,
        }
    }

    /// Never fails: provider errors yield a locally computed summary.
    pub async fn summarize(&self, session: &Session) -> String {
        let request =
            CompletionRequest::single(analysis_system_prompt(), analysis_prompt(session), self.max_tokens);

        let start = Instant::now();
        let result = self.completion.complete(request).await;
        metrics()
            .summary_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        match result {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "Session analysis failed, using fallback");
                fallback_analysis(session)
            }
        }
    }
}

/// Owner of the live session table.
///
/// Finalization (explicit end or sweep) starts with an atomic claim on the
/// registry; only the claimant runs the analysis, alert and ledger write.
pub struct SessionTracker {
    config: TrackerConfig,
    registry: SessionRegistry,
    ledger: Arc<Ledger>,
    geo: Arc<dyn GeoLocator>,
    summarizer: Summarizer,
    notifier: Arc<Notifier>,
    enricher: DeviceEnricher,
    excluded: ExcludedNetworks,
}

impl SessionTracker {
    pub fn new(
        config: TrackerConfig,
        ledger: Arc<Ledger>,
        geo: Arc<dyn GeoLocator>,
        summarizer: Summarizer,
        notifier: Arc<Notifier>,
        excluded: ExcludedNetworks,
    ) -> Self {
        Self {
            config,
            registry: SessionRegistry::new(),
            ledger,
            geo,
            summarizer,
            notifier,
            enricher: DeviceEnricher::new(),
            excluded,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Registers a visit. Returns `None` for excluded networks.
    pub async fn start_session(&self, request: VisitRequest, client_ip: Option<String>) -> Option<String> {
        self.start_session_at(request, client_ip, Utc::now()).await
    }

    pub async fn start_session_at(
        &self,
        request: VisitRequest,
        client_ip: Option<String>,
        now: DateTime<Utc>,
    ) -> Option<String> {
        if self.excluded.is_excluded(client_ip.as_deref()) {
            metrics().sessions_excluded.inc();
            debug!(ip = ?client_ip, "Visit from excluded network, not tracked");
            return None;
        }

        let geo = self.locate(client_ip.as_deref()).await;
        let mut origin = Origin {
            ip: client_ip,
            geo,
            user_agent: request.user_agent,
            screen_size: request.screen_size,
            referrer: request.referrer.filter(|r| !r.is_empty()),
            ..Origin::default()
        };
        self.enricher.enrich(&mut origin);

        let session = Session::new(Session::generate_id(now), origin, now);
        let id = session.id.clone();
        self.registry.insert(session.clone());
        self.update_gauge();
        metrics().sessions_started.inc();

        info!(
            session_id = %id,
            location = %session.origin.geo.display(),
            device = %session.origin.device.device_type,
            "Session started"
        );

        self.write_visitor(&session).await;
        self.persist_active().await;
        self.notifier.send(Notification::visit_started(&session)).await;

        Some(id)
    }

    async fn locate(&self, client_ip: Option<&str>) -> GeoLocation {
        let Some(ip) = client_ip.and_then(parse_client_ip) else {
            return GeoLocation::unknown();
        };
        self.geo
            .locate(ip)
            .await
            .unwrap_or_else(|_| GeoLocation::unknown())
    }

    /// Applies an engagement update. Returns false for unknown sessions.
    pub async fn record_activity(&self, id: &str, update: &ActivityUpdate) -> bool {
        self.record_activity_at(id, update, Utc::now()).await
    }

    pub async fn record_activity_at(&self, id: &str, update: &ActivityUpdate, now: DateTime<Utc>) -> bool {
        let applied = self.registry.update(id, |session| {
            let outcome = session.apply_activity(update, now);
            (outcome, session.origin.geo.display())
        });

        let Some((outcome, location)) = applied else {
            metrics().unknown_session_calls.inc();
            debug!(session_id = %id, "Activity for unknown session");
            return false;
        };
        metrics().activity_updates.inc();

        if let Some(section) = outcome.first_view {
            debug!(session_id = %id, section = %section, "Section first viewed");
            if self.config.alerts_on_section(&section) {
                self.notifier
                    .send(Notification::SectionViewed {
                        session_id: id.to_string(),
                        section,
                        location,
                    })
                    .await;
            }
        }

        self.persist_active().await;
        true
    }

    /// Refreshes liveness and merges client dwell totals.
    pub async fn heartbeat(&self, id: &str, section_times: Option<&BTreeMap<String, u64>>) -> bool {
        self.heartbeat_at(id, section_times, Utc::now()).await
    }

    pub async fn heartbeat_at(
        &self,
        id: &str,
        section_times: Option<&BTreeMap<String, u64>>,
        now: DateTime<Utc>,
    ) -> bool {
        let found = self
            .registry
            .update(id, |session| {
                session.touch(now);
                if let Some(times) = section_times {
                    session.merge_section_times(times);
                }
            })
            .is_some();

        if found {
            metrics().heartbeats.inc();
            self.persist_active().await;
        } else {
            metrics().unknown_session_calls.inc();
        }
        found
    }

    /// Appends a chat exchange to a live session's transcript.
    pub async fn record_chat(&self, id: &str, question: &str, response: &str) -> bool {
        let now = Utc::now();
        let found = self
            .registry
            .update(id, |session| session.record_chat(question, response, now))
            .is_some();
        if found {
            self.persist_active().await;
        }
        found
    }

    /// Explicit end from the page. Unknown or already finalized ids are a no-op.
    pub async fn end_session(&self, id: &str, section_times: Option<&BTreeMap<String, u64>>) -> EndOutcome {
        self.end_session_at(id, section_times, Utc::now()).await
    }

    pub async fn end_session_at(
        &self,
        id: &str,
        section_times: Option<&BTreeMap<String, u64>>,
        now: DateTime<Utc>,
    ) -> EndOutcome {
        let Some(session) = self.registry.claim(id) else {
            metrics().unknown_session_calls.inc();
            debug!(session_id = %id, "End for unknown or finalized session");
            return EndOutcome::not_found();
        };

        let analysis = self
            .finalize(session, section_times, EndReason::Explicit, now)
            .await;
        EndOutcome {
            ok: true,
            analysis: Some(analysis),
        }
    }

    /// Finalizes every session idle for longer than the timeout.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Utc::now()).await
    }

    pub async fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let timeout = self.config.idle_timeout();
        let mut swept = 0;

        for id in self.registry.idle_ids(now, timeout) {
            // Activity may have arrived since the scan
            let Some(session) = self.registry.claim_if_idle(&id, now, timeout) else {
                continue;
            };
            debug!(
                session_id = %id,
                idle_secs = session.idle_for(now).num_seconds(),
                "Sweeping idle session"
            );
            self.finalize(session, None, EndReason::Inactivity, now).await;
            metrics().sessions_swept.inc();
            swept += 1;
        }

        if swept > 0 {
            info!(swept, remaining = self.registry.len(), "Inactivity sweep");
        }
        swept
    }

    async fn finalize(
        &self,
        mut session: Session,
        section_times: Option<&BTreeMap<String, u64>>,
        reason: EndReason,
        now: DateTime<Utc>,
    ) -> String {
        self.update_gauge();

        if let Some(times) = section_times {
            session.merge_section_times(times);
        }
        session.finish(now, reason);

        let analysis = self.summarizer.summarize(&session).await;
        session.analysis = Some(analysis.clone());

        self.write_visitor(&session).await;
        self.persist_active().await;
        self.notifier.send(Notification::session_ended(&session)).await;
        metrics().sessions_ended.inc();

        info!(
            session_id = %session.id,
            reason = reason.as_str(),
            duration_secs = session.duration().num_seconds(),
            max_scroll = session.max_scroll,
            sections = session.sections_viewed.len(),
            "Session finalized"
        );

        analysis
    }

    /// Reloads live sessions persisted by a previous run.
    ///
    /// Restored sessions keep their last-activity time, so the next sweep
    /// finalizes the ones that went idle while the process was down.
    pub async fn restore(&self) -> Result<usize> {
        let snapshot = self.ledger.load_active().await?;
        let mut restored = 0;
        for (_, session) in snapshot {
            if session.active && session.ended_at.is_none() && !self.registry.contains(&session.id) {
                self.registry.insert(session);
                restored += 1;
            }
        }
        self.update_gauge();
        if restored > 0 {
            info!(restored, "Restored active sessions");
        }
        Ok(restored)
    }

    /// Live sessions, oldest first.
    pub fn active_sessions(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self.registry.snapshot().into_values().collect();
        sessions.sort_by_key(|s| s.started_at);
        sessions
    }

    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    /// Writes the active-session snapshot.
    pub async fn persist_active(&self) {
        // Errors are counted and logged by the ledger
        let _ = self.ledger.save_active(|| self.registry.snapshot()).await;
    }

    async fn write_visitor(&self, session: &Session) {
        let _ = self.ledger.upsert_visitor(session).await;
    }

    fn update_gauge(&self) {
        metrics().active_sessions.set(self.registry.len() as u64);
    }
}
