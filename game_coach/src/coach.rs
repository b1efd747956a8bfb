//! Zone-entry facade wiring progress reconciliation to coaching decisions.

use std::sync::Arc;

use tracing::debug;

use crate::config::CoachConfig;
use crate::decision::{Decision, DecisionContext, SessionManager};
use crate::messages::MessageCatalog;
use crate::session::{CoachSession, MessageKind};
use zone_progress::{Clock, KeyValueStore, ProfileId, ProgressBook, ZoneGraph, ZoneId};

/// One coach per application, sharing a store and clock between the
/// progress book and the session manager.
pub struct GameCoach {
    progress: ProgressBook,
    sessions: SessionManager,
    catalog: MessageCatalog,
}

impl GameCoach {
    /// Create a coach with the default message catalog.
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, config: CoachConfig) -> Self {
        let progress = ProgressBook::new(store.clone(), config.progress_config());
        let sessions = SessionManager::new(store, clock, config);
        Self {
            progress,
            sessions,
            catalog: MessageCatalog::default(),
        }
    }

    /// Replace the message catalog.
    pub fn with_catalog(mut self, catalog: MessageCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// The progress book backing zone entry.
    pub fn progress(&self) -> &ProgressBook {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut ProgressBook {
        &mut self.progress
    }

    /// The session manager making decisions.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn catalog_mut(&mut self) -> &mut MessageCatalog {
        &mut self.catalog
    }

    /// Reconcile the zone's progress and decide whether to coach.
    ///
    /// The caller displays the message (see [`GameCoach::message_for`]) and
    /// then calls [`GameCoach::mark_shown`]; skipping that call leaves the
    /// cooldown untouched.
    pub fn enter_zone(&self, profile: &ProfileId, graph: &ZoneGraph, quick_navigation: bool) -> Decision {
        let snapshot = self.progress.snapshot(profile, graph);
        debug!(
            %profile,
            zone = %graph.zone,
            completed = snapshot.completed_count(),
            total = graph.len(),
            "entering zone"
        );

        let context = DecisionContext::new(graph.len()).with_quick_navigation(quick_navigation);
        self.sessions.decide(profile, &graph.zone, &snapshot, context)
    }

    /// Message text for a decision, addressed to `display_name`.
    pub fn message_for(&self, decision: &Decision, display_name: &str) -> Option<String> {
        self.catalog.get_message(decision, display_name)
    }

    /// Record that a message was displayed.
    pub fn mark_shown(&self, profile: &ProfileId, zone: &ZoneId, kind: MessageKind) {
        self.sessions.mark_shown(profile, zone, kind);
    }

    pub fn reset_session(&self, profile: &ProfileId, zone: &ZoneId) {
        self.sessions.reset_session(profile, zone);
    }

    pub fn session(&self, profile: &ProfileId, zone: &ZoneId) -> CoachSession {
        self.sessions.session(profile, zone)
    }
}
