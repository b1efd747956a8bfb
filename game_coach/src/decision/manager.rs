//! The session manager: loads a session, applies the trigger rules in
//! priority order and persists the result.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use super::{
    compute_delta, CompletionData, Decision, DecisionContext, StuckData, SuppressReason,
};
use crate::config::CoachConfig;
use crate::session::{CoachSession, MessageKind};
use zone_progress::{Clock, KeyValueStore, ProfileId, ProgressSnapshot, ZoneId};

/// Decides when to coach and remembers what was shown.
///
/// `decide` always updates visit bookkeeping. `mark_shown` must be called
/// only once a message has actually been displayed; it alone feeds the
/// cooldown and the shown history.
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: CoachConfig,
    // Serializes read-modify-write of session records.
    lock: Mutex<()>,
}

impl SessionManager {
    /// Create a session manager over the given store and clock.
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, config: CoachConfig) -> Self {
        Self {
            store,
            clock,
            config,
            lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    /// Evaluate the trigger rules for a zone entry or progress event.
    pub fn decide(
        &self,
        profile: &ProfileId,
        zone: &ZoneId,
        progress: &ProgressSnapshot,
        context: DecisionContext,
    ) -> Decision {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let now = self.clock.now_ms();

        let mut session = self.load(profile, zone, now);
        session.visit_count += 1;
        session.last_visit_time = now;

        let decision = self.evaluate(&mut session, progress, context, now);
        self.persist(profile, zone, &session);

        debug!(
            %profile,
            %zone,
            session = %session.session_id,
            visit = session.visit_count,
            ?decision,
            "coach decision"
        );
        decision
    }

    /// Record that a message of `kind` was displayed.
    pub fn mark_shown(&self, profile: &ProfileId, zone: &ZoneId, kind: MessageKind) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let now = self.clock.now_ms();

        let mut session = self.load(profile, zone, now);
        session.push_shown(kind, self.config.history_limit);
        session.last_coach_time = Some(now);
        self.persist(profile, zone, &session);

        debug!(%profile, %zone, %kind, "coach message shown");
    }

    /// Delete the stored session; the next read starts fresh.
    pub fn reset_session(&self, profile: &ProfileId, zone: &ZoneId) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let key = self.config.keys.session_key(profile, zone);
        match self.store.remove(&key) {
            Ok(()) => info!(%profile, %zone, "coach session reset"),
            Err(e) => warn!(%profile, %zone, error = %e, "failed to reset coach session"),
        }
    }

    /// The session as the next call would see it. Nothing is written.
    pub fn session(&self, profile: &ProfileId, zone: &ZoneId) -> CoachSession {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.load(profile, zone, self.clock.now_ms())
    }

    fn evaluate(
        &self,
        session: &mut CoachSession,
        progress: &ProgressSnapshot,
        context: DecisionContext,
        now: i64,
    ) -> Decision {
        if session.first_visit {
            session.first_visit = false;
            session.last_progress = progress.clone();
            return Decision::Welcome;
        }

        // Achievements are never held back by the cooldown.
        if let Some(delta) = compute_delta(&session.last_progress, progress) {
            session.last_progress = progress.clone();
            session.stuck_counter = 0;
            return Decision::Celebration { delta };
        }

        if session.in_cooldown(now, self.config.cooldown_ms) {
            return Decision::Suppressed {
                reason: SuppressReason::Cooldown,
            };
        }

        if context.quick_navigation {
            return Decision::Suppressed {
                reason: SuppressReason::QuickNavigation,
            };
        }

        let completed = progress.completed_count();
        if context.total_scenes > 0
            && completed == context.total_scenes
            && !session.has_shown(MessageKind::Mastery)
        {
            return Decision::Mastery {
                completion: CompletionData {
                    completed_scenes: completed,
                    total_scenes: context.total_scenes,
                    total_stars: progress.total_stars(),
                },
            };
        }

        session.stuck_counter += 1;
        if session.stuck_counter >= self.config.stuck_threshold
            && !session.shown_recently(
                MessageKind::Encouragement,
                self.config.recent_history_window,
            )
        {
            return Decision::Encouragement {
                stuck: StuckData {
                    stuck_counter: session.stuck_counter,
                    visit_count: session.visit_count,
                },
            };
        }

        Decision::Suppressed {
            reason: SuppressReason::NoTrigger,
        }
    }

    fn load(&self, profile: &ProfileId, zone: &ZoneId, now: i64) -> CoachSession {
        let key = self.config.keys.session_key(profile, zone);
        let raw = match self.store.get(&key) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(%profile, %zone, error = %e, "coach session read failed");
                None
            }
        };

        let Some(raw) = raw else {
            info!(%profile, %zone, "starting coach session");
            return CoachSession::fresh(now);
        };

        match serde_json::from_str::<CoachSession>(&raw) {
            Ok(session) if session.is_stale(now, self.config.utc_offset_minutes) => {
                info!(%profile, %zone, "new day, starting fresh coach session");
                CoachSession::fresh(now)
            }
            Ok(session) => session,
            Err(e) => {
                warn!(%profile, %zone, error = %e, "discarding malformed coach session");
                CoachSession::fresh(now)
            }
        }
    }

    fn persist(&self, profile: &ProfileId, zone: &ZoneId, session: &CoachSession) {
        let key = self.config.keys.session_key(profile, zone);
        let result = serde_json::to_string(session)
            .map_err(zone_progress::StoreError::from)
            .and_then(|raw| self.store.set(&key, raw));
        if let Err(e) = result {
            warn!(%profile, %zone, error = %e, "coach session write failed");
        }
    }
}
