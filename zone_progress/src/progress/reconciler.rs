//! Progress reconciliation: merges permanent and transient records into a
//! per-scene display status.
//!
//! Transient (unsaved) data wins while a mini-game is being played, so a
//! player who navigates away and back sees "continue" before the permanent
//! write lands. It never reopens a permanently completed scene and never
//! leaks into a locked one.

use std::collections::HashMap;

use tracing::warn;

use super::predicates::CompletionRegistry;
use super::records::{PermanentRecord, PermanentRecords, SceneReport, SceneStatus, TransientRecord};
use crate::config::ProgressSignals;
use crate::scenes::{SceneDescriptor, SceneId, ZoneGraph};

/// Source of raw transient records for the scenes of one (profile, zone).
pub trait TransientLookup {
    /// The stored, still serialized record for `scene`, if any.
    fn raw_transient(&self, scene: &SceneId) -> Option<String>;
}

impl TransientLookup for HashMap<SceneId, String> {
    fn raw_transient(&self, scene: &SceneId) -> Option<String> {
        self.get(scene).cloned()
    }
}

impl<F> TransientLookup for F
where
    F: Fn(&SceneId) -> Option<String>,
{
    fn raw_transient(&self, scene: &SceneId) -> Option<String> {
        self(scene)
    }
}

/// Lookup for callers with no transient data at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransient;

impl TransientLookup for NoTransient {
    fn raw_transient(&self, _scene: &SceneId) -> Option<String> {
        None
    }
}

/// Computes scene statuses from permanent and transient records.
#[derive(Debug, Default)]
pub struct ProgressReconciler {
    signals: ProgressSignals,
    completions: CompletionRegistry,
}

impl ProgressReconciler {
    pub fn new(signals: ProgressSignals, completions: CompletionRegistry) -> Self {
        Self {
            signals,
            completions,
        }
    }

    pub fn signals(&self) -> &ProgressSignals {
        &self.signals
    }

    pub fn completions_mut(&mut self) -> &mut CompletionRegistry {
        &mut self.completions
    }

    /// Whether `scene` can be entered.
    ///
    /// True for the order-1 scene, for scenes explicitly unlocked, and for
    /// scenes whose immediate predecessor is permanently completed.
    pub fn is_unlocked(
        &self,
        scene: &SceneDescriptor,
        zone: &ZoneGraph,
        permanent: &PermanentRecords,
    ) -> bool {
        if scene.is_first() {
            return true;
        }

        if permanent.get(&scene.id).map(|r| r.unlocked).unwrap_or(false) {
            return true;
        }

        zone.predecessor(scene)
            .and_then(|prev| permanent.get(&prev.id))
            .map(|r| r.completed)
            .unwrap_or(false)
    }

    /// Derive the status and displayed stars of `scene`.
    pub fn compute_status(
        &self,
        scene: &SceneDescriptor,
        zone: &ZoneGraph,
        permanent: &PermanentRecords,
        transient: &dyn TransientLookup,
    ) -> SceneReport {
        if !self.is_unlocked(scene, zone, permanent) {
            return SceneReport::locked();
        }

        let stored = permanent.get(&scene.id).copied().unwrap_or_default();

        if !stored.completed {
            if let Some(record) = self.load_transient(scene, transient) {
                if let Some(report) = self.evaluate_transient(scene, &record, &stored) {
                    return report;
                }
            }
        }

        if stored.completed {
            SceneReport::new(SceneStatus::Completed, stored.stars)
        } else if stored.stars > 0 {
            SceneReport::new(SceneStatus::InProgress, stored.stars)
        } else {
            SceneReport::available()
        }
    }

    /// Whether a transient record shows the player has done anything yet.
    ///
    /// A record still in one of the initial phases never counts.
    pub fn has_partial_progress(&self, record: &TransientRecord) -> bool {
        if let Some(phase) = record.phase() {
            if self.signals.is_initial_phase(phase) {
                return false;
            }
            return true;
        }

        record.stars() > 0
            || self
                .signals
                .discovery_fields
                .iter()
                .any(|field| record.entry_count(field) > 0)
            || self
                .signals
                .progress_flags
                .iter()
                .any(|flag| record.flag(flag))
    }

    fn evaluate_transient(
        &self,
        scene: &SceneDescriptor,
        record: &TransientRecord,
        stored: &PermanentRecord,
    ) -> Option<SceneReport> {
        let stars = record.stars();

        // The mini-game is on its own completion screen; the permanent write
        // has not happened yet.
        if record.flag(&self.signals.completion_screen_flag) {
            return Some(SceneReport::new(SceneStatus::InProgress, stars));
        }

        if self.completions.is_complete(scene.kind_tag(), record) {
            return Some(SceneReport::new(
                SceneStatus::Completed,
                stars.max(stored.stars),
            ));
        }

        if self.has_partial_progress(record) {
            return Some(SceneReport::new(SceneStatus::InProgress, stars));
        }

        None
    }

    fn load_transient(
        &self,
        scene: &SceneDescriptor,
        transient: &dyn TransientLookup,
    ) -> Option<TransientRecord> {
        let raw = transient.raw_transient(&scene.id)?;
        match TransientRecord::parse(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(scene = %scene.id, error = %e, "ignoring malformed transient record");
                None
            }
        }
    }
}
