//! Coaching decisions and the progress-delta computation behind them.

mod manager;

pub use manager::*;

use serde::{Deserialize, Serialize};

use crate::session::MessageKind;
use zone_progress::{ProgressSnapshot, SceneId};

/// What caused a message to be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    FirstVisit,
    NewProgress,
    ZoneComplete,
    StuckDetection,
}

/// Why no message is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    Cooldown,
    QuickNavigation,
    NoTrigger,
}

/// Classification of a progress delta, taken from the first scene that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressType {
    SceneCompletion,
    StarProgress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarGain {
    pub scene: SceneId,
    pub gained: u8,
}

/// Progress made since the session's last snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressDelta {
    pub progress_type: ProgressType,
    /// Every scene that became completed, in snapshot order.
    pub completed_scenes: Vec<SceneId>,
    /// Scenes that gained stars without newly completing.
    pub star_gains: Vec<StarGain>,
    pub stars_gained: u32,
}

impl ProgressDelta {
    /// The first scene that became completed, if any.
    pub fn just_completed(&self) -> Option<&SceneId> {
        self.completed_scenes.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionData {
    pub completed_scenes: usize,
    pub total_scenes: usize,
    pub total_stars: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StuckData {
    pub stuck_counter: u32,
    pub visit_count: u32,
}

/// Caller-supplied facts about the current zone entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecisionContext {
    pub total_scenes: usize,
    /// The player clicked through right after entering the zone.
    pub quick_navigation: bool,
}

impl DecisionContext {
    pub fn new(total_scenes: usize) -> Self {
        Self {
            total_scenes,
            quick_navigation: false,
        }
    }

    pub fn with_quick_navigation(mut self, quick: bool) -> Self {
        self.quick_navigation = quick;
        self
    }
}

/// Outcome of a single evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Welcome,
    Celebration { delta: ProgressDelta },
    Mastery { completion: CompletionData },
    Encouragement { stuck: StuckData },
    Suppressed { reason: SuppressReason },
}

impl Decision {
    pub fn show(&self) -> bool {
        !matches!(self, Decision::Suppressed { .. })
    }

    pub fn kind(&self) -> Option<MessageKind> {
        match self {
            Decision::Welcome => Some(MessageKind::Welcome),
            Decision::Celebration { .. } => Some(MessageKind::Celebration),
            Decision::Mastery { .. } => Some(MessageKind::Mastery),
            Decision::Encouragement { .. } => Some(MessageKind::Encouragement),
            Decision::Suppressed { .. } => None,
        }
    }

    pub fn trigger(&self) -> Option<Trigger> {
        match self {
            Decision::Welcome => Some(Trigger::FirstVisit),
            Decision::Celebration { .. } => Some(Trigger::NewProgress),
            Decision::Mastery { .. } => Some(Trigger::ZoneComplete),
            Decision::Encouragement { .. } => Some(Trigger::StuckDetection),
            Decision::Suppressed { .. } => None,
        }
    }

    pub fn suppress_reason(&self) -> Option<SuppressReason> {
        match self {
            Decision::Suppressed { reason } => Some(*reason),
            _ => None,
        }
    }
}

/// Compare two snapshots and describe the progress made.
///
/// Scenes missing from `previous` count as not completed with zero stars.
/// Returns `None` when nothing was completed and no stars were gained.
pub fn compute_delta(previous: &ProgressSnapshot, current: &ProgressSnapshot) -> Option<ProgressDelta> {
    let mut progress_type = None;
    let mut completed_scenes = Vec::new();
    let mut star_gains = Vec::new();
    let mut stars_gained = 0u32;

    for (scene, now) in current.iter() {
        let before = previous.get(scene).copied().unwrap_or_default();

        if now.completed && !before.completed {
            completed_scenes.push(scene.clone());
            progress_type.get_or_insert(ProgressType::SceneCompletion);
        } else if now.stars > before.stars {
            let gained = now.stars - before.stars;
            stars_gained += gained as u32;
            star_gains.push(StarGain {
                scene: scene.clone(),
                gained,
            });
            progress_type.get_or_insert(ProgressType::StarProgress);
        }
    }

    progress_type.map(|progress_type| ProgressDelta {
        progress_type,
        completed_scenes,
        star_gains,
        stars_gained,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_change_no_delta() {
        let snapshot = ProgressSnapshot::new().with("modak", true, 3).with("pond", false, 1);
        assert!(compute_delta(&snapshot, &snapshot).is_none());
    }

    #[test]
    fn test_missing_old_entry_counts_as_empty() {
        let current = ProgressSnapshot::new().with("modak", false, 0).with("pond", false, 2);
        let delta = compute_delta(&ProgressSnapshot::new(), &current).unwrap();
        assert_eq!(delta.progress_type, ProgressType::StarProgress);
        assert_eq!(delta.stars_gained, 2);
        assert!(delta.completed_scenes.is_empty());
    }

    #[test]
    fn test_first_changed_scene_decides_type() {
        let previous = ProgressSnapshot::new()
            .with("modak", false, 1)
            .with("pond", false, 0)
            .with("symbol", false, 0);
        let current = ProgressSnapshot::new()
            .with("modak", false, 2)
            .with("pond", true, 3)
            .with("symbol", true, 1);

        let delta = compute_delta(&previous, &current).unwrap();
        assert_eq!(delta.progress_type, ProgressType::StarProgress);
        assert_eq!(
            delta.completed_scenes,
            vec![SceneId::from("pond"), SceneId::from("symbol")]
        );
        assert_eq!(delta.star_gains.len(), 1);
        assert_eq!(delta.stars_gained, 1);
        assert_eq!(delta.just_completed(), Some(&SceneId::from("pond")));
    }

    #[test]
    fn test_completion_first() {
        let current = ProgressSnapshot::new().with("modak", true, 3).with("pond", false, 1);
        let delta = compute_delta(&ProgressSnapshot::new(), &current).unwrap();
        assert_eq!(delta.progress_type, ProgressType::SceneCompletion);
        // The completed scene's stars are not double-counted as star progress.
        assert_eq!(delta.stars_gained, 1);
    }

    #[test]
    fn test_star_loss_is_not_progress() {
        let previous = ProgressSnapshot::new().with("modak", false, 2);
        let current = ProgressSnapshot::new().with("modak", false, 1);
        assert!(compute_delta(&previous, &current).is_none());
    }

    #[test]
    fn test_decision_accessors() {
        let suppressed = Decision::Suppressed {
            reason: SuppressReason::Cooldown,
        };
        assert!(!suppressed.show());
        assert_eq!(suppressed.kind(), None);
        assert_eq!(suppressed.suppress_reason(), Some(SuppressReason::Cooldown));

        assert!(Decision::Welcome.show());
        assert_eq!(Decision::Welcome.kind(), Some(MessageKind::Welcome));
        assert_eq!(Decision::Welcome.trigger(), Some(Trigger::FirstVisit));
    }

    #[test]
    fn test_decision_json_shape() {
        let json = serde_json::to_value(Decision::Suppressed {
            reason: SuppressReason::QuickNavigation,
        })
        .unwrap();
        assert_eq!(json["decision"], "suppressed");
        assert_eq!(json["reason"], "quick_navigation");
    }
}
