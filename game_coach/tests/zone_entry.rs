//! End-to-end zone entry: progress reconciliation feeding coaching decisions.

use std::sync::Arc;

use serde_json::json;

use game_coach::{CoachConfig, Decision, GameCoach, MessageKind, ProgressType, SuppressReason};
use zone_progress::{
    FileStore, KeyValueStore, ManualClock, MemoryStore, ProfileId, SceneId, SceneReport,
    SceneStatus, ZoneGraph,
};

const START: i64 = 1_704_096_000_000; // 2024-01-01T08:00:00Z
const MINUTE: i64 = 60 * 1000;

const GARDEN: &str = r#"
zone = "ganesha_garden"

[[scenes]]
id = "modak"
order = 1
kind = "phase_complete"

[[scenes]]
id = "pond"
order = 2
kind = "all_phases_complete"
"#;

fn garden() -> ZoneGraph {
    ZoneGraph::from_toml_str(GARDEN).unwrap()
}

fn coach_with(store: Arc<dyn KeyValueStore>, clock: Arc<ManualClock>) -> GameCoach {
    GameCoach::new(store, clock, CoachConfig::default())
}

fn pond_report(coach: &GameCoach, profile: &ProfileId, graph: &ZoneGraph) -> SceneReport {
    coach
        .progress()
        .scene_report(profile, graph, &SceneId::from("pond"))
        .unwrap()
}

#[test]
fn full_play_through() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(START));
    let coach = coach_with(store, clock.clone());
    let profile = ProfileId::from("asha");
    let graph = garden();
    let zone = graph.zone.clone();
    let modak = SceneId::from("modak");

    // First entry: welcome, shown.
    let decision = coach.enter_zone(&profile, &graph, false);
    assert_eq!(decision, Decision::Welcome);
    let text = coach.message_for(&decision, "Asha").unwrap();
    assert!(text.contains("Asha"));
    coach.mark_shown(&profile, &zone, MessageKind::Welcome);

    // Back again a minute later with nothing new: cooldown.
    clock.advance(MINUTE);
    assert_eq!(
        coach.enter_zone(&profile, &graph, false),
        Decision::Suppressed {
            reason: SuppressReason::Cooldown
        }
    );

    // The player finishes the modak game; the permanent write has not landed yet.
    coach
        .progress()
        .save_transient(&profile, &zone, &modak, json!({"phase": "complete", "stars": 2}));
    clock.advance(10 * 1000);
    let decision = coach.enter_zone(&profile, &graph, false);
    match &decision {
        Decision::Celebration { delta } => {
            assert_eq!(delta.progress_type, ProgressType::SceneCompletion);
            assert_eq!(delta.completed_scenes, vec![modak.clone()]);
        }
        other => panic!("expected celebration, got {:?}", other),
    }
    coach.mark_shown(&profile, &zone, MessageKind::Celebration);

    // Once saved, the same completion is not celebrated twice.
    coach.progress().record_completion(&profile, &zone, &modak, 2);
    clock.advance(MINUTE);
    assert_eq!(
        coach.enter_zone(&profile, &graph, false).suppress_reason(),
        Some(SuppressReason::Cooldown)
    );

    // Pond unlocked by the completed modak scene.
    assert_eq!(pond_report(&coach, &profile, &graph).status, SceneStatus::Available);

    coach.progress().record_completion(&profile, &zone, &SceneId::from("pond"), 3);
    clock.advance(MINUTE);
    assert!(matches!(
        coach.enter_zone(&profile, &graph, false),
        Decision::Celebration { .. }
    ));

    // After the cooldown the finished zone earns mastery, once.
    clock.advance(5 * MINUTE);
    let decision = coach.enter_zone(&profile, &graph, false);
    assert_eq!(decision.kind(), Some(MessageKind::Mastery));
    let text = coach.message_for(&decision, "").unwrap();
    assert!(text.contains("little explorer"));
    coach.mark_shown(&profile, &zone, MessageKind::Mastery);

    clock.advance(5 * MINUTE);
    assert_ne!(
        coach.enter_zone(&profile, &graph, false).kind(),
        Some(MessageKind::Mastery)
    );
}

#[test]
fn two_scene_examples() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(START));
    let coach = coach_with(store.clone(), clock);
    let profile = ProfileId::from("ravi");
    let graph = garden();
    let zone = graph.zone.clone();
    let pond = SceneId::from("pond");

    coach
        .progress()
        .record_completion(&profile, &zone, &SceneId::from("modak"), 3);

    coach
        .progress()
        .save_transient(&profile, &zone, &pond, json!({"stars": 1, "phase": "mooshika_search"}));
    assert_eq!(pond_report(&coach, &profile, &graph), SceneReport::available());

    coach
        .progress()
        .save_transient(&profile, &zone, &pond, json!({"stars": 1, "phase": "exploring"}));
    assert_eq!(
        pond_report(&coach, &profile, &graph),
        SceneReport::new(SceneStatus::InProgress, 1)
    );

    let key = CoachConfig::default()
        .keys
        .transient_key(&profile, &zone, &pond);
    store.set(&key, "{bad".to_string()).unwrap();
    assert_eq!(pond_report(&coach, &profile, &graph), SceneReport::available());
}

#[test]
fn quick_navigation_is_respected() {
    let coach = coach_with(Arc::new(MemoryStore::new()), Arc::new(ManualClock::new(START)));
    let profile = ProfileId::from("mira");
    let graph = garden();

    assert_eq!(coach.enter_zone(&profile, &graph, true), Decision::Welcome);
    assert_eq!(
        coach.enter_zone(&profile, &graph, true),
        Decision::Suppressed {
            reason: SuppressReason::QuickNavigation
        }
    );
}

#[test]
fn sessions_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coach.json");
    let clock = Arc::new(ManualClock::new(START));
    let profile = ProfileId::from("asha");
    let graph = garden();

    {
        let store = Arc::new(FileStore::open(&path).unwrap());
        let coach = coach_with(store, clock.clone());
        assert_eq!(coach.enter_zone(&profile, &graph, false), Decision::Welcome);
        coach.mark_shown(&profile, &graph.zone, MessageKind::Welcome);
    }

    clock.advance(MINUTE);
    let store = Arc::new(FileStore::open(&path).unwrap());
    let coach = coach_with(store, clock);
    let session = coach.session(&profile, &graph.zone);
    assert!(!session.first_visit);
    assert_eq!(session.messages_shown.len(), 1);
    assert_eq!(
        coach.enter_zone(&profile, &graph, false).suppress_reason(),
        Some(SuppressReason::Cooldown)
    );

    coach.reset_session(&profile, &graph.zone);
    assert_eq!(coach.enter_zone(&profile, &graph, false), Decision::Welcome);
}
