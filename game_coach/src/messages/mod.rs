//! Coaching message templates.
//!
//! Selection is a pure function of the decision, the player's name and a
//! random draw. Templates use `{name}`; mastery templates may also use
//! `{stars}` and `{total}`.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

use crate::decision::Decision;
use crate::session::MessageKind;
use zone_progress::SceneId;

/// Used when the player has not entered a display name.
pub const DEFAULT_DISPLAY_NAME: &str = "little explorer";

const WELCOME: &[&str] = &[
    "Namaste, {name}! Ganesha has been waiting for you!",
    "Welcome, {name}! A new adventure is about to begin.",
    "Hello, {name}! Shall we explore this magical place together?",
    "Look who is here! Welcome, {name}!",
];

const CELEBRATION: &[&str] = &[
    "Wonderful work, {name}!",
    "You did it, {name}! Ganesha is so proud of you.",
    "Shabash, {name}! Look at all that progress!",
    "Hooray, {name}! You are getting better and better.",
];

const MASTERY: &[&str] = &[
    "{name}, you finished every adventure here and earned {stars} stars!",
    "Amazing, {name}! All {total} adventures complete!",
    "You are a true champion, {name}! This whole land is yours.",
];

const ENCOURAGEMENT: &[&str] = &[
    "Keep going, {name}! Every step is a little victory.",
    "Need a hint, {name}? Try tapping something that sparkles.",
    "Mooshika believes in you, {name}! Let's try again.",
    "Take a deep breath, {name}. You can do this!",
];

const SCENE_CELEBRATIONS: &[(&str, &[&str])] = &[
    (
        "modak",
        &[
            "Yum, {name}! Ganesha loves the modaks you made!",
            "Sweet success, {name}! The modak plate is full.",
        ],
    ),
    (
        "pond",
        &[
            "Splash! {name}, the lotus pond is sparkling again!",
            "The fish are dancing for you, {name}!",
        ],
    ),
    (
        "symbol",
        &["{name}, you placed every sacred symbol just right!"],
    ),
];

/// Template pools per message kind, plus scene-specific celebrations.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    templates: HashMap<MessageKind, Vec<String>>,
    scene_celebrations: HashMap<SceneId, Vec<String>>,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        let pool = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let mut templates = HashMap::new();
        templates.insert(MessageKind::Welcome, pool(WELCOME));
        templates.insert(MessageKind::Celebration, pool(CELEBRATION));
        templates.insert(MessageKind::Mastery, pool(MASTERY));
        templates.insert(MessageKind::Encouragement, pool(ENCOURAGEMENT));

        let scene_celebrations = SCENE_CELEBRATIONS
            .iter()
            .map(|(scene, items)| (SceneId::from(*scene), pool(*items)))
            .collect();

        Self {
            templates,
            scene_celebrations,
        }
    }
}

impl MessageCatalog {
    /// Replace the pool used for `kind`. Empty pools are ignored.
    pub fn set_templates(&mut self, kind: MessageKind, templates: Vec<String>) {
        if !templates.is_empty() {
            self.templates.insert(kind, templates);
        }
    }

    /// Add a celebration template used when `scene` was just completed.
    pub fn register_scene_template(&mut self, scene: SceneId, template: impl Into<String>) {
        self.scene_celebrations
            .entry(scene)
            .or_default()
            .push(template.into());
    }

    /// Message text for a decision, or `None` when it shows nothing.
    pub fn get_message(&self, decision: &Decision, display_name: &str) -> Option<String> {
        self.get_message_with_rng(decision, display_name, &mut rand::thread_rng())
    }

    pub fn get_message_with_rng<R: Rng + ?Sized>(
        &self,
        decision: &Decision,
        display_name: &str,
        rng: &mut R,
    ) -> Option<String> {
        let kind = decision.kind()?;
        let template = self.pick(kind, decision, rng)?;
        Some(interpolate(template, display_name, decision))
    }

    fn pick<R: Rng + ?Sized>(&self, kind: MessageKind, decision: &Decision, rng: &mut R) -> Option<&String> {
        if let Decision::Celebration { delta } = decision {
            let scene_pool = delta
                .just_completed()
                .and_then(|scene| self.scene_celebrations.get(scene))
                .filter(|pool| !pool.is_empty());
            if let Some(pool) = scene_pool {
                return pool.choose(rng);
            }
        }

        self.templates.get(&kind)?.choose(rng)
    }
}

fn interpolate(template: &str, display_name: &str, decision: &Decision) -> String {
    let name = match display_name.trim() {
        "" => DEFAULT_DISPLAY_NAME,
        trimmed => trimmed,
    };

    // Numbers first, so placeholders inside the player's name stay literal.
    let mut text = template.to_string();
    if let Decision::Mastery { completion } = decision {
        text = text
            .replace("{stars}", &completion.total_stars.to_string())
            .replace("{total}", &completion.total_scenes.to_string());
    }
    text.replace("{name}", name)
}
