//! Scene graph definitions: identifiers, scene descriptors and per-zone ordering.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ConfigError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a player profile.
    ProfileId
);
string_id!(
    /// Identifier of a zone (a themed group of scenes).
    ZoneId
);
string_id!(
    /// Identifier of a scene within a zone.
    SceneId
);

/// A single playable scene and its position in the zone's unlock chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub id: SceneId,
    /// Prerequisite position; order 1 is always unlocked.
    pub order: u32,
    /// Tag selecting the completion predicate. Falls back to the scene id.
    #[serde(default)]
    pub kind: Option<String>,
}

impl SceneDescriptor {
    /// Create a scene descriptor with no explicit kind.
    pub fn new(id: impl Into<String>, order: u32) -> Self {
        Self {
            id: SceneId::new(id),
            order,
            kind: None,
        }
    }

    /// Set the kind tag.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// The tag used to look up this scene's completion predicate.
    pub fn kind_tag(&self) -> &str {
        self.kind.as_deref().unwrap_or(self.id.as_str())
    }

    pub fn is_first(&self) -> bool {
        self.order == 1
    }
}

/// The ordered list of scenes that make up one zone.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneGraph {
    pub zone: ZoneId,
    scenes: Vec<SceneDescriptor>,
}

#[derive(Deserialize)]
struct ZoneGraphFile {
    zone: ZoneId,
    #[serde(default)]
    scenes: Vec<SceneDescriptor>,
}

impl ZoneGraph {
    /// Build a zone graph, sorting scenes by order.
    ///
    /// Rejects empty zones, repeated scene ids, repeated orders and zones
    /// whose lowest order is not 1.
    pub fn new(zone: ZoneId, mut scenes: Vec<SceneDescriptor>) -> Result<Self, ConfigError> {
        if scenes.is_empty() {
            return Err(ConfigError::EmptyZone(zone.to_string()));
        }

        let mut ids = HashSet::new();
        let mut orders = HashSet::new();
        for scene in &scenes {
            if !ids.insert(scene.id.clone()) {
                return Err(ConfigError::DuplicateScene {
                    zone: zone.to_string(),
                    scene: scene.id.to_string(),
                });
            }
            if !orders.insert(scene.order) {
                return Err(ConfigError::DuplicateOrder {
                    zone: zone.to_string(),
                    order: scene.order,
                });
            }
        }

        scenes.sort_by_key(|s| s.order);
        let first = scenes[0].order;
        if first != 1 {
            return Err(ConfigError::OrderStart {
                zone: zone.to_string(),
                first,
            });
        }
        Ok(Self { zone, scenes })
    }

    /// Parse a zone descriptor from TOML.
    ///
    /// ```toml
    /// zone = "ganesha_garden"
    ///
    /// [[scenes]]
    /// id = "modak"
    /// order = 1
    /// kind = "phase_complete"
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: ZoneGraphFile = toml::from_str(source)?;
        Self::new(file.zone, file.scenes)
    }

    /// Look up a scene by id.
    pub fn get(&self, id: &SceneId) -> Option<&SceneDescriptor> {
        self.scenes.iter().find(|s| &s.id == id)
    }

    /// The scene immediately before `scene` by order, if any.
    pub fn predecessor(&self, scene: &SceneDescriptor) -> Option<&SceneDescriptor> {
        self.scenes
            .iter()
            .filter(|s| s.order < scene.order)
            .max_by_key(|s| s.order)
    }

    /// Scenes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &SceneDescriptor> {
        self.scenes.iter()
    }

    /// Number of scenes in the zone.
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}
