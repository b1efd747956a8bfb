//! Permanent and transient progress records, and the derived scene status.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::scenes::SceneId;

/// Highest star rating a scene can award.
pub const MAX_STARS: u8 = 3;

/// Durably saved state of one scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PermanentRecord {
    pub completed: bool,
    pub stars: u8,
    /// Set by auto-unlock; unlocks the scene regardless of its predecessor.
    pub unlocked: bool,
}

impl PermanentRecord {
    pub fn completed(stars: u8) -> Self {
        Self {
            completed: true,
            stars: stars.min(MAX_STARS),
            unlocked: false,
        }
    }
}

/// Permanent records of one zone, keyed by scene.
pub type PermanentRecords = BTreeMap<SceneId, PermanentRecord>;

/// A mini-game's unsaved session snapshot.
///
/// The shape is owned by each mini-game; only a few well-known fields are read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransientRecord(pub Map<String, Value>);

impl TransientRecord {
    /// Parse a stored record. Anything other than a JSON object is rejected.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Stars earned so far, clamped to [`MAX_STARS`]; 0 when absent.
    pub fn stars(&self) -> u8 {
        self.0
            .get("stars")
            .and_then(Value::as_u64)
            .map(|s| s.min(MAX_STARS as u64) as u8)
            .unwrap_or(0)
    }

    pub fn phase(&self) -> Option<&str> {
        self.0.get("phase").and_then(Value::as_str)
    }

    /// A boolean field; absent or non-boolean reads as false.
    pub fn flag(&self, name: &str) -> bool {
        self.0.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Number of entries in an object or array field; 0 when absent.
    pub fn entry_count(&self, name: &str) -> usize {
        match self.0.get(name) {
            Some(Value::Object(map)) => map.len(),
            Some(Value::Array(items)) => items.len(),
            _ => 0,
        }
    }
}

/// Display status of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SceneStatus {
    Locked,
    Available,
    InProgress,
    Completed,
}

impl SceneStatus {
    pub fn is_playable(&self) -> bool {
        matches!(self, SceneStatus::Available | SceneStatus::InProgress)
    }
}

/// Status and displayed stars for one scene, derived on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneReport {
    pub status: SceneStatus,
    pub stars: u8,
}

impl SceneReport {
    pub fn new(status: SceneStatus, stars: u8) -> Self {
        Self { status, stars }
    }

    pub fn locked() -> Self {
        Self::new(SceneStatus::Locked, 0)
    }

    pub fn available() -> Self {
        Self::new(SceneStatus::Available, 0)
    }
}
