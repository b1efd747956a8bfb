//! Insertion-ordered per-scene progress snapshots.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::scenes::SceneId;

/// Completion state of one scene as seen by the coach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SceneProgress {
    pub completed: bool,
    pub stars: u8,
}

impl SceneProgress {
    pub fn new(completed: bool, stars: u8) -> Self {
        Self { completed, stars }
    }
}

/// Scene id -> progress, iterated in insertion order.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    entries: Vec<(SceneId, SceneProgress)>,
}

impl ProgressSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, scene: impl Into<String>, completed: bool, stars: u8) -> Self {
        self.insert(SceneId::new(scene), SceneProgress::new(completed, stars));
        self
    }

    /// Insert or replace; a replaced entry keeps its original position.
    pub fn insert(&mut self, scene: SceneId, progress: SceneProgress) {
        match self.entries.iter_mut().find(|(id, _)| *id == scene) {
            Some((_, existing)) => *existing = progress,
            None => self.entries.push((scene, progress)),
        }
    }

    pub fn get(&self, scene: &SceneId) -> Option<&SceneProgress> {
        self.entries
            .iter()
            .find(|(id, _)| id == scene)
            .map(|(_, progress)| progress)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SceneId, &SceneProgress)> {
        self.entries.iter().map(|(id, progress)| (id, progress))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.entries.iter().filter(|(_, p)| p.completed).count()
    }

    pub fn total_stars(&self) -> u32 {
        self.entries.iter().map(|(_, p)| p.stars as u32).sum()
    }
}

impl FromIterator<(SceneId, SceneProgress)> for ProgressSnapshot {
    fn from_iter<I: IntoIterator<Item = (SceneId, SceneProgress)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for (scene, progress) in iter {
            snapshot.insert(scene, progress);
        }
        snapshot
    }
}

impl Serialize for ProgressSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (scene, progress) in &self.entries {
            map.serialize_entry(scene, progress)?;
        }
        map.end()
    }
}

struct SnapshotVisitor;

impl<'de> Visitor<'de> for SnapshotVisitor {
    type Value = ProgressSnapshot;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of scene id to progress")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut snapshot = ProgressSnapshot::new();
        while let Some((scene, progress)) = access.next_entry::<SceneId, SceneProgress>()? {
            snapshot.insert(scene, progress);
        }
        Ok(snapshot)
    }
}

impl<'de> Deserialize<'de> for ProgressSnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SnapshotVisitor)
    }
}
