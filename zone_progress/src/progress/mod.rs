//! Scene progress: records, snapshots, completion predicates, and the
//! store-backed [`ProgressBook`].

mod predicates;
mod reconciler;
mod records;
mod snapshot;

pub use predicates::*;
pub use reconciler::*;
pub use records::*;
pub use snapshot::*;

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{ProgressConfig, StorageKeys};
use crate::scenes::{ProfileId, SceneId, ZoneGraph, ZoneId};
use crate::storage::KeyValueStore;

/// Reads and writes a profile's progress records and reconciles them into
/// scene statuses.
pub struct ProgressBook {
    store: Arc<dyn KeyValueStore>,
    keys: StorageKeys,
    reconciler: ProgressReconciler,
    // Serializes read-modify-write of permanent records.
    lock: Mutex<()>,
}

/// Transient lookup bound to one (profile, zone).
struct StoredTransients<'a> {
    book: &'a ProgressBook,
    profile: &'a ProfileId,
    zone: &'a ZoneId,
}

impl TransientLookup for StoredTransients<'_> {
    fn raw_transient(&self, scene: &SceneId) -> Option<String> {
        let key = self.book.keys.transient_key(self.profile, self.zone, scene);
        self.book.read(&key)
    }
}

impl ProgressBook {
    /// Create a progress book with the default completion predicates.
    pub fn new(store: Arc<dyn KeyValueStore>, config: ProgressConfig) -> Self {
        let reconciler = ProgressReconciler::new(config.signals, CompletionRegistry::default());
        Self::with_reconciler(store, config.keys, reconciler)
    }

    /// Create a progress book with a custom reconciler.
    pub fn with_reconciler(
        store: Arc<dyn KeyValueStore>,
        keys: StorageKeys,
        reconciler: ProgressReconciler,
    ) -> Self {
        Self {
            store,
            keys,
            reconciler,
            lock: Mutex::new(()),
        }
    }

    /// The reconciler used for status computation.
    pub fn reconciler(&self) -> &ProgressReconciler {
        &self.reconciler
    }

    pub fn reconciler_mut(&mut self) -> &mut ProgressReconciler {
        &mut self.reconciler
    }

    /// Permanent records for a zone. Missing or malformed data reads as empty.
    pub fn permanent_records(&self, profile: &ProfileId, zone: &ZoneId) -> PermanentRecords {
        let key = self.keys.permanent_key(profile, zone);
        let Some(raw) = self.read(&key) else {
            return PermanentRecords::new();
        };

        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(%profile, %zone, error = %e, "discarding malformed permanent progress");
                PermanentRecords::new()
            }
        }
    }

    /// Replace the zone's permanent records.
    pub fn save_permanent(&self, profile: &ProfileId, zone: &ZoneId, records: &PermanentRecords) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.write_permanent(profile, zone, records);
    }

    fn write_permanent(&self, profile: &ProfileId, zone: &ZoneId, records: &PermanentRecords) {
        let key = self.keys.permanent_key(profile, zone);
        match serde_json::to_string(records) {
            Ok(raw) => self.write(&key, raw),
            Err(e) => warn!(%profile, %zone, error = %e, "failed to serialize permanent progress"),
        }
    }

    /// The parsed transient record for a scene, if present and well formed.
    pub fn transient_record(
        &self,
        profile: &ProfileId,
        zone: &ZoneId,
        scene: &SceneId,
    ) -> Option<TransientRecord> {
        let raw = self.read(&self.keys.transient_key(profile, zone, scene))?;
        match TransientRecord::parse(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(%profile, %zone, %scene, error = %e, "ignoring malformed transient record");
                None
            }
        }
    }

    /// Store a mini-game's in-flight state. Non-object values are rejected.
    pub fn save_transient(
        &self,
        profile: &ProfileId,
        zone: &ZoneId,
        scene: &SceneId,
        state: Value,
    ) -> bool {
        let Some(record) = TransientRecord::from_value(state) else {
            warn!(%profile, %zone, %scene, "transient state must be a JSON object");
            return false;
        };
        match serde_json::to_string(&record) {
            Ok(raw) => {
                self.write(&self.keys.transient_key(profile, zone, scene), raw);
                true
            }
            Err(e) => {
                warn!(%profile, %zone, %scene, error = %e, "failed to serialize transient record");
                false
            }
        }
    }

    /// Remove a scene's transient record.
    pub fn clear_transient(&self, profile: &ProfileId, zone: &ZoneId, scene: &SceneId) {
        let key = self.keys.transient_key(profile, zone, scene);
        if let Err(e) = self.store.remove(&key) {
            warn!(%key, error = %e, "failed to remove transient record");
        }
    }

    /// Permanently mark a scene completed, keeping the best star count, and
    /// drop its transient record.
    pub fn record_completion(
        &self,
        profile: &ProfileId,
        zone: &ZoneId,
        scene: &SceneId,
        stars: u8,
    ) -> PermanentRecord {
        let saved = self.update_permanent(profile, zone, |records| {
            let entry = records.entry(scene.clone()).or_default();
            entry.completed = true;
            entry.stars = entry.stars.max(stars.min(MAX_STARS));
            *entry
        });

        self.clear_transient(profile, zone, scene);
        info!(%profile, %zone, %scene, stars = saved.stars, "scene completed");
        saved
    }

    /// Set the explicit unlock flag on a scene.
    pub fn unlock_scene(&self, profile: &ProfileId, zone: &ZoneId, scene: &SceneId) {
        self.update_permanent(profile, zone, |records| {
            records.entry(scene.clone()).or_default().unlocked = true;
        });
        debug!(%profile, %zone, %scene, "scene unlocked");
    }

    /// Status of a single scene, or `None` if the zone has no such scene.
    pub fn scene_report(
        &self,
        profile: &ProfileId,
        graph: &ZoneGraph,
        scene: &SceneId,
    ) -> Option<SceneReport> {
        let descriptor = graph.get(scene)?;
        let permanent = self.permanent_records(profile, &graph.zone);
        let lookup = self.lookup(profile, &graph.zone);
        Some(
            self.reconciler
                .compute_status(descriptor, graph, &permanent, &lookup),
        )
    }

    /// Reports for every scene of the zone, in scene order.
    pub fn zone_report(&self, profile: &ProfileId, graph: &ZoneGraph) -> Vec<(SceneId, SceneReport)> {
        let permanent = self.permanent_records(profile, &graph.zone);
        let lookup = self.lookup(profile, &graph.zone);
        graph
            .iter()
            .map(|scene| {
                let report = self
                    .reconciler
                    .compute_status(scene, graph, &permanent, &lookup);
                (scene.id.clone(), report)
            })
            .collect()
    }

    /// The zone's progress as the coach sees it: completed scenes and
    /// displayed stars, in scene order.
    pub fn snapshot(&self, profile: &ProfileId, graph: &ZoneGraph) -> ProgressSnapshot {
        self.zone_report(profile, graph)
            .into_iter()
            .map(|(scene, report)| {
                let completed = report.status == SceneStatus::Completed;
                (scene, SceneProgress::new(completed, report.stars))
            })
            .collect()
    }

    /// First scene, in order, that the player can play right now.
    pub fn next_playable(&self, profile: &ProfileId, graph: &ZoneGraph) -> Option<SceneId> {
        self.zone_report(profile, graph)
            .into_iter()
            .find(|(_, report)| report.status.is_playable())
            .map(|(scene, _)| scene)
    }

    /// Apply `change` to the zone's permanent records and write them back,
    /// holding the lock for the whole read-modify-write.
    fn update_permanent<T>(
        &self,
        profile: &ProfileId,
        zone: &ZoneId,
        change: impl FnOnce(&mut PermanentRecords) -> T,
    ) -> T {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut records = self.permanent_records(profile, zone);
        let result = change(&mut records);
        self.write_permanent(profile, zone, &records);
        result
    }

    fn lookup<'a>(&'a self, profile: &'a ProfileId, zone: &'a ZoneId) -> StoredTransients<'a> {
        StoredTransients {
            book: self,
            profile,
            zone,
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(%key, error = %e, "progress read failed");
                None
            }
        }
    }

    fn write(&self, key: &str, value: String) {
        if let Err(e) = self.store.set(key, value) {
            warn!(%key, error = %e, "progress write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::SceneDescriptor;
    use crate::storage::MemoryStore;
    use serde_json::json;

    struct Fixture {
        store: Arc<MemoryStore>,
        book: ProgressBook,
        profile: ProfileId,
        graph: ZoneGraph,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let book = ProgressBook::new(store.clone(), ProgressConfig::default());
        let graph = ZoneGraph::new(
            ZoneId::from("garden"),
            vec![
                SceneDescriptor::new("modak", 1).with_kind(PHASE_COMPLETE),
                SceneDescriptor::new("pond", 2).with_kind(ALL_PHASES_COMPLETE),
                SceneDescriptor::new("symbol", 3).with_kind(PLACED_ITEMS),
            ],
        )
        .unwrap();
        Fixture {
            store,
            book,
            profile: ProfileId::from("asha"),
            graph,
        }
    }

    fn statuses(f: &Fixture) -> Vec<SceneStatus> {
        f.book
            .zone_report(&f.profile, &f.graph)
            .into_iter()
            .map(|(_, r)| r.status)
            .collect()
    }

    #[test]
    fn test_fresh_zone() {
        let f = fixture();
        assert_eq!(
            statuses(&f),
            vec![SceneStatus::Available, SceneStatus::Locked, SceneStatus::Locked]
        );
        assert_eq!(
            f.book.next_playable(&f.profile, &f.graph),
            Some(SceneId::from("modak"))
        );
    }

    #[test]
    fn test_record_completion_unlocks_next_and_clears_transient() {
        let f = fixture();
        let zone = f.graph.zone.clone();
        let modak = SceneId::from("modak");

        assert!(f.book.save_transient(&f.profile, &zone, &modak, json!({"phase": "feeding"})));
        assert!(f.book.transient_record(&f.profile, &zone, &modak).is_some());

        f.book.record_completion(&f.profile, &zone, &modak, 2);
        assert!(f.book.transient_record(&f.profile, &zone, &modak).is_none());
        assert_eq!(
            statuses(&f),
            vec![SceneStatus::Completed, SceneStatus::Available, SceneStatus::Locked]
        );

        // A worse replay keeps the best stars.
        let saved = f.book.record_completion(&f.profile, &zone, &modak, 1);
        assert_eq!(saved.stars, 2);
    }

    #[test]
    fn test_snapshot_reflects_transient_completion() {
        let f = fixture();
        let zone = f.graph.zone.clone();
        f.book.record_completion(&f.profile, &zone, &SceneId::from("modak"), 3);
        f.book.save_transient(
            &f.profile,
            &zone,
            &SceneId::from("pond"),
            json!({"phase": "all_complete", "gameComplete": true, "stars": 2}),
        );

        let snapshot = f.book.snapshot(&f.profile, &f.graph);
        assert_eq!(snapshot.completed_count(), 2);
        assert_eq!(snapshot.get(&SceneId::from("pond")), Some(&SceneProgress::new(true, 2)));
        assert_eq!(snapshot.get(&SceneId::from("symbol")), Some(&SceneProgress::new(false, 0)));
    }

    #[test]
    fn test_unlock_scene_flag() {
        let f = fixture();
        let zone = f.graph.zone.clone();
        f.book.unlock_scene(&f.profile, &zone, &SceneId::from("symbol"));
        assert_eq!(
            statuses(&f),
            vec![SceneStatus::Available, SceneStatus::Locked, SceneStatus::Available]
        );
    }

    #[test]
    fn test_malformed_permanent_reads_empty() {
        let f = fixture();
        let key = StorageKeys::default().permanent_key(&f.profile, &f.graph.zone);
        f.store.set(&key, "not json".to_string()).unwrap();
        assert!(f.book.permanent_records(&f.profile, &f.graph.zone).is_empty());
    }

    #[test]
    fn test_malformed_transient_is_ignored() {
        let f = fixture();
        let key = StorageKeys::default().transient_key(
            &f.profile,
            &f.graph.zone,
            &SceneId::from("modak"),
        );
        f.store.set(&key, "{bad".to_string()).unwrap();

        let report = f
            .book
            .scene_report(&f.profile, &f.graph, &SceneId::from("modak"))
            .unwrap();
        assert_eq!(report, SceneReport::available());
    }

    #[test]
    fn test_concurrent_permanent_updates_are_not_lost() {
        let f = Arc::new(fixture());
        let zone = f.graph.zone.clone();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let f = f.clone();
                let zone = zone.clone();
                std::thread::spawn(move || {
                    let scene = SceneId::new(format!("scene_{}", i));
                    if i % 2 == 0 {
                        f.book.unlock_scene(&f.profile, &zone, &scene);
                    } else {
                        f.book.record_completion(&f.profile, &zone, &scene, 2);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let records = f.book.permanent_records(&f.profile, &zone);
        assert_eq!(records.len(), 16);
        for i in 0..16 {
            let record = records[&SceneId::new(format!("scene_{}", i))];
            if i % 2 == 0 {
                assert!(record.unlocked);
            } else {
                assert!(record.completed);
                assert_eq!(record.stars, 2);
            }
        }
    }

    #[test]
    fn test_save_transient_rejects_non_object() {
        let f = fixture();
        assert!(!f.book.save_transient(
            &f.profile,
            &f.graph.zone,
            &SceneId::from("modak"),
            json!([1, 2, 3]),
        ));
        assert!(f.store.is_empty());
    }
}
