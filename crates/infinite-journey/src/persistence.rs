//! Versioned snapshot envelope and the stores that hold it.
//!
//! A snapshot is the journey state wrapped in `{"state": ..., "version": N}`.
//! Snapshots written by the browser front-end before versioning existed
//! carry version 0 (or no version at all) and are repaired by [`migrate`]
//! on the way in. Every decoded snapshot, whatever its version, then has
//! the gateway unlocked and duplicate achievements dropped.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use infinite_types::{JourneyState, Layer};

use crate::PersistError;
use crate::reducer::MAX_PROGRESS;

/// Storage key the journey is persisted under.
pub const STORAGE_KEY: &str = "infinite-resume-storage";

/// Envelope version written by this crate.
pub const CURRENT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A persisted journey snapshot.
///
/// The state is kept as raw JSON until migrated so that older layouts that
/// no longer satisfy the current invariants can still be read and repaired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// The serialized [`JourneyState`].
    pub state: Value,
    /// Layout version. Missing means 0.
    #[serde(default)]
    pub version: u32,
}

impl Envelope {
    /// Wrap `state` at [`CURRENT_VERSION`].
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Json`] if the state cannot be serialized.
    pub fn wrap(state: &JourneyState) -> Result<Self, PersistError> {
        Ok(Self {
            state: serde_json::to_value(state)?,
            version: CURRENT_VERSION,
        })
    }

    /// Migrate to [`CURRENT_VERSION`], decode the state, and restore the
    /// invariants a hand-edited or foreign snapshot may have broken.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::UnsupportedVersion`] for versions newer than
    /// this crate understands, or [`PersistError::Json`] if the migrated
    /// state does not decode.
    pub fn into_state(self) -> Result<JourneyState, PersistError> {
        let migrated = migrate(self)?;
        let mut state: JourneyState = serde_json::from_value(migrated.state)?;
        normalize(&mut state);
        Ok(state)
    }
}

/// Unlock the gateway and keep only the first achievement per id.
fn normalize(state: &mut JourneyState) {
    let gateway_added = state.unlocked_layers.insert(Layer::Gateway);

    let before = state.technical_achievements.len();
    let mut seen = BTreeSet::new();
    state
        .technical_achievements
        .retain(|a| seen.insert(a.id.clone()));
    let duplicates = before.saturating_sub(state.technical_achievements.len());

    if gateway_added || duplicates > 0 {
        tracing::warn!(gateway_added, duplicates, "Repaired journey snapshot");
    }
}

/// Bring `envelope` up to [`CURRENT_VERSION`].
///
/// Version 0 to 1 repairs the shapes the unversioned layout allowed:
/// out-of-range layer indices are dropped, an invalid current layer falls
/// back to the gateway, and progress is clamped into `[0, 100]`.
///
/// # Errors
///
/// Returns [`PersistError::UnsupportedVersion`] if the envelope is newer
/// than [`CURRENT_VERSION`].
pub fn migrate(mut envelope: Envelope) -> Result<Envelope, PersistError> {
    if envelope.version > CURRENT_VERSION {
        return Err(PersistError::UnsupportedVersion {
            found: envelope.version,
            supported: CURRENT_VERSION,
        });
    }
    if envelope.version == 0 {
        repair_v0(&mut envelope.state);
        envelope.version = 1;
        tracing::info!(from = 0, to = 1, "Migrated journey snapshot");
    }
    Ok(envelope)
}

fn repair_v0(state: &mut Value) {
    let Some(fields) = state.as_object_mut() else {
        return;
    };

    let valid_layer =
        |v: &Value| -> bool { v.as_u64().is_some_and(|i| i <= u64::from(Layer::LAST_INDEX)) };

    let mut layers: Vec<u64> = fields
        .get("unlockedLayers")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter(|v| valid_layer(v)).filter_map(Value::as_u64).collect())
        .unwrap_or_default();
    layers.sort_unstable();
    layers.dedup();
    fields.insert("unlockedLayers".to_owned(), Value::from(layers));

    if !fields.get("currentLayer").is_some_and(valid_layer) {
        fields.insert("currentLayer".to_owned(), Value::from(0_u8));
    }

    let progress = fields
        .get("journeyProgress")
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
        .clamp(0.0, MAX_PROGRESS);
    fields.insert("journeyProgress".to_owned(), Value::from(progress));
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Durable key-value storage for snapshot envelopes.
pub trait SnapshotStore {
    /// Load the envelope stored under `key`, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] if the storage cannot be read or holds
    /// something that is not an envelope.
    fn load(&self, key: &str) -> Result<Option<Envelope>, PersistError>;

    /// Store `envelope` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] if the write fails.
    fn save(&mut self, key: &str, envelope: &Envelope) -> Result<(), PersistError>;

    /// Remove whatever is stored under `key`. Clearing a missing key is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] if the removal fails.
    fn clear(&mut self, key: &str) -> Result<(), PersistError>;
}

/// An in-process store. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Envelope>,
}

impl MemoryStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Envelope>, PersistError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, envelope: &Envelope) -> Result<(), PersistError> {
        self.entries.insert(key.to_owned(), envelope.clone());
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<(), PersistError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A directory of `<key>.json` files.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target, so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`. The directory is created on first
    /// write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory snapshots are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file a key maps to.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::InvalidKey`] unless the key is non-empty and
    /// made of ASCII letters, digits, `-` and `_`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, PersistError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PersistError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PersistError {
    PersistError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<Envelope>, PersistError> {
        let path = self.path_for(key)?;
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, e)),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&mut self, key: &str, envelope: &Envelope) -> Result<(), PersistError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;

        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec(envelope)?;
        std::fs::write(&tmp, body).map_err(|e| io_error(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_error(&path, e))?;

        tracing::trace!(path = %path.display(), "Wrote journey snapshot");
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<(), PersistError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn v0_snapshot() -> Value {
        json!({
            "state": {
                "currentLayer": 2,
                "journeyProgress": 140.0,
                "unlockedLayers": [2, 1, 7],
                "dataPoints": [],
                "philosophicalInsights": ["one"],
                "technicalAchievements": [
                    {"id": "data-collector", "title": "A", "description": "first",
                     "unlockedAt": 1, "rarity": "common"},
                    {"id": "data-collector", "title": "B", "description": "second",
                     "unlockedAt": 2, "rarity": "common"}
                ],
                "userInteractions": [],
                "dimensionShifts": 2,
                "infinityGlimpses": 1
            },
            "version": 0
        })
    }

    #[test]
    fn v0_snapshot_is_repaired() {
        let envelope: Envelope = serde_json::from_value(v0_snapshot()).unwrap_or_else(|_| Envelope {
            state: Value::Null,
            version: 99,
        });
        let state = envelope.into_state().unwrap_or_default();

        assert_eq!(state.current_layer, Layer::Philosophy);
        assert!(state.is_unlocked(Layer::Gateway));
        assert_eq!(state.unlocked_layers.len(), 3);
        assert!((state.journey_progress - 100.0).abs() < 1e-9);
        assert_eq!(state.technical_achievements.len(), 1);
        assert_eq!(state.technical_achievements[0].title, "A");
        assert_eq!(state.dimension_shifts, 2);
    }

    #[test]
    fn current_version_snapshots_are_normalized_too() {
        let raw = json!({
            "state": {
                "currentLayer": 3,
                "journeyProgress": 75.0,
                "unlockedLayers": [3],
                "dataPoints": [],
                "philosophicalInsights": [],
                "technicalAchievements": [
                    {"id": "data-collector", "title": "A", "description": "first",
                     "unlockedAt": 1, "rarity": "common"},
                    {"id": "data-collector", "title": "B", "description": "second",
                     "unlockedAt": 2, "rarity": "common"}
                ],
                "userInteractions": [],
                "dimensionShifts": 0,
                "infinityGlimpses": 0
            },
            "version": 1
        });
        let envelope: Envelope = serde_json::from_value(raw).unwrap_or_else(|_| Envelope {
            state: Value::Null,
            version: 99,
        });
        let state = envelope.into_state().unwrap_or_default();

        assert_eq!(state.current_layer, Layer::Technical);
        assert!(state.is_unlocked(Layer::Gateway));
        assert!(state.is_unlocked(Layer::Technical));
        assert_eq!(state.technical_achievements.len(), 1);
        assert_eq!(state.technical_achievements[0].title, "A");
    }

    #[test]
    fn missing_version_means_zero() {
        let raw = json!({"state": {"currentLayer": 0}});
        let envelope: Option<Envelope> = serde_json::from_value(raw).ok();
        assert_eq!(envelope.map(|e| e.version), Some(0));
    }

    #[test]
    fn future_version_is_rejected() {
        let envelope = Envelope {
            state: json!({}),
            version: CURRENT_VERSION + 1,
        };
        assert!(matches!(
            migrate(envelope),
            Err(PersistError::UnsupportedVersion { found: 2, supported: 1 })
        ));
    }

    #[test]
    fn current_version_passes_through() {
        let state = JourneyState::initial();
        let envelope = Envelope::wrap(&state).ok();
        assert_eq!(envelope.as_ref().map(|e| e.version), Some(CURRENT_VERSION));
        let restored = envelope.and_then(|e| e.into_state().ok());
        assert_eq!(restored, Some(state));
    }

    #[test]
    fn file_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().ok();
        let Some(dir) = dir else { return };
        let mut store = JsonFileStore::new(dir.path().join("nested"));

        assert!(matches!(store.load(STORAGE_KEY), Ok(None)));

        let envelope = Envelope::wrap(&JourneyState::initial()).ok();
        let Some(envelope) = envelope else { return };
        assert!(store.save(STORAGE_KEY, &envelope).is_ok());
        assert!(dir.path().join("nested/infinite-resume-storage.json").exists());

        let loaded = store.load(STORAGE_KEY).ok().flatten();
        assert_eq!(loaded, Some(envelope));

        assert!(store.clear(STORAGE_KEY).is_ok());
        assert!(store.clear(STORAGE_KEY).is_ok());
        assert!(matches!(store.load(STORAGE_KEY), Ok(None)));
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let store = JsonFileStore::new("/tmp");
        assert!(matches!(store.path_for("../etc/passwd"), Err(PersistError::InvalidKey(_))));
        assert!(matches!(store.path_for(""), Err(PersistError::InvalidKey(_))));
    }

    #[test]
    fn memory_store_overwrites() {
        let mut store = MemoryStore::new();
        let first = Envelope {
            state: json!({"a": 1}),
            version: 1,
        };
        let second = Envelope {
            state: json!({"a": 2}),
            version: 1,
        };
        assert!(store.save("k", &first).is_ok());
        assert!(store.save("k", &second).is_ok());
        assert_eq!(store.len(), 1);
        assert_eq!(store.load("k").ok().flatten(), Some(second));
    }
}
