//! The journey tracker: owner of the session state.
//!
//! [`JourneyTracker`] holds the one [`JourneyState`] of a session, applies
//! commands through the reducer, and writes the result through to its
//! [`SnapshotStore`] after every mutation. Write failures are logged and
//! swallowed; the in-memory state stays authoritative.

use infinite_types::{Achievement, DataPoint, Interaction, JourneyState, Layer, now_millis};

use crate::JourneyError;
use crate::persistence::{Envelope, STORAGE_KEY, SnapshotStore};
use crate::reducer::{JourneyCommand, ReduceContext, Transition, reduce};

/// Default interaction log cap.
pub const DEFAULT_MAX_INTERACTIONS: usize = 10_000;

/// Tracker settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSettings {
    /// Storage key the state is persisted under.
    pub key: String,
    /// Interaction log cap. `0` keeps every entry.
    pub max_interactions: usize,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            key: STORAGE_KEY.to_owned(),
            max_interactions: DEFAULT_MAX_INTERACTIONS,
        }
    }
}

/// Where the tracker's initial state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateOrigin {
    /// Nothing was stored; the session starts from the initial state.
    Fresh,
    /// A snapshot was loaded and migrated from the given version.
    Restored {
        /// Envelope version found in storage.
        from_version: u32,
    },
    /// A snapshot existed but could not be read; it was replaced.
    Discarded,
}

/// The single owner of a session's journey state.
#[derive(Debug)]
pub struct JourneyTracker<S> {
    state: JourneyState,
    store: S,
    settings: TrackerSettings,
    origin: StateOrigin,
}

impl<S: SnapshotStore> JourneyTracker<S> {
    /// Rehydrate from `store`, or start fresh if it holds nothing usable.
    pub fn open(store: S, settings: TrackerSettings) -> Self {
        let (state, origin) = match store.load(&settings.key) {
            Ok(None) => (JourneyState::initial(), StateOrigin::Fresh),
            Ok(Some(envelope)) => {
                let from_version = envelope.version;
                match envelope.into_state() {
                    Ok(state) => (state, StateOrigin::Restored { from_version }),
                    Err(e) => {
                        tracing::warn!(key = %settings.key, error = %e, "Discarding unreadable journey snapshot");
                        (JourneyState::initial(), StateOrigin::Discarded)
                    }
                }
            }
            Err(e) => {
                tracing::warn!(key = %settings.key, error = %e, "Discarding unreadable journey snapshot");
                (JourneyState::initial(), StateOrigin::Discarded)
            }
        };

        tracing::info!(
            key = %settings.key,
            origin = ?origin,
            layer = state.current_layer.index(),
            progress = state.journey_progress,
            "Journey tracker opened"
        );

        Self {
            state,
            store,
            settings,
            origin,
        }
    }

    /// Apply a command stamped with the current time.
    pub fn apply(&mut self, command: JourneyCommand) -> Transition {
        self.apply_at(command, now_millis())
    }

    /// Apply a command stamped with `now` (epoch millis), then persist.
    pub fn apply_at(&mut self, command: JourneyCommand, now: i64) -> Transition {
        let name = command.name();
        let ctx = ReduceContext {
            now,
            max_interactions: self.settings.max_interactions,
        };
        let transition = reduce(&mut self.state, command, &ctx);

        tracing::debug!(
            command = name,
            progress = self.state.journey_progress,
            "Applied journey command"
        );
        for achievement in &transition.granted {
            tracing::info!(
                id = %achievement.id,
                rarity = ?achievement.rarity,
                title = %achievement.title,
                "Achievement unlocked"
            );
        }
        if let Some(id) = &transition.already_unlocked {
            tracing::debug!(%id, "Achievement already unlocked");
        }

        self.persist();
        transition
    }

    fn persist(&mut self) {
        let result =
            Envelope::wrap(&self.state).and_then(|e| self.store.save(&self.settings.key, &e));
        if let Err(e) = result {
            tracing::warn!(key = %self.settings.key, error = %e, "Failed to persist journey state");
        }
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Make `layer` current without checking that it is unlocked.
    pub fn set_current_layer(&mut self, layer: Layer) -> Transition {
        self.apply(JourneyCommand::SetCurrentLayer(layer))
    }

    /// Make `layer` current if it is unlocked.
    ///
    /// # Errors
    ///
    /// Returns [`JourneyError::LayerLocked`] if `layer` is not unlocked. The
    /// state is left untouched.
    pub fn navigate(&mut self, layer: Layer) -> Result<Transition, JourneyError> {
        if !self.state.is_unlocked(layer) {
            tracing::debug!(layer = layer.index(), "Navigation to locked layer refused");
            return Err(JourneyError::LayerLocked(layer));
        }
        Ok(self.set_current_layer(layer))
    }

    /// Add `layer` to the unlocked set.
    pub fn unlock_layer(&mut self, layer: Layer) -> Transition {
        self.apply(JourneyCommand::UnlockLayer(layer))
    }

    /// Unlock every layer.
    pub fn unlock_all(&mut self) -> Transition {
        self.apply(JourneyCommand::UnlockAll)
    }

    /// Append a data point.
    pub fn add_data_point(&mut self, point: DataPoint) -> Transition {
        self.apply(JourneyCommand::AddDataPoint(point))
    }

    /// Append a philosophical insight.
    pub fn add_philosophical_insight(&mut self, insight: impl Into<String>) -> Transition {
        self.apply(JourneyCommand::AddPhilosophicalInsight(insight.into()))
    }

    /// Append an achievement unless its id is already unlocked.
    pub fn add_technical_achievement(&mut self, achievement: Achievement) -> Transition {
        self.apply(JourneyCommand::AddTechnicalAchievement(achievement))
    }

    /// Append to the interaction log.
    pub fn record_interaction(&mut self, interaction: Interaction) -> Transition {
        self.apply(JourneyCommand::RecordInteraction(interaction))
    }

    /// Count a dimension shift.
    pub fn increment_dimension_shifts(&mut self) -> Transition {
        self.apply(JourneyCommand::IncrementDimensionShifts)
    }

    /// Count an infinity glimpse.
    pub fn increment_infinity_glimpses(&mut self) -> Transition {
        self.apply(JourneyCommand::IncrementInfinityGlimpses)
    }

    /// Restore the initial state and persist it.
    pub fn reset(&mut self) -> Transition {
        tracing::info!("Journey reset");
        self.apply(JourneyCommand::Reset)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The current state.
    pub const fn state(&self) -> &JourneyState {
        &self.state
    }

    /// The current progress score.
    pub const fn progress(&self) -> f64 {
        self.state.journey_progress
    }

    /// Whether `layer` is unlocked.
    pub fn is_unlocked(&self, layer: Layer) -> bool {
        self.state.is_unlocked(layer)
    }

    /// Whether the achievement `id` is unlocked.
    pub fn has_achievement(&self, id: &str) -> bool {
        self.state.has_achievement(id)
    }

    /// Where the initial state came from.
    pub const fn origin(&self) -> StateOrigin {
        self.origin
    }

    /// The tracker's settings.
    pub const fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// The backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consume the tracker, returning its store.
    pub fn into_store(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::achievements;
    use crate::persistence::{JsonFileStore, MemoryStore};
    use crate::PersistError;

    fn tracker() -> JourneyTracker<MemoryStore> {
        JourneyTracker::open(MemoryStore::new(), TrackerSettings::default())
    }

    #[test]
    fn opens_fresh_on_empty_store() {
        let tracker = tracker();
        assert_eq!(tracker.origin(), StateOrigin::Fresh);
        assert_eq!(tracker.state(), &JourneyState::initial());
    }

    #[test]
    fn navigate_refuses_locked_layers() {
        let mut tracker = tracker();
        let result = tracker.navigate(Layer::Technical);
        assert!(matches!(result, Err(JourneyError::LayerLocked(Layer::Technical))));
        assert_eq!(tracker.state().current_layer, Layer::Gateway);

        tracker.unlock_layer(Layer::Narrative);
        assert!(tracker.navigate(Layer::Narrative).is_ok());
        assert_eq!(tracker.state().current_layer, Layer::Narrative);
    }

    #[test]
    fn unlock_all_opens_every_layer() {
        let mut tracker = tracker();
        tracker.unlock_all();
        assert!(Layer::ALL.iter().all(|l| tracker.is_unlocked(*l)));
    }

    #[test]
    fn every_mutation_writes_through() {
        let mut tracker = tracker();
        tracker.add_philosophical_insight("first");
        let saved = tracker
            .store()
            .load(STORAGE_KEY)
            .ok()
            .flatten()
            .and_then(|e| e.into_state().ok());
        assert_eq!(saved.map(|s| s.philosophical_insights), Some(vec!["first".to_owned()]));
    }

    #[test]
    fn reload_restores_the_same_state() {
        let mut tracker = tracker();
        tracker.unlock_layer(Layer::Narrative);
        tracker.set_current_layer(Layer::Narrative);
        tracker.add_data_point(DataPoint::new("narrative", json!("moment"), Vec::new()));
        tracker.increment_infinity_glimpses();
        let before = tracker.state().clone();

        let reopened = JourneyTracker::open(tracker.into_store(), TrackerSettings::default());
        assert_eq!(reopened.origin(), StateOrigin::Restored { from_version: 1 });
        assert_eq!(reopened.state(), &before);
    }

    #[test]
    fn restored_snapshots_keep_the_gateway_open() {
        let mut store = MemoryStore::new();
        let edited = Envelope {
            state: json!({
                "currentLayer": 3,
                "journeyProgress": 75.0,
                "unlockedLayers": [3],
                "dataPoints": [],
                "philosophicalInsights": [],
                "technicalAchievements": [
                    {"id": "data-collector", "title": "A", "description": "first",
                     "unlockedAt": 1, "rarity": "common"},
                    {"id": "data-collector", "title": "A", "description": "again",
                     "unlockedAt": 2, "rarity": "common"}
                ],
                "userInteractions": [],
                "dimensionShifts": 0,
                "infinityGlimpses": 0
            }),
            version: 1,
        };
        assert!(store.save(STORAGE_KEY, &edited).is_ok());

        let tracker = JourneyTracker::open(store, TrackerSettings::default());
        assert_eq!(tracker.origin(), StateOrigin::Restored { from_version: 1 });
        assert!(tracker.is_unlocked(Layer::Gateway));
        assert_eq!(tracker.state().technical_achievements.len(), 1);
    }

    #[test]
    fn corrupt_snapshot_is_discarded() {
        let mut store = MemoryStore::new();
        let bad = Envelope {
            state: json!({"currentLayer": "upstairs"}),
            version: 1,
        };
        assert!(store.save(STORAGE_KEY, &bad).is_ok());

        let tracker = JourneyTracker::open(store, TrackerSettings::default());
        assert_eq!(tracker.origin(), StateOrigin::Discarded);
        assert_eq!(tracker.state(), &JourneyState::initial());
    }

    /// A store whose writes always fail.
    struct ReadOnlyStore;

    impl SnapshotStore for ReadOnlyStore {
        fn load(&self, _key: &str) -> Result<Option<Envelope>, PersistError> {
            Ok(None)
        }

        fn save(&mut self, key: &str, _envelope: &Envelope) -> Result<(), PersistError> {
            Err(PersistError::InvalidKey(key.to_owned()))
        }

        fn clear(&mut self, _key: &str) -> Result<(), PersistError> {
            Ok(())
        }
    }

    #[test]
    fn write_failures_do_not_reach_the_caller() {
        let mut tracker = JourneyTracker::open(ReadOnlyStore, TrackerSettings::default());
        let transition = tracker.add_technical_achievement(achievements::technical_master(1));
        assert_eq!(transition.granted.len(), 1);
        assert!(tracker.has_achievement(achievements::TECHNICAL_MASTER));
    }

    #[test]
    fn file_backed_tracker_survives_restart() {
        let Some(dir) = tempfile::tempdir().ok() else { return };
        let settings = TrackerSettings::default();

        let mut first = JourneyTracker::open(JsonFileStore::new(dir.path()), settings.clone());
        for _ in 0..5 {
            first.increment_dimension_shifts();
        }
        drop(first);

        let second = JourneyTracker::open(JsonFileStore::new(dir.path()), settings);
        assert_eq!(second.state().dimension_shifts, 5);
        assert!(second.has_achievement(achievements::DIMENSION_WALKER));
    }
}
