//! Core journey structs: the session state and its append-only collections.
//!
//! Field names serialize in camelCase so a snapshot written by this crate
//! has the same shape as the one the browser front-end persists.

use std::collections::BTreeSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Layer, Rarity};
use crate::ids::{AchievementId, DataPointId};

/// Current wall-clock time as milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// A piece of data collected while moving through the layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct DataPoint {
    /// Unique identifier.
    pub id: DataPointId,
    /// Collection time in epoch milliseconds.
    #[ts(type = "number")]
    pub timestamp: i64,
    /// Opaque payload.
    pub value: serde_json::Value,
    /// Tag naming the dimension the point was collected in.
    pub dimension: String,
    /// Identifiers of related data points or narrative nodes.
    pub connections: Vec<String>,
}

impl DataPoint {
    /// Build a data point with a generated id (prefixed by the dimension)
    /// and the current timestamp.
    pub fn new(
        dimension: impl Into<String>,
        value: serde_json::Value,
        connections: Vec<String>,
    ) -> Self {
        let dimension = dimension.into();
        Self {
            id: DataPointId::generate(&dimension),
            timestamp: now_millis(),
            value,
            dimension,
            connections,
        }
    }
}

/// A one-time unlockable badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Achievement {
    /// Unique key; unlocking is idempotent per id.
    pub id: AchievementId,
    /// Short title.
    pub title: String,
    /// One-line description.
    pub description: String,
    /// Unlock time in epoch milliseconds.
    #[ts(type = "number")]
    pub unlocked_at: i64,
    /// Rarity tier.
    pub rarity: Rarity,
}

/// A telemetry record of something the visitor did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Interaction {
    /// Interaction kind, e.g. `philosophical_concept_explored`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Time in epoch milliseconds.
    #[ts(type = "number")]
    pub timestamp: i64,
    /// Layer the interaction happened in.
    #[ts(type = "number")]
    pub layer: Layer,
    /// Optional opaque payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub data: Option<serde_json::Value>,
}

impl Interaction {
    /// Build an interaction stamped with the current time.
    pub fn new(kind: impl Into<String>, layer: Layer, data: Option<serde_json::Value>) -> Self {
        Self {
            kind: kind.into(),
            timestamp: now_millis(),
            layer,
            data,
        }
    }
}

// ---------------------------------------------------------------------------
// Journey state
// ---------------------------------------------------------------------------

/// The whole session state of a visitor's journey.
///
/// One value of this type is the single source of truth for progress. It is
/// rehydrated from storage at load, mutated only through the journey
/// reducer, and wiped by a reset. Missing fields decode to their initial
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export, export_to = "bindings/")]
pub struct JourneyState {
    /// The layer currently on screen.
    #[ts(type = "number")]
    pub current_layer: Layer,
    /// Derived engagement score in `[0, 100]`.
    pub journey_progress: f64,
    /// Layers the visitor may navigate to. Always contains the gateway.
    #[ts(type = "Array<number>")]
    pub unlocked_layers: BTreeSet<Layer>,
    /// Collected data points, in insertion order.
    pub data_points: Vec<DataPoint>,
    /// Collected insights, in insertion order. Duplicates allowed.
    pub philosophical_insights: Vec<String>,
    /// Unlocked achievements, in unlock order.
    pub technical_achievements: Vec<Achievement>,
    /// Interaction telemetry, oldest first.
    pub user_interactions: Vec<Interaction>,
    /// Number of times the visitor moved into a non-gateway layer.
    pub dimension_shifts: u32,
    /// Number of times the visitor glimpsed the infinite.
    pub infinity_glimpses: u32,
}

impl JourneyState {
    /// The documented initial state: gateway layer, only the gateway
    /// unlocked, zero counters, empty collections.
    pub fn initial() -> Self {
        Self {
            current_layer: Layer::Gateway,
            journey_progress: 0.0,
            unlocked_layers: BTreeSet::from([Layer::Gateway]),
            data_points: Vec::new(),
            philosophical_insights: Vec::new(),
            technical_achievements: Vec::new(),
            user_interactions: Vec::new(),
            dimension_shifts: 0,
            infinity_glimpses: 0,
        }
    }

    /// Whether an achievement with the given id has been unlocked.
    pub fn has_achievement(&self, id: &str) -> bool {
        self.technical_achievements.iter().any(|a| a.id == id)
    }

    /// Whether the given layer is unlocked.
    pub fn is_unlocked(&self, layer: Layer) -> bool {
        self.unlocked_layers.contains(&layer)
    }
}

impl Default for JourneyState {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_has_only_gateway_unlocked() {
        let state = JourneyState::initial();
        assert_eq!(state.current_layer, Layer::Gateway);
        assert_eq!(state.unlocked_layers.len(), 1);
        assert!(state.is_unlocked(Layer::Gateway));
        assert_eq!(state.dimension_shifts, 0);
        assert!(state.data_points.is_empty());
    }

    #[test]
    fn state_uses_browser_field_names() {
        let state = JourneyState::initial();
        let json = serde_json::to_value(&state).unwrap_or_default();
        assert_eq!(json["currentLayer"], 0);
        assert_eq!(json["unlockedLayers"], serde_json::json!([0]));
        assert!(json.get("infinityGlimpses").is_some());
    }

    #[test]
    fn interaction_type_field_and_optional_data() {
        let interaction = Interaction::new("node_selected", Layer::Narrative, None);
        let json = serde_json::to_value(&interaction).unwrap_or_default();
        assert_eq!(json["type"], "node_selected");
        assert_eq!(json["layer"], 1);
        assert!(json.get("data").is_none());
    }

    #[test]
    fn data_point_id_uses_dimension_prefix() {
        let point = DataPoint::new("narrative", serde_json::json!({"mode": "linear"}), Vec::new());
        assert!(point.id.as_str().starts_with("narrative-"));
        assert!(point.timestamp > 0);
    }
}
