//! Journey commands and the reducer that applies them.
//!
//! Every mutation of a [`JourneyState`] goes through [`reduce`]. A command
//! and the achievements it triggers are applied together before the reducer
//! returns, so an observer never sees a state where the threshold was
//! crossed but the badge is missing.
//!
//! # Progress
//!
//! Progress is a derived score:
//!
//! ```text
//! min(100, layer/4*100 + 0.5*|data| + 2*|insights| + 3*|achievements|)
//! ```
//!
//! It is recomputed after data, insight, and achievement changes. Changing
//! the current layer only ever raises it to the layer floor.

use infinite_types::{Achievement, AchievementId, DataPoint, Interaction, JourneyState, Layer};

use crate::achievements;

/// Upper bound of the progress score.
pub const MAX_PROGRESS: f64 = 100.0;

/// A single mutation of the journey state.
#[derive(Debug, Clone, PartialEq)]
pub enum JourneyCommand {
    /// Make `layer` current, raising progress to the layer floor and
    /// unlocking it. Performs no unlock check.
    SetCurrentLayer(Layer),
    /// Add a layer to the unlocked set.
    UnlockLayer(Layer),
    /// Unlock every layer.
    UnlockAll,
    /// Append a data point.
    AddDataPoint(DataPoint),
    /// Append an insight. Duplicates are kept.
    AddPhilosophicalInsight(String),
    /// Append an achievement unless one with the same id exists.
    AddTechnicalAchievement(Achievement),
    /// Append to the interaction log.
    RecordInteraction(Interaction),
    /// Count one dimension shift.
    IncrementDimensionShifts,
    /// Count one infinity glimpse.
    IncrementInfinityGlimpses,
    /// Restore the initial state.
    Reset,
}

impl JourneyCommand {
    /// Short name used in log lines.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetCurrentLayer(_) => "set_current_layer",
            Self::UnlockLayer(_) => "unlock_layer",
            Self::UnlockAll => "unlock_all",
            Self::AddDataPoint(_) => "add_data_point",
            Self::AddPhilosophicalInsight(_) => "add_philosophical_insight",
            Self::AddTechnicalAchievement(_) => "add_technical_achievement",
            Self::RecordInteraction(_) => "record_interaction",
            Self::IncrementDimensionShifts => "increment_dimension_shifts",
            Self::IncrementInfinityGlimpses => "increment_infinity_glimpses",
            Self::Reset => "reset",
        }
    }
}

/// Inputs the reducer needs besides the state and the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReduceContext {
    /// Timestamp (epoch millis) stamped on automatically granted badges.
    pub now: i64,
    /// Interaction log cap. `0` keeps every entry.
    pub max_interactions: usize,
}

/// What a command did beyond mutating the state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    /// Achievements appended by this command, in grant order.
    pub granted: Vec<Achievement>,
    /// Set when an explicitly added achievement was already unlocked.
    pub already_unlocked: Option<AchievementId>,
    /// Interactions dropped from the front of the log by the cap.
    pub evicted_interactions: usize,
}

/// Apply `command` to `state`.
///
/// The data operations are total: there is no input that makes this fail.
pub fn reduce(state: &mut JourneyState, command: JourneyCommand, ctx: &ReduceContext) -> Transition {
    let mut transition = Transition::default();

    match command {
        JourneyCommand::SetCurrentLayer(layer) => {
            state.current_layer = layer;
            state.journey_progress = state
                .journey_progress
                .max(layer_floor(layer))
                .min(MAX_PROGRESS);
            state.unlocked_layers.insert(layer);
        }
        JourneyCommand::UnlockLayer(layer) => {
            state.unlocked_layers.insert(layer);
        }
        JourneyCommand::UnlockAll => {
            state.unlocked_layers.extend(Layer::ALL);
        }
        JourneyCommand::AddDataPoint(point) => {
            state.data_points.push(point);
            if state.data_points.len() >= achievements::DATA_COLLECTOR_THRESHOLD {
                grant(state, achievements::data_collector(ctx.now), &mut transition);
            }
            state.journey_progress = compute_progress(state);
        }
        JourneyCommand::AddPhilosophicalInsight(insight) => {
            state.philosophical_insights.push(insight);
            state.journey_progress = compute_progress(state);
        }
        JourneyCommand::AddTechnicalAchievement(achievement) => {
            let id = achievement.id.clone();
            if !grant(state, achievement, &mut transition) {
                transition.already_unlocked = Some(id);
            }
            state.journey_progress = compute_progress(state);
        }
        JourneyCommand::RecordInteraction(interaction) => {
            state.user_interactions.push(interaction);
            transition.evicted_interactions = cap_interactions(state, ctx.max_interactions);
        }
        JourneyCommand::IncrementDimensionShifts => {
            state.dimension_shifts = state.dimension_shifts.saturating_add(1);
            if state.dimension_shifts == achievements::DIMENSION_WALKER_THRESHOLD
                && grant(state, achievements::dimension_walker(ctx.now), &mut transition)
            {
                state.journey_progress = compute_progress(state);
            }
        }
        JourneyCommand::IncrementInfinityGlimpses => {
            state.infinity_glimpses = state.infinity_glimpses.saturating_add(1);
            if state.infinity_glimpses == achievements::INFINITY_SEEKER_THRESHOLD
                && grant(state, achievements::infinity_seeker(ctx.now), &mut transition)
            {
                state.journey_progress = compute_progress(state);
            }
        }
        JourneyCommand::Reset => {
            *state = JourneyState::initial();
        }
    }

    transition
}

/// Append `achievement` unless its id is already present. Returns whether it
/// was appended.
fn grant(state: &mut JourneyState, achievement: Achievement, transition: &mut Transition) -> bool {
    if state.has_achievement(achievement.id.as_str()) {
        return false;
    }
    state.technical_achievements.push(achievement.clone());
    transition.granted.push(achievement);
    true
}

/// Drop the oldest interactions beyond `max`. Returns how many were dropped.
fn cap_interactions(state: &mut JourneyState, max: usize) -> usize {
    if max == 0 || state.user_interactions.len() <= max {
        return 0;
    }
    let excess = state.user_interactions.len().saturating_sub(max);
    state.user_interactions.drain(..excess);
    excess
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// The progress contributed by being on `layer`: 25 points per layer.
pub fn layer_floor(layer: Layer) -> f64 {
    f64::from(layer.index()) / f64::from(Layer::LAST_INDEX) * MAX_PROGRESS
}

/// Recompute the progress score from the state's layer and collections.
pub fn compute_progress(state: &JourneyState) -> f64 {
    let raw = layer_floor(state.current_layer)
        + 0.5 * count(state.data_points.len())
        + 2.0 * count(state.philosophical_insights.len())
        + 3.0 * count(state.technical_achievements.len());
    raw.min(MAX_PROGRESS)
}

fn count(len: usize) -> f64 {
    f64::from(u32::try_from(len).unwrap_or(u32::MAX))
}
