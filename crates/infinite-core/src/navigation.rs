//! Layer navigation policy.
//!
//! Jumps and arrow moves only land on unlocked layers. Whether a move counts
//! as a dimension shift is decided here too: any change of the current
//! layer to a layer past the gateway does.

use infinite_journey::JourneyError;
use infinite_types::{JourneyState, Layer};

use crate::SessionError;

/// An arrow-key move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward the gateway.
    Up,
    /// Deeper into the journey.
    Down,
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
        })
    }
}

/// Check that `layer` may be jumped to.
///
/// # Errors
///
/// Returns [`JourneyError::LayerLocked`] (wrapped) if it is locked.
pub fn check_target(state: &JourneyState, layer: Layer) -> Result<Layer, SessionError> {
    if state.is_unlocked(layer) {
        Ok(layer)
    } else {
        tracing::info!(layer = layer.index(), "Layer is locked");
        Err(JourneyError::LayerLocked(layer).into())
    }
}

/// The layer an arrow move from the current layer lands on.
///
/// # Errors
///
/// Returns [`SessionError::AtEdge`] past either end, or a locked-layer error
/// when the neighbour is not unlocked.
pub fn neighbour(state: &JourneyState, direction: Direction) -> Result<Layer, SessionError> {
    let current = state.current_layer;
    let next = match direction {
        Direction::Up => current.previous(),
        Direction::Down => current.next(),
    };
    let layer = next.ok_or(SessionError::AtEdge {
        direction,
        layer: current,
    })?;
    check_target(state, layer)
}

/// Whether moving from `from` to `to` counts as a dimension shift.
pub fn is_dimension_shift(from: Layer, to: Layer) -> bool {
    from != to && to != Layer::Gateway
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(current: Layer, unlocked: &[Layer]) -> JourneyState {
        let mut state = JourneyState::initial();
        state.current_layer = current;
        state.unlocked_layers.extend(unlocked.iter().copied());
        state
    }

    #[test]
    fn locked_jump_is_refused() {
        let state = state_with(Layer::Gateway, &[]);
        assert!(matches!(
            check_target(&state, Layer::Technical),
            Err(SessionError::Journey {
                source: JourneyError::LayerLocked(Layer::Technical)
            })
        ));
        assert!(matches!(check_target(&state, Layer::Gateway), Ok(Layer::Gateway)));
    }

    #[test]
    fn down_requires_the_next_layer_unlocked() {
        let state = state_with(Layer::Narrative, &[Layer::Narrative]);
        assert!(neighbour(&state, Direction::Down).is_err());

        let state = state_with(Layer::Narrative, &[Layer::Narrative, Layer::Philosophy]);
        assert!(matches!(neighbour(&state, Direction::Down), Ok(Layer::Philosophy)));
    }

    #[test]
    fn up_moves_toward_the_gateway() {
        let state = state_with(Layer::Narrative, &[Layer::Narrative]);
        assert!(matches!(neighbour(&state, Direction::Up), Ok(Layer::Gateway)));
    }

    #[test]
    fn edges_are_reported() {
        let state = state_with(Layer::Gateway, &[]);
        assert!(matches!(
            neighbour(&state, Direction::Up),
            Err(SessionError::AtEdge {
                direction: Direction::Up,
                layer: Layer::Gateway
            })
        ));

        let state = state_with(Layer::Psychological, &Layer::ALL);
        assert!(matches!(
            neighbour(&state, Direction::Down),
            Err(SessionError::AtEdge { .. })
        ));
    }

    #[test]
    fn shifts_count_only_real_moves_past_the_gateway() {
        assert!(is_dimension_shift(Layer::Gateway, Layer::Narrative));
        assert!(is_dimension_shift(Layer::Technical, Layer::Narrative));
        assert!(!is_dimension_shift(Layer::Narrative, Layer::Gateway));
        assert!(!is_dimension_shift(Layer::Philosophy, Layer::Philosophy));
    }
}
