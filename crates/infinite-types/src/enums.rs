//! Enumeration types for the Infinite Resume journey.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Errors raised when converting raw values into journey enums.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayerError {
    /// A layer index outside `0..=4` was supplied.
    #[error("layer index {0} is out of range (expected 0..=4)")]
    OutOfRange(u8),

    /// A name did not match any known variant.
    #[error("unknown {kind}: {value}")]
    UnknownName {
        /// The enum being parsed (e.g. "concept").
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

/// One of the five full-screen narrative sections of the journey.
///
/// Layers serialize as their integer index (0-4) so the persisted layout
/// stays compatible with the browser snapshot format. Out-of-range indices
/// are rejected at the deserialization boundary.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Layer {
    /// Layer 0: the entrance, always unlocked.
    #[default]
    Gateway,
    /// Layer 1: where data tells its story.
    Narrative,
    /// Layer 2: the metaphysical framework.
    Philosophy,
    /// Layer 3: technical mastery revealed.
    Technical,
    /// Layer 4: the psychological connection.
    Psychological,
}

impl Layer {
    /// All layers in journey order.
    pub const ALL: [Self; 5] = [
        Self::Gateway,
        Self::Narrative,
        Self::Philosophy,
        Self::Technical,
        Self::Psychological,
    ];

    /// Number of layers in the journey.
    pub const COUNT: u8 = 5;

    /// The highest layer index.
    pub const LAST_INDEX: u8 = 4;

    /// Return the layer's integer index (0-4).
    pub const fn index(self) -> u8 {
        match self {
            Self::Gateway => 0,
            Self::Narrative => 1,
            Self::Philosophy => 2,
            Self::Technical => 3,
            Self::Psychological => 4,
        }
    }

    /// Return the next layer, or `None` from the last one.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Gateway => Some(Self::Narrative),
            Self::Narrative => Some(Self::Philosophy),
            Self::Philosophy => Some(Self::Technical),
            Self::Technical => Some(Self::Psychological),
            Self::Psychological => None,
        }
    }

    /// Return the previous layer, or `None` from the gateway.
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Gateway => None,
            Self::Narrative => Some(Self::Gateway),
            Self::Philosophy => Some(Self::Narrative),
            Self::Technical => Some(Self::Philosophy),
            Self::Psychological => Some(Self::Technical),
        }
    }

    /// Display name shown in the navigation overlay.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gateway => "Gateway",
            Self::Narrative => "Narrative",
            Self::Philosophy => "Philosophy",
            Self::Technical => "Technical",
            Self::Psychological => "Psychological",
        }
    }

    /// One-line description shown in the navigation overlay.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Gateway => "The entrance to infinite dimensions",
            Self::Narrative => "Where data tells its story",
            Self::Philosophy => "The metaphysical framework",
            Self::Technical => "Technical mastery revealed",
            Self::Psychological => "The psychological connection",
        }
    }
}

impl TryFrom<u8> for Layer {
    type Error = LayerError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Self::Gateway),
            1 => Ok(Self::Narrative),
            2 => Ok(Self::Philosophy),
            3 => Ok(Self::Technical),
            4 => Ok(Self::Psychological),
            other => Err(LayerError::OutOfRange(other)),
        }
    }
}

impl From<Layer> for u8 {
    fn from(layer: Layer) -> Self {
        layer.index()
    }
}

impl core::fmt::Display for Layer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.name(), self.index())
    }
}

// ---------------------------------------------------------------------------
// Achievements
// ---------------------------------------------------------------------------

/// How rare an achievement is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Rarity {
    /// Granted through ordinary engagement.
    Common,
    /// Requires repeated exploration.
    Rare,
    /// Requires deliberate effort.
    Legendary,
    /// The final connection.
    Transcendent,
}

// ---------------------------------------------------------------------------
// Layer content
// ---------------------------------------------------------------------------

/// Philosophical concepts explorable in the Philosophy layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Concept {
    /// Godel's incompleteness theorems.
    Godel,
    /// Buddhist impermanence.
    Buddhism,
    /// Quantum superposition.
    Quantum,
}

impl Concept {
    /// All concepts in display order.
    pub const ALL: [Self; 3] = [Self::Godel, Self::Buddhism, Self::Quantum];

    /// Lowercase identifier used in interactions and commands.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Godel => "godel",
            Self::Buddhism => "buddhism",
            Self::Quantum => "quantum",
        }
    }
}

impl core::str::FromStr for Concept {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| LayerError::UnknownName {
                kind: "concept",
                value: s.to_owned(),
            })
    }
}

/// Top-level panels of the Technical layer.
///
/// Opening a panel counts as exploring it; the layer completes once
/// enough distinct panels have been explored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum Demo {
    /// Animated algorithm visualizations.
    Algorithms,
    /// The sandboxed code runner.
    LiveCode,
    /// The self-modifying code panel.
    SelfModify,
    /// Impact metrics.
    Metrics,
}

impl Demo {
    /// All panels in display order.
    pub const ALL: [Self; 4] = [Self::Algorithms, Self::LiveCode, Self::SelfModify, Self::Metrics];

    /// Kebab-case identifier used in interactions and commands.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Algorithms => "algorithms",
            Self::LiveCode => "live-code",
            Self::SelfModify => "self-modify",
            Self::Metrics => "metrics",
        }
    }
}

impl core::str::FromStr for Demo {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| LayerError::UnknownName {
                kind: "demo",
                value: s.to_owned(),
            })
    }
}

/// Visualizations inside the [`Demo::Algorithms`] panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Algorithm {
    /// Bubble sort stepping.
    Sort,
    /// Grid pathfinding.
    Pathfind,
    /// Neural network forward pass.
    Ml,
}

impl Algorithm {
    /// All algorithms in display order.
    pub const ALL: [Self; 3] = [Self::Sort, Self::Pathfind, Self::Ml];

    /// Lowercase identifier used in commands.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sort => "sort",
            Self::Pathfind => "pathfind",
            Self::Ml => "ml",
        }
    }
}

impl core::str::FromStr for Algorithm {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| LayerError::UnknownName {
                kind: "algorithm",
                value: s.to_owned(),
            })
    }
}

/// Contact channels offered by the Psychological layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum ContactMethod {
    /// Email address.
    Email,
    /// Professional network profile.
    Linkedin,
    /// Scheduling link.
    Calendar,
}

impl ContactMethod {
    /// All contact methods in display order.
    pub const ALL: [Self; 3] = [Self::Email, Self::Linkedin, Self::Calendar];

    /// Lowercase identifier used in commands and achievement text.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Linkedin => "linkedin",
            Self::Calendar => "calendar",
        }
    }
}

impl core::str::FromStr for ContactMethod {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| LayerError::UnknownName {
                kind: "contact method",
                value: s.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_index_roundtrip() {
        for layer in Layer::ALL {
            assert_eq!(Layer::try_from(layer.index()), Ok(layer));
        }
        assert_eq!(Layer::try_from(5), Err(LayerError::OutOfRange(5)));
    }

    #[test]
    fn layer_serializes_as_integer() {
        let json = serde_json::to_string(&Layer::Technical).unwrap_or_default();
        assert_eq!(json, "3");
        let bad: Result<Layer, _> = serde_json::from_str("9");
        assert!(bad.is_err());
    }

    #[test]
    fn layer_neighbours() {
        assert_eq!(Layer::Gateway.previous(), None);
        assert_eq!(Layer::Gateway.next(), Some(Layer::Narrative));
        assert_eq!(Layer::Psychological.next(), None);
    }

    #[test]
    fn rarity_is_lowercase_on_the_wire() {
        let json = serde_json::to_string(&Rarity::Transcendent).unwrap_or_default();
        assert_eq!(json, "\"transcendent\"");
    }

    #[test]
    fn names_parse() {
        assert_eq!("quantum".parse::<Concept>(), Ok(Concept::Quantum));
        assert_eq!("ml".parse::<Algorithm>(), Ok(Algorithm::Ml));
        assert_eq!("live-code".parse::<Demo>(), Ok(Demo::LiveCode));
        assert!("ml".parse::<Demo>().is_err());
        assert!("fax".parse::<ContactMethod>().is_err());
    }

    #[test]
    fn demo_panels_are_kebab_case_on_the_wire() {
        let json = serde_json::to_string(&Demo::SelfModify).unwrap_or_default();
        assert_eq!(json, "\"self-modify\"");
        for demo in Demo::ALL {
            assert_eq!(json_name(demo), demo.as_str());
        }
    }

    fn json_name(demo: Demo) -> String {
        serde_json::to_string(&demo)
            .unwrap_or_default()
            .trim_matches('"')
            .to_owned()
    }
}
