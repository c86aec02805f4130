//! Per-layer local state.
//!
//! A [`Scene`] is what is mounted while a layer is on screen: completion
//! flags, the enlightenment meter, the explored demos, the code panels. It
//! is rebuilt from scratch every time the current layer changes, so
//! revisiting a layer starts its flow over while the journey state keeps
//! everything collected.

use std::collections::BTreeSet;

use infinite_geometry::Shape;
use infinite_sandbox::EvolvingCode;
use infinite_showcase::{Demonstration, demonstration};
use infinite_types::{Algorithm, Concept, ContactMethod, Demo, JourneyState, Layer};

use crate::SessionError;

/// Insight captured in the Narrative layer.
pub const NARRATIVE_INSIGHT: &str = "Data narratives exist in superposition until observed";

/// Insight added by glimpsing the infinite.
pub const TRANSCENDENCE_INSIGHT: &str = "Achieved temporary transcendence of data limitations";

/// Insight added by resonating in the Psychological layer.
pub const RESONANCE_INSIGHT: &str =
    "Achieved resonance between human consciousness and data infinity";

/// Narrative node ids a captured moment connects to.
pub const NARRATIVE_NODES: [&str; 7] = ["n1", "n2", "n3", "n4", "n5", "n6", "n7"];

/// Insights needed before the Philosophy layer is complete.
pub const PHILOSOPHY_INSIGHTS_REQUIRED: usize = 3;

/// Distinct panels explored before a selection completes the Technical layer.
pub const DEMOS_REQUIRED: usize = 2;

/// One card of the Technical layer's metrics panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactMetric {
    /// Card heading.
    pub title: &'static str,
    /// What was achieved.
    pub description: &'static str,
    /// Headline figure.
    pub value: &'static str,
    /// Impact score out of 100.
    pub impact: f64,
}

/// Cards shown on the metrics panel.
pub const IMPACT_METRICS: [ImpactMetric; 4] = [
    ImpactMetric {
        title: "Performance Optimizer",
        description: "Reduced model inference time by 87%",
        value: "13ms -> 1.7ms",
        impact: 95.0,
    },
    ImpactMetric {
        title: "Scale Master",
        description: "Architected system handling 1B+ requests/day",
        value: "99.99% uptime",
        impact: 98.0,
    },
    ImpactMetric {
        title: "Data Pipeline Architect",
        description: "Built real-time ETL processing 10TB daily",
        value: "<5min latency",
        impact: 92.0,
    },
    ImpactMetric {
        title: "Algorithm Innovator",
        description: "Patented novel recommendation algorithm",
        value: "+34% engagement",
        impact: 96.0,
    },
];

/// Closing line of the metrics panel.
pub const METRICS_QUOTE: &str = "Performance is not just about speed; it's about creating systems \
that scale infinitely while maintaining elegance in their implementation.";

/// Mean impact score across [`IMPACT_METRICS`].
pub fn overall_impact() -> f64 {
    let total: f64 = IMPACT_METRICS.iter().map(|m| m.impact).sum();
    total / count(IMPACT_METRICS.len())
}

/// Enlightenment gained per ramp tick.
pub const ENLIGHTENMENT_STEP: f64 = 0.01;

/// The insight recorded for exploring `concept`.
pub const fn concept_insight(concept: Concept) -> &'static str {
    match concept {
        Concept::Godel => {
            "Just as mathematics contains undecidable propositions, data contains unmeasurable truths"
        }
        Concept::Buddhism => {
            "Data flows like water, taking the shape of its container while remaining formless"
        }
        Concept::Quantum => {
            "We are simultaneously all our potential futures until choice collapses the wave function"
        }
    }
}

/// Engagement score shown in the Psychological layer, in `[0, 1]`.
pub fn flow_state(state: &JourneyState) -> f64 {
    let score = (state.journey_progress / 100.0).mul_add(
        0.3,
        (count(state.data_points.len()) / 50.0).mul_add(
            0.2,
            (count(state.philosophical_insights.len()) / 10.0)
                .mul_add(0.2, count(state.technical_achievements.len()) / 5.0 * 0.3),
        ),
    );
    score.min(1.0)
}

fn count(len: usize) -> f64 {
    f64::from(u32::try_from(len).unwrap_or(u32::MAX))
}

/// The decorative shapes drawn behind `layer`.
pub const fn backdrop(layer: Layer) -> &'static [Shape] {
    match layer {
        Layer::Gateway => &[
            Shape::Infinity,
            Shape::Mobius,
            Shape::Penrose,
            Shape::Tree,
            Shape::Lorenz,
            Shape::Metatron,
            Shape::Klein,
            Shape::Hopf,
        ],
        Layer::Narrative => &[Shape::Flower],
        Layer::Philosophy => &[Shape::Cantor, Shape::Penrose, Shape::Merkabah],
        Layer::Technical => &[Shape::Rossler, Shape::Chua],
        Layer::Psychological => &[Shape::Flower, Shape::Hopf],
    }
}

// ---------------------------------------------------------------------------
// Scenes
// ---------------------------------------------------------------------------

/// How the Narrative layer lays out its nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NarrativeMode {
    /// Chronological spiral.
    #[default]
    Timeline,
    /// Force-directed graph.
    Network,
    /// Streaming particles.
    Flow,
}

impl NarrativeMode {
    /// All modes.
    pub const ALL: [Self; 3] = [Self::Timeline, Self::Network, Self::Flow];

    /// Lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeline => "timeline",
            Self::Network => "network",
            Self::Flow => "flow",
        }
    }
}

/// Narrative layer state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NarrativeScene {
    /// Current layout.
    pub mode: NarrativeMode,
    /// Set once a moment was captured.
    pub complete: bool,
}

/// Philosophy layer state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhilosophyScene {
    /// Last concept explored.
    pub selected: Option<Concept>,
    /// Meter in `[0, 1]`.
    pub enlightenment: f64,
    /// Set by enough insights or by glimpsing the infinite.
    pub complete: bool,
}

impl PhilosophyScene {
    /// Advance the meter one tick. Returns the new level.
    pub fn ramp(&mut self) -> f64 {
        self.enlightenment = (self.enlightenment + ENLIGHTENMENT_STEP).min(1.0);
        self.enlightenment
    }
}

/// Technical layer state.
pub struct TechnicalScene {
    /// Panel on screen. Starts on [`Demo::Algorithms`] without counting it
    /// as explored.
    pub active: Demo,
    /// Panels selected so far.
    pub explored: BTreeSet<Demo>,
    /// Visualization chosen inside the algorithms panel.
    pub algorithm: Algorithm,
    /// The running demonstration for [`Self::algorithm`].
    pub demonstration: Box<dyn Demonstration + Send>,
    /// Set once enough panels were explored.
    pub complete: bool,
    /// The self-modifying code panel.
    pub code: EvolvingCode,
    /// Output of the last live-code run.
    pub last_output: Option<String>,
    seed: u64,
}

impl TechnicalScene {
    /// Mount with the algorithms panel showing the sort visualization.
    pub fn new(seed: u64) -> Result<Self, SessionError> {
        Ok(Self {
            active: Demo::Algorithms,
            explored: BTreeSet::new(),
            algorithm: Algorithm::Sort,
            demonstration: demonstration(Algorithm::Sort, seed),
            complete: false,
            code: EvolvingCode::new(seed)?,
            last_output: None,
            seed,
        })
    }

    /// Put `demo` on screen. Returns whether this selection completed the
    /// layer. Switching to the algorithms panel remounts it on sort.
    pub fn select(&mut self, demo: Demo) -> bool {
        let explored_before = self.explored.len();
        self.explored.insert(demo);
        if demo == Demo::Algorithms && self.active != Demo::Algorithms {
            self.select_algorithm(Algorithm::Sort);
        }
        self.active = demo;
        if explored_before >= DEMOS_REQUIRED && !self.complete {
            self.complete = true;
            return true;
        }
        false
    }

    /// Restart the algorithms panel on `algorithm`.
    pub fn select_algorithm(&mut self, algorithm: Algorithm) {
        self.algorithm = algorithm;
        self.demonstration = demonstration(algorithm, self.seed);
    }

    /// Whether `algorithm` is the visualization currently animating.
    pub fn is_animating(&self, algorithm: Algorithm) -> bool {
        self.active == Demo::Algorithms && self.algorithm == algorithm
    }
}

impl core::fmt::Debug for TechnicalScene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TechnicalScene")
            .field("active", &self.active)
            .field("explored", &self.explored)
            .field("algorithm", &self.algorithm)
            .field("demonstration", &self.demonstration.summary())
            .field("complete", &self.complete)
            .field("iterations", &self.code.iterations())
            .finish_non_exhaustive()
    }
}

/// Psychological layer state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PsychologicalScene {
    /// Times the visitor resonated.
    pub resonances: u32,
    /// Channel chosen in the contact portal.
    pub contact: Option<ContactMethod>,
}

/// The mounted state of the current layer.
#[derive(Debug)]
pub enum Scene {
    /// The entrance.
    Gateway,
    /// Narrative layer.
    Narrative(NarrativeScene),
    /// Philosophy layer.
    Philosophy(PhilosophyScene),
    /// Technical layer.
    Technical(Box<TechnicalScene>),
    /// Psychological layer.
    Psychological(PsychologicalScene),
}

impl Scene {
    /// Fresh state for `layer`.
    pub fn mount(layer: Layer, seed: u64) -> Result<Self, SessionError> {
        Ok(match layer {
            Layer::Gateway => Self::Gateway,
            Layer::Narrative => Self::Narrative(NarrativeScene::default()),
            Layer::Philosophy => Self::Philosophy(PhilosophyScene::default()),
            Layer::Technical => Self::Technical(Box::new(TechnicalScene::new(seed)?)),
            Layer::Psychological => Self::Psychological(PsychologicalScene::default()),
        })
    }

    /// The layer this scene belongs to.
    pub const fn layer(&self) -> Layer {
        match self {
            Self::Gateway => Layer::Gateway,
            Self::Narrative(_) => Layer::Narrative,
            Self::Philosophy(_) => Layer::Philosophy,
            Self::Technical(_) => Layer::Technical,
            Self::Psychological(_) => Layer::Psychological,
        }
    }

    /// Whether `continue` may leave this layer. The gateway is always
    /// passable; the last layer never is.
    pub fn is_complete(&self) -> bool {
        match self {
            Self::Gateway => true,
            Self::Narrative(s) => s.complete,
            Self::Philosophy(s) => s.complete,
            Self::Technical(s) => s.complete,
            Self::Psychological(_) => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn enlightenment_caps_at_one() {
        let mut scene = PhilosophyScene::default();
        for _ in 0..150 {
            scene.ramp();
        }
        assert!((scene.enlightenment - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn enlightenment_ramps_by_a_hundredth() {
        let mut scene = PhilosophyScene::default();
        scene.ramp();
        scene.ramp();
        assert!((scene.enlightenment - 0.02).abs() < 1e-12);
    }

    #[test]
    fn technical_completes_on_the_selection_after_two_distinct_panels() {
        let mut scene = TechnicalScene::new(1).unwrap();
        assert_eq!(scene.active, Demo::Algorithms);
        assert!(scene.explored.is_empty());
        assert!(!scene.select(Demo::LiveCode));
        assert!(!scene.select(Demo::LiveCode));
        assert!(!scene.select(Demo::SelfModify));
        assert!(!scene.complete);
        assert!(scene.select(Demo::Algorithms));
        assert!(scene.complete);
        assert_eq!(scene.active, Demo::Algorithms);
        assert!(!scene.select(Demo::Metrics));
    }

    #[test]
    fn algorithm_choice_does_not_count_as_exploring() {
        let mut scene = TechnicalScene::new(1).unwrap();
        for algorithm in Algorithm::ALL {
            scene.select_algorithm(algorithm);
        }
        assert!(scene.explored.is_empty());
        assert!(!scene.complete);
    }

    #[test]
    fn selecting_an_algorithm_restarts_the_demonstration() {
        let mut scene = TechnicalScene::new(1).unwrap();
        scene.demonstration.advance();
        scene.select_algorithm(Algorithm::Pathfind);
        assert_eq!(scene.demonstration.algorithm(), Algorithm::Pathfind);
        assert!(scene.demonstration.summary().contains("0 cells"));
        assert!(scene.is_animating(Algorithm::Pathfind));
    }

    #[test]
    fn returning_to_the_algorithms_panel_remounts_on_sort() {
        let mut scene = TechnicalScene::new(1).unwrap();
        scene.select_algorithm(Algorithm::Ml);
        scene.select(Demo::Metrics);
        assert!(!scene.is_animating(Algorithm::Ml));
        scene.select(Demo::Algorithms);
        assert_eq!(scene.algorithm, Algorithm::Sort);
        assert!(scene.is_animating(Algorithm::Sort));
    }

    #[test]
    fn overall_impact_is_the_mean_score() {
        assert!((overall_impact() - 95.25).abs() < 1e-12);
    }

    #[test]
    fn flow_state_formula() {
        let mut state = JourneyState::initial();
        assert!(flow_state(&state).abs() < f64::EPSILON);

        state.journey_progress = 50.0;
        state.philosophical_insights = vec!["a".to_owned(); 5];
        // 0.5 * 0.3 + 0.5 * 0.2
        assert!((flow_state(&state) - 0.25).abs() < 1e-12);

        state.journey_progress = 100.0;
        state.philosophical_insights = vec!["a".to_owned(); 40];
        assert!((flow_state(&state) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mounted_scenes_start_incomplete() {
        for layer in [Layer::Narrative, Layer::Philosophy, Layer::Technical, Layer::Psychological] {
            let scene = Scene::mount(layer, 0);
            assert!(matches!(&scene, Ok(s) if s.layer() == layer && !s.is_complete()));
        }
        assert!(matches!(Scene::mount(Layer::Gateway, 0), Ok(Scene::Gateway)));
    }

    #[test]
    fn concept_insights_differ() {
        let insights: BTreeSet<_> = Concept::ALL.into_iter().map(concept_insight).collect();
        assert_eq!(insights.len(), 3);
    }

    #[test]
    fn every_layer_has_a_backdrop() {
        assert!(Layer::ALL.into_iter().all(|layer| !backdrop(layer).is_empty()));
    }
}
