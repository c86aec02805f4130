//! The session: journey tracker plus the mounted layer scene.
//!
//! [`Session`] is the single owner of a visitor's run through the layers.
//! Every operation a layer offers lives here as a method that checks the
//! visitor is on that layer, applies the journey mutations in the order the
//! layer performs them, and updates the scene. Changing the current layer
//! remounts the scene and, past the gateway, counts a dimension shift.
//!
//! Achievements granted along the way are queued; the caller drains them
//! with [`Session::take_granted`] to announce them.

use infinite_geometry::{Geometry, Pose, Shape, pose};
use infinite_journey::{
    JourneyTracker, SnapshotStore, TrackerSettings, Transition, achievements,
};
use infinite_sandbox::{Budget, DEFAULT_PROGRAM, Execution, Modification};
use infinite_types::{
    Achievement, Algorithm, Concept, ContactMethod, DataPoint, Demo, Interaction, JourneyState,
    Layer, now_millis,
};
use serde::Serialize;
use serde_json::json;

use crate::SessionError;
use crate::command::{Command, HELP};
use crate::config::ResumeConfig;
use crate::navigation::{self, Direction};
use crate::scene::{
    self, IMPACT_METRICS, METRICS_QUOTE, NARRATIVE_INSIGHT, NARRATIVE_NODES, NarrativeMode,
    NarrativeScene, PHILOSOPHY_INSIGHTS_REQUIRED, PhilosophyScene, PsychologicalScene,
    RESONANCE_INSIGHT, Scene, TRANSCENDENCE_INSIGHT, TechnicalScene,
};

/// Where the contact portal points for each channel.
pub const fn contact_address(method: ContactMethod) -> &'static str {
    match method {
        ContactMethod::Email => "ai.strategist@infinitedata.io",
        ContactMethod::Linkedin => "linkedin.com/in/data-infinity",
        ContactMethod::Calendar => "calendly.com/infinite-possibilities",
    }
}

/// The metrics panel as text: one line per card, the overall score, the
/// closing quote.
pub fn metrics_report() -> String {
    let mut lines: Vec<String> = IMPACT_METRICS
        .iter()
        .map(|m| format!("{} ({}): {} [{:.0}]", m.title, m.value, m.description, m.impact))
        .collect();
    let overall = (scene::overall_impact() * 10.0).round() / 10.0;
    lines.push(format!("Overall impact: {overall:.1}"));
    lines.push(format!("\"{METRICS_QUOTE}\""));
    lines.join("\n")
}

/// How a layer change is authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    /// The target must already be unlocked.
    Checked,
    /// A flow moves on after unlocking the target itself.
    Flow,
}

/// A snapshot of the journey for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// Current layer.
    pub layer: Layer,
    /// Progress score in `[0, 100]`.
    pub progress: f64,
    /// Unlocked layers in order.
    pub unlocked: Vec<Layer>,
    /// Collected data points.
    pub data_points: usize,
    /// Collected insights.
    pub insights: usize,
    /// Titles of unlocked achievements, in unlock order.
    pub achievements: Vec<String>,
    /// Dimension shift counter.
    pub dimension_shifts: u32,
    /// Infinity glimpse counter.
    pub infinity_glimpses: u32,
    /// Engagement score in `[0, 1]`.
    pub flow_state: f64,
    /// Whether `continue` may leave the current layer.
    pub layer_complete: bool,
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "Layer:        {} - {}", self.layer, self.layer.description())?;
        writeln!(f, "Progress:     {:.1}%", self.progress)?;
        let unlocked: Vec<String> = self.unlocked.iter().map(|l| l.index().to_string()).collect();
        writeln!(f, "Unlocked:     {}/{} [{}]", self.unlocked.len(), Layer::COUNT, unlocked.join(", "))?;
        writeln!(f, "Data points:  {}", self.data_points)?;
        writeln!(f, "Insights:     {}", self.insights)?;
        writeln!(f, "Achievements: {}", self.achievements.len())?;
        for title in &self.achievements {
            writeln!(f, "  - {title}")?;
        }
        writeln!(f, "Dimension shifts: {}", self.dimension_shifts)?;
        writeln!(f, "Infinity glimpses: {}", self.infinity_glimpses)?;
        write!(f, "Flow state:   {:.0}%", self.flow_state * 100.0)
    }
}

/// A visitor's session.
#[derive(Debug)]
pub struct Session<S> {
    tracker: JourneyTracker<S>,
    scene: Scene,
    budget: Budget,
    seed: u64,
    granted: Vec<Achievement>,
}

impl<S: SnapshotStore> Session<S> {
    /// Open a session over `store` with the settings in `config`.
    pub fn open(store: S, config: &ResumeConfig) -> Result<Self, SessionError> {
        let settings = TrackerSettings {
            key: config.storage.key.clone(),
            max_interactions: config.journey.max_interactions,
        };
        Self::new(JourneyTracker::open(store, settings), config.sandbox, config.geometry.seed)
    }

    /// Wrap an open tracker, mounting the scene for its current layer.
    pub fn new(tracker: JourneyTracker<S>, budget: Budget, seed: u64) -> Result<Self, SessionError> {
        let scene = Scene::mount(tracker.state().current_layer, seed)?;
        Ok(Self {
            tracker,
            scene,
            budget,
            seed,
            granted: Vec::new(),
        })
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    fn track(&mut self, transition: Transition) {
        self.granted.extend(transition.granted);
    }

    fn record(&mut self, kind: &str, data: serde_json::Value) {
        let layer = self.scene.layer();
        let transition = self
            .tracker
            .record_interaction(Interaction::new(kind, layer, Some(data)));
        self.track(transition);
    }

    fn require(&self, required: Layer, action: &'static str) -> Result<(), SessionError> {
        let current = self.scene.layer();
        if current == required {
            Ok(())
        } else {
            Err(SessionError::WrongLayer {
                action,
                required,
                current,
            })
        }
    }

    const fn wrong_layer(&self, required: Layer, action: &'static str) -> SessionError {
        SessionError::WrongLayer {
            action,
            required,
            current: self.scene.layer(),
        }
    }

    fn narrative(&mut self, action: &'static str) -> Result<&mut NarrativeScene, SessionError> {
        let error = self.wrong_layer(Layer::Narrative, action);
        match &mut self.scene {
            Scene::Narrative(scene) => Ok(scene),
            _ => Err(error),
        }
    }

    fn philosophy(&mut self, action: &'static str) -> Result<&mut PhilosophyScene, SessionError> {
        let error = self.wrong_layer(Layer::Philosophy, action);
        match &mut self.scene {
            Scene::Philosophy(scene) => Ok(scene),
            _ => Err(error),
        }
    }

    fn technical(&mut self, action: &'static str) -> Result<&mut TechnicalScene, SessionError> {
        let error = self.wrong_layer(Layer::Technical, action);
        match &mut self.scene {
            Scene::Technical(scene) => Ok(scene),
            _ => Err(error),
        }
    }

    fn panel(
        &mut self,
        required: Demo,
        action: &'static str,
    ) -> Result<&mut TechnicalScene, SessionError> {
        let scene = self.technical(action)?;
        if scene.active == required {
            Ok(scene)
        } else {
            Err(SessionError::WrongPanel {
                action,
                required,
                current: scene.active,
            })
        }
    }

    fn psychological(
        &mut self,
        action: &'static str,
    ) -> Result<&mut PsychologicalScene, SessionError> {
        let error = self.wrong_layer(Layer::Psychological, action);
        match &mut self.scene {
            Scene::Psychological(scene) => Ok(scene),
            _ => Err(error),
        }
    }

    /// Make `to` current. A real change remounts the scene and, past the
    /// gateway, counts a dimension shift.
    fn change_layer(&mut self, to: Layer, entry: Entry) -> Result<Layer, SessionError> {
        let from = self.tracker.state().current_layer;
        let transition = match entry {
            Entry::Checked => self.tracker.navigate(to)?,
            Entry::Flow => self.tracker.set_current_layer(to),
        };
        self.track(transition);

        if from != to {
            self.scene = Scene::mount(to, self.seed)?;
            tracing::info!(from = from.index(), to = to.index(), "Layer changed");
            if navigation::is_dimension_shift(from, to) {
                let transition = self.tracker.increment_dimension_shifts();
                self.track(transition);
            }
        }
        Ok(to)
    }

    /// Unlock the layer after the current one and move there.
    fn advance(&mut self) -> Result<Layer, SessionError> {
        let current = self.scene.layer();
        let next = current.next().ok_or(SessionError::NoNextLayer(current))?;
        let transition = self.tracker.unlock_layer(next);
        self.track(transition);
        self.change_layer(next, Entry::Flow)
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Jump to an unlocked layer.
    ///
    /// # Errors
    ///
    /// Returns a locked-layer error if `layer` is not unlocked.
    pub fn goto(&mut self, layer: Layer) -> Result<Layer, SessionError> {
        let target = navigation::check_target(self.tracker.state(), layer)?;
        self.change_layer(target, Entry::Checked)
    }

    /// Move one layer up or down.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AtEdge`] past either end, or a locked-layer
    /// error when the neighbour is locked.
    pub fn step(&mut self, direction: Direction) -> Result<Layer, SessionError> {
        let target = navigation::neighbour(self.tracker.state(), direction)?;
        self.change_layer(target, Entry::Checked)
    }

    /// Leave the current layer for the next one once its flow is complete.
    /// On the gateway this is the same as [`Self::enter`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Incomplete`] before the layer is complete,
    /// and [`SessionError::NoNextLayer`] on the last layer.
    pub fn continue_journey(&mut self) -> Result<Layer, SessionError> {
        match self.scene.layer() {
            Layer::Gateway => self.enter(),
            Layer::Psychological => Err(SessionError::NoNextLayer(Layer::Psychological)),
            layer if !self.scene.is_complete() => Err(SessionError::Incomplete(layer)),
            _ => self.advance(),
        }
    }

    /// Unlock every layer.
    pub fn unlock_all(&mut self) {
        tracing::info!("Unlocking all layers");
        let transition = self.tracker.unlock_all();
        self.track(transition);
    }

    /// Wipe the journey and return to the gateway.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        let was = self.scene.layer();
        let transition = self.tracker.reset();
        self.track(transition);
        self.granted.clear();
        if was != Layer::Gateway {
            self.scene = Scene::mount(Layer::Gateway, self.seed)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Gateway
    // -----------------------------------------------------------------------

    /// Step through the gateway: count a glimpse, unlock the Narrative
    /// layer and move there.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WrongLayer`] outside the gateway.
    pub fn enter(&mut self) -> Result<Layer, SessionError> {
        self.require(Layer::Gateway, "enter")?;
        let transition = self.tracker.increment_infinity_glimpses();
        self.track(transition);
        self.advance()
    }

    // -----------------------------------------------------------------------
    // Narrative
    // -----------------------------------------------------------------------

    /// Capture the moment: one insight and one data point connected to
    /// every narrative node. Completes the layer.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WrongLayer`] outside the Narrative layer.
    pub fn capture_moment(&mut self) -> Result<(), SessionError> {
        let mode = self.narrative("capture")?.mode;
        let transition = self.tracker.add_philosophical_insight(NARRATIVE_INSIGHT);
        self.track(transition);
        let point = DataPoint::new(
            "narrative",
            json!({ "narrativeMode": mode.as_str(), "nodesExplored": NARRATIVE_NODES.len() }),
            NARRATIVE_NODES.iter().map(|&id| id.to_owned()).collect(),
        );
        let transition = self.tracker.add_data_point(point);
        self.track(transition);
        self.narrative("capture")?.complete = true;
        Ok(())
    }

    /// Switch the narrative layout.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WrongLayer`] outside the Narrative layer.
    pub fn set_narrative_mode(&mut self, mode: NarrativeMode) -> Result<(), SessionError> {
        self.narrative("mode")?.mode = mode;
        self.record("narrative_mode_change", json!({ "mode": mode.as_str() }));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Philosophy
    // -----------------------------------------------------------------------

    /// Explore `concept`, adding its insight. Returns whether the layer is
    /// complete, which takes three insights in total.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WrongLayer`] outside the Philosophy layer.
    pub fn explore(&mut self, concept: Concept) -> Result<bool, SessionError> {
        self.philosophy("explore")?.selected = Some(concept);
        let transition = self
            .tracker
            .add_philosophical_insight(scene::concept_insight(concept));
        self.track(transition);
        self.record("philosophical_concept_explored", json!({ "concept": concept.as_str() }));

        let enough = self.tracker.state().philosophical_insights.len() >= PHILOSOPHY_INSIGHTS_REQUIRED;
        let scene = self.philosophy("explore")?;
        if enough {
            scene.complete = true;
        }
        Ok(scene.complete)
    }

    /// Glimpse the infinite: count a glimpse, fill the meter, add the
    /// transcendence insight. Completes the layer.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WrongLayer`] outside the Philosophy layer.
    pub fn glimpse_infinite(&mut self) -> Result<(), SessionError> {
        self.philosophy("glimpse")?;
        let transition = self.tracker.increment_infinity_glimpses();
        self.track(transition);
        let transition = self.tracker.add_philosophical_insight(TRANSCENDENCE_INSIGHT);
        self.track(transition);
        let scene = self.philosophy("glimpse")?;
        scene.enlightenment = 1.0;
        scene.complete = true;
        Ok(())
    }

    /// Advance the enlightenment meter if the Philosophy layer is mounted.
    pub fn tick_enlightenment(&mut self) -> Option<f64> {
        match &mut self.scene {
            Scene::Philosophy(scene) => Some(scene.ramp()),
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Technical
    // -----------------------------------------------------------------------

    /// Put the `demo` panel on screen. Returns whether this selection
    /// completed the layer.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WrongLayer`] outside the Technical layer.
    pub fn select_demo(&mut self, demo: Demo) -> Result<bool, SessionError> {
        self.technical("demo")?;
        self.record("technical_demo_selected", json!({ "demo": demo.as_str() }));
        let completed = self.technical("demo")?.select(demo);
        if completed {
            tracing::info!("Technical layer complete");
        }
        Ok(completed)
    }

    /// Restart the algorithms panel on `algorithm`. Returns the
    /// demonstration's initial summary.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WrongLayer`] outside the Technical layer and
    /// [`SessionError::WrongPanel`] when another panel is on screen.
    pub fn select_algorithm(&mut self, algorithm: Algorithm) -> Result<String, SessionError> {
        let scene = self.panel(Demo::Algorithms, "algo")?;
        scene.select_algorithm(algorithm);
        Ok(scene.demonstration.summary())
    }

    /// Advance the running demonstration if it is `algorithm` and the
    /// algorithms panel is on screen. Returns its new summary, or `None`
    /// when nothing moved.
    pub fn advance_demo(&mut self, algorithm: Algorithm) -> Option<String> {
        let Scene::Technical(scene) = &mut self.scene else {
            return None;
        };
        if !scene.is_animating(algorithm) || !scene.demonstration.advance() {
            return None;
        }
        Some(scene.demonstration.summary())
    }

    /// Run `source` in the live-code panel and collect the output as a
    /// technical data point.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WrongLayer`] outside the Technical layer and
    /// [`SessionError::WrongPanel`] when the live-code panel is not on
    /// screen. Script failures are not errors; they are part of the output.
    pub fn execute_code(&mut self, source: &str) -> Result<Execution, SessionError> {
        self.panel(Demo::LiveCode, "run")?;
        let execution = infinite_sandbox::execute(source, &self.budget);
        let point = DataPoint::new("technical", json!({ "code": execution.output }), Vec::new());
        let transition = self.tracker.add_data_point(point);
        self.track(transition);
        self.technical("run")?.last_output = Some(execution.output.clone());
        Ok(execution)
    }

    /// Evolve the self-modifying code panel one step.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WrongLayer`] outside the Technical layer and
    /// [`SessionError::WrongPanel`] when the self-modify panel is not on
    /// screen.
    pub fn evolve_code(&mut self) -> Result<Modification, SessionError> {
        Ok(self.panel(Demo::SelfModify, "evolve")?.code.evolve())
    }

    /// Claim the technical mastery badge. Returns `false` if it was
    /// already unlocked.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WrongLayer`] outside the Technical layer.
    pub fn claim_mastery(&mut self) -> Result<bool, SessionError> {
        self.technical("mastery")?;
        let transition = self
            .tracker
            .add_technical_achievement(achievements::technical_master(now_millis()));
        let granted = !transition.granted.is_empty();
        self.track(transition);
        Ok(granted)
    }

    // -----------------------------------------------------------------------
    // Psychological
    // -----------------------------------------------------------------------

    /// Resonate: add the resonance insight and record the flow state at
    /// that moment. Returns the flow state.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WrongLayer`] outside the Psychological layer.
    pub fn resonate(&mut self) -> Result<f64, SessionError> {
        let scene = self.psychological("resonate")?;
        scene.resonances = scene.resonances.saturating_add(1);
        let flow = self.flow_state();
        let transition = self.tracker.add_philosophical_insight(RESONANCE_INSIGHT);
        self.track(transition);
        self.record("psychological_resonance", json!({ "flowState": flow }));
        Ok(flow)
    }

    /// Reach out through `method`. Returns `false` if a connection was
    /// already established.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WrongLayer`] outside the Psychological layer.
    pub fn contact(&mut self, method: ContactMethod) -> Result<bool, SessionError> {
        self.psychological("contact")?.contact = Some(method);
        let transition = self
            .tracker
            .add_technical_achievement(achievements::connection_established(method, now_millis()));
        let granted = !transition.granted.is_empty();
        self.track(transition);
        Ok(granted)
    }

    /// The engagement score.
    pub fn flow_state(&self) -> f64 {
        scene::flow_state(self.tracker.state())
    }

    // -----------------------------------------------------------------------
    // Geometry
    // -----------------------------------------------------------------------

    /// Vertex data for `shape`.
    pub fn geometry(&self, shape: Shape) -> Geometry {
        infinite_geometry::generate(shape, self.seed)
    }

    /// Poses of the current layer's backdrop after `t` seconds.
    pub fn backdrop_poses(&self, t: f64) -> Vec<(Shape, Pose)> {
        scene::backdrop(self.scene.layer())
            .iter()
            .map(|&shape| (shape, pose(shape, t)))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Achievements granted since the last call, in grant order.
    pub fn take_granted(&mut self) -> Vec<Achievement> {
        core::mem::take(&mut self.granted)
    }

    /// The journey state.
    pub const fn state(&self) -> &JourneyState {
        self.tracker.state()
    }

    /// The tracker.
    pub const fn tracker(&self) -> &JourneyTracker<S> {
        &self.tracker
    }

    /// The mounted scene.
    pub const fn scene(&self) -> &Scene {
        &self.scene
    }

    /// A display snapshot.
    pub fn status(&self) -> Status {
        let state = self.tracker.state();
        Status {
            layer: state.current_layer,
            progress: state.journey_progress,
            unlocked: state.unlocked_layers.iter().copied().collect(),
            data_points: state.data_points.len(),
            insights: state.philosophical_insights.len(),
            achievements: state
                .technical_achievements
                .iter()
                .map(|a| a.title.clone())
                .collect(),
            dimension_shifts: state.dimension_shifts,
            infinity_glimpses: state.infinity_glimpses,
            flow_state: self.flow_state(),
            layer_complete: self.scene.is_complete(),
        }
    }

    // -----------------------------------------------------------------------
    // Command dispatch
    // -----------------------------------------------------------------------

    /// Carry out `command` and describe the result.
    ///
    /// # Errors
    ///
    /// Returns whatever the underlying operation returns.
    #[allow(clippy::too_many_lines)]
    pub fn dispatch(&mut self, command: &Command) -> Result<String, SessionError> {
        match command {
            Command::Status => Ok(self.status().to_string()),
            Command::Help => Ok(HELP.to_owned()),
            Command::Enter | Command::Goto(_) | Command::Move(_) | Command::Continue => {
                let layer = match command {
                    Command::Goto(layer) => self.goto(*layer)?,
                    Command::Move(direction) => self.step(*direction)?,
                    Command::Continue => self.continue_journey()?,
                    _ => self.enter()?,
                };
                Ok(format!("Now in {layer}: {}", layer.description()))
            }
            Command::Capture => {
                self.capture_moment()?;
                Ok(format!(
                    "{NARRATIVE_INSIGHT}.\nYour narrative has been woven into the infinite tapestry. \
                     Ready to explore the philosophical dimensions? (continue)"
                ))
            }
            Command::Mode(mode) => {
                self.set_narrative_mode(*mode)?;
                Ok(format!("Narrative mode: {}", mode.as_str()))
            }
            Command::Explore(concept) => {
                let complete = self.explore(*concept)?;
                let mut reply = scene::concept_insight(*concept).to_owned();
                if complete {
                    reply.push_str(
                        "\nYou have contemplated the infinite nature of data. \
                         Ready to manifest technical mastery? (continue)",
                    );
                }
                Ok(reply)
            }
            Command::Glimpse => {
                self.glimpse_infinite()?;
                Ok(format!("{TRANSCENDENCE_INSIGHT}."))
            }
            Command::Demo(demo) => {
                let complete = self.select_demo(*demo)?;
                let mut reply = match demo {
                    Demo::Algorithms => {
                        let summary = self
                            .technical("demo")
                            .map(|scene| scene.demonstration.summary())?;
                        format!("Algorithms: {summary}")
                    }
                    Demo::LiveCode => "Live code ready. Try: run <program>".to_owned(),
                    Demo::SelfModify => {
                        let source = self.technical("demo")?.code.source().to_owned();
                        format!("Self-modifying code (evolve to mutate):\n\n{source}")
                    }
                    Demo::Metrics => metrics_report(),
                };
                if complete {
                    reply.push_str(
                        "\nTechnical mastery demonstrated across infinite dimensions. \
                         Ready to forge the final connection? (continue)",
                    );
                }
                Ok(reply)
            }
            Command::Algorithm(algorithm) => {
                let summary = self.select_algorithm(*algorithm)?;
                Ok(format!("Running {}: {summary}", algorithm.as_str()))
            }
            Command::Run(source) => {
                let source = source.as_deref().unwrap_or(DEFAULT_PROGRAM);
                Ok(self.execute_code(source)?.output)
            }
            Command::Evolve => {
                let modification = self.evolve_code()?;
                let source = self.technical("evolve")?.code.source().to_owned();
                if modification.changed {
                    Ok(format!("{}\n\n{source}", modification.description))
                } else {
                    Ok(format!("{} (no change)", modification.description))
                }
            }
            Command::Mastery => Ok(if self.claim_mastery()? {
                "Technical mastery claimed.".to_owned()
            } else {
                "Technical mastery was already claimed.".to_owned()
            }),
            Command::Resonate => {
                let flow = self.resonate()?;
                Ok(format!("{RESONANCE_INSIGHT}.\nFlow state: {:.0}%", flow * 100.0))
            }
            Command::Contact(method) => {
                let first = self.contact(*method)?;
                let mut reply = format!("Reach out at {}", contact_address(*method));
                if !first {
                    reply.push_str(" (connection already established)");
                }
                Ok(reply)
            }
            Command::UnlockAll => {
                self.unlock_all();
                Ok("All layers unlocked.".to_owned())
            }
            Command::Geometry(shape) => Ok(serde_json::to_string(&self.geometry(*shape))?),
            Command::Reset => {
                self.reset()?;
                Ok("Journey reset.".to_owned())
            }
            Command::Quit => Ok("Goodbye.".to_owned()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use infinite_journey::MemoryStore;
    use infinite_sandbox::NO_OUTPUT;

    use super::*;

    fn session() -> Session<MemoryStore> {
        Session::open(MemoryStore::new(), &ResumeConfig::default()).unwrap()
    }

    fn at(layer: Layer) -> Session<MemoryStore> {
        let mut s = session();
        s.unlock_all();
        s.goto(layer).unwrap();
        s.take_granted();
        s
    }

    fn on_panel(demo: Demo) -> Session<MemoryStore> {
        let mut s = at(Layer::Technical);
        s.select_demo(demo).unwrap();
        s
    }

    fn granted_ids(s: &mut Session<MemoryStore>) -> Vec<String> {
        s.take_granted().into_iter().map(|a| a.id.0).collect()
    }

    #[test]
    fn enter_unlocks_and_moves_to_narrative() {
        let mut s = session();
        assert_eq!(s.enter().unwrap(), Layer::Narrative);
        let state = s.state();
        assert_eq!(state.current_layer, Layer::Narrative);
        assert!(state.is_unlocked(Layer::Narrative));
        assert_eq!(state.infinity_glimpses, 1);
        assert_eq!(state.dimension_shifts, 1);
        assert!(matches!(s.scene(), Scene::Narrative(_)));
        assert!((state.journey_progress - 25.0).abs() < 1e-9);
    }

    #[test]
    fn flow_operations_require_their_layer() {
        let mut s = session();
        assert!(matches!(
            s.capture_moment(),
            Err(SessionError::WrongLayer {
                action: "capture",
                required: Layer::Narrative,
                current: Layer::Gateway
            })
        ));
        assert!(s.explore(Concept::Godel).is_err());
        assert!(s.execute_code("1").is_err());
        assert!(s.contact(ContactMethod::Email).is_err());
        s.enter().unwrap();
        assert!(matches!(s.enter(), Err(SessionError::WrongLayer { .. })));
        assert!(s.state().philosophical_insights.is_empty());
    }

    #[test]
    fn narrative_continue_needs_a_captured_moment() {
        let mut s = session();
        s.enter().unwrap();
        assert!(matches!(
            s.continue_journey(),
            Err(SessionError::Incomplete(Layer::Narrative))
        ));

        s.capture_moment().unwrap();
        let state = s.state();
        assert_eq!(state.philosophical_insights, vec![NARRATIVE_INSIGHT.to_owned()]);
        let point = &state.data_points[0];
        assert_eq!(point.dimension, "narrative");
        assert_eq!(point.connections.len(), 7);
        assert_eq!(point.value["narrativeMode"], "timeline");

        assert_eq!(s.continue_journey().unwrap(), Layer::Philosophy);
        assert!(s.state().is_unlocked(Layer::Philosophy));
        assert_eq!(s.state().dimension_shifts, 2);
    }

    #[test]
    fn narrative_mode_shapes_the_data_point() {
        let mut s = at(Layer::Narrative);
        s.set_narrative_mode(NarrativeMode::Flow).unwrap();
        s.capture_moment().unwrap();
        let state = s.state();
        assert_eq!(state.data_points[0].value["narrativeMode"], "flow");
        assert_eq!(state.user_interactions[0].kind, "narrative_mode_change");
    }

    #[test]
    fn philosophy_completes_at_three_insights() {
        let mut s = at(Layer::Philosophy);
        assert!(!s.explore(Concept::Godel).unwrap());
        assert!(!s.explore(Concept::Buddhism).unwrap());
        assert!(s.explore(Concept::Godel).unwrap());

        let state = s.state();
        assert_eq!(state.philosophical_insights.len(), 3);
        let explored: Vec<_> = state
            .user_interactions
            .iter()
            .filter(|i| i.kind == "philosophical_concept_explored")
            .collect();
        assert_eq!(explored.len(), 3);
        assert_eq!(explored[0].data, Some(json!({ "concept": "godel" })));
        assert_eq!(explored[0].layer, Layer::Philosophy);
    }

    #[test]
    fn insights_from_earlier_layers_count_toward_philosophy() {
        let mut s = session();
        s.enter().unwrap();
        s.capture_moment().unwrap();
        s.continue_journey().unwrap();
        s.explore(Concept::Quantum).unwrap();
        assert!(s.explore(Concept::Buddhism).unwrap());
    }

    #[test]
    fn glimpse_completes_and_fills_the_meter() {
        let mut s = at(Layer::Philosophy);
        s.glimpse_infinite().unwrap();
        assert_eq!(s.state().infinity_glimpses, 1);
        assert_eq!(
            s.state().philosophical_insights,
            vec![TRANSCENDENCE_INSIGHT.to_owned()]
        );
        assert!(matches!(
            s.scene(),
            Scene::Philosophy(p) if p.complete && (p.enlightenment - 1.0).abs() < f64::EPSILON
        ));
        assert!(matches!(s.tick_enlightenment(), Some(level) if (level - 1.0).abs() < f64::EPSILON));
        assert_eq!(s.continue_journey().unwrap(), Layer::Technical);
    }

    #[test]
    fn enlightenment_only_ramps_in_philosophy() {
        let mut s = session();
        assert_eq!(s.tick_enlightenment(), None);
        let mut s = at(Layer::Philosophy);
        let level = s.tick_enlightenment().unwrap();
        assert!((level - 0.01).abs() < 1e-12);
    }

    #[test]
    fn third_glimpse_grants_infinity_seeker() {
        let mut s = at(Layer::Philosophy);
        s.glimpse_infinite().unwrap();
        s.glimpse_infinite().unwrap();
        assert!(granted_ids(&mut s).is_empty());
        s.glimpse_infinite().unwrap();
        assert_eq!(granted_ids(&mut s), vec!["infinity-seeker".to_owned()]);
    }

    #[test]
    fn technical_flow() {
        let mut s = at(Layer::Technical);
        assert!(matches!(
            s.continue_journey(),
            Err(SessionError::Incomplete(Layer::Technical))
        ));
        assert!(!s.select_demo(Demo::LiveCode).unwrap());
        assert!(!s.select_demo(Demo::SelfModify).unwrap());
        assert!(s.select_demo(Demo::Algorithms).unwrap());
        let selected: Vec<_> = s
            .state()
            .user_interactions
            .iter()
            .filter(|i| i.kind == "technical_demo_selected")
            .map(|i| i.data.clone().unwrap())
            .collect();
        assert_eq!(
            selected,
            vec![
                json!({ "demo": "live-code" }),
                json!({ "demo": "self-modify" }),
                json!({ "demo": "algorithms" }),
            ]
        );

        assert!(s.claim_mastery().unwrap());
        assert!(!s.claim_mastery().unwrap());
        assert_eq!(granted_ids(&mut s), vec!["technical-master".to_owned()]);

        assert_eq!(s.continue_journey().unwrap(), Layer::Psychological);
    }

    #[test]
    fn switching_algorithms_never_completes_the_layer() {
        let mut s = at(Layer::Technical);
        for algorithm in Algorithm::ALL {
            s.select_algorithm(algorithm).unwrap();
        }
        assert!(matches!(
            s.continue_journey(),
            Err(SessionError::Incomplete(Layer::Technical))
        ));
        assert!(
            !s.state()
                .user_interactions
                .iter()
                .any(|i| i.kind == "technical_demo_selected")
        );
    }

    #[test]
    fn panel_operations_need_their_panel() {
        let mut s = at(Layer::Technical);
        assert!(matches!(
            s.execute_code("1"),
            Err(SessionError::WrongPanel {
                required: Demo::LiveCode,
                current: Demo::Algorithms,
                ..
            })
        ));
        assert!(matches!(
            s.evolve_code(),
            Err(SessionError::WrongPanel { required: Demo::SelfModify, .. })
        ));
        s.select_demo(Demo::LiveCode).unwrap();
        assert!(matches!(
            s.select_algorithm(Algorithm::Ml),
            Err(SessionError::WrongPanel { required: Demo::Algorithms, .. })
        ));
        assert!(s.execute_code("1").is_ok());
        assert_eq!(s.state().data_points.len(), 1);
    }

    #[test]
    fn code_runs_become_technical_data_points() {
        let mut s = on_panel(Demo::LiveCode);
        let run = s.execute_code("console.log(6 * 7)").unwrap();
        assert_eq!(run.output, "42");
        let run = s.execute_code("let quiet = true").unwrap();
        assert_eq!(run.output, NO_OUTPUT);
        let run = s.execute_code("while (true) {}").unwrap();
        assert!(run.output.starts_with("Error: execution budget exceeded"));

        let points = &s.state().data_points;
        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| p.dimension == "technical" && p.connections.is_empty()));
        assert_eq!(points[0].value, json!({ "code": "42" }));
    }

    #[test]
    fn demo_timers_only_move_the_active_demo() {
        let mut s = at(Layer::Technical);
        assert!(s.advance_demo(Algorithm::Pathfind).is_none());
        assert!(s.advance_demo(Algorithm::Sort).is_some());
        s.select_algorithm(Algorithm::Pathfind).unwrap();
        let summary = s.advance_demo(Algorithm::Pathfind).unwrap();
        assert!(summary.contains("1 cells visited"), "{summary}");
        s.select_demo(Demo::Metrics).unwrap();
        assert!(s.advance_demo(Algorithm::Pathfind).is_none());
    }

    #[test]
    fn evolving_code_lives_with_the_scene() {
        let mut s = on_panel(Demo::SelfModify);
        assert_eq!(s.evolve_code().unwrap().description, "Version upgraded to 1.1");
        s.goto(Layer::Narrative).unwrap();
        s.goto(Layer::Technical).unwrap();
        s.select_demo(Demo::SelfModify).unwrap();
        assert_eq!(s.evolve_code().unwrap().description, "Version upgraded to 1.1");
    }

    #[test]
    fn psychological_flow() {
        let mut s = at(Layer::Psychological);
        let flow = s.resonate().unwrap();
        assert!((0.0..=1.0).contains(&flow));
        let last = s.state().user_interactions.last().unwrap();
        assert_eq!(last.kind, "psychological_resonance");
        assert!(last.data.as_ref().unwrap().get("flowState").is_some());

        assert!(s.contact(ContactMethod::Calendar).unwrap());
        assert!(!s.contact(ContactMethod::Email).unwrap());
        let granted = s.take_granted();
        assert_eq!(granted.len(), 1);
        assert_eq!(granted[0].description, "Initiated contact through calendar");

        assert!(matches!(
            s.continue_journey(),
            Err(SessionError::NoNextLayer(Layer::Psychological))
        ));
    }

    #[test]
    fn locked_layers_refuse_navigation() {
        let mut s = session();
        assert!(matches!(s.goto(Layer::Technical), Err(SessionError::Journey { .. })));
        assert!(matches!(s.step(Direction::Down), Err(SessionError::Journey { .. })));
        assert_eq!(s.state().current_layer, Layer::Gateway);
        assert_eq!(s.state().dimension_shifts, 0);
    }

    #[test]
    fn arrow_moves_follow_unlocked_neighbours() {
        let mut s = session();
        s.unlock_all();
        assert_eq!(s.step(Direction::Down).unwrap(), Layer::Narrative);
        assert_eq!(s.step(Direction::Down).unwrap(), Layer::Philosophy);
        assert_eq!(s.step(Direction::Up).unwrap(), Layer::Narrative);
        assert_eq!(s.step(Direction::Up).unwrap(), Layer::Gateway);
        assert!(matches!(s.step(Direction::Up), Err(SessionError::AtEdge { .. })));
        // Three moves landed past the gateway.
        assert_eq!(s.state().dimension_shifts, 3);
    }

    #[test]
    fn fifth_shift_grants_dimension_walker_once() {
        let mut s = session();
        s.unlock_all();
        for layer in [
            Layer::Narrative,
            Layer::Philosophy,
            Layer::Technical,
            Layer::Psychological,
        ] {
            s.goto(layer).unwrap();
        }
        assert!(granted_ids(&mut s).is_empty());
        s.goto(Layer::Narrative).unwrap();
        assert_eq!(granted_ids(&mut s), vec!["dimension-walker".to_owned()]);
        s.goto(Layer::Technical).unwrap();
        assert!(granted_ids(&mut s).is_empty());
        assert_eq!(s.state().dimension_shifts, 6);
    }

    #[test]
    fn staying_put_is_not_a_shift() {
        let mut s = at(Layer::Philosophy);
        let shifts = s.state().dimension_shifts;
        s.explore(Concept::Godel).unwrap();
        s.goto(Layer::Philosophy).unwrap();
        assert_eq!(s.state().dimension_shifts, shifts);
        // The scene was not remounted.
        assert!(matches!(s.scene(), Scene::Philosophy(p) if p.selected == Some(Concept::Godel)));
    }

    #[test]
    fn reset_returns_to_the_gateway() {
        let mut s = at(Layer::Technical);
        s.claim_mastery().unwrap();
        s.reset().unwrap();
        assert_eq!(*s.state(), JourneyState::initial());
        assert!(matches!(s.scene(), Scene::Gateway));
        assert!(s.take_granted().is_empty());
    }

    #[test]
    fn tenth_data_point_grants_data_collector() {
        let mut s = on_panel(Demo::LiveCode);
        for _ in 0..9 {
            s.execute_code("1").unwrap();
        }
        assert!(granted_ids(&mut s).is_empty());
        s.execute_code("1").unwrap();
        assert_eq!(granted_ids(&mut s), vec!["data-collector".to_owned()]);
        s.execute_code("1").unwrap();
        assert!(granted_ids(&mut s).is_empty());
    }

    #[test]
    fn dispatch_describes_results() {
        let mut s = session();
        let reply = s.dispatch(&Command::Enter).unwrap();
        assert!(reply.starts_with("Now in Narrative (1)"));
        assert!(s.dispatch(&Command::Status).unwrap().contains("Progress:     25.0%"));
        assert!(s.dispatch(&Command::Capture).unwrap().starts_with(NARRATIVE_INSIGHT));
        assert!(matches!(
            s.dispatch(&Command::Goto(Layer::Technical)),
            Err(SessionError::Journey { .. })
        ));
        let json = s.dispatch(&Command::Geometry(Shape::Merkabah)).unwrap();
        assert!(json.starts_with('{'));
        assert_eq!(s.dispatch(&Command::Help).unwrap(), HELP);
    }

    #[test]
    fn dispatch_runs_the_starter_program() {
        let mut s = on_panel(Demo::LiveCode);
        let reply = s.dispatch(&Command::Run(None)).unwrap();
        assert!(reply.ends_with("Transformed sum: 41"), "{reply}");
    }

    #[test]
    fn dispatch_shows_each_panel() {
        let mut s = at(Layer::Technical);
        let reply = s.dispatch(&Command::Algorithm(Algorithm::Pathfind)).unwrap();
        assert!(reply.starts_with("Running pathfind: searching"), "{reply}");
        let reply = s.dispatch(&Command::Demo(Demo::Metrics)).unwrap();
        assert!(reply.contains("Scale Master (99.99% uptime)"), "{reply}");
        assert!(reply.contains("Overall impact: 95.3"), "{reply}");
        assert!(s.dispatch(&Command::Demo(Demo::LiveCode)).unwrap().starts_with("Live code"));
        let reply = s.dispatch(&Command::Demo(Demo::Algorithms)).unwrap();
        assert!(reply.starts_with("Algorithms: bubble sort"), "{reply}");
        assert!(reply.ends_with("(continue)"));
    }

    #[test]
    fn backdrop_follows_the_layer() {
        let s = session();
        let poses = s.backdrop_poses(1.0);
        assert_eq!(poses[0].0, Shape::Infinity);
        assert_eq!(poses.len(), scene::backdrop(Layer::Gateway).len());
    }

    #[test]
    fn status_serializes_camel_case() {
        let s = session();
        let json = serde_json::to_value(s.status()).unwrap();
        assert_eq!(json["layer"], 0);
        assert_eq!(json["dimensionShifts"], 0);
        assert_eq!(json["layerComplete"], true);
    }
}
