//! The self-modifying code panel.
//!
//! [`EvolvingCode`] holds a short class definition that rewrites itself one
//! step per [`evolve`](EvolvingCode::evolve) call. Steps cycle through a
//! version bump, an achievement counter and a skill append, each a single
//! regex replacement on the current text. A step that leaves the text
//! unchanged (the drawn skill was already listed) is not recorded in the
//! history, but still advances the cycle.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

/// The document the panel starts from.
pub const INITIAL_SOURCE: &str = r"class SelfModifyingResume {
  constructor() {
    this.version = 1.0;
    this.skills = ['AI Strategy', 'Data Science'];
    this.achievements = 0;
    this.insights = [];
  }

  evolve() {
    this.version += 0.1;
    this.achievements++;

    if (this.achievements % 3 === 0) {
      this.unlockNewSkill();
    }

    this.generateInsight();
    this.optimizePerformance();
  }

  unlockNewSkill() {
    const newSkills = [
      'Quantum Computing',
      'Neural Architecture Search',
      'Causal Inference',
      'Reinforcement Learning',
      'Knowledge Graphs'
    ];

    const skill = newSkills[
      Math.floor(Math.random() * newSkills.length)
    ];

    if (!this.skills.includes(skill)) {
      this.skills.push(skill);
      this.modifyCode('skills', this.skills);
    }
  }

  generateInsight() {
    const insights = [
      'Data is the new oil, but insights are the refinery',
      'Every model is wrong, but some are useful',
      'The best algorithm is the one that ships',
      'Complexity is the enemy of execution'
    ];

    const insight = insights[
      Math.floor(Math.random() * insights.length)
    ];

    this.insights.push({
      text: insight,
      timestamp: new Date().toISOString()
    });
  }

  optimizePerformance() {
    if (this.version > 2.0) {
      this.modifyCode('constructor',
        this.constructor.toString()
          .replace('1.0', '2.0')
      );
    }
  }

  modifyCode(section, newContent) {
    console.log(`Modified ${section}: ${newContent}`);
  }
}

const resume = new SelfModifyingResume();";

/// Skills the append step draws from.
pub const SKILL_POOL: [&str; 5] = [
    "Machine Learning Ops",
    "Distributed Systems",
    "Edge Computing",
    "Explainable AI",
    "Privacy-Preserving ML",
];

const VERSION_PATTERN: &str = r"this\.version = \d+\.\d+";
const ACHIEVEMENTS_PATTERN: &str = r"this\.achievements = \d+";
const SKILLS_PATTERN: &str = r"this\.skills = \[([^\]]+)\]";

/// Errors raised while preparing the rewrite patterns.
#[derive(Debug, thiserror::Error)]
pub enum EvolveError {
    /// A rewrite pattern failed to compile.
    #[error("invalid rewrite pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// The rewrite applied by one evolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionStep {
    /// `this.version = 1.N`
    VersionBump,
    /// `this.achievements = N`
    AchievementCount,
    /// A new entry in `this.skills`.
    SkillAppend,
}

impl EvolutionStep {
    /// Steps in cycle order.
    pub const CYCLE: [Self; 3] = [Self::VersionBump, Self::AchievementCount, Self::SkillAppend];

    /// The step taken at `iteration` (0-based).
    pub const fn at(iteration: u32) -> Self {
        match iteration.checked_rem(3) {
            Some(0) => Self::VersionBump,
            Some(1) => Self::AchievementCount,
            _ => Self::SkillAppend,
        }
    }
}

/// The outcome of one evolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    /// Which rewrite ran.
    pub step: EvolutionStep,
    /// Human-readable summary.
    pub description: String,
    /// Whether the text changed.
    pub changed: bool,
}

/// A document that rewrites itself.
#[derive(Debug, Clone)]
pub struct EvolvingCode {
    source: String,
    iterations: u32,
    history: Vec<String>,
    rng: StdRng,
    version: Regex,
    achievements: Regex,
    skills: Regex,
}

impl EvolvingCode {
    /// Start from [`INITIAL_SOURCE`]; `seed` drives skill picks.
    pub fn new(seed: u64) -> Result<Self, EvolveError> {
        Self::with_source(INITIAL_SOURCE, seed)
    }

    /// Start from arbitrary text.
    pub fn with_source(source: impl Into<String>, seed: u64) -> Result<Self, EvolveError> {
        Ok(Self {
            source: source.into(),
            iterations: 0,
            history: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            version: Regex::new(VERSION_PATTERN)?,
            achievements: Regex::new(ACHIEVEMENTS_PATTERN)?,
            skills: Regex::new(SKILLS_PATTERN)?,
        })
    }

    /// Apply the next rewrite in the cycle.
    pub fn evolve(&mut self) -> Modification {
        let step = EvolutionStep::at(self.iterations);
        let next = self.iterations.saturating_add(1);

        let (rewritten, description) = match step {
            EvolutionStep::VersionBump => {
                let version = format!("{:.1}", f64::from(next).mul_add(0.1, 1.0));
                let replacement = format!("this.version = {version}");
                (
                    self.version.replace(&self.source, NoExpand(&replacement)).into_owned(),
                    format!("Version upgraded to {version}"),
                )
            }
            EvolutionStep::AchievementCount => {
                let replacement = format!("this.achievements = {next}");
                (
                    self.achievements
                        .replace(&self.source, NoExpand(&replacement))
                        .into_owned(),
                    format!("Achievements increased to {next}"),
                )
            }
            EvolutionStep::SkillAppend => (
                self.append_skill(),
                "Added new skill through self-learning".to_owned(),
            ),
        };

        let changed = rewritten != self.source;
        if changed {
            self.source = rewritten;
            self.history.push(description.clone());
            tracing::debug!(iteration = next, step = ?step, "Code evolved");
        }
        self.iterations = next;
        Modification {
            step,
            description,
            changed,
        }
    }

    fn append_skill(&mut self) -> String {
        let Some(current) = self
            .skills
            .captures(&self.source)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_owned())
        else {
            return self.source.clone();
        };
        let Some(skill) = SKILL_POOL.choose(&mut self.rng) else {
            return self.source.clone();
        };
        if current.contains(skill) {
            return self.source.clone();
        }
        let replacement = format!("this.skills = [{current}, '{skill}']");
        self.skills
            .replace(&self.source, NoExpand(&replacement))
            .into_owned()
    }

    /// The current text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evolutions so far, including ones that changed nothing.
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Descriptions of the evolutions that changed the text, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn steps_cycle_in_order() {
        let steps: Vec<_> = (0..6).map(EvolutionStep::at).collect();
        assert_eq!(steps[..3], EvolutionStep::CYCLE);
        assert_eq!(steps[3..], EvolutionStep::CYCLE);
    }

    #[test]
    fn first_evolution_bumps_the_version() {
        let mut code = EvolvingCode::new(1).unwrap();
        let m = code.evolve();
        assert_eq!(m.step, EvolutionStep::VersionBump);
        assert_eq!(m.description, "Version upgraded to 1.1");
        assert!(m.changed);
        assert!(code.source().contains("this.version = 1.1;"));
        // Only the first match is rewritten.
        assert!(code.source().contains("this.version += 0.1;"));
    }

    #[test]
    fn second_evolution_counts_achievements() {
        let mut code = EvolvingCode::new(1).unwrap();
        code.evolve();
        let m = code.evolve();
        assert_eq!(m.description, "Achievements increased to 2");
        assert!(code.source().contains("this.achievements = 2;"));
    }

    #[test]
    fn third_evolution_appends_a_pool_skill() {
        let mut code = EvolvingCode::new(9).unwrap();
        code.evolve();
        code.evolve();
        let m = code.evolve();
        assert_eq!(m.step, EvolutionStep::SkillAppend);
        assert!(m.changed);
        assert!(SKILL_POOL
            .iter()
            .any(|s| code.source().contains(&format!("'AI Strategy', 'Data Science', '{s}']"))));
        assert_eq!(code.history().len(), 3);
        assert_eq!(code.iterations(), 3);
    }

    #[test]
    fn repeated_skill_changes_nothing() {
        let start = format!("this.skills = ['{}']", SKILL_POOL.join("', '"));
        let mut code = EvolvingCode::with_source(start.clone(), 3).unwrap();
        code.evolve();
        code.evolve();
        let m = code.evolve();
        assert!(!m.changed);
        assert_eq!(code.source(), start);
        assert!(code.history().is_empty());
        assert_eq!(code.iterations(), 3);
    }

    #[test]
    fn version_keeps_climbing_across_cycles() {
        let mut code = EvolvingCode::new(2).unwrap();
        for _ in 0..4 {
            code.evolve();
        }
        assert!(code.source().contains("this.version = 1.4;"));
    }
}
