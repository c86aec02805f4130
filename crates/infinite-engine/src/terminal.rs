//! Session callback that writes to the terminal.
//!
//! Replies go to stdout, refusals to stderr. Timer activity is only
//! logged, at `debug`, so the prompt stays readable.

use infinite_core::{Command, SessionCallback, SessionError};
use infinite_types::{Achievement, Algorithm};
use tracing::debug;

/// Callback that bridges the session loop to the terminal.
#[derive(Debug, Default)]
pub struct TerminalCallback {
    enlightened: bool,
}

impl TerminalCallback {
    /// A callback that has announced nothing yet.
    pub const fn new() -> Self {
        Self { enlightened: false }
    }
}

impl SessionCallback for TerminalCallback {
    fn on_reply(&mut self, command: &Command, reply: &str) {
        if matches!(command, Command::Quit) {
            println!("{reply}");
        } else {
            println!("{reply}\n");
        }
    }

    fn on_error(&mut self, _command: &Command, error: &SessionError) {
        eprintln!("! {error}\n");
    }

    fn on_achievement(&mut self, achievement: &Achievement) {
        println!(
            "* Achievement unlocked: {} [{:?}]\n  {}\n",
            achievement.title, achievement.rarity, achievement.description
        );
    }

    fn on_demo_step(&mut self, algorithm: Algorithm, summary: &str) {
        debug!(algorithm = algorithm.as_str(), summary, "Demonstration step");
    }

    fn on_enlightenment(&mut self, level: f64) {
        if level >= 1.0 && !self.enlightened {
            self.enlightened = true;
            println!("~ Enlightenment complete.\n");
        } else if level < 1.0 {
            self.enlightened = false;
        }
    }
}
