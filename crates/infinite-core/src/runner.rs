//! Session loop runner.
//!
//! [`run_session`] drives a [`Session`] from a command channel while the
//! layer timers keep running:
//!
//! - **Commands**: each one is dispatched and its reply or error reported
//! - **Animation frame**: backdrop poses for the current layer
//! - **Enlightenment**: the Philosophy meter ramps on its own
//! - **Demo timers**: sort, pathfinding and neural steps for the algorithm
//!   on screen
//!
//! The loop ends on `quit` or when the command channel closes. Achievements
//! granted by any event are announced right after it.

use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use infinite_geometry::{Pose, Shape};
use infinite_journey::SnapshotStore;
use infinite_types::{Achievement, Algorithm};

use crate::SessionError;
use crate::command::Command;
use crate::config::TimerConfig;
use crate::session::Session;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The visitor quit.
    Quit,
    /// The command channel closed.
    InputClosed,
}

/// What happened during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Why the loop stopped.
    pub end_reason: EndReason,
    /// Commands dispatched, including failed ones.
    pub commands: u64,
    /// Animation frames rendered.
    pub frames: u64,
}

/// Receives everything the loop produces.
///
/// Only replies, errors and achievements must be handled; the timer hooks
/// default to doing nothing.
pub trait SessionCallback: Send {
    /// A command succeeded.
    fn on_reply(&mut self, command: &Command, reply: &str);

    /// A command failed.
    fn on_error(&mut self, command: &Command, error: &SessionError);

    /// An achievement was unlocked.
    fn on_achievement(&mut self, achievement: &Achievement);

    /// An animation frame: the backdrop after `t` seconds.
    fn on_frame(&mut self, _t: f64, _poses: &[(Shape, Pose)]) {}

    /// The visualized algorithm advanced.
    fn on_demo_step(&mut self, _algorithm: Algorithm, _summary: &str) {}

    /// The enlightenment meter moved.
    fn on_enlightenment(&mut self, _level: f64) {}
}

/// A callback that ignores everything, for tests and headless runs.
pub struct NoOpCallback;

impl SessionCallback for NoOpCallback {
    fn on_reply(&mut self, _command: &Command, _reply: &str) {}
    fn on_error(&mut self, _command: &Command, _error: &SessionError) {}
    fn on_achievement(&mut self, _achievement: &Achievement) {}
}

fn every(ms: u64) -> Interval {
    let mut interval = tokio::time::interval(Duration::from_millis(ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

/// Run `session` until the visitor quits or `commands` closes.
///
/// Commands take priority over timers, so input queued before the first
/// tick is handled in order before any animation.
pub async fn run_session<S: SnapshotStore>(
    session: &mut Session<S>,
    commands: &mut mpsc::Receiver<Command>,
    timers: &TimerConfig,
    callback: &mut dyn SessionCallback,
) -> RunSummary {
    let mut frame = every(timers.frame_ms);
    let mut enlightenment = every(timers.enlightenment_ms);
    let mut sort = every(timers.sort_ms);
    let mut path = every(timers.path_ms);
    let mut neural = every(timers.neural_ms);
    let started = Instant::now();

    let mut handled: u64 = 0;
    let mut frames: u64 = 0;

    info!(
        layer = session.state().current_layer.index(),
        frame_ms = timers.frame_ms,
        "Session starting"
    );

    let end_reason = loop {
        tokio::select! {
            biased;

            received = commands.recv() => {
                let Some(command) = received else {
                    break EndReason::InputClosed;
                };
                handled = handled.saturating_add(1);
                debug!(?command, "Dispatching command");
                match session.dispatch(&command) {
                    Ok(reply) => callback.on_reply(&command, &reply),
                    Err(e) => {
                        debug!(?command, error = %e, "Command refused");
                        callback.on_error(&command, &e);
                    }
                }
                announce(session, callback);
                if command == Command::Quit {
                    break EndReason::Quit;
                }
            }
            _ = frame.tick() => {
                frames = frames.saturating_add(1);
                let poses = session.backdrop_poses(started.elapsed().as_secs_f64());
                callback.on_frame(started.elapsed().as_secs_f64(), &poses);
            }
            _ = enlightenment.tick() => {
                if let Some(level) = session.tick_enlightenment() {
                    callback.on_enlightenment(level);
                }
            }
            _ = sort.tick() => step_demo(session, Algorithm::Sort, callback),
            _ = path.tick() => step_demo(session, Algorithm::Pathfind, callback),
            _ = neural.tick() => step_demo(session, Algorithm::Ml, callback),
        }
    };

    info!(
        reason = ?end_reason,
        commands = handled,
        frames,
        progress = session.state().journey_progress,
        "Session ended"
    );

    RunSummary {
        end_reason,
        commands: handled,
        frames,
    }
}

fn step_demo<S: SnapshotStore>(
    session: &mut Session<S>,
    algorithm: Algorithm,
    callback: &mut dyn SessionCallback,
) {
    if let Some(summary) = session.advance_demo(algorithm) {
        callback.on_demo_step(algorithm, &summary);
    }
}

fn announce<S: SnapshotStore>(session: &mut Session<S>, callback: &mut dyn SessionCallback) {
    for achievement in session.take_granted() {
        callback.on_achievement(&achievement);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use infinite_journey::MemoryStore;
    use infinite_types::{Demo, Layer};

    use super::*;
    use crate::config::ResumeConfig;

    #[derive(Default)]
    struct Recorder {
        replies: Vec<String>,
        errors: Vec<String>,
        achievements: Vec<String>,
        demo_steps: Vec<Algorithm>,
        levels: Vec<f64>,
        frames: u64,
    }

    impl SessionCallback for Recorder {
        fn on_reply(&mut self, _command: &Command, reply: &str) {
            self.replies.push(reply.to_owned());
        }
        fn on_error(&mut self, _command: &Command, error: &SessionError) {
            self.errors.push(error.to_string());
        }
        fn on_achievement(&mut self, achievement: &Achievement) {
            self.achievements.push(achievement.id.to_string());
        }
        fn on_frame(&mut self, _t: f64, poses: &[(Shape, Pose)]) {
            assert!(!poses.is_empty());
            self.frames = self.frames.saturating_add(1);
        }
        fn on_demo_step(&mut self, algorithm: Algorithm, _summary: &str) {
            self.demo_steps.push(algorithm);
        }
        fn on_enlightenment(&mut self, level: f64) {
            self.levels.push(level);
        }
    }

    fn session() -> Session<MemoryStore> {
        Session::open(MemoryStore::new(), &ResumeConfig::default()).unwrap()
    }

    async fn feed(commands: Vec<Command>) -> mpsc::Receiver<Command> {
        let (tx, rx) = mpsc::channel(commands.len().max(1));
        for command in commands {
            tx.send(command).await.unwrap();
        }
        rx
    }

    #[tokio::test(start_paused = true)]
    async fn quit_ends_the_loop() {
        let mut s = session();
        let mut rx = feed(vec![Command::Enter, Command::Quit, Command::Reset]).await;
        let mut recorder = Recorder::default();

        let summary = run_session(&mut s, &mut rx, &TimerConfig::default(), &mut recorder).await;

        assert_eq!(summary.end_reason, EndReason::Quit);
        assert_eq!(summary.commands, 2);
        assert_eq!(recorder.replies.len(), 2);
        assert_eq!(s.state().current_layer, Layer::Narrative);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_input_ends_the_loop_and_errors_are_reported() {
        let mut s = session();
        let mut rx = feed(vec![Command::Capture, Command::Goto(Layer::Technical)]).await;
        let mut recorder = Recorder::default();

        let summary = run_session(&mut s, &mut rx, &TimerConfig::default(), &mut NoOpCallback).await;
        assert_eq!(summary.end_reason, EndReason::InputClosed);
        assert_eq!(summary.commands, 2);

        let mut rx = feed(vec![Command::Capture, Command::Goto(Layer::Technical)]).await;
        run_session(&mut s, &mut rx, &TimerConfig::default(), &mut recorder).await;
        assert_eq!(recorder.errors.len(), 2);
        assert!(recorder.errors[1].contains("locked"));
    }

    #[tokio::test(start_paused = true)]
    async fn achievements_are_announced_after_the_command() {
        let mut s = session();
        s.unlock_all();
        s.goto(Layer::Philosophy).unwrap();
        s.take_granted();
        let mut rx = feed(vec![Command::Glimpse, Command::Glimpse, Command::Glimpse]).await;
        let mut recorder = Recorder::default();

        run_session(&mut s, &mut rx, &TimerConfig::default(), &mut recorder).await;

        assert_eq!(recorder.achievements, vec!["infinity-seeker".to_owned()]);
    }

    #[tokio::test(start_paused = true)]
    async fn timers_drive_the_mounted_layer() {
        let mut s = session();
        s.unlock_all();
        s.goto(Layer::Philosophy).unwrap();
        let (tx, mut rx) = mpsc::channel::<Command>(1);
        let mut recorder = Recorder::default();
        let timers = TimerConfig::default();

        let run = run_session(&mut s, &mut rx, &timers, &mut recorder);
        let stopped = tokio::time::timeout(Duration::from_millis(550), run).await;
        assert!(stopped.is_err());
        drop(tx);

        // Ticks at 0, 100, ..., 500.
        assert_eq!(recorder.levels.len(), 6);
        assert!(recorder.frames >= 30);
        assert!(recorder.demo_steps.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_active_demo_steps() {
        let mut s = session();
        s.unlock_all();
        s.goto(Layer::Technical).unwrap();
        let (tx, mut rx) = mpsc::channel::<Command>(1);
        let mut recorder = Recorder::default();
        let timers = TimerConfig::default();

        let run = run_session(&mut s, &mut rx, &timers, &mut recorder);
        let stopped = tokio::time::timeout(Duration::from_millis(2_500), run).await;
        assert!(stopped.is_err());
        drop(tx);

        assert!(recorder.demo_steps.iter().all(|a| *a == Algorithm::Sort));
        assert_eq!(recorder.demo_steps.len(), 3);
        assert!(recorder.levels.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn other_panels_pause_the_algorithm_timers() {
        let mut s = session();
        s.unlock_all();
        s.goto(Layer::Technical).unwrap();
        s.select_demo(Demo::Metrics).unwrap();
        let (tx, mut rx) = mpsc::channel::<Command>(1);
        let mut recorder = Recorder::default();
        let timers = TimerConfig::default();

        let run = run_session(&mut s, &mut rx, &timers, &mut recorder);
        let stopped = tokio::time::timeout(Duration::from_millis(2_500), run).await;
        assert!(stopped.is_err());
        drop(tx);

        assert!(recorder.demo_steps.is_empty());
        assert!(recorder.frames > 0);
    }
}
