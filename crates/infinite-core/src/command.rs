//! Front-end commands.
//!
//! One command per input line: a lowercase verb followed by at most one
//! argument. `run` takes the rest of the line verbatim as script source.

use infinite_geometry::Shape;
use infinite_types::{Algorithm, Concept, ContactMethod, Demo, Layer};

use crate::navigation::Direction;
use crate::scene::NarrativeMode;

/// Errors raised while parsing an input line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The verb is not a known command.
    #[error("unknown command: {0} (try 'help')")]
    Unknown(String),

    /// A required argument is missing.
    #[error("'{command}' needs {expected}")]
    MissingArgument {
        /// The verb.
        command: &'static str,
        /// What should follow it.
        expected: &'static str,
    },

    /// An argument could not be understood.
    #[error("'{command}': {reason}")]
    InvalidArgument {
        /// The verb.
        command: &'static str,
        /// Why the argument was rejected.
        reason: String,
    },
}

/// A single user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the journey status.
    Status,
    /// Print the command list.
    Help,
    /// Step through the gateway.
    Enter,
    /// Jump to an unlocked layer.
    Goto(Layer),
    /// Arrow move.
    Move(Direction),
    /// Leave a completed layer for the next one.
    Continue,
    /// Capture the narrative moment.
    Capture,
    /// Switch the narrative layout.
    Mode(NarrativeMode),
    /// Explore a philosophical concept.
    Explore(Concept),
    /// Glimpse the infinite.
    Glimpse,
    /// Open a Technical panel.
    Demo(Demo),
    /// Pick the visualization in the algorithms panel.
    Algorithm(Algorithm),
    /// Run script in the live-code panel. `None` runs the starter program.
    Run(Option<String>),
    /// Evolve the self-modifying code panel.
    Evolve,
    /// Claim the technical mastery badge.
    Mastery,
    /// Resonate in the Psychological layer.
    Resonate,
    /// Reach out through a contact channel.
    Contact(ContactMethod),
    /// Unlock every layer.
    UnlockAll,
    /// Print the vertex data of a shape as JSON.
    Geometry(Shape),
    /// Wipe the journey.
    Reset,
    /// End the session.
    Quit,
}

/// Usage text, one command per line.
pub const HELP: &str = "\
status                      journey progress and current layer
enter                       step through the gateway
goto <0-4>                  jump to an unlocked layer
up | down                   move one layer
continue                    leave a completed layer
capture                     capture the narrative moment
mode <timeline|network|flow>
explore <godel|buddhism|quantum>
glimpse                     glimpse the infinite
demo <algorithms|live-code|self-modify|metrics>
algo <sort|pathfind|ml>     pick the algorithm to visualize
run [script]                run toy script (no script runs the starter program)
evolve                      evolve the self-modifying code
mastery                     claim technical mastery
resonate                    resonate with the journey
contact <email|linkedin|calendar>
unlock-all                  unlock every layer
geometry <shape>            print vertex data as JSON
reset                       wipe the journey
quit";

impl core::str::FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(verb, rest)| (verb, rest.trim()));
        let arg = (!rest.is_empty()).then_some(rest);

        Ok(match verb.to_ascii_lowercase().as_str() {
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "enter" => Self::Enter,
            "goto" => Self::Goto(parse_layer(required("goto", arg, "a layer number 0-4")?)?),
            "up" => Self::Move(Direction::Up),
            "down" => Self::Move(Direction::Down),
            "continue" | "next" => Self::Continue,
            "capture" => Self::Capture,
            "mode" => {
                let name = required("mode", arg, "timeline, network or flow")?;
                Self::Mode(
                    NarrativeMode::ALL
                        .into_iter()
                        .find(|m| m.as_str() == name)
                        .ok_or_else(|| CommandError::InvalidArgument {
                            command: "mode",
                            reason: format!("unknown mode: {name}"),
                        })?,
                )
            }
            "explore" => Self::Explore(parse_named(
                "explore",
                required("explore", arg, "godel, buddhism or quantum")?,
            )?),
            "glimpse" => Self::Glimpse,
            "demo" => Self::Demo(parse_named(
                "demo",
                required("demo", arg, "algorithms, live-code, self-modify or metrics")?,
            )?),
            "algo" => Self::Algorithm(parse_named(
                "algo",
                required("algo", arg, "sort, pathfind or ml")?,
            )?),
            "run" => Self::Run(arg.map(str::to_owned)),
            "evolve" => Self::Evolve,
            "mastery" => Self::Mastery,
            "resonate" => Self::Resonate,
            "contact" => Self::Contact(parse_named(
                "contact",
                required("contact", arg, "email, linkedin or calendar")?,
            )?),
            "unlock-all" => Self::UnlockAll,
            "geometry" => Self::Geometry(parse_named(
                "geometry",
                required("geometry", arg, "a shape name")?,
            )?),
            "reset" => Self::Reset,
            "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_owned())),
        })
    }
}

fn required<'a>(
    command: &'static str,
    arg: Option<&'a str>,
    expected: &'static str,
) -> Result<&'a str, CommandError> {
    arg.ok_or(CommandError::MissingArgument { command, expected })
}

fn parse_layer(arg: &str) -> Result<Layer, CommandError> {
    let invalid = |reason: String| CommandError::InvalidArgument {
        command: "goto",
        reason,
    };
    let index: u8 = arg
        .parse()
        .map_err(|e: core::num::ParseIntError| invalid(format!("{arg:?} is not a layer number ({e})")))?;
    Layer::try_from(index).map_err(|e| invalid(e.to_string()))
}

fn parse_named<T>(command: &'static str, arg: &str) -> Result<T, CommandError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    arg.to_ascii_lowercase()
        .parse()
        .map_err(|e: T::Err| CommandError::InvalidArgument {
            command,
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, CommandError> {
        line.parse()
    }

    #[test]
    fn bare_verbs() {
        assert_eq!(parse("status"), Ok(Command::Status));
        assert_eq!(parse("  Enter  "), Ok(Command::Enter));
        assert_eq!(parse("down"), Ok(Command::Move(Direction::Down)));
        assert_eq!(parse("unlock-all"), Ok(Command::UnlockAll));
        assert_eq!(parse("exit"), Ok(Command::Quit));
    }

    #[test]
    fn arguments_are_parsed() {
        assert_eq!(parse("goto 3"), Ok(Command::Goto(Layer::Technical)));
        assert_eq!(parse("explore Godel"), Ok(Command::Explore(Concept::Godel)));
        assert_eq!(parse("demo live-code"), Ok(Command::Demo(Demo::LiveCode)));
        assert_eq!(parse("algo pathfind"), Ok(Command::Algorithm(Algorithm::Pathfind)));
        assert!(parse("demo pathfind").is_err());
        assert_eq!(parse("contact linkedin"), Ok(Command::Contact(ContactMethod::Linkedin)));
        assert_eq!(parse("geometry klein"), Ok(Command::Geometry(Shape::Klein)));
        assert_eq!(parse("mode network"), Ok(Command::Mode(NarrativeMode::Network)));
    }

    #[test]
    fn run_keeps_the_rest_of_the_line() {
        assert_eq!(
            parse("run console.log('a b');  console.log(2)"),
            Ok(Command::Run(Some("console.log('a b');  console.log(2)".to_owned())))
        );
        assert_eq!(parse("run"), Ok(Command::Run(None)));
    }

    #[test]
    fn bad_input_is_explained() {
        assert_eq!(parse("fly"), Err(CommandError::Unknown("fly".to_owned())));
        assert!(matches!(
            parse("goto"),
            Err(CommandError::MissingArgument { command: "goto", .. })
        ));
        assert!(matches!(
            parse("goto 7"),
            Err(CommandError::InvalidArgument { command: "goto", reason }) if reason.contains("out of range")
        ));
        assert!(matches!(
            parse("explore stoicism"),
            Err(CommandError::InvalidArgument { command: "explore", .. })
        ));
        assert!(matches!(parse(""), Err(CommandError::Unknown(_))));
    }
}
