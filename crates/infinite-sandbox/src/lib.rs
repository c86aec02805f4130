//! Code panels for the Technical layer.
//!
//! Visitor-typed script never runs in the host. [`execute`] parses it as
//! toy script, a small JavaScript-flavoured language, and evaluates it in a
//! tree-walking interpreter under a [`Budget`] of steps, call depth, output
//! lines, allocations and wall-clock time. Every outcome, failures included,
//! comes back as display text.
//!
//! The [`evolve`] module drives the self-modifying code panel, a document
//! that rewrites itself one regex step at a time.
//!
//! # Modules
//!
//! - [`budget`] -- Run limits and the meter that enforces them
//! - [`evolve`] -- Self-modifying code panel
//! - `lexer`, `parser`, `ast` -- Toy script front end
//! - `interpreter`, `value` -- Evaluation and console rendering

mod ast;
pub mod budget;
pub mod evolve;
mod interpreter;
mod lexer;
mod parser;
mod value;

pub use budget::{Budget, Exhausted};
pub use evolve::{EvolutionStep, EvolveError, EvolvingCode, Modification};

use serde::{Deserialize, Serialize};

use crate::interpreter::Interpreter;

/// Label shown on the code panel.
pub const LABEL: &str =
    "Toy demo: runs a small sandboxed subset of JavaScript, not a real engine";

/// Output of a successful run that printed nothing.
pub const NO_OUTPUT: &str = "Code executed successfully with no output";

/// The program the panel starts with.
pub const DEFAULT_PROGRAM: &str = r#"// Live coding environment
// Try editing this code!

function fibonacci(n) {
  if (n <= 1) return n;
  return fibonacci(n - 1) + fibonacci(n - 2);
}

// Calculate first 10 Fibonacci numbers
const results = [];
for (let i = 0; i < 10; i++) {
  results.push(fibonacci(i));
}

console.log("Fibonacci sequence:", results);

// Data transformation example
const data = [1, 2, 3, 4, 5];
const transformed = data
  .map(x => x * x)
  .filter(x => x > 10)
  .reduce((sum, x) => sum + x, 0);

console.log("Transformed sum:", transformed);"#;

/// Stack for the interpreter thread. Recursion depth is bounded by the
/// budget and the parser's nesting cap; this leaves ample headroom.
const INTERPRETER_STACK: usize = 32 * 1024 * 1024;

/// Everything that can stop a run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SandboxError {
    /// The source does not parse.
    #[error("{message} (line {line})")]
    Syntax {
        /// 1-based line of the offending token.
        line: u32,
        /// What was wrong.
        message: String,
    },
    /// A name was read or assigned before being declared.
    #[error("{0} is not defined")]
    Reference(String),
    /// A name was declared twice in one scope.
    #[error("Identifier '{0}' has already been declared")]
    Redeclared(String),
    /// An operation was applied to a value that does not support it.
    #[error("{0}")]
    Type(String),
    /// Script executed `throw`. Carries the error message.
    #[error("{0}")]
    Thrown(String),
    /// A [`Budget`] limit was reached.
    #[error("execution budget exceeded ({0})")]
    Budget(#[from] Exhausted),
    /// The interpreter itself failed.
    #[error("interpreter failure: {0}")]
    Internal(String),
}

/// The result of one run, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    /// Console lines joined by newlines, [`NO_OUTPUT`], or `Error: <message>`.
    pub output: String,
    /// Whether the program ran to completion.
    pub succeeded: bool,
    /// Evaluation steps taken.
    pub steps: u64,
    /// Wall-clock time in milliseconds.
    pub elapsed_ms: u64,
}

impl core::fmt::Display for Execution {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.output)
    }
}

struct RunReport {
    result: Result<Vec<String>, SandboxError>,
    steps: u64,
    elapsed_ms: u64,
}

fn run(source: &str, budget: Budget, seed: u64) -> RunReport {
    let mut interpreter = Interpreter::new(budget, seed);
    let result = parser::parse(source).and_then(|program| interpreter.run(&program));
    let steps = interpreter.meter().steps();
    let elapsed_ms = u64::try_from(interpreter.meter().elapsed().as_millis()).unwrap_or(u64::MAX);
    RunReport {
        result: result.map(|()| interpreter.into_output()),
        steps,
        elapsed_ms,
    }
}

/// Run `source` under `budget` with a fresh `Math.random` seed.
pub fn execute(source: &str, budget: &Budget) -> Execution {
    execute_seeded(source, budget, rand::random())
}

/// Run `source` under `budget`, seeding `Math.random` with `seed`.
///
/// Never fails: parse errors, runtime errors, `throw`, budget exhaustion and
/// even an interpreter fault all come back as `Error: <message>` output.
pub fn execute_seeded(source: &str, budget: &Budget, seed: u64) -> Execution {
    let budget = *budget;
    let report = std::thread::scope(|scope| {
        let handle = std::thread::Builder::new()
            .name("sandbox".to_owned())
            .stack_size(INTERPRETER_STACK)
            .spawn_scoped(scope, move || run(source, budget, seed));
        let failure = |message: String| RunReport {
            result: Err(SandboxError::Internal(message)),
            steps: 0,
            elapsed_ms: 0,
        };
        match handle {
            Err(e) => failure(format!("could not start interpreter thread: {e}")),
            Ok(handle) => match handle.join() {
                Ok(report) => report,
                Err(payload) => {
                    let detail = payload
                        .downcast_ref::<&str>()
                        .map(|s| (*s).to_owned())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_owned());
                    failure(detail)
                }
            },
        }
    });

    let (output, succeeded) = match report.result {
        Ok(lines) if lines.is_empty() => (NO_OUTPUT.to_owned(), true),
        Ok(lines) => (lines.join("\n"), true),
        Err(e) => {
            match &e {
                SandboxError::Internal(detail) => {
                    tracing::error!(detail = %detail, "Sandbox interpreter failed");
                }
                SandboxError::Budget(limit) => {
                    tracing::info!(limit = %limit, steps = report.steps, "Sandbox run exhausted its budget");
                }
                _ => {}
            }
            (format!("Error: {e}"), false)
        }
    };
    tracing::debug!(
        succeeded,
        steps = report.steps,
        elapsed_ms = report.elapsed_ms,
        "Sandbox run finished"
    );
    Execution {
        output,
        succeeded,
        steps: report.steps,
        elapsed_ms: report.elapsed_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec(source: &str) -> Execution {
        execute_seeded(source, &Budget::default(), 1)
    }

    #[test]
    fn default_program_prints_fibonacci_and_sum() {
        let run = exec(DEFAULT_PROGRAM);
        assert!(run.succeeded, "{}", run.output);
        let expected = "Fibonacci sequence: [\n  0,\n  1,\n  1,\n  2,\n  3,\n  5,\n  8,\n  13,\n  21,\n  34\n]\nTransformed sum: 41";
        assert_eq!(run.output, expected);
        assert!(run.steps > 0);
    }

    #[test]
    fn silent_program_reports_no_output() {
        assert_eq!(exec("let x = 1 + 1;").output, NO_OUTPUT);
        assert_eq!(exec("").output, NO_OUTPUT);
    }

    #[test]
    fn infinite_loop_ends_with_a_budget_error() {
        let budget = Budget {
            max_steps: 10_000,
            ..Budget::default()
        };
        let run = execute_seeded("while (true) {}", &budget, 0);
        assert!(!run.succeeded);
        assert_eq!(run.output, "Error: execution budget exceeded (step limit of 10000)");
    }

    #[test]
    fn infinite_loop_ends_with_a_timeout() {
        let budget = Budget {
            max_steps: u64::MAX,
            timeout_ms: 50,
            ..Budget::default()
        };
        let run = execute_seeded("for (;;) {}", &budget, 0);
        assert_eq!(run.output, "Error: execution budget exceeded (time limit of 50 ms)");
    }

    #[test]
    fn thrown_errors_render_with_prefix() {
        assert_eq!(exec("throw new Error('Something broke')").output, "Error: Something broke");
        assert_eq!(exec("missing()").output, "Error: missing is not defined");
    }

    #[test]
    fn output_before_a_failure_is_discarded() {
        let run = exec("console.log('first'); null.x");
        assert!(!run.succeeded);
        assert_eq!(run.output, "Error: Cannot read properties of null (reading 'x')");
    }

    #[test]
    fn syntax_errors_name_the_line() {
        assert_eq!(exec("let x = 1\nlet = 2").output, "Error: Unexpected token '=' (line 2)");
    }

    #[test]
    fn output_lines_are_capped() {
        let budget = Budget {
            max_output_lines: 3,
            ..Budget::default()
        };
        let run = execute_seeded("for (let i = 0; i < 10; i++) console.log(i)", &budget, 0);
        assert_eq!(run.output, "Error: execution budget exceeded (output limit of 3 lines)");
    }

    #[test]
    fn repeated_copies_hit_the_allocation_limit() {
        let run = exec(
            "const big = 'x'.repeat(100000).split(''); const keep = []; while (true) { keep.push(big.slice()) }",
        );
        assert!(!run.succeeded);
        assert_eq!(
            run.output,
            "Error: execution budget exceeded (allocation limit of 4000000 units)"
        );
    }

    #[test]
    fn small_programs_stay_within_the_allocation_limit() {
        let run = exec("let s = ''; for (let i = 0; i < 100; i++) s += i; console.log(s.length)");
        assert_eq!(run.output, "190");
    }

    #[test]
    fn deep_recursion_is_stopped_not_crashed() {
        let run = exec("function down(n) { return down(n + 1) } down(0)");
        assert_eq!(run.output, "Error: execution budget exceeded (call depth limit of 256)");
    }

    #[test]
    fn execution_serializes_camel_case() {
        let json = serde_json::to_value(exec("console.log(1)")).unwrap_or_default();
        assert_eq!(json["output"], "1");
        assert!(json.get("elapsedMs").is_some());
    }
}
