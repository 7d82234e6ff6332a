//! Scripted `CommandRunner` for tests.

use anyhow::Result;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{command_line, CommandOutput, CommandRunner};
use crate::error::SupervisorError;

#[derive(Debug, Clone)]
enum Scripted {
    Stdout(String),
    Fail(String),
}

#[derive(Debug)]
struct Rule {
    pattern: String,
    responses: VecDeque<Scripted>,
}

/// Records every invocation and answers from per-pattern response queues.
///
/// A rule matches when its pattern is a substring of the rendered command
/// line. Responses are consumed in order and the last one repeats. Commands
/// that match no rule succeed with empty output.
#[derive(Debug, Default)]
pub struct FakeCommandRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<String>>,
}

impl FakeCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response with the given stdout.
    pub fn respond(&self, pattern: &str, stdout: &str) {
        self.push(pattern, Scripted::Stdout(stdout.to_string()));
    }

    /// Queue a failed response.
    pub fn fail(&self, pattern: &str, stderr: &str) {
        self.push(pattern, Scripted::Fail(stderr.to_string()));
    }

    /// Every command line run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of recorded command lines containing `pattern`.
    pub fn count_calls(&self, pattern: &str) -> usize {
        self.calls()
            .iter()
            .filter(|line| line.contains(pattern))
            .count()
    }

    fn push(&self, pattern: &str, response: Scripted) {
        let Ok(mut rules) = self.rules.lock() else {
            return;
        };
        match rules.iter_mut().find(|r| r.pattern == pattern) {
            Some(rule) => rule.responses.push_back(response),
            None => rules.push(Rule {
                pattern: pattern.to_string(),
                responses: VecDeque::from([response]),
            }),
        }
    }

    fn next_response(&self, line: &str) -> Option<Scripted> {
        let mut rules = self.rules.lock().ok()?;
        let rule = rules.iter_mut().find(|r| line.contains(&r.pattern))?;
        if rule.responses.len() > 1 {
            rule.responses.pop_front()
        } else {
            rule.responses.front().cloned()
        }
    }
}

impl CommandRunner for FakeCommandRunner {
    fn run_command(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let line = command_line(program, args);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(line.clone());
        }

        match self.next_response(&line) {
            Some(Scripted::Stdout(stdout)) => Ok(CommandOutput::from_stdout(stdout)),
            Some(Scripted::Fail(stderr)) => Err(SupervisorError::CommandFailed {
                command: line,
                exit_code: Some(1),
                stderr,
            }
            .into()),
            None => Ok(CommandOutput::from_stdout("")),
        }
    }
}
