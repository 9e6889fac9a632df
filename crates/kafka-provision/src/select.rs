//! Interactive version selection
//!
//! Selection is a small state machine fed one line at a time:
//! `AwaitingInput -> Selected | Invalid`, where `Invalid` goes back to
//! waiting for the next line. Input comes from an [`InputSource`] so tests can
//! supply a fixed script of answers.

use std::collections::VecDeque;
use std::io;

use thiserror::Error;

use crate::report::Reporter;
use crate::version::Version;

/// Source of answers to the version prompt
pub trait InputSource {
    /// Show `prompt` and read one line. `Ok(None)` means end of input.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// Fixed sequence of answers, for non-interactive use and tests
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
    prompts: usize,
}

impl ScriptedInput {
    pub fn new(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts: 0,
        }
    }

    /// How many times the prompt was shown
    pub fn prompts(&self) -> usize {
        self.prompts
    }
}

impl InputSource for ScriptedInput {
    fn read_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
        self.prompts += 1;
        Ok(self.lines.pop_front())
    }
}

/// Why an answer was not accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NotANumber(String),
    OutOfRange { choice: i64, count: usize },
}

impl Rejection {
    pub fn message(&self) -> String {
        match self {
            Self::NotANumber(input) => format!("'{input}' is not a number, please enter a valid number"),
            Self::OutOfRange { choice, count } => {
                format!("invalid choice {choice}, pick a number between 1 and {count}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionState {
    AwaitingInput,
    Selected(Version),
    Invalid(Rejection),
}

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("no versions available to choose from")]
    NoVersions,

    #[error("input closed before a version was chosen")]
    InputClosed,

    #[error("failed to read selection: {0}")]
    Io(#[from] io::Error),
}

/// Prompt over a non-empty, ascending list of versions
#[derive(Debug)]
pub struct VersionPrompt<'a> {
    versions: &'a [Version],
    state: SelectionState,
}

impl<'a> VersionPrompt<'a> {
    pub fn new(versions: &'a [Version]) -> Result<Self, SelectError> {
        if versions.is_empty() {
            return Err(SelectError::NoVersions);
        }
        Ok(Self {
            versions,
            state: SelectionState::AwaitingInput,
        })
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Highest offered version, chosen on blank input
    pub fn default_version(&self) -> Version {
        self.versions[self.versions.len() - 1]
    }

    pub fn prompt_text(&self) -> String {
        format!(
            "Select a version (1-{}), press Enter to install the latest {}",
            self.versions.len(),
            self.default_version()
        )
    }

    /// Menu lines, 1-indexed
    pub fn menu_items(&self) -> Vec<String> {
        self.versions
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{}) {v}", i + 1))
            .collect()
    }

    /// Evaluate one answer and move to the next state
    pub fn feed(&mut self, input: &str) -> &SelectionState {
        let input = input.trim();
        self.state = if input.is_empty() {
            SelectionState::Selected(self.default_version())
        } else {
            match input.parse::<i64>() {
                Err(_) => SelectionState::Invalid(Rejection::NotANumber(input.to_string())),
                Ok(choice) => match usize::try_from(choice) {
                    Ok(n) if (1..=self.versions.len()).contains(&n) => {
                        SelectionState::Selected(self.versions[n - 1])
                    }
                    _ => SelectionState::Invalid(Rejection::OutOfRange {
                        choice,
                        count: self.versions.len(),
                    }),
                },
            }
        };
        &self.state
    }

    /// Show the menu and ask until an answer is accepted
    pub fn run(
        mut self,
        input: &mut dyn InputSource,
        reporter: &dyn Reporter,
    ) -> Result<Version, SelectError> {
        reporter.menu("Available Kafka versions:", &self.menu_items());
        let prompt = self.prompt_text();

        loop {
            let Some(line) = input.read_line(&prompt)? else {
                return Err(SelectError::InputClosed);
            };
            match self.feed(&line) {
                SelectionState::Selected(version) => return Ok(*version),
                SelectionState::Invalid(rejection) => reporter.warn(&rejection.message()),
                SelectionState::AwaitingInput => {}
            }
        }
    }
}
