use crate::error::{CheckoutError, Result};
use serde::Deserialize;
use std::io::Read;

/// A page interaction in a replay script.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Mount,
    /// The user edits the card element.
    Input,
    Submit,
    /// The provider fails the next tokenization with `message`.
    FailNext,
    Complete,
    CaptureFailed,
    Reset,
    Unmount,
    /// The host removes the mount point from the page.
    Detach,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Mount => "mount",
            Action::Input => "input",
            Action::Submit => "submit",
            Action::FailNext => "fail_next",
            Action::Complete => "complete",
            Action::CaptureFailed => "capture_failed",
            Action::Reset => "reset",
            Action::Unmount => "unmount",
            Action::Detach => "detach",
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct ScriptStep {
    pub action: Action,
    pub card_number: Option<String>,
    pub expiry: Option<String>,
    pub cvc: Option<String>,
    pub message: Option<String>,
}

impl ScriptStep {
    /// The `message` column, required by `fail_next` and `capture_failed`.
    pub fn require_message(&self) -> Result<&str> {
        self.message.as_deref().ok_or_else(|| {
            CheckoutError::ScriptError(format!("'{}' needs a message", self.action.name()))
        })
    }
}

/// Reads replay steps from a CSV source.
///
/// Columns: `action, card_number, expiry, cvc, message`. Whitespace is trimmed
/// and trailing empty columns may be omitted.
pub struct ScriptReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ScriptReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes steps; malformed rows surface as errors in place.
    pub fn steps(self) -> impl Iterator<Item = Result<ScriptStep>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(CheckoutError::from))
    }
}
