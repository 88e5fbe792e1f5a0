use crate::domain::credential::TokenId;
use crate::domain::ui_state::{PageView, UiState};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// One output row: the page after a replay step.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TransitionRecord {
    pub step: usize,
    pub action: String,
    pub state: String,
    pub message: Option<String>,
    pub button: String,
    pub disabled: bool,
    pub token: Option<TokenId>,
}

impl TransitionRecord {
    pub fn new(
        step: usize,
        action: &str,
        state: &UiState,
        view: &PageView,
        token: Option<TokenId>,
    ) -> Self {
        Self {
            step,
            action: action.to_string(),
            state: state.name().to_string(),
            message: view.error_banner.message.clone(),
            button: view.button.text.clone(),
            disabled: view.button.disabled,
            token,
        }
    }
}

/// Writes replay results as CSV with a header row.
pub struct TransitionWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TransitionWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write(&mut self, record: &TransitionRecord) -> Result<()> {
        self.writer.serialize(record)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
