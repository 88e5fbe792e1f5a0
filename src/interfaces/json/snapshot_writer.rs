use crate::domain::credential::TokenId;
use crate::domain::ui_state::{PageView, UiState};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// The page after a replay step, with every element keyed by its layout id.
#[derive(Debug, Serialize)]
pub struct PageSnapshot<'a> {
    pub step: usize,
    pub action: &'a str,
    #[serde(flatten)]
    pub state: &'a UiState,
    pub page: &'a PageView,
    pub token: Option<&'a TokenId>,
}

/// Writes one JSON object per line.
pub struct SnapshotWriter<W: Write> {
    sink: W,
}

impl<W: Write> SnapshotWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    pub fn write(&mut self, snapshot: &PageSnapshot<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.sink, snapshot)?;
        self.sink.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }
}
