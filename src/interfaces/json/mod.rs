//! JSON Lines output for the replay CLI: the full page view after each step.

pub mod snapshot_writer;
