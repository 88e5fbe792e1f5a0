//! CSV adapters for the replay CLI: script steps in, page transitions out.

pub mod script_reader;
pub mod transition_writer;
