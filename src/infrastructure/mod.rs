//! Adapters for the domain ports: a simulated card-element provider backed by an
//! in-memory page, and host hooks that record what the page would render.

pub mod card;
pub mod in_memory;
pub mod simulated;
