//! Application layer: the checkout session that owns the mounted widget and
//! runs the submission flow.
//!
//! `CheckoutSession` replaces page-global provider and widget bindings with an
//! explicit context object. The host gives it a provider factory and its hooks;
//! everything else lives inside the session.

pub mod driver;
pub mod session;
pub mod submission;
