//! Domain types for the payment widget: UI states, credentials, widget handles,
//! pricing and the ports through which the provider and the host are reached.

pub mod credential;
pub mod form;
pub mod ports;
pub mod pricing;
pub mod ui_state;
pub mod widget;
