use crate::domain::ports::HostHooksBox;
use crate::domain::ui_state::{UiEvent, UiState, UiStateMachine};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Applies UI events and notifies the host of each accepted transition.
///
/// Shared between the session and the widget's change listener, so the
/// machine sits behind a mutex. The lock is released before the host is called.
pub struct StateDriver {
    machine: Mutex<UiStateMachine>,
    hooks: HostHooksBox,
}

impl StateDriver {
    /// Creates a driver in the `Default` state.
    pub fn new(hooks: HostHooksBox) -> Self {
        Self {
            machine: Mutex::new(UiStateMachine::new()),
            hooks,
        }
    }

    pub fn hooks(&self) -> &HostHooksBox {
        &self.hooks
    }

    pub fn current(&self) -> UiState {
        self.lock().current().clone()
    }

    /// Applies `event`; returns the new state, or `None` if it was ignored.
    pub fn apply(&self, event: UiEvent) -> Option<UiState> {
        let next = self.lock().apply(&event).cloned();
        match &next {
            Some(state) => self.hooks.set_state(state),
            None => debug!(?event, "UI event ignored in current state"),
        }
        next
    }

    fn lock(&self) -> MutexGuard<'_, UiStateMachine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
