use crate::domain::credential::TokenId;
use crate::domain::ports::HostHooks;
use crate::domain::ui_state::UiState;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A call made by the checkout session into the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    SetState(UiState),
    HandleToken(TokenId),
}

/// Host hooks that record every call in order.
///
/// Used by the replay CLI and by tests to observe what a real page would have
/// rendered. `Clone` shares the recorded calls.
#[derive(Debug, Default, Clone)]
pub struct RecordingHost {
    calls: Arc<Mutex<Vec<HostCall>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.lock().clone()
    }

    /// Returns and forgets the calls recorded so far.
    pub fn drain(&self) -> Vec<HostCall> {
        std::mem::take(&mut *self.lock())
    }

    pub fn states(&self) -> Vec<UiState> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                HostCall::SetState(state) => Some(state.clone()),
                HostCall::HandleToken(_) => None,
            })
            .collect()
    }

    pub fn tokens(&self) -> Vec<TokenId> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                HostCall::HandleToken(token) => Some(token.clone()),
                HostCall::SetState(_) => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<HostCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HostHooks for RecordingHost {
    fn set_state(&self, state: &UiState) {
        self.lock().push(HostCall::SetState(state.clone()));
    }

    fn handle_token(&self, token: TokenId) {
        self.lock().push(HostCall::HandleToken(token));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_host_keeps_order() {
        let host = RecordingHost::new();
        host.handle_token(TokenId("tok_1".to_string()));
        host.set_state(&UiState::Processing);

        assert_eq!(
            host.calls(),
            vec![
                HostCall::HandleToken(TokenId("tok_1".to_string())),
                HostCall::SetState(UiState::Processing),
            ]
        );
        assert_eq!(host.states(), vec![UiState::Processing]);
        assert_eq!(host.tokens().len(), 1);
    }

    #[test]
    fn test_drain_empties_log() {
        let host = RecordingHost::new();
        host.set_state(&UiState::Default);
        assert_eq!(host.drain().len(), 1);
        assert!(host.calls().is_empty());
    }
}
