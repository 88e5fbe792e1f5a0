use super::session::CheckoutSession;
use crate::domain::credential::TokenId;
use crate::domain::form::SubmitEvent;
use crate::domain::ui_state::UiEvent;
use crate::domain::widget::ProviderFault;
use crate::error::{CheckoutError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// What happened to a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The provider issued a token and the host received its id.
    Tokenized(TokenId),
    /// The provider refused to tokenize; the UI shows the fault.
    Rejected(ProviderFault),
    /// The button was not in a submittable state, or a request was already in flight.
    Ignored,
}

/// Marks a tokenization request as in flight until dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CheckoutSession {
    /// Handles a `submit` event from the payment form.
    ///
    /// The browser's default action is always suppressed. A token is requested
    /// for the current contents of the card element; on success the host's
    /// token hook receives the token id and the UI moves to `Processing`, on a
    /// provider fault the UI moves to `Error` and the hook is not called.
    /// Failed submissions are not retried.
    pub async fn on_submit(&self, event: &mut SubmitEvent) -> Result<SubmitOutcome> {
        event.prevent_default();

        let mounted = self.mounted.as_ref().ok_or(CheckoutError::NotMounted)?;

        let state = self.driver.current();
        if !state.accepts_submission() {
            debug!(form = event.form_id(), %state, "submission ignored, button disabled");
            return Ok(SubmitOutcome::Ignored);
        }

        let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
            debug!(form = event.form_id(), "submission ignored, tokenization in flight");
            return Ok(SubmitOutcome::Ignored);
        };

        let result = match mounted.provider.create_token(&mounted.handle).await {
            Ok(result) => result,
            Err(e) => {
                self.driver.apply(UiEvent::SubmissionFailed(e.to_string()));
                return Err(e);
            }
        };

        match result {
            Ok(token) => {
                info!(widget = %mounted.handle.id(), token = %token.id, "card tokenized");
                self.driver.hooks().handle_token(token.id.clone());
                self.driver.apply(UiEvent::TokenIssued);
                Ok(SubmitOutcome::Tokenized(token.id))
            }
            Err(fault) => {
                info!(kind = ?fault.kind, code = ?fault.code, "tokenization rejected");
                self.driver
                    .apply(UiEvent::SubmissionFailed(fault.message.clone()));
                Ok(SubmitOutcome::Rejected(fault))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StyleOptions;
    use crate::domain::credential::PublicKey;
    use crate::domain::ui_state::UiState;
    use crate::domain::widget::FaultKind;
    use crate::infrastructure::card::CardInput;
    use crate::infrastructure::in_memory::{HostCall, RecordingHost};
    use crate::infrastructure::simulated::{SimulatedPage, SimulatedProvider};
    use std::sync::Arc;
    use std::time::Duration;

    const MOUNT: &str = "#card-element";

    async fn mounted(page: SimulatedPage) -> (CheckoutSession, RecordingHost) {
        let host = RecordingHost::new();
        let mut session = CheckoutSession::new(
            SimulatedProvider::factory(page),
            Arc::new(host.clone()),
        );
        session
            .mount(
                &PublicKey::new("pk_test_abc").unwrap(),
                MOUNT,
                &StyleOptions::default(),
            )
            .await
            .unwrap();
        (session, host)
    }

    fn page() -> SimulatedPage {
        SimulatedPage::with_mount_points([MOUNT]).with_today(2026, 10)
    }

    fn valid_card() -> CardInput {
        CardInput::new("4242424242424242", "12/99", "123")
    }

    #[tokio::test]
    async fn test_success_calls_hook_once_before_processing() {
        let page = page();
        let (session, host) = mounted(page.clone()).await;
        page.type_card(MOUNT, valid_card()).unwrap();
        host.drain();

        let mut event = SubmitEvent::new("payment-form");
        let outcome = session.on_submit(&mut event).await.unwrap();

        let token = TokenId("tok_sim_000001".to_string());
        assert_eq!(outcome, SubmitOutcome::Tokenized(token.clone()));
        assert!(event.default_prevented());
        assert_eq!(
            host.calls(),
            vec![
                HostCall::HandleToken(token),
                HostCall::SetState(UiState::Processing),
            ]
        );
    }

    #[tokio::test]
    async fn test_provider_fault_shows_error_without_hook() {
        let page = page();
        let (session, host) = mounted(page.clone()).await;
        page.type_card(MOUNT, valid_card()).unwrap();
        page.fail_next_token(ProviderFault::new(
            FaultKind::ApiConnectionError,
            "We could not reach the payment network.",
        ));

        let mut event = SubmitEvent::new("payment-form");
        let outcome = session.on_submit(&mut event).await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Rejected(_)));
        assert!(event.default_prevented());
        assert!(host.tokens().is_empty());
        assert_eq!(
            session.state(),
            UiState::Error("We could not reach the payment network.".to_string())
        );
    }

    #[tokio::test]
    async fn test_incomplete_card_is_rejected() {
        let (session, host) = mounted(page()).await;

        let mut event = SubmitEvent::new("payment-form");
        let outcome = session.on_submit(&mut event).await.unwrap();

        match outcome {
            SubmitOutcome::Rejected(fault) => {
                assert_eq!(fault.message, "Your card number is incomplete.")
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(host.tokens().is_empty());
    }

    #[tokio::test]
    async fn test_no_automatic_retry_after_fault() {
        let page = page();
        let (session, _) = mounted(page.clone()).await;
        page.type_card(MOUNT, valid_card()).unwrap();
        page.fail_next_token(ProviderFault::new(FaultKind::ApiError, "Try again later."));

        session
            .on_submit(&mut SubmitEvent::new("payment-form"))
            .await
            .unwrap();
        assert_eq!(page.token_requests(), 1);

        // Button stays disabled until the user edits the card
        let outcome = session
            .on_submit(&mut SubmitEvent::new("payment-form"))
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Ignored);
        assert_eq!(page.token_requests(), 1);

        page.type_card(MOUNT, valid_card()).unwrap();
        let outcome = session
            .on_submit(&mut SubmitEvent::new("payment-form"))
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Tokenized(_)));
    }

    #[tokio::test]
    async fn test_concurrent_submissions_request_one_token() {
        let page = page().with_latency(Duration::from_millis(20));
        let (session, host) = mounted(page.clone()).await;
        page.type_card(MOUNT, valid_card()).unwrap();

        let mut first = SubmitEvent::new("payment-form");
        let mut second = SubmitEvent::new("payment-form");
        let (a, b) = tokio::join!(session.on_submit(&mut first), session.on_submit(&mut second));

        let outcomes = [a.unwrap(), b.unwrap()];
        assert_eq!(
            outcomes
                .iter()
                .filter(|o| matches!(o, SubmitOutcome::Tokenized(_)))
                .count(),
            1
        );
        assert!(outcomes.contains(&SubmitOutcome::Ignored));
        assert!(first.default_prevented() && second.default_prevented());
        assert_eq!(page.token_requests(), 1);
        assert_eq!(host.tokens().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_while_processing_is_ignored() {
        let page = page();
        let (session, _) = mounted(page.clone()).await;
        page.type_card(MOUNT, valid_card()).unwrap();

        session
            .on_submit(&mut SubmitEvent::new("payment-form"))
            .await
            .unwrap();
        let outcome = session
            .on_submit(&mut SubmitEvent::new("payment-form"))
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Ignored);

        assert_eq!(session.complete(), Some(UiState::Complete));
        assert_eq!(session.reset(), Some(UiState::Default));
    }

    #[tokio::test]
    async fn test_submit_without_widget() {
        let session = CheckoutSession::new(
            SimulatedProvider::factory(page()),
            Arc::new(RecordingHost::new()),
        );
        let mut event = SubmitEvent::new("payment-form");

        let err = session.on_submit(&mut event).await.unwrap_err();
        assert!(matches!(err, CheckoutError::NotMounted));
        assert!(event.default_prevented());
    }
}
