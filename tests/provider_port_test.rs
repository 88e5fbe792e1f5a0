use async_trait::async_trait;
use paywidget::application::session::CheckoutSession;
use paywidget::application::submission::SubmitOutcome;
use paywidget::config::StyleOptions;
use paywidget::domain::credential::{CardSummary, PublicKey, Token, TokenId};
use paywidget::domain::form::SubmitEvent;
use paywidget::domain::ports::{
    ChangeListener, PaymentProvider, ProviderBox, ProviderFactory, TokenResult,
};
use paywidget::domain::ui_state::UiState;
use paywidget::domain::widget::{
    CardBrand, ChangeEvent, ElementKind, FaultKind, ProviderFault, WidgetHandle, WidgetId,
};
use paywidget::error::{CheckoutError, Result};
use paywidget::infrastructure::in_memory::{HostCall, RecordingHost};
use std::sync::{Arc, Mutex};

/// A provider that answers tokenization from a fixed script and whose teardown
/// always fails.
#[derive(Default)]
struct ScriptedProvider {
    responses: Mutex<Vec<TokenResult>>,
    listeners: Mutex<Vec<ChangeListener>>,
}

impl ScriptedProvider {
    fn emit(&self, event: ChangeEvent) {
        for listener in self.listeners.lock().unwrap().iter() {
            listener(&event);
        }
    }
}

#[async_trait]
impl PaymentProvider for ScriptedProvider {
    async fn create_element(
        &self,
        kind: ElementKind,
        _style: &StyleOptions,
    ) -> Result<WidgetHandle> {
        Ok(WidgetHandle::new(WidgetId(7), kind))
    }

    async fn mount(&self, _widget: &WidgetHandle, _selector: &str) -> Result<()> {
        Ok(())
    }

    fn add_change_listener(&self, _widget: &WidgetHandle, listener: ChangeListener) -> Result<()> {
        self.listeners.lock().unwrap().push(listener);
        Ok(())
    }

    async fn unmount(&self, widget: &WidgetHandle) -> Result<()> {
        Err(CheckoutError::StaleWidget(widget.id()))
    }

    async fn create_token(&self, _widget: &WidgetHandle) -> Result<TokenResult> {
        Ok(self.responses.lock().unwrap().remove(0))
    }
}

fn token(id: &str) -> Token {
    Token {
        id: TokenId(id.to_string()),
        card: CardSummary {
            brand: CardBrand::Visa,
            last4: "4242".to_string(),
            exp_month: 12,
            exp_year: 2099,
        },
        livemode: false,
        created: 0,
    }
}

fn session_with(provider: Arc<ScriptedProvider>) -> (CheckoutSession, RecordingHost) {
    let factory: ProviderFactory = Box::new(move |_key: &PublicKey| -> Result<ProviderBox> {
        Ok(provider.clone())
    });
    let host = RecordingHost::new();
    (CheckoutSession::new(factory, Arc::new(host.clone())), host)
}

fn key() -> PublicKey {
    PublicKey::new("pk_test_port").unwrap()
}

#[tokio::test]
async fn test_hook_receives_token_id_before_processing() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.responses.lock().unwrap().push(Ok(token("tok_abc")));
    let (mut session, host) = session_with(provider);

    session
        .mount(&key(), "#card-element", &StyleOptions::default())
        .await
        .unwrap();
    let mut event = SubmitEvent::new("payment-form");
    let outcome = session.on_submit(&mut event).await.unwrap();

    assert_eq!(outcome, SubmitOutcome::Tokenized(TokenId("tok_abc".to_string())));
    assert_eq!(
        host.calls(),
        vec![
            HostCall::HandleToken(TokenId("tok_abc".to_string())),
            HostCall::SetState(UiState::Processing),
        ]
    );
}

#[tokio::test]
async fn test_card_error_reported_with_exact_message() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.responses.lock().unwrap().push(Err(ProviderFault::new(
        FaultKind::CardError,
        "Your card has insufficient funds.",
    )
    .with_code("card_declined")));
    let (mut session, host) = session_with(provider);

    session
        .mount(&key(), "#card-element", &StyleOptions::default())
        .await
        .unwrap();
    session
        .on_submit(&mut SubmitEvent::new("payment-form"))
        .await
        .unwrap();

    assert!(host.tokens().is_empty());
    assert_eq!(
        host.states(),
        vec![UiState::Error("Your card has insufficient funds.".to_string())]
    );
}

#[tokio::test]
async fn test_failing_teardown_is_swallowed() {
    let provider = Arc::new(ScriptedProvider::default());
    let (mut session, _) = session_with(provider.clone());

    session
        .mount(&key(), "#card-element", &StyleOptions::default())
        .await
        .unwrap();
    session.unmount().await;
    session.unmount().await;

    assert!(!session.is_mounted());
    // Left: the test's handle and the factory's
    assert_eq!(Arc::strong_count(&provider), 2);
}

#[tokio::test]
async fn test_change_events_from_provider() {
    let provider = Arc::new(ScriptedProvider::default());
    let (mut session, _) = session_with(provider.clone());
    session
        .mount(&key(), "#card-element", &StyleOptions::default())
        .await
        .unwrap();

    provider.emit(ChangeEvent {
        widget: WidgetId(7),
        empty: false,
        complete: false,
        brand: CardBrand::Unknown,
        error: Some(ProviderFault::validation(
            "invalid_number",
            "Your card number is invalid.",
        )),
    });
    assert_eq!(
        session.state(),
        UiState::Error("Your card number is invalid.".to_string())
    );

    provider.emit(ChangeEvent {
        widget: WidgetId(7),
        empty: false,
        complete: true,
        brand: CardBrand::Visa,
        error: None,
    });
    assert_eq!(session.state(), UiState::Default);
}

#[tokio::test]
async fn test_factory_error_leaves_session_unmounted() {
    let factory: ProviderFactory = Box::new(|key: &PublicKey| -> Result<ProviderBox> {
        Err(CheckoutError::InvalidPublicKey(key.to_string()))
    });
    let mut session = CheckoutSession::new(factory, Arc::new(RecordingHost::new()));

    let err = session
        .mount(&key(), "#card-element", &StyleOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::InvalidPublicKey(_)));
    assert!(!session.is_mounted());
}
