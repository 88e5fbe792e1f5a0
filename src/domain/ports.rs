use super::credential::{PublicKey, Token, TokenId};
use super::ui_state::UiState;
use super::widget::{ChangeEvent, ElementKind, ProviderFault, WidgetHandle};
use crate::config::StyleOptions;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Callback registered for widget `change` events.
pub type ChangeListener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Outcome of a tokenization request that reached the provider.
pub type TokenResult = std::result::Result<Token, ProviderFault>;

/// A client of the hosted payment provider, bound to one publishable key.
///
/// The outer `Result` of each method is a failure to talk to the element at all
/// (unknown mount point, stale handle); faults the provider reports about the
/// card itself travel inside [`TokenResult`] or [`ChangeEvent`].
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_element(
        &self,
        kind: ElementKind,
        style: &StyleOptions,
    ) -> Result<WidgetHandle>;
    async fn mount(&self, widget: &WidgetHandle, selector: &str) -> Result<()>;
    fn add_change_listener(&self, widget: &WidgetHandle, listener: ChangeListener) -> Result<()>;
    /// Detaches the element and drops its listeners. The handle is stale afterwards.
    async fn unmount(&self, widget: &WidgetHandle) -> Result<()>;
    async fn create_token(&self, widget: &WidgetHandle) -> Result<TokenResult>;
}

pub type ProviderBox = Arc<dyn PaymentProvider>;

/// Builds a provider client for a key; called once per mount.
pub type ProviderFactory = Box<dyn Fn(&PublicKey) -> Result<ProviderBox> + Send + Sync>;

/// The capabilities the host page hands to the checkout session.
pub trait HostHooks: Send + Sync {
    /// Called on every accepted state transition.
    fn set_state(&self, state: &UiState);
    /// Called exactly once per issued token, before the state moves to processing.
    fn handle_token(&self, token: TokenId);
}

pub type HostHooksBox = Arc<dyn HostHooks>;
