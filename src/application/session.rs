use super::driver::StateDriver;
use crate::config::StyleOptions;
use crate::domain::credential::PublicKey;
use crate::domain::ports::{
    ChangeListener, HostHooksBox, ProviderBox, ProviderFactory,
};
use crate::domain::ui_state::{UiEvent, UiState};
use crate::domain::widget::{ChangeEvent, ElementKind, WidgetHandle, WidgetId};
use crate::error::{CheckoutError, Result};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info, warn};

pub(super) struct MountedWidget {
    pub(super) provider: ProviderBox,
    pub(super) handle: WidgetHandle,
}

/// One checkout on one page.
///
/// Owns the provider client and the mounted card element, and drives the UI
/// state through the host's hooks. At most one widget is mounted at a time.
pub struct CheckoutSession {
    factory: ProviderFactory,
    pub(super) driver: Arc<StateDriver>,
    pub(super) mounted: Option<MountedWidget>,
    pub(super) in_flight: AtomicBool,
}

impl CheckoutSession {
    /// Creates a session with nothing mounted.
    ///
    /// # Arguments
    ///
    /// * `factory` - Builds a provider client for the key given to [`Self::mount`].
    /// * `hooks` - The host's state and token callbacks.
    pub fn new(factory: ProviderFactory, hooks: HostHooksBox) -> Self {
        Self {
            factory,
            driver: Arc::new(StateDriver::new(hooks)),
            mounted: None,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Returns a snapshot of the current UI state.
    pub fn state(&self) -> UiState {
        self.driver.current()
    }

    /// Returns true while a card element is mounted.
    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Returns the id of the mounted card element, if any.
    pub fn widget_id(&self) -> Option<WidgetId> {
        self.mounted.as_ref().map(|mounted| mounted.handle.id())
    }

    /// Creates a card element and mounts it at `selector`.
    ///
    /// Change events from the element move the UI to `Error(message)` when the
    /// provider reports a fault and back to `Default` when it does not. On any
    /// failure the provider client is dropped and nothing stays attached.
    pub async fn mount(
        &mut self,
        key: &PublicKey,
        selector: &str,
        style: &StyleOptions,
    ) -> Result<WidgetId> {
        if self.mounted.is_some() {
            return Err(CheckoutError::AlreadyMounted);
        }

        let provider = (self.factory)(key)?;
        let handle = provider.create_element(ElementKind::Card, style).await?;
        provider.mount(&handle, selector).await?;

        let driver = Arc::clone(&self.driver);
        let listener: ChangeListener = Arc::new(move |event: &ChangeEvent| {
            debug!(
                widget = %event.widget,
                complete = event.complete,
                empty = event.empty,
                "card element changed"
            );
            let fault = event.error.as_ref().map(|fault| fault.message.clone());
            driver.apply(UiEvent::WidgetChanged(fault));
        });
        if let Err(e) = provider.add_change_listener(&handle, listener) {
            if let Err(teardown) = provider.unmount(&handle).await {
                warn!(error = %teardown, "Error rolling back payment widget mount");
            }
            return Err(e);
        }

        // A fresh element starts idle; a state left over from the previous
        // widget goes back through the machine so the host sees it too.
        if self.driver.current() != UiState::Default {
            self.driver.apply(UiEvent::Reset);
        }
        let id = handle.id();
        info!(widget = %id, selector, live = key.is_live(), "payment widget mounted");
        self.mounted = Some(MountedWidget { provider, handle });
        Ok(id)
    }

    /// Detaches the widget and releases the provider client.
    ///
    /// Never fails: faults during teardown are logged and the widget is
    /// considered gone either way.
    pub async fn unmount(&mut self) {
        let Some(MountedWidget { provider, handle }) = self.mounted.take() else {
            debug!("unmount requested with no payment widget mounted");
            return;
        };

        match provider.unmount(&handle).await {
            Ok(()) => info!(widget = %handle.id(), "payment widget unmounted"),
            Err(e) => warn!(widget = %handle.id(), error = %e, "Error unloading payment widget"),
        }
    }

    /// Host signal that the payment was captured.
    pub fn complete(&self) -> Option<UiState> {
        self.driver.apply(UiEvent::Completed)
    }

    /// Host signal that capturing the payment failed after tokenization.
    pub fn capture_failed(&self, message: impl Into<String>) -> Option<UiState> {
        self.driver.apply(UiEvent::CaptureFailed(message.into()))
    }

    /// Returns the UI to `Default` from any state.
    pub fn reset(&self) -> Option<UiState> {
        self.driver.apply(UiEvent::Reset)
    }
}
