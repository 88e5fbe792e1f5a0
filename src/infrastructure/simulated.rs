use super::card::{self, CardInput};
use crate::config::StyleOptions;
use crate::domain::credential::{PublicKey, Token, TokenId};
use crate::domain::ports::{
    ChangeListener, PaymentProvider, ProviderBox, ProviderFactory, TokenResult,
};
use crate::domain::widget::{ChangeEvent, ElementKind, ProviderFault, WidgetHandle, WidgetId};
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

/// An in-memory page hosting simulated card elements.
///
/// Tracks the mount points present in the DOM, which element occupies each of
/// them, and how many provider clients and change listeners currently reference
/// the page. Also carries the knobs tests use to script the provider: faults
/// for the next tokenization, response latency and the current date.
///
/// `Clone` shares the underlying state.
#[derive(Clone, Default)]
pub struct SimulatedPage {
    inner: Arc<Mutex<PageState>>,
}

struct PageState {
    mount_points: BTreeSet<String>,
    occupied: HashMap<String, (WidgetId, Weak<SimulatedProvider>)>,
    clients: usize,
    listeners: usize,
    token_requests: usize,
    next_widget: u64,
    next_token: u64,
    pending_faults: VecDeque<ProviderFault>,
    latency: Option<Duration>,
    today: (u16, u8),
}

impl Default for PageState {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            mount_points: BTreeSet::new(),
            occupied: HashMap::new(),
            clients: 0,
            listeners: 0,
            token_requests: 0,
            next_widget: 1,
            next_token: 1,
            pending_faults: VecDeque::new(),
            latency: None,
            today: (now.year() as u16, now.month() as u8),
        }
    }
}

impl SimulatedPage {
    /// Creates an empty page with no mount points.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mount_points<I, S>(points: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let page = Self::new();
        for point in points {
            page.add_mount_point(point);
        }
        page
    }

    /// Delays every tokenization response by `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = Some(latency);
        self
    }

    /// Fixes the date used for expiry checks.
    pub fn with_today(self, year: u16, month: u8) -> Self {
        self.lock().today = (year, month);
        self
    }

    pub fn add_mount_point(&self, selector: impl Into<String>) {
        self.lock().mount_points.insert(selector.into());
    }

    /// Removes a node from the DOM. Any element mounted there is orphaned.
    pub fn remove_mount_point(&self, selector: &str) -> bool {
        let mut state = self.lock();
        state.occupied.remove(selector);
        state.mount_points.remove(selector)
    }

    /// Simulates the user editing the card element mounted at `selector`.
    pub fn type_card(&self, selector: &str, input: CardInput) -> Result<()> {
        let (widget, provider) = {
            let state = self.lock();
            let (widget, client) = state
                .occupied
                .get(selector)
                .ok_or_else(|| CheckoutError::MountPointNotFound(selector.to_string()))?;
            let provider = client
                .upgrade()
                .ok_or_else(|| CheckoutError::MountPointNotFound(selector.to_string()))?;
            (*widget, provider)
        };
        provider.enter_card(widget, input)
    }

    /// Makes the next tokenization request fail with `fault`.
    pub fn fail_next_token(&self, fault: ProviderFault) {
        self.lock().pending_faults.push_back(fault);
    }

    pub fn client_count(&self) -> usize {
        self.lock().clients
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners
    }

    pub fn occupied_count(&self) -> usize {
        self.lock().occupied.len()
    }

    pub fn is_occupied(&self, selector: &str) -> bool {
        self.lock().occupied.contains_key(selector)
    }

    pub fn token_requests(&self) -> usize {
        self.lock().token_requests
    }

    /// Style of the element mounted at `selector`, as the provider received it.
    pub fn style_at(&self, selector: &str) -> Option<StyleOptions> {
        let (widget, provider) = {
            let state = self.lock();
            let (widget, client) = state.occupied.get(selector)?;
            (*widget, client.upgrade()?)
        };
        provider.style_of(widget)
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn occupy(&self, selector: &str, widget: WidgetId, client: Weak<SimulatedProvider>) -> Result<()> {
        let mut state = self.lock();
        if !state.mount_points.contains(selector) {
            return Err(CheckoutError::MountPointNotFound(selector.to_string()));
        }
        if state.occupied.contains_key(selector) {
            return Err(CheckoutError::MountPointOccupied(selector.to_string()));
        }
        state.occupied.insert(selector.to_string(), (widget, client));
        Ok(())
    }

    /// Frees `selector` if `widget` still occupies it.
    fn release(&self, selector: &str, widget: WidgetId) -> bool {
        let mut state = self.lock();
        match state.occupied.get(selector) {
            Some((occupant, _)) if *occupant == widget => {
                state.occupied.remove(selector);
                true
            }
            _ => false,
        }
    }

    fn next_widget_id(&self) -> WidgetId {
        let mut state = self.lock();
        let id = WidgetId(state.next_widget);
        state.next_widget += 1;
        id
    }

    fn next_token_id(&self) -> TokenId {
        let mut state = self.lock();
        let id = TokenId(format!("tok_sim_{:06}", state.next_token));
        state.next_token += 1;
        id
    }
}

struct Element {
    kind: ElementKind,
    style: StyleOptions,
    selector: Option<String>,
    input: CardInput,
    listeners: Vec<ChangeListener>,
}

/// A provider client backed by a [`SimulatedPage`].
///
/// Behaves like the hosted card element: validates input as it changes,
/// reports faults through change listeners and tokenizes complete cards.
pub struct SimulatedProvider {
    me: Weak<SimulatedProvider>,
    key: PublicKey,
    page: SimulatedPage,
    elements: Mutex<HashMap<WidgetId, Element>>,
}

impl SimulatedProvider {
    pub fn connect(key: &PublicKey, page: &SimulatedPage) -> Arc<Self> {
        page.lock().clients += 1;
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            key: key.clone(),
            page: page.clone(),
            elements: Mutex::new(HashMap::new()),
        })
    }

    /// A factory connecting every new client to `page`.
    pub fn factory(page: SimulatedPage) -> ProviderFactory {
        Box::new(move |key: &PublicKey| -> Result<ProviderBox> {
            Ok(Self::connect(key, &page))
        })
    }

    fn elements(&self) -> MutexGuard<'_, HashMap<WidgetId, Element>> {
        self.elements.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn style_of(&self, widget: WidgetId) -> Option<StyleOptions> {
        self.elements().get(&widget).map(|element| element.style.clone())
    }

    fn enter_card(&self, widget: WidgetId, input: CardInput) -> Result<()> {
        let today = self.page.lock().today;
        let (event, listeners) = {
            let mut elements = self.elements();
            let element = elements
                .get_mut(&widget)
                .ok_or(CheckoutError::StaleWidget(widget))?;
            let result = card::check(&input, today);
            element.input = input;
            let event = ChangeEvent {
                widget,
                empty: result.empty,
                complete: result.complete,
                brand: result.brand,
                error: result.error,
            };
            (event, element.listeners.clone())
        };

        for listener in listeners {
            listener(&event);
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentProvider for SimulatedProvider {
    async fn create_element(
        &self,
        kind: ElementKind,
        style: &StyleOptions,
    ) -> Result<WidgetHandle> {
        let id = self.page.next_widget_id();
        self.elements().insert(
            id,
            Element {
                kind,
                style: style.clone(),
                selector: None,
                input: CardInput::default(),
                listeners: Vec::new(),
            },
        );
        Ok(WidgetHandle::new(id, kind))
    }

    async fn mount(&self, widget: &WidgetHandle, selector: &str) -> Result<()> {
        let id = widget.id();
        {
            let elements = self.elements();
            let element = elements.get(&id).ok_or(CheckoutError::StaleWidget(id))?;
            if let Some(current) = &element.selector {
                return Err(CheckoutError::MountPointOccupied(current.clone()));
            }
        }

        self.page.occupy(selector, id, self.me.clone())?;

        if let Some(element) = self.elements().get_mut(&id) {
            element.selector = Some(selector.to_string());
        }
        Ok(())
    }

    fn add_change_listener(&self, widget: &WidgetHandle, listener: ChangeListener) -> Result<()> {
        let id = widget.id();
        self.elements()
            .get_mut(&id)
            .ok_or(CheckoutError::StaleWidget(id))?
            .listeners
            .push(listener);
        self.page.lock().listeners += 1;
        Ok(())
    }

    async fn unmount(&self, widget: &WidgetHandle) -> Result<()> {
        let id = widget.id();
        let selector = {
            let elements = self.elements();
            let element = elements.get(&id).ok_or(CheckoutError::StaleWidget(id))?;
            debug_assert_eq!(element.kind, widget.kind());
            element.selector.clone()
        };

        if let Some(selector) = selector
            && !self.page.release(&selector, id)
        {
            return Err(CheckoutError::MountPointNotFound(selector));
        }

        let removed = self.elements().remove(&id);
        if let Some(element) = removed {
            self.page.lock().listeners -= element.listeners.len();
        }
        Ok(())
    }

    async fn create_token(&self, widget: &WidgetHandle) -> Result<TokenResult> {
        let (latency, today) = {
            let mut page = self.page.lock();
            page.token_requests += 1;
            (page.latency, page.today)
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let id = widget.id();
        let input = {
            let elements = self.elements();
            let element = elements.get(&id).ok_or(CheckoutError::StaleWidget(id))?;
            if element.selector.is_none() {
                return Err(CheckoutError::NotMounted);
            }
            element.input.clone()
        };

        if let Some(fault) = self.page.lock().pending_faults.pop_front() {
            return Ok(Err(fault));
        }

        Ok(card::summarize(&input, today).map(|card| Token {
            id: self.page.next_token_id(),
            card,
            livemode: self.key.is_live(),
            created: Utc::now().timestamp(),
        }))
    }
}

impl Drop for SimulatedProvider {
    fn drop(&mut self) {
        let elements = std::mem::take(
            self.elements
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let listeners: usize = elements.values().map(|e| e.listeners.len()).sum();
        for (id, element) in &elements {
            if let Some(selector) = &element.selector {
                self.page.release(selector, *id);
            }
        }

        let mut page = self.page.lock();
        page.listeners -= listeners;
        page.clients -= 1;
    }
}
