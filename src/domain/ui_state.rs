use crate::config::PageLayout;
use serde::Serialize;
use std::fmt;

/// The visual state of the pay button and the error banner.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum UiState {
    /// Idle, submit enabled.
    #[default]
    Default,
    /// Credential handed to the host, waiting for the capture step.
    Processing,
    /// Payment captured.
    Complete,
    /// Submit disabled, banner shows the message.
    Error(String),
}

impl UiState {
    /// Short name used for the button class suffix and CSV output.
    pub fn name(&self) -> &'static str {
        match self {
            UiState::Default => "default",
            UiState::Processing => "processing",
            UiState::Complete => "complete",
            UiState::Error(_) => "error",
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            UiState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Only an idle button can be pressed.
    pub fn accepts_submission(&self) -> bool {
        matches!(self, UiState::Default)
    }
}

impl fmt::Display for UiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiState::Error(message) => write!(f, "error: {}", message),
            other => f.write_str(other.name()),
        }
    }
}

/// Everything that can move the state machine. There are no timers: each event
/// comes from the widget, the submission flow, or the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// The widget re-validated its input. `Some` carries the fault message.
    WidgetChanged(Option<String>),
    SubmissionFailed(String),
    TokenIssued,
    /// Host signal: the payment was captured.
    Completed,
    /// Host signal: the capture step after tokenization failed.
    CaptureFailed(String),
    Reset,
}

/// Pure transition function. `None` means the event does not apply in the
/// current state and the state is left untouched.
pub fn transition(current: &UiState, event: &UiEvent) -> Option<UiState> {
    use UiEvent as E;
    use UiState as S;

    match (current, event) {
        (_, E::Reset) => Some(S::Default),
        (S::Default | S::Error(_), E::WidgetChanged(None)) => Some(S::Default),
        (S::Default | S::Error(_), E::WidgetChanged(Some(message))) => {
            Some(S::Error(message.clone()))
        }
        (S::Default | S::Error(_) | S::Processing, E::SubmissionFailed(message)) => {
            Some(S::Error(message.clone()))
        }
        (S::Default | S::Error(_), E::TokenIssued) => Some(S::Processing),
        (S::Processing, E::Completed) => Some(S::Complete),
        (S::Processing, E::CaptureFailed(message)) => Some(S::Error(message.clone())),
        _ => None,
    }
}

/// Holds the current state and applies events through [`transition`].
#[derive(Debug, Default)]
pub struct UiStateMachine {
    current: UiState,
}

impl UiStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &UiState {
        &self.current
    }

    /// Applies an event, returning the new state if it was accepted.
    pub fn apply(&mut self, event: &UiEvent) -> Option<&UiState> {
        let next = transition(&self.current, event)?;
        self.current = next;
        Some(&self.current)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PayIcon {
    Lock,
    Spinner,
    Check,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonView {
    pub id: String,
    pub class: String,
    pub text: String,
    pub disabled: bool,
    pub icon_id: String,
    pub icon: PayIcon,
}

/// The error container. Hidden when `message` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BannerView {
    pub id: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmountView {
    pub id: String,
    pub text: String,
}

/// What the host should show for a state, keyed by the element ids of the
/// page layout: the pay button with its icon, the error banner and the price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub button: ButtonView,
    pub error_banner: BannerView,
    pub amount: AmountView,
}

impl PageView {
    /// Projects `state` onto the page described by `layout`. `amount` is the
    /// formatted price shown in the amount element and the idle label, e.g. `$2.21`.
    pub fn render(state: &UiState, amount: &str, layout: &PageLayout) -> Self {
        let (text, disabled, icon) = match state {
            UiState::Default => (format!("Pay {}", amount), false, PayIcon::Lock),
            UiState::Processing => ("Processing…".to_string(), true, PayIcon::Spinner),
            UiState::Complete => ("Paid".to_string(), true, PayIcon::Check),
            UiState::Error(_) => (format!("Pay {}", amount), true, PayIcon::Warning),
        };

        Self {
            button: ButtonView {
                id: layout.button_id.clone(),
                class: format!("{} {}--{}", layout.button_id, layout.button_id, state.name()),
                text,
                disabled,
                icon_id: layout.icon_id.clone(),
                icon,
            },
            error_banner: BannerView {
                id: layout.errors_id.clone(),
                message: state.message().map(str::to_string),
            },
            amount: AmountView {
                id: layout.amount_id.clone(),
                text: amount.to_string(),
            },
        }
    }
}
